//! Terminal colors for the preview pane.
//!
//! Uses ANSI colors that adapt to the terminal's palette; syntax colors from
//! the highlighter are mapped down to xterm-256 when truecolor is missing.

use ratatui::style::{Color, Modifier, Style};

use crate::preview::{InlineColor, InlineStyle, LineKind};

/// Get the style for a given preview line kind.
pub fn style_for_line_kind(kind: LineKind, light: bool) -> Style {
    let pick = |light_color: Color, dark_color: Color| {
        if light { light_color } else { dark_color }
    };
    match kind {
        // Headings - bold with distinct colors per level
        LineKind::Heading(1) => Style::default()
            .fg(pick(Color::Indexed(24), Color::Cyan))
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        LineKind::Heading(2) => Style::default()
            .fg(pick(Color::Indexed(22), Color::Green))
            .add_modifier(Modifier::BOLD),
        LineKind::Heading(3) => Style::default()
            .fg(pick(Color::Indexed(58), Color::Yellow))
            .add_modifier(Modifier::BOLD),
        LineKind::Heading(4) => Style::default()
            .fg(pick(Color::Indexed(24), Color::Blue))
            .add_modifier(Modifier::BOLD),
        LineKind::Heading(5) => Style::default()
            .fg(pick(Color::Indexed(54), Color::Magenta))
            .add_modifier(Modifier::BOLD),
        LineKind::Heading(_) => Style::default()
            .fg(pick(Color::Indexed(24), Color::Cyan))
            .add_modifier(Modifier::BOLD),

        LineKind::CodeHeader => Style::default()
            .fg(pick(Color::Indexed(241), Color::Indexed(246)))
            .add_modifier(Modifier::BOLD),
        LineKind::CodeBlock => Style::default()
            .fg(pick(Color::Indexed(238), Color::Indexed(245)))
            .add_modifier(Modifier::DIM),

        LineKind::BlockQuote => Style::default()
            .fg(pick(Color::Indexed(24), Color::Blue))
            .add_modifier(Modifier::ITALIC),

        LineKind::HorizontalRule => Style::default()
            .fg(pick(Color::Indexed(241), Color::Indexed(240)))
            .add_modifier(Modifier::DIM),

        // Images are shown as their alt text
        LineKind::Image => Style::default()
            .fg(pick(Color::Indexed(90), Color::Magenta))
            .add_modifier(Modifier::ITALIC),

        LineKind::ListItem(_) | LineKind::Table | LineKind::Paragraph | LineKind::Empty => {
            Style::default()
        }
    }
}

/// Get the style for an inline span, merged with a base line style.
pub fn style_for_inline(base: Style, inline: InlineStyle, light: bool) -> Style {
    let mut style = base;

    if let Some(fg) = inline.fg {
        style = style
            .fg(fg_color_for_terminal(fg))
            .remove_modifier(Modifier::DIM);
    }
    if let Some(bg) = inline.bg {
        style = style.bg(Color::Rgb(bg.r, bg.g, bg.b));
    }

    if inline.emphasis {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if inline.strong {
        style = style.add_modifier(Modifier::BOLD);
    }
    if inline.strikethrough {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    if inline.link {
        style = style.add_modifier(Modifier::UNDERLINED);
        if inline.fg.is_none() {
            style = style.fg(if light { Color::Blue } else { Color::LightBlue });
        }
    }
    if inline.code && inline.fg.is_none() {
        style = style
            .fg(if light { Color::Indexed(88) } else { Color::Red })
            .add_modifier(Modifier::BOLD);
    }

    style
}

fn fg_color_for_terminal(fg: InlineColor) -> Color {
    if supports_truecolor() {
        Color::Rgb(fg.r, fg.g, fg.b)
    } else {
        Color::Indexed(rgb_to_xterm_256(fg.r, fg.g, fg.b))
    }
}

fn supports_truecolor() -> bool {
    if let Ok(force) = std::env::var("MARKDRAFT_TRUECOLOR") {
        let value = force.to_ascii_lowercase();
        return matches!(value.as_str(), "1" | "true" | "yes" | "on");
    }
    supports_truecolor_from_env(
        std::env::var("COLORTERM").ok().as_deref(),
        std::env::var("TERM").ok().as_deref(),
    )
}

fn supports_truecolor_from_env(colorterm: Option<&str>, term: Option<&str>) -> bool {
    if let Some(ct) = colorterm {
        let lower = ct.to_ascii_lowercase();
        if lower.contains("truecolor") || lower.contains("24bit") {
            return true;
        }
    }
    if let Some(t) = term {
        let lower = t.to_ascii_lowercase();
        if lower.contains("direct") || lower.contains("truecolor") {
            return true;
        }
    }
    false
}

fn rgb_to_xterm_256(r: u8, g: u8, b: u8) -> u8 {
    // Result is always 0-5, fits in u8
    #[allow(clippy::cast_possible_truncation)]
    let to_cube = |v: u8| ((u16::from(v) * 5) / 255) as u8;
    16 + (36 * to_cube(r)) + (6 * to_cube(g)) + to_cube(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_styles_are_bold() {
        for level in 1..=6 {
            for light in [true, false] {
                let style = style_for_line_kind(LineKind::Heading(level), light);
                assert!(style.add_modifier.contains(Modifier::BOLD));
            }
        }
    }

    #[test]
    fn test_h1_is_underlined() {
        let style = style_for_line_kind(LineKind::Heading(1), false);
        assert!(style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_light_and_dark_code_colors_differ() {
        let light = style_for_line_kind(LineKind::CodeBlock, true);
        let dark = style_for_line_kind(LineKind::CodeBlock, false);
        assert_ne!(light.fg, dark.fg);
    }

    #[test]
    fn test_inline_color_removes_dim_modifier() {
        let base = Style::default().add_modifier(Modifier::DIM);
        let inline = InlineStyle {
            fg: Some(InlineColor::new(255, 0, 0)),
            ..InlineStyle::default()
        };
        let styled = style_for_inline(base, inline, false);
        assert!(!styled.add_modifier.contains(Modifier::DIM));
    }

    #[test]
    fn test_link_without_color_gets_link_blue() {
        let inline = InlineStyle {
            link: true,
            ..InlineStyle::default()
        };
        let styled = style_for_inline(Style::default(), inline, true);
        assert_eq!(styled.fg, Some(Color::Blue));
        assert!(styled.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_truecolor_detection_without_colorterm() {
        assert!(!supports_truecolor_from_env(None, Some("xterm-256color")));
    }

    #[test]
    fn test_truecolor_detection_with_colorterm() {
        assert!(supports_truecolor_from_env(
            Some("truecolor"),
            Some("xterm-256color")
        ));
    }

    #[test]
    fn test_fallback_indexed_color_when_not_truecolor() {
        assert_eq!(rgb_to_xterm_256(255, 0, 0), 196);
    }
}
