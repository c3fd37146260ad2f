//! Syntax highlighting for code blocks.
//!
//! Uses syntect for highlighting with Sublime Text syntax definitions. The
//! same syntaxes feed both the HTML renderer and the terminal preview.

use std::sync::OnceLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::preview::{InlineColor, InlineSpan, InlineStyle};
use crate::render::escape_html;

/// Which terminal or page background the highlight colors must read on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightBackground {
    Light,
    #[default]
    Dark,
}

impl HighlightBackground {
    /// Detect from the `COLORFGBG` environment variable.
    pub fn detect() -> Self {
        background_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
    }
}

/// Highlight `code` into inline-styled HTML `<span>`s.
///
/// Unknown languages and highlighting failures yield escaped plain text.
pub fn highlight_html(language: Option<&str>, code: &str, background: HighlightBackground) -> String {
    let syntax_set = syntax_set();
    let Some(syntax) = find_syntax(language, code) else {
        return escape_html(code);
    };

    let mut highlighter = HighlightLines::new(syntax, theme(background));
    let mut out = String::with_capacity(code.len() * 2);
    for line in LinesWithEndings::from(code) {
        let html = highlighter
            .highlight_line(line, syntax_set)
            .and_then(|ranges| styled_line_to_highlighted_html(&ranges, IncludeBackground::No));
        match html {
            Ok(html) => out.push_str(&html),
            Err(err) => {
                tracing::debug!(%err, "highlight failed, emitting plain line");
                out.push_str(&escape_html(line));
            }
        }
    }
    out
}

/// Highlight `code` into preview spans, one `Vec` per line.
pub fn highlight_code(
    language: Option<&str>,
    code: &str,
    background: HighlightBackground,
) -> Vec<Vec<InlineSpan>> {
    let mut lines = Vec::new();
    let syntax_set = syntax_set();
    let code_style = InlineStyle {
        code: true,
        ..InlineStyle::default()
    };
    let syntax = find_syntax(language, code);

    let Some(syntax) = syntax else {
        for line in code.lines() {
            lines.push(vec![InlineSpan::new(line.to_string(), code_style)]);
        }
        return lines;
    };

    let mut highlighter = HighlightLines::new(syntax, theme(background));
    for line in code.lines() {
        let ranges = highlighter
            .highlight_line(line, syntax_set)
            .unwrap_or_default();
        let mut spans = Vec::new();
        for (style, text) in ranges {
            let fg = InlineColor::new(style.foreground.r, style.foreground.g, style.foreground.b);
            let inline_style = InlineStyle {
                fg: Some(adjust_fg_for_background(fg, background)),
                ..code_style
            };
            spans.push(InlineSpan::new(text.to_string(), inline_style));
        }
        lines.push(spans);
    }

    lines
}

fn find_syntax(language: Option<&str>, code: &str) -> Option<&'static SyntaxReference> {
    let syntax_set = syntax_set();
    let by_token = language
        .filter(|lang| !lang.is_empty())
        .and_then(|lang| {
            syntax_set
                .find_syntax_by_token(lang)
                .or_else(|| syntax_set.find_syntax_by_name(lang))
        });
    if by_token.is_some() {
        return by_token;
    }
    let first_line = code.lines().next()?;
    syntax_set
        .find_syntax_by_first_line(first_line)
        .filter(|syntax| syntax.name != "Plain Text")
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        tracing::debug!("loading syntax definitions");
        SyntaxSet::load_defaults_newlines()
    })
}

fn theme(background: HighlightBackground) -> &'static Theme {
    static DARK: OnceLock<Theme> = OnceLock::new();
    static LIGHT: OnceLock<Theme> = OnceLock::new();
    let (cell, preferred) = match background {
        HighlightBackground::Dark => (
            &DARK,
            [
                "Monokai Extended",
                "Monokai Extended Bright",
                "Dracula",
                "Solarized (dark)",
                "base16-ocean.dark",
            ]
            .as_slice(),
        ),
        HighlightBackground::Light => (
            &LIGHT,
            [
                "InspiredGitHub",
                "Solarized (light)",
                "base16-ocean.light",
            ]
            .as_slice(),
        ),
    };
    cell.get_or_init(|| {
        let theme_set = ThemeSet::load_defaults();
        for name in preferred {
            if let Some(theme) = theme_set.themes.get(*name) {
                return theme.clone();
            }
        }

        theme_set
            .themes
            .values()
            .next()
            .cloned()
            .unwrap_or_default()
    })
}

/// Interpret `COLORFGBG` (`"fg;bg"`); dark unless the background index is light.
pub fn background_from_colorfgbg(colorfgbg: Option<&str>) -> HighlightBackground {
    let Some(value) = colorfgbg else {
        return HighlightBackground::Dark;
    };
    let bg_str = value.rsplit(';').next().unwrap_or(value);
    let Ok(bg) = bg_str.parse::<u8>() else {
        return HighlightBackground::Dark;
    };

    if bg >= 7 {
        HighlightBackground::Light
    } else {
        HighlightBackground::Dark
    }
}

fn adjust_fg_for_background(color: InlineColor, background: HighlightBackground) -> InlineColor {
    match background {
        HighlightBackground::Dark => color,
        HighlightBackground::Light => {
            let luma = 0.0722f32.mul_add(
                f32::from(color.b),
                0.2126f32.mul_add(f32::from(color.r), 0.7152 * f32::from(color.g)),
            );
            if luma < 155.0 {
                return color;
            }

            let darken = |c: u8| (f32::from(c) * 0.42).round() as u8;
            InlineColor::new(darken(color.r), darken(color.g), darken(color.b))
        }
    }
}
