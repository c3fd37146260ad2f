//! Toolbar markup tokens.

/// One of the predefined toolbar insertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkupToken {
    Bold,
    Italic,
    Code,
    Link,
    Image,
    ListItem,
}

impl MarkupToken {
    /// Toolbar order.
    pub const ALL: [Self; 6] = [
        Self::Bold,
        Self::Italic,
        Self::Code,
        Self::Link,
        Self::Image,
        Self::ListItem,
    ];

    /// Placeholder text inserted when nothing is selected.
    pub const fn literal(self) -> &'static str {
        match self {
            Self::Bold => "**bold**",
            Self::Italic => "*italic*",
            Self::Code => "`code`",
            Self::Link => "[text](url)",
            Self::Image => "![alt](url)",
            Self::ListItem => "- item",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Bold => "Bold",
            Self::Italic => "Italic",
            Self::Code => "Code",
            Self::Link => "Link",
            Self::Image => "Image",
            Self::ListItem => "List",
        }
    }

    /// Match a token by its exact placeholder text.
    pub fn from_literal(literal: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|token| token.literal() == literal)
    }

    /// Wrap `selected` with this token's markup.
    pub fn wrap(self, selected: &str) -> String {
        match self {
            Self::Bold => format!("**{selected}**"),
            Self::Italic => format!("*{selected}*"),
            Self::Code => format!("`{selected}`"),
            Self::Link => format!("[{selected}](url)"),
            Self::Image => format!("![{selected}](url)"),
            Self::ListItem => format!("- {selected}"),
        }
    }
}

/// Text that replaces `selected` when `literal` is inserted.
///
/// Only the predefined tokens wrap a selection; anything else, or an
/// empty selection, inserts `literal` as is.
pub fn markup_replacement(literal: &str, selected: &str) -> String {
    match MarkupToken::from_literal(literal) {
        Some(token) if !selected.is_empty() => token.wrap(selected),
        _ => literal.to_string(),
    }
}
