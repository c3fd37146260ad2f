//! Markdown to HTML rendering with comrak.
//!
//! Rendering options are passed per call rather than configured globally,
//! so the preview and the exports can ask for different output.

mod sanitize;
mod template;

use std::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use comrak::{Arena, Options, format_html, parse_document};

use crate::error::RenderError;
use crate::highlight::{HighlightBackground, highlight_html};

pub use sanitize::{NEUTRAL_URL, escape_html, is_safe_url};
pub use template::standalone_document;

/// Class given to code blocks without a language.
const PLAIN_LANGUAGE: &str = "plaintext";

/// Options for a single render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Treat every newline inside a paragraph as a line break
    pub hard_breaks: bool,
    /// Tables, strikethrough, autolinks and task lists
    pub gfm: bool,
    /// Syntax-highlight fenced code
    pub highlight: bool,
    /// Emit a copy button in each code block header
    pub copy_buttons: bool,
    pub background: HighlightBackground,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            hard_breaks: true,
            gfm: true,
            highlight: true,
            copy_buttons: true,
            background: HighlightBackground::Light,
        }
    }
}

/// comrak options matching `options`.
pub fn comrak_options(options: &RenderOptions) -> Options {
    let mut comrak = Options::default();

    if options.gfm {
        comrak.extension.strikethrough = true;
        comrak.extension.table = true;
        comrak.extension.autolink = true;
        comrak.extension.tasklist = true;
        comrak.extension.footnotes = true;
    }
    comrak.render.hardbreaks = options.hard_breaks;
    // Raw HTML is escaped in the AST; the only HTML nodes left are ours.
    comrak.render.unsafe_ = true;

    comrak
}

/// Render `markdown` into sanitized HTML.
pub fn render_html(markdown: &str, options: &RenderOptions) -> Result<String, RenderError> {
    let arena = Arena::new();
    let comrak = comrak_options(options);
    let root = parse_document(&arena, markdown, &comrak);

    sanitize::sanitize_tree(root);
    replace_code_blocks(root, options);

    let mut out = Vec::with_capacity(markdown.len() * 2);
    format_html(root, &comrak, &mut out)?;
    Ok(String::from_utf8(out)?)
}

/// Render `markdown`, degrading to an escaped `<pre>` of the source on error.
pub fn render_html_lossy(markdown: &str, options: &RenderOptions) -> String {
    match render_html(markdown, options) {
        Ok(html) => html,
        Err(err) => {
            tracing::warn!(%err, "markdown render failed, showing source");
            format!("<pre>{}</pre>\n", escape_html(markdown))
        }
    }
}

fn replace_code_blocks<'a>(root: &'a AstNode<'a>, options: &RenderOptions) {
    for node in root.descendants() {
        let html = match &node.data.borrow().value {
            NodeValue::CodeBlock(block) => Some(code_block_html(&block.info, &block.literal, options)),
            _ => None,
        };
        if let Some(literal) = html {
            node.data.borrow_mut().value = NodeValue::HtmlBlock(NodeHtmlBlock {
                block_type: 0,
                literal,
            });
        }
    }
}

/// Markup for one code block: a header with the language label and copy
/// button, then the highlighted `<pre><code>`.
fn code_block_html(info: &str, code: &str, options: &RenderOptions) -> String {
    let language = info.split_whitespace().next().filter(|s| !s.is_empty());
    let class = language.map_or_else(|| PLAIN_LANGUAGE.to_string(), class_token);
    let label = if class == PLAIN_LANGUAGE { "text" } else { &class };
    let body = if options.highlight {
        highlight_html(language, code, options.background)
    } else {
        escape_html(code)
    };

    let mut html = String::with_capacity(body.len() + code.len() + 256);
    html.push_str("<div class=\"code-block-wrapper\">");
    html.push_str("<div class=\"code-header\">");
    let _ = write!(html, "<span class=\"lang\">{label}</span>");
    if options.copy_buttons {
        let _ = write!(
            html,
            "<button class=\"copy-btn\" type=\"button\" data-code=\"{}\">Copy</button>",
            BASE64.encode(code)
        );
    }
    html.push_str("</div>");
    let _ = write!(html, "<pre><code class=\"hljs {class}\">{body}</code></pre>");
    html.push_str("</div>\n");
    html
}

/// Restrict a fence language to characters safe inside a class attribute.
fn class_token(language: &str) -> String {
    let token: String = language
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#' | '.'))
        .collect();
    if token.is_empty() {
        PLAIN_LANGUAGE.to_string()
    } else {
        token
    }
}
