//! AST-level sanitizing before HTML output.
//!
//! Raw HTML typed by the user is turned into text and unsafe URL schemes are
//! dropped from links and images. Only the code-block markup inserted after
//! this pass reaches the output unescaped.

use std::sync::OnceLock;

use comrak::nodes::{AstNode, NodeValue};
use regex::Regex;

/// Href written in place of a rejected URL.
pub const NEUTRAL_URL: &str = "#";

/// Escape text for HTML element content and double-quoted attributes,
/// using the same escaper comrak applies to rendered text.
pub fn escape_html(text: &str) -> String {
    let mut out = Vec::with_capacity(text.len());
    // Writes into a Vec cannot fail.
    let _ = comrak::html::escape(&mut out, text.as_bytes());
    String::from_utf8_lossy(&out).into_owned()
}

/// Neutralize raw HTML and dangerous URLs throughout the tree.
pub fn sanitize_tree<'a>(root: &'a AstNode<'a>) {
    for node in root.descendants() {
        let mut data = node.data.borrow_mut();
        let replacement = match &mut data.value {
            NodeValue::HtmlInline(raw) => Some(NodeValue::Text(std::mem::take(raw))),
            NodeValue::HtmlBlock(block) => {
                block.literal = escaped_block(&block.literal);
                None
            }
            NodeValue::Link(link) => {
                if !is_safe_url(&link.url, false) {
                    tracing::debug!(url = %link.url, "dropping unsafe link target");
                    link.url = NEUTRAL_URL.to_string();
                }
                None
            }
            NodeValue::Image(image) => {
                if !is_safe_url(&image.url, true) {
                    tracing::debug!(url = %image.url, "dropping unsafe image source");
                    image.url = NEUTRAL_URL.to_string();
                }
                None
            }
            _ => None,
        };
        if let Some(value) = replacement {
            data.value = value;
        }
    }
}

fn escaped_block(literal: &str) -> String {
    let text = literal.trim_end_matches('\n');
    if text.is_empty() {
        return String::new();
    }
    format!("<p>{}</p>\n", escape_html(text))
}

/// Whether `url` may be emitted as an `href`/`src`.
///
/// Relative URLs carry no scheme and are always allowed. `data:` is only
/// accepted for raster images.
pub fn is_safe_url(url: &str, is_image: bool) -> bool {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    static SAFE_DATA_IMAGE: OnceLock<Regex> = OnceLock::new();

    let scheme_re = SCHEME.get_or_init(|| {
        Regex::new(r"^[\s\x00-\x1f]*([A-Za-z][A-Za-z0-9+.\-]*)[\s\x00-\x1f]*:")
            .expect("scheme pattern is valid")
    });
    let Some(caps) = scheme_re.captures(url) else {
        return true;
    };
    let scheme = caps[1].to_ascii_lowercase();
    match scheme.as_str() {
        "javascript" | "vbscript" | "file" => false,
        "data" => {
            is_image
                && SAFE_DATA_IMAGE
                    .get_or_init(|| {
                        Regex::new(r"(?i)^\s*data:image/(png|gif|jpeg|jpg|webp)[;,]")
                            .expect("data-image pattern is valid")
                    })
                    .is_match(url)
        }
        _ => true,
    }
}
