//! Content-type sniffing for response bodies.
//!
//! Raw whois servers never say what they send, and some web forms omit the
//! header too. We look at the first bytes and pick one of a few types.

use regex::bytes::Regex;

/// Number of leading bytes examined when sniffing.
const SNIFF_LEN: usize = 512;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const TEXT_HTML: &str = "text/html; charset=utf-8";
pub const TEXT_XML: &str = "text/xml; charset=utf-8";
pub const OCTET_STREAM: &str = "application/octet-stream";

lazy_static::lazy_static! {
    // Tag must be followed by a space or '>' so "<br" doesn't match "<brand".
    static ref HTML_SIGNATURE: Regex = Regex::new(
        r"(?i-u)^<(!doctype html|html|head|script|iframe|h1|div|font|table|a|style|title|b|body|br|p|!--)[\t\n\x0c\r >]"
    )
    .expect("HTML signature pattern is valid");
}

/// Classify a body by its leading bytes.
///
/// Always returns a valid media type; an empty body is plain text.
pub fn detect_content_type(body: &[u8]) -> &'static str {
    let head = &body[..body.len().min(SNIFF_LEN)];

    if head.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return TEXT_PLAIN;
    }
    if head.starts_with(&[0xFE, 0xFF]) {
        return "text/plain; charset=utf-16be";
    }
    if head.starts_with(&[0xFF, 0xFE]) {
        return "text/plain; charset=utf-16le";
    }

    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    let trimmed = &head[start..];

    if HTML_SIGNATURE.is_match(trimmed) {
        return TEXT_HTML;
    }
    if trimmed.starts_with(b"<?xml") {
        return TEXT_XML;
    }
    if head.starts_with(b"%PDF-") {
        return "application/pdf";
    }

    if head.iter().copied().any(is_binary_byte) {
        OCTET_STREAM
    } else {
        TEXT_PLAIN
    }
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
