//! HTML bridge
//!
//! The HTML string is the persisted and exchanged form of a document.
//! `from_html(to_html(d))` gives back a document equal to `d`: same text, same
//! attribute spans after normalization, same attachments in the same order.

pub mod reader;
pub mod writer;

pub use reader::{parse, ParseReport};
pub use writer::{to_html, EMBEDDED_HTML_ATTRIBUTE, EMBEDDED_HTML_CLASS};

use crate::text::Document;

/// Parse `html`, degrading malformed input to plain text
///
/// Anomalies are logged; use [`parse`] to inspect them.
pub fn from_html(html: &str) -> Document {
    let report = parse(html);
    if !report.anomalies.is_empty() {
        log::warn!("Parsed HTML with {} anomalies", report.anomalies.len());
    }
    report.document
}
