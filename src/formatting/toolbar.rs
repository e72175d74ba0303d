//! Toolbar state projection
//!
//! Maps the document state under a selection back to the identifiers a host
//! toolbar should highlight.

use crate::error::EditorError;
use crate::models::{Attachment, Attributes, FormattingIdentifier, ListStyle, StyleKey};
use crate::text::{Document, SelectionRange};
use serde::Serialize;
use std::collections::BTreeSet;

/// One toolbar button as the host should draw it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolbarItem {
    pub identifier: FormattingIdentifier,
    pub icon: String,
    pub active: bool,
}

/// Identifiers whose style is active over `range`
///
/// A non-empty range reports styles present on all of it, plus `media` when
/// the range is exactly one media placeholder. A caret reports what the next
/// typed character will look like, pending typing attributes included.
pub fn active_identifiers(
    document: &Document,
    range: SelectionRange,
) -> Result<BTreeSet<FormattingIdentifier>, EditorError> {
    let mut active = identifiers_for(&document.attributes_spanning(range)?);

    if range.length == 1 {
        if let Some(entry) = document.attachment_at(range.start) {
            if matches!(entry.attachment, Attachment::Media(_)) {
                active.insert(FormattingIdentifier::Media);
            }
        }
    }
    Ok(active)
}

/// Identifiers corresponding to an attribute set
pub fn identifiers_for(attributes: &Attributes) -> BTreeSet<FormattingIdentifier> {
    let mut identifiers = BTreeSet::new();
    for (key, identifier) in [
        (StyleKey::Bold, FormattingIdentifier::Bold),
        (StyleKey::Italic, FormattingIdentifier::Italic),
        (StyleKey::Underline, FormattingIdentifier::Underline),
        (StyleKey::Strikethrough, FormattingIdentifier::Strikethrough),
    ] {
        if attributes.has(key) {
            identifiers.insert(identifier);
        }
    }

    match attributes.list_style() {
        Some(ListStyle::Ordered) => {
            identifiers.insert(FormattingIdentifier::OrderedList);
        }
        Some(ListStyle::Unordered) => {
            identifiers.insert(FormattingIdentifier::UnorderedList);
        }
        None => {}
    }

    if let Some(heading) = attributes
        .heading_level()
        .and_then(FormattingIdentifier::from_heading_level)
    {
        identifiers.insert(heading);
    }
    identifiers
}
