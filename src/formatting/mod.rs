//! Formatting engine
//!
//! Toggles character- and paragraph-level styles over a selection.
//!
//! - Character styles (bold, italic, underline, strikethrough) use a
//!   uniform-state toggle: if the style covers the whole range it is removed
//!   everywhere, otherwise it is applied everywhere.
//! - List and heading styles work on whole paragraphs. A paragraph holds at
//!   most one of them: switching list style or heading level replaces the old
//!   value in one step, and setting a list clears a heading (and vice versa).

pub mod toolbar;

pub use toolbar::{active_identifiers, identifiers_for, ToolbarItem};

use crate::error::EditorError;
use crate::models::{FormattingIdentifier, ListStyle, StyleKey, StyleValue};
use crate::text::{Document, SelectionRange};

/// Attribute a style identifier toggles, or `None` for commands
pub fn style_for(identifier: FormattingIdentifier) -> Option<(StyleKey, StyleValue)> {
    match identifier {
        FormattingIdentifier::Bold => Some((StyleKey::Bold, StyleValue::Flag)),
        FormattingIdentifier::Italic => Some((StyleKey::Italic, StyleValue::Flag)),
        FormattingIdentifier::Underline => Some((StyleKey::Underline, StyleValue::Flag)),
        FormattingIdentifier::Strikethrough => Some((StyleKey::Strikethrough, StyleValue::Flag)),
        FormattingIdentifier::OrderedList => {
            Some((StyleKey::ListStyle, StyleValue::List(ListStyle::Ordered)))
        }
        FormattingIdentifier::UnorderedList => {
            Some((StyleKey::ListStyle, StyleValue::List(ListStyle::Unordered)))
        }
        other => other
            .heading_level()
            .map(|level| (StyleKey::HeadingLevel, StyleValue::Heading(level))),
    }
}

/// Toggle `identifier` over `range`
///
/// Identifiers that are not styles (`media`, `sourcecode`, `more`, `done`)
/// leave the document untouched.
pub fn toggle(
    document: &mut Document,
    identifier: FormattingIdentifier,
    range: SelectionRange,
) -> Result<(), EditorError> {
    let Some((key, value)) = style_for(identifier) else {
        document.validate_range(range)?;
        log::debug!("{} is not a style, toggle ignored", identifier);
        return Ok(());
    };

    if key.is_paragraph_level() {
        toggle_paragraph_style(document, key, value, range)
    } else {
        toggle_character_style(document, key, range)
    }
}

fn toggle_character_style(
    document: &mut Document,
    key: StyleKey,
    range: SelectionRange,
) -> Result<(), EditorError> {
    if document.attributes_spanning(range)?.has(key) {
        log::debug!("Removing {:?} over {:?}", key, range);
        document.remove_attribute(range, key)
    } else {
        log::debug!("Applying {:?} over {:?}", key, range);
        document.apply_attribute(range, key, StyleValue::Flag)
    }
}

fn toggle_paragraph_style(
    document: &mut Document,
    key: StyleKey,
    value: StyleValue,
    range: SelectionRange,
) -> Result<(), EditorError> {
    // Empty trailing paragraph (or empty document): the caret range makes the
    // document store these as typing attributes
    let paragraphs = document.paragraph_range(range)?;

    if document.attributes_spanning(paragraphs)?.contains(key, &value) {
        log::debug!("Clearing {:?} on paragraphs {:?}", key, paragraphs);
        return document.remove_attribute(paragraphs, key);
    }

    log::debug!("Setting {:?} = {:?} on paragraphs {:?}", key, value, paragraphs);
    document.apply_attribute(paragraphs, key, value)?;
    document.remove_attribute(paragraphs, exclusive_with(key))
}

fn exclusive_with(key: StyleKey) -> StyleKey {
    match key {
        StyleKey::HeadingLevel => StyleKey::ListStyle,
        _ => StyleKey::HeadingLevel,
    }
}
