// Formatting toggles and toolbar projection through the public API

use rich_text_editor::formatting::{active_identifiers, toggle};
use rich_text_editor::models::{FormattingIdentifier, ListStyle, StyleKey};
use rich_text_editor::{Document, SelectionRange};
use std::collections::BTreeSet;

#[test]
fn test_character_toggle_twice_restores_document() {
    let original = Document::from_text("one two\nthree");
    for identifier in [
        FormattingIdentifier::Bold,
        FormattingIdentifier::Italic,
        FormattingIdentifier::Underline,
        FormattingIdentifier::Strikethrough,
    ] {
        let mut doc = original.clone();
        let range = SelectionRange::new(2, 8);
        toggle(&mut doc, identifier, range).unwrap();
        assert_ne!(doc, original);
        toggle(&mut doc, identifier, range).unwrap();
        assert_eq!(doc, original, "{} did not restore", identifier);
    }
}

#[test]
fn test_partially_styled_selection_becomes_fully_styled() {
    let mut doc = Document::from_text("abcdef");
    toggle(&mut doc, FormattingIdentifier::Bold, SelectionRange::new(0, 2)).unwrap();
    toggle(&mut doc, FormattingIdentifier::Bold, SelectionRange::new(0, 6)).unwrap();

    assert!(doc
        .attributes_spanning(SelectionRange::new(0, 6))
        .unwrap()
        .has(StyleKey::Bold));
}

#[test]
fn test_list_style_switches_in_one_call() {
    let mut doc = Document::from_text("a\nb");
    let all = SelectionRange::new(0, 3);
    toggle(&mut doc, FormattingIdentifier::UnorderedList, all).unwrap();
    toggle(&mut doc, FormattingIdentifier::OrderedList, all).unwrap();

    assert_eq!(doc.paragraph_attributes(0).list_style(), Some(ListStyle::Ordered));
    assert_eq!(doc.paragraph_attributes(2).list_style(), Some(ListStyle::Ordered));
    assert_eq!(
        active_identifiers(&doc, all).unwrap(),
        BTreeSet::from([FormattingIdentifier::OrderedList])
    );

    toggle(&mut doc, FormattingIdentifier::OrderedList, all).unwrap();
    assert_eq!(doc.paragraph_attributes(0).list_style(), None);
}

#[test]
fn test_caret_toggle_styles_next_typed_text() {
    let mut doc = Document::from_text("plain");
    toggle(&mut doc, FormattingIdentifier::Italic, SelectionRange::caret(5)).unwrap();
    assert!(active_identifiers(&doc, SelectionRange::caret(5))
        .unwrap()
        .contains(&FormattingIdentifier::Italic));

    doc.insert_text(5, " styled").unwrap();
    assert!(!doc.attributes_at(0).unwrap().has(StyleKey::Italic));
    assert!(doc.attributes_at(6).unwrap().has(StyleKey::Italic));
}

#[test]
fn test_moving_the_caret_drops_pending_style() {
    let mut doc = Document::from_text("plain");
    toggle(&mut doc, FormattingIdentifier::Underline, SelectionRange::caret(5)).unwrap();
    doc.selection_changed(SelectionRange::caret(2));
    doc.selection_changed(SelectionRange::caret(5));

    assert!(active_identifiers(&doc, SelectionRange::caret(5))
        .unwrap()
        .is_empty());
}
