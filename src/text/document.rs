//! Attributed document
//!
//! The document is an ordered list of [`StyledRun`]s plus an
//! [`AttachmentTable`] keyed by placeholder position. All positions are
//! UTF-16 code unit offsets.
//!
//! ## Invariants
//!
//! - Runs are non-empty, contiguous, and adjacent runs differ in attributes.
//! - Every placeholder character has exactly one attachment entry at its
//!   position, and every entry sits on a placeholder.
//! - Paragraph separators (`\n`) never carry character-level attributes.

use super::attachments::{AttachmentEntry, AttachmentTable};
use super::cursor::SelectionRange;
use super::runs::{normalize, runs_for_insertion, StyledRun};
use crate::error::EditorError;
use crate::models::{Attachment, AttachmentId, Attributes, StyleKey, StyleValue, PLACEHOLDER};
use crate::utils::{byte_offset, char_at, utf16_len};
use std::collections::BTreeMap;

/// Pending style state at a caret
///
/// `None` values record an explicit removal, so "bold off" survives even when
/// the preceding character is bold.
#[derive(Debug, Clone, Default)]
struct TypingAttributes {
    caret: Option<usize>,
    overrides: BTreeMap<StyleKey, Option<StyleValue>>,
}

impl TypingAttributes {
    fn set(&mut self, caret: usize, key: StyleKey, value: Option<StyleValue>) {
        if self.caret != Some(caret) {
            self.overrides.clear();
            self.caret = Some(caret);
        }
        self.overrides.insert(key, value);
    }

    fn apply(&self, caret: usize, attributes: &mut Attributes) {
        if self.caret != Some(caret) {
            return;
        }
        for (key, value) in &self.overrides {
            match value {
                Some(value) => attributes.insert(*key, value.clone()),
                None => {
                    attributes.remove(*key);
                }
            }
        }
    }

    fn clear(&mut self) {
        self.caret = None;
        self.overrides.clear();
    }
}

/// One piece of paragraph content, as seen by serializers
#[derive(Debug, Clone)]
pub enum Piece<'a> {
    Text {
        text: String,
        attributes: &'a Attributes,
    },
    Attachment {
        entry: &'a AttachmentEntry,
        attributes: &'a Attributes,
    },
}

impl Piece<'_> {
    pub fn attributes(&self) -> &Attributes {
        match self {
            Piece::Text { attributes, .. } | Piece::Attachment { attributes, .. } => attributes,
        }
    }
}

/// A paragraph without its separator
#[derive(Debug, Clone)]
pub struct ParagraphView<'a> {
    /// Paragraph-level attributes
    pub attributes: Attributes,
    pub pieces: Vec<Piece<'a>>,
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    runs: Vec<StyledRun>,
    attachments: AttachmentTable,
    typing: TypingAttributes,
    len: usize,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document holding unstyled text
    pub fn from_text(text: &str) -> Self {
        let mut document = Self::new();
        let text = insertable_text(text);
        document.runs = runs_for_insertion(&text, &Attributes::new());
        normalize(&mut document.runs);
        document.len = utf16_len(&text);
        document
    }

    /// Assemble a document from finished runs and attachment positions
    ///
    /// The caller guarantees that each position holds a placeholder.
    pub(crate) fn from_parts(mut runs: Vec<StyledRun>, attachments: Vec<(usize, Attachment)>) -> Self {
        normalize(&mut runs);
        let len = runs.iter().map(StyledRun::len).sum();
        let mut table = AttachmentTable::new();
        for (pos, attachment) in attachments {
            table.insert(pos, attachment);
        }
        Self {
            runs,
            attachments: table,
            typing: TypingAttributes::default(),
            len,
        }
    }

    /// Length in UTF-16 code units
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(StyledRun::text).collect()
    }

    pub fn runs(&self) -> &[StyledRun] {
        &self.runs
    }

    pub fn attachments(&self) -> &AttachmentTable {
        &self.attachments
    }

    /// Look up an attachment by id, returning its position
    pub fn attachment(&self, id: AttachmentId) -> Option<(usize, &AttachmentEntry)> {
        self.attachments.find(id)
    }

    pub fn attachment_at(&self, index: usize) -> Option<&AttachmentEntry> {
        self.attachments.get(index)
    }

    /// Character starting at `index`; `None` past the end or on a low surrogate
    pub fn char_at(&self, index: usize) -> Option<char> {
        let (run, offset) = self.run_containing(index)?;
        char_at(run.text(), offset)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Fail with `InvalidRange` unless `range` lies within the document on
    /// character boundaries
    pub fn validate_range(&self, range: SelectionRange) -> Result<(), EditorError> {
        self.check(range)
    }

    /// Attributes of the character at `index`
    pub fn attributes_at(&self, index: usize) -> Result<Attributes, EditorError> {
        self.attributes_ref(index)
            .cloned()
            .ok_or_else(|| self.invalid(SelectionRange::new(index, 1)))
    }

    /// Attribute pairs present on every character of `range`
    ///
    /// Character-level keys only consider non-separator characters. A caret
    /// range yields the typing attributes at that position.
    pub fn attributes_spanning(&self, range: SelectionRange) -> Result<Attributes, EditorError> {
        self.check(range)?;
        if range.is_caret() {
            return Ok(self.typing_attributes(range.start));
        }

        let mut characters: Option<Attributes> = None;
        let mut paragraphs: Option<Attributes> = None;
        let mut pos = 0;
        for run in &self.runs {
            let run_end = pos + run.len();
            if run_end > range.start && pos < range.end() {
                let local_start = range.start.saturating_sub(pos);
                let local_end = range.end().min(run_end) - pos;
                let has_text = match (byte_offset(run.text(), local_start), byte_offset(run.text(), local_end)) {
                    (Some(a), Some(b)) => run.text()[a..b].chars().any(|c| c != '\n'),
                    _ => !run.is_separator(),
                };

                intersect_into(&mut paragraphs, run.attributes.paragraph_only());
                if has_text {
                    intersect_into(&mut characters, run.attributes.character_only());
                }
            }
            if run_end >= range.end() {
                break;
            }
            pos = run_end;
        }

        let mut result = characters.unwrap_or_default();
        result.merge(&paragraphs.unwrap_or_default());
        Ok(result)
    }

    /// What the next character typed at `caret` will look like
    ///
    /// Character-level attributes come from the preceding character (or the
    /// following one at a paragraph start), paragraph-level attributes from
    /// the caret's paragraph, and pending typing attributes override both.
    pub fn typing_attributes(&self, caret: usize) -> Attributes {
        let mut attributes = self.inherited_character_attributes(caret);
        attributes.merge(&self.paragraph_attributes(caret));
        self.typing.apply(caret, &mut attributes);
        attributes
    }

    /// Paragraph-level attributes of the paragraph containing `index`
    ///
    /// The empty paragraph after a trailing separator continues the list the
    /// document ends in.
    pub fn paragraph_attributes(&self, index: usize) -> Attributes {
        match self.attributes_ref(self.paragraph_start(index)) {
            Some(attributes) => attributes.paragraph_only(),
            None => self.trailing_paragraph_attributes(),
        }
    }

    fn trailing_paragraph_attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        if let Some(style) = self.runs.last().and_then(|run| run.attributes.get(StyleKey::ListStyle)) {
            attributes.insert(StyleKey::ListStyle, style.clone());
        }
        attributes
    }

    /// Expand `range` to whole paragraphs, separators included
    pub fn paragraph_range(&self, range: SelectionRange) -> Result<SelectionRange, EditorError> {
        self.check(range)?;
        let start = self.paragraph_start(range.start);
        let probe = if range.is_caret() { range.start } else { range.end() - 1 };
        let end = self.paragraph_end(probe);
        Ok(SelectionRange::from_bounds(start, end))
    }

    /// Paragraphs in order, each split into text and attachment pieces
    ///
    /// A document ending in a separator has a trailing empty paragraph; an
    /// empty document has none.
    pub fn paragraphs(&self) -> Vec<ParagraphView<'_>> {
        let mut paragraphs = Vec::new();
        if self.is_empty() {
            return paragraphs;
        }

        let mut current = ParagraphView {
            attributes: Attributes::new(),
            pieces: Vec::new(),
        };
        let mut at_paragraph_start = true;
        let mut pos = 0;
        for run in &self.runs {
            let mut buffer = String::new();
            for ch in run.text().chars() {
                if at_paragraph_start {
                    current.attributes = run.attributes.paragraph_only();
                    at_paragraph_start = false;
                }
                match ch {
                    '\n' => {
                        flush_text(&mut current, &mut buffer, &run.attributes);
                        paragraphs.push(std::mem::replace(
                            &mut current,
                            ParagraphView {
                                attributes: Attributes::new(),
                                pieces: Vec::new(),
                            },
                        ));
                        at_paragraph_start = true;
                    }
                    PLACEHOLDER => {
                        flush_text(&mut current, &mut buffer, &run.attributes);
                        match self.attachments.get(pos) {
                            Some(entry) => current.pieces.push(Piece::Attachment {
                                entry,
                                attributes: &run.attributes,
                            }),
                            None => log::warn!("Placeholder at {} has no attachment", pos),
                        }
                    }
                    _ => buffer.push(ch),
                }
                pos += ch.len_utf16();
            }
            flush_text(&mut current, &mut buffer, &run.attributes);
        }
        if at_paragraph_start {
            current.attributes = self.trailing_paragraph_attributes();
        }
        paragraphs.push(current);
        paragraphs
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Set `key` over `range`; a caret range stores a typing attribute
    ///
    /// Paragraph-level keys cover whole paragraphs, so `range` first grows to
    /// its paragraph bounds.
    pub fn apply_attribute(&mut self, range: SelectionRange, key: StyleKey, value: StyleValue) -> Result<(), EditorError> {
        let range = self.target_range(range, key)?;
        if range.is_caret() {
            self.typing.set(range.start, key, Some(value));
            return Ok(());
        }
        self.update_range(range, !key.is_paragraph_level(), |attributes| {
            attributes.insert(key, value.clone())
        })
    }

    /// Clear `key` over `range`; a caret range records a typing removal
    pub fn remove_attribute(&mut self, range: SelectionRange, key: StyleKey) -> Result<(), EditorError> {
        let range = self.target_range(range, key)?;
        if range.is_caret() {
            self.typing.set(range.start, key, None);
            return Ok(());
        }
        self.update_range(range, !key.is_paragraph_level(), |attributes| {
            attributes.remove(key);
        })
    }

    /// Insert text at `index`, styled by the typing attributes there
    ///
    /// Placeholder characters in `text` are dropped; attachments go through
    /// [`Self::insert_attachment`]. Carriage returns become separators.
    pub fn insert_text(&mut self, index: usize, text: &str) -> Result<(), EditorError> {
        self.check(SelectionRange::caret(index))?;
        let attributes = self.typing_attributes(index);
        self.insert_with(index, text, &attributes)
    }

    /// Insert an attachment placeholder at `index`
    pub fn insert_attachment(&mut self, index: usize, attachment: Attachment) -> Result<AttachmentId, EditorError> {
        self.check(SelectionRange::caret(index))?;
        let attributes = self.typing_attributes(index);
        self.typing.clear();
        self.splice(index, vec![StyledRun::new(PLACEHOLDER.to_string(), attributes)])?;
        self.attachments.on_insert(index, 1);
        let id = self.attachments.insert(index, attachment);
        log::debug!("Inserted attachment {} at {}", id, index);
        Ok(id)
    }

    /// Delete `range`, returning the attachments that went with it
    ///
    /// Removed entries are marked dead. If a separator was deleted the merged
    /// paragraph takes the paragraph attributes of its first part.
    pub fn delete(&mut self, range: SelectionRange) -> Result<Vec<AttachmentEntry>, EditorError> {
        self.check(range)?;
        if range.is_caret() {
            return Ok(Vec::new());
        }
        let first = self.split_at(range.start)?;
        let last = self.split_at(range.end())?;
        self.runs.drain(first..last);
        self.len -= range.length;
        normalize(&mut self.runs);
        self.typing.clear();

        let removed = self.attachments.on_delete(range);
        self.unify_paragraph(range.start)?;
        Ok(removed)
    }

    /// Replace `range` with `text`
    ///
    /// The new text takes the style of the first replaced character.
    pub fn replace(&mut self, range: SelectionRange, text: &str) -> Result<Vec<AttachmentEntry>, EditorError> {
        self.check(range)?;
        let mut attributes = self.typing_attributes(range.start);
        if !range.is_caret() && self.char_at(range.start) != Some('\n') {
            if let Some(first) = self.attributes_ref(range.start) {
                attributes = first.clone();
            }
        }
        let removed = self.delete(range)?;
        self.insert_with(range.start, text, &attributes)?;
        Ok(removed)
    }

    /// Remove every character and attachment
    pub fn clear(&mut self) -> Vec<AttachmentEntry> {
        self.runs.clear();
        self.len = 0;
        self.typing.clear();
        self.attachments.clear()
    }

    /// Report a selection change; typing attributes survive only if the caret
    /// stayed where they were set
    pub fn selection_changed(&mut self, selection: SelectionRange) {
        if !(selection.is_caret() && self.typing.caret == Some(selection.start)) {
            self.typing.clear();
        }
    }

    /// Check the structural invariants listed in the module docs
    pub fn check_invariants(&self) -> bool {
        let mut pos = 0;
        let mut placeholders = Vec::new();
        for (i, run) in self.runs.iter().enumerate() {
            if run.is_empty() || run.len() != utf16_len(run.text()) {
                return false;
            }
            if i > 0 && self.runs[i - 1].attributes == run.attributes {
                return false;
            }
            for ch in run.text().chars() {
                if ch == '\n' && !run.attributes.character_only().is_empty() {
                    return false;
                }
                if ch == PLACEHOLDER {
                    placeholders.push(pos);
                }
                pos += ch.len_utf16();
            }
        }
        let table: Vec<usize> = self.attachments.iter().map(|(p, _)| p).collect();
        pos == self.len && placeholders == table
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn invalid(&self, range: SelectionRange) -> EditorError {
        EditorError::InvalidRange {
            start: range.start,
            length: range.length,
            len: self.len,
        }
    }

    fn check(&self, range: SelectionRange) -> Result<(), EditorError> {
        if range.fits(self.len) && self.is_boundary(range.start) && self.is_boundary(range.end()) {
            Ok(())
        } else {
            Err(self.invalid(range))
        }
    }

    fn is_boundary(&self, offset: usize) -> bool {
        match self.run_containing(offset) {
            Some((run, local)) => byte_offset(run.text(), local).is_some(),
            None => offset == self.len,
        }
    }

    /// Run holding the unit at `index`, with the offset inside it
    fn run_containing(&self, index: usize) -> Option<(&StyledRun, usize)> {
        let mut pos = 0;
        for run in &self.runs {
            if index < pos + run.len() {
                return Some((run, index - pos));
            }
            pos += run.len();
        }
        None
    }

    fn attributes_ref(&self, index: usize) -> Option<&Attributes> {
        self.run_containing(index).map(|(run, _)| &run.attributes)
    }

    fn inherited_character_attributes(&self, index: usize) -> Attributes {
        if index > 0 && self.char_at(index - 1) != Some('\n') {
            if let Some(attributes) = self.attributes_ref(index - 1) {
                return attributes.character_only();
            }
        }
        match self.char_at(index) {
            Some(ch) if ch != '\n' => self
                .attributes_ref(index)
                .map(Attributes::character_only)
                .unwrap_or_default(),
            _ => Attributes::new(),
        }
    }

    /// Offset just after the last separator before `index`, or 0
    fn paragraph_start(&self, index: usize) -> usize {
        let mut start = 0;
        let mut pos = 0;
        for run in &self.runs {
            if pos >= index {
                break;
            }
            for ch in run.text().chars() {
                if pos >= index {
                    break;
                }
                pos += ch.len_utf16();
                if ch == '\n' {
                    start = pos;
                }
            }
        }
        start
    }

    /// Offset just past the first separator at or after `probe`
    fn paragraph_end(&self, probe: usize) -> usize {
        let mut pos = 0;
        for run in &self.runs {
            if pos + run.len() <= probe {
                pos += run.len();
                continue;
            }
            for ch in run.text().chars() {
                let next = pos + ch.len_utf16();
                if ch == '\n' && pos >= probe {
                    return next;
                }
                pos = next;
            }
        }
        self.len
    }

    /// Ensure a run boundary at `offset`; returns the index of the first run
    /// starting there (or `runs.len()` at the end)
    fn split_at(&mut self, offset: usize) -> Result<usize, EditorError> {
        let mut pos = 0;
        for i in 0..self.runs.len() {
            if pos == offset {
                return Ok(i);
            }
            let run_len = self.runs[i].len();
            if offset < pos + run_len {
                let tail = self.runs[i]
                    .split_off(offset - pos)
                    .ok_or_else(|| self.invalid(SelectionRange::caret(offset)))?;
                self.runs.insert(i + 1, tail);
                return Ok(i + 1);
            }
            pos += run_len;
        }
        Ok(self.runs.len())
    }

    /// Split runs in `first..last` so that no run mixes separators and text;
    /// returns the new exclusive end index
    fn isolate_separators(&mut self, first: usize, last: usize) -> usize {
        let pieces: Vec<StyledRun> = self
            .runs
            .splice(first..last, std::iter::empty())
            .flat_map(|run| {
                if run.is_separator() || !run.text().contains('\n') {
                    vec![run]
                } else {
                    runs_for_insertion(run.text(), &run.attributes)
                        .into_iter()
                        .map(|piece| StyledRun::new(piece.text(), run.attributes.clone()))
                        .collect()
                }
            })
            .collect();
        let end = first + pieces.len();
        self.runs.splice(first..first, pieces);
        end
    }

    fn update_range(
        &mut self,
        range: SelectionRange,
        character_level: bool,
        mut update: impl FnMut(&mut Attributes),
    ) -> Result<(), EditorError> {
        let first = self.split_at(range.start)?;
        let mut last = self.split_at(range.end())?;
        if character_level {
            last = self.isolate_separators(first, last);
        }
        for run in &mut self.runs[first..last] {
            if character_level && run.is_separator() {
                continue;
            }
            update(&mut run.attributes);
        }
        normalize(&mut self.runs);
        Ok(())
    }

    fn splice(&mut self, index: usize, runs: Vec<StyledRun>) -> Result<(), EditorError> {
        let at = self.split_at(index)?;
        self.len += runs.iter().map(StyledRun::len).sum::<usize>();
        self.runs.splice(at..at, runs);
        normalize(&mut self.runs);
        Ok(())
    }

    fn insert_with(&mut self, index: usize, text: &str, attributes: &Attributes) -> Result<(), EditorError> {
        let text = insertable_text(text);
        if text.is_empty() {
            return Ok(());
        }
        self.typing.clear();
        self.splice(index, runs_for_insertion(&text, attributes))?;
        self.attachments.on_insert(index, utf16_len(&text));
        Ok(())
    }

    fn target_range(&self, range: SelectionRange, key: StyleKey) -> Result<SelectionRange, EditorError> {
        if key.is_paragraph_level() {
            self.paragraph_range(range)
        } else {
            self.check(range)?;
            Ok(range)
        }
    }

    /// Give the paragraph containing `index` the paragraph attributes of its
    /// first character
    fn unify_paragraph(&mut self, index: usize) -> Result<(), EditorError> {
        let start = self.paragraph_start(index);
        if start >= self.len {
            return Ok(());
        }
        let end = self.paragraph_end(start);
        let paragraph = self.paragraph_attributes(start);
        self.update_range(SelectionRange::from_bounds(start, end), false, |attributes| {
            attributes.remove(StyleKey::ListStyle);
            attributes.remove(StyleKey::HeadingLevel);
            attributes.merge(&paragraph);
        })
    }
}

/// Observational equality: same runs, same attachments in the same places.
/// Attachment ids and typing state are not compared.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.runs == other.runs
            && self
                .attachments
                .iter()
                .map(|(pos, entry)| (pos, &entry.attachment))
                .eq(other.attachments.iter().map(|(pos, entry)| (pos, &entry.attachment)))
    }
}

/// Text as stored: no placeholders, `\r\n` and lone `\r` as `\n`
fn insertable_text(text: &str) -> String {
    let mut stored = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            PLACEHOLDER => {}
            '\r' => {
                chars.next_if_eq(&'\n');
                stored.push('\n');
            }
            _ => stored.push(ch),
        }
    }
    stored
}

fn intersect_into(acc: &mut Option<Attributes>, attributes: Attributes) {
    match acc {
        Some(existing) => existing.intersect(&attributes),
        None => *acc = Some(attributes),
    }
}

fn flush_text<'a>(paragraph: &mut ParagraphView<'a>, buffer: &mut String, attributes: &'a Attributes) {
    if !buffer.is_empty() {
        paragraph.pieces.push(Piece::Text {
            text: std::mem::take(buffer),
            attributes,
        });
    }
}
