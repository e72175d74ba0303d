//! Styled runs
//!
//! A run is a contiguous slice of document text sharing one attribute set.
//! The document is an ordered list of runs whose concatenation is the full
//! text.

use crate::models::Attributes;
use crate::utils::{split_at, utf16_len};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyledRun {
    text: String,
    pub attributes: Attributes,
    /// Cached length in UTF-16 code units
    #[serde(skip)]
    len: usize,
}

impl StyledRun {
    pub fn new(text: impl Into<String>, attributes: Attributes) -> Self {
        let text = text.into();
        let len = utf16_len(&text);
        Self { text, attributes, len }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Attributes::new())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in UTF-16 code units
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True when every character is a paragraph separator
    pub fn is_separator(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(|c| c == '\n')
    }

    /// Split at a UTF-16 offset, keeping the head in `self`
    ///
    /// Returns `None` (leaving the run untouched) when the offset is past the
    /// end or inside a surrogate pair.
    pub fn split_off(&mut self, offset: usize) -> Option<StyledRun> {
        let (head, tail) = split_at(&self.text, offset)?;
        let tail = StyledRun::new(tail, self.attributes.clone());
        self.text = head.to_string();
        self.len = offset;
        Some(tail)
    }

    /// Append another run's text; attributes are not compared
    pub fn absorb(&mut self, other: StyledRun) {
        self.text.push_str(&other.text);
        self.len += other.len;
    }
}

/// Build runs for inserted text: separators get only the paragraph-level part
/// of `attributes`
pub fn runs_for_insertion(text: &str, attributes: &Attributes) -> Vec<StyledRun> {
    let separator_attributes = attributes.paragraph_only();
    let mut runs = Vec::new();
    for (i, segment) in text.split('\n').enumerate() {
        if i > 0 {
            runs.push(StyledRun::new("\n", separator_attributes.clone()));
        }
        if !segment.is_empty() {
            runs.push(StyledRun::new(segment, attributes.clone()));
        }
    }
    runs
}

/// Drop empty runs and merge neighbours with identical attributes
///
/// Idempotent: normalizing a normalized list is a no-op.
pub fn normalize(runs: &mut Vec<StyledRun>) {
    let mut merged: Vec<StyledRun> = Vec::with_capacity(runs.len());
    for run in runs.drain(..) {
        if run.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.attributes == run.attributes => last.absorb(run),
            _ => merged.push(run),
        }
    }
    *runs = merged;
}
