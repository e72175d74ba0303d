//! Formatting identifiers
//!
//! The vocabulary shared by the toolbar, the formatting engine and the HTML
//! bridge. The string form is what a host toolbar sends.

use crate::error::EditorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormattingIdentifier {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    OrderedList,
    UnorderedList,
    Header1,
    Header2,
    Header3,
    Header4,
    Header5,
    Header6,
    Media,
    SourceCode,
    More,
    Done,
}

impl FormattingIdentifier {
    pub const ALL: [FormattingIdentifier; 16] = [
        FormattingIdentifier::Bold,
        FormattingIdentifier::Italic,
        FormattingIdentifier::Underline,
        FormattingIdentifier::Strikethrough,
        FormattingIdentifier::OrderedList,
        FormattingIdentifier::UnorderedList,
        FormattingIdentifier::Header1,
        FormattingIdentifier::Header2,
        FormattingIdentifier::Header3,
        FormattingIdentifier::Header4,
        FormattingIdentifier::Header5,
        FormattingIdentifier::Header6,
        FormattingIdentifier::Media,
        FormattingIdentifier::SourceCode,
        FormattingIdentifier::More,
        FormattingIdentifier::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormattingIdentifier::Bold => "bold",
            FormattingIdentifier::Italic => "italic",
            FormattingIdentifier::Underline => "underline",
            FormattingIdentifier::Strikethrough => "strikethrough",
            FormattingIdentifier::OrderedList => "orderedlist",
            FormattingIdentifier::UnorderedList => "unorderedlist",
            FormattingIdentifier::Header1 => "header1",
            FormattingIdentifier::Header2 => "header2",
            FormattingIdentifier::Header3 => "header3",
            FormattingIdentifier::Header4 => "header4",
            FormattingIdentifier::Header5 => "header5",
            FormattingIdentifier::Header6 => "header6",
            FormattingIdentifier::Media => "media",
            FormattingIdentifier::SourceCode => "sourcecode",
            FormattingIdentifier::More => "more",
            FormattingIdentifier::Done => "done",
        }
    }

    /// Heading level for `header1`..`header6`
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            FormattingIdentifier::Header1 => Some(1),
            FormattingIdentifier::Header2 => Some(2),
            FormattingIdentifier::Header3 => Some(3),
            FormattingIdentifier::Header4 => Some(4),
            FormattingIdentifier::Header5 => Some(5),
            FormattingIdentifier::Header6 => Some(6),
            _ => None,
        }
    }

    pub fn from_heading_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(FormattingIdentifier::Header1),
            2 => Some(FormattingIdentifier::Header2),
            3 => Some(FormattingIdentifier::Header3),
            4 => Some(FormattingIdentifier::Header4),
            5 => Some(FormattingIdentifier::Header5),
            6 => Some(FormattingIdentifier::Header6),
            _ => None,
        }
    }
}

impl fmt::Display for FormattingIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormattingIdentifier {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormattingIdentifier::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| EditorError::UnknownIdentifier(s.to_string()))
    }
}
