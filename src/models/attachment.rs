//! Attachment variants
//!
//! Non-text content embedded in the document at a single placeholder
//! character. Each variant keeps only what HTML round-tripping and rendering
//! need.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Object replacement character reserving one text slot per attachment
pub const PLACEHOLDER: char = '\u{FFFC}';

/// Stable identity of an attachment within one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttachmentId(pub u64);

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discriminant used for renderer lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Comment,
    Html,
    Media,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Attachment {
    Comment(CommentAttachment),
    Html(HtmlAttachment),
    Media(MediaAttachment),
}

impl Attachment {
    pub fn comment(text: impl Into<String>) -> Self {
        Attachment::Comment(CommentAttachment { text: text.into() })
    }

    pub fn html(raw: impl Into<String>) -> Self {
        Attachment::Html(HtmlAttachment { raw: raw.into() })
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Attachment::Media(MediaAttachment::new(MediaSource::Url(url.into())))
    }

    pub fn kind(&self) -> AttachmentKind {
        match self {
            Attachment::Comment(_) => AttachmentKind::Comment,
            Attachment::Html(_) => AttachmentKind::Html,
            Attachment::Media(_) => AttachmentKind::Media,
        }
    }
}

/// An HTML comment, e.g. the `<!--more-->` marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAttachment {
    pub text: String,
}

/// Markup the editor cannot represent natively, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlAttachment {
    pub raw: String,
}

impl HtmlAttachment {
    /// Name of the first element in the raw markup, lowercased
    pub fn root_tag_name(&self) -> Option<String> {
        let rest = self.raw.trim_start().strip_prefix('<')?;
        let name: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        (!name.is_empty()).then(|| name.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaSource {
    Url(String),
    /// Image bytes carried in the document itself (`data:` URL in HTML)
    Inline { mime: String, data: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub source: MediaSource,
    pub caption: Option<String>,
    /// Natural size in pixels, when known from markup
    pub dimensions: Option<(u32, u32)>,
}

impl MediaAttachment {
    pub fn new(source: MediaSource) -> Self {
        Self {
            source,
            caption: None,
            dimensions: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some((width, height));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(Attachment::comment("more").kind(), AttachmentKind::Comment);
        assert_eq!(Attachment::html("<iframe></iframe>").kind(), AttachmentKind::Html);
        assert_eq!(Attachment::image_url("https://x/y.png").kind(), AttachmentKind::Media);
    }

    #[test]
    fn test_root_tag_name() {
        let html = HtmlAttachment { raw: "  <IFRAME src=\"x\"></IFRAME>".into() };
        assert_eq!(html.root_tag_name().as_deref(), Some("iframe"));

        let text = HtmlAttachment { raw: "just text".into() };
        assert_eq!(text.root_tag_name(), None);
    }
}
