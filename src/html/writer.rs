//! Document → HTML
//!
//! Block structure comes from paragraph attributes, inline tags from
//! character attributes. Inline tags are kept on a stack: at each piece
//! boundary the common prefix with the wanted set stays open, the rest is
//! closed in reverse order and the new tail is opened. Because attribute keys
//! iterate in a fixed order the output for an unchanged document is
//! byte-identical.

use crate::models::{
    Attachment, CommentAttachment, Font, ListStyle, MediaAttachment, MediaSource, StyleKey, StyleValue,
};
use crate::text::{Document, ParagraphView, Piece};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use quick_xml::escape::escape;
use std::fmt::Write;

/// Class marking a wrapper around verbatim markup
pub const EMBEDDED_HTML_CLASS: &str = "rte-html";

/// Attribute of the wrapper holding the escaped markup
pub const EMBEDDED_HTML_ATTRIBUTE: &str = "data-raw";

/// Serialize `document`; an empty document yields an empty string
pub fn to_html(document: &Document) -> String {
    let mut out = String::new();
    let mut open_list: Option<ListStyle> = None;

    for paragraph in document.paragraphs() {
        let list = paragraph.attributes.list_style();
        if list != open_list {
            if let Some(style) = open_list {
                out.push_str(list_close(style));
            }
            if let Some(style) = list {
                out.push_str(list_open(style));
            }
            open_list = list;
        }
        write_paragraph(&mut out, &paragraph);
    }

    if let Some(style) = open_list {
        out.push_str(list_close(style));
    }
    out
}

fn list_open(style: ListStyle) -> &'static str {
    match style {
        ListStyle::Ordered => "<ol>",
        ListStyle::Unordered => "<ul>",
    }
}

fn list_close(style: ListStyle) -> &'static str {
    match style {
        ListStyle::Ordered => "</ol>",
        ListStyle::Unordered => "</ul>",
    }
}

fn write_paragraph(out: &mut String, paragraph: &ParagraphView<'_>) {
    let in_list = paragraph.attributes.list_style().is_some();
    let heading = paragraph.attributes.heading_level();

    if in_list {
        out.push_str("<li>");
    }
    match heading {
        Some(level) => {
            let _ = write!(out, "<h{}>", level);
        }
        None if !in_list => out.push_str("<p>"),
        None => {}
    }

    write_inline(out, &paragraph.pieces);

    match heading {
        Some(level) => {
            let _ = write!(out, "</h{}>", level);
        }
        None if !in_list => out.push_str("</p>"),
        None => {}
    }
    if in_list {
        out.push_str("</li>");
    }
}

fn write_inline(out: &mut String, pieces: &[Piece<'_>]) {
    let mut open: Vec<(StyleKey, &StyleValue)> = Vec::new();

    for piece in pieces {
        let wanted: Vec<(StyleKey, &StyleValue)> = piece
            .attributes()
            .iter()
            .filter(|(key, _)| !key.is_paragraph_level())
            .collect();

        let keep = open
            .iter()
            .zip(&wanted)
            .take_while(|(a, b)| a == b)
            .count();
        for (key, _) in open.drain(keep..).rev() {
            out.push_str(close_tag(key));
        }
        for (key, value) in &wanted[keep..] {
            write_open_tag(out, *key, *value);
            open.push((*key, *value));
        }

        match piece {
            Piece::Text { text, .. } => out.push_str(&escape(text.as_str())),
            Piece::Attachment { entry, .. } => write_attachment(out, &entry.attachment),
        }
    }

    for (key, _) in open.into_iter().rev() {
        out.push_str(close_tag(key));
    }
}

fn write_open_tag(out: &mut String, key: StyleKey, value: &StyleValue) {
    match (key, value) {
        (StyleKey::Font, StyleValue::Font(Font { family, size })) => {
            let _ = write!(
                out,
                "<span style=\"font-family: {}; font-size: {}pt\">",
                escape(family.as_str()),
                size
            );
        }
        (StyleKey::ForegroundColor, StyleValue::Color(color)) => {
            let _ = write!(out, "<span style=\"color: {}\">", color.to_hex());
        }
        (StyleKey::Bold, _) => out.push_str("<strong>"),
        (StyleKey::Italic, _) => out.push_str("<em>"),
        (StyleKey::Underline, _) => out.push_str("<u>"),
        (StyleKey::Strikethrough, _) => out.push_str("<s>"),
        // A value of the wrong shape still needs a balanced tag
        _ => out.push_str("<span>"),
    }
}

fn close_tag(key: StyleKey) -> &'static str {
    match key {
        StyleKey::Bold => "</strong>",
        StyleKey::Italic => "</em>",
        StyleKey::Underline => "</u>",
        StyleKey::Strikethrough => "</s>",
        _ => "</span>",
    }
}

fn write_attachment(out: &mut String, attachment: &Attachment) {
    match attachment {
        Attachment::Comment(CommentAttachment { text }) => {
            let _ = write!(out, "<!--{}-->", escape_comment(text));
        }
        Attachment::Html(html) => {
            // Raw markup may be unbalanced, so it only ever lives in an attribute
            let _ = write!(
                out,
                "<div class=\"{}\" {}=\"{}\"></div>",
                EMBEDDED_HTML_CLASS,
                EMBEDDED_HTML_ATTRIBUTE,
                escape(html.raw.as_str())
            );
        }
        Attachment::Media(media) => write_media(out, media),
    }
}

/// Comment text that cannot end the comment early
///
/// `&` becomes `&amp;`, a `-` that is first, last or followed by another `-`
/// becomes `&#45;` and a leading `>` becomes `&gt;`. The reader unescapes
/// comment text, so plain markers like `more` are written unchanged.
fn escape_comment(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut first = true;
    while let Some(c) = chars.next() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '>' if first => escaped.push_str("&gt;"),
            '-' if first || matches!(chars.peek(), None | Some('-')) => escaped.push_str("&#45;"),
            _ => escaped.push(c),
        }
        first = false;
    }
    escaped
}

fn write_media(out: &mut String, media: &MediaAttachment) {
    if media.caption.is_some() {
        out.push_str("<figure>");
    }

    out.push_str("<img src=\"");
    match &media.source {
        MediaSource::Url(url) => out.push_str(&escape(url.as_str())),
        MediaSource::Inline { mime, data } => {
            let _ = write!(out, "data:{};base64,{}", escape(mime.as_str()), BASE64.encode(data));
        }
    }
    out.push('"');
    if let Some((width, height)) = media.dimensions {
        let _ = write!(out, " width=\"{}\" height=\"{}\"", width, height);
    }
    out.push_str(" />");

    if let Some(caption) = &media.caption {
        let _ = write!(out, "<figcaption>{}</figcaption></figure>", escape(caption.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatting::toggle;
    use crate::models::{Color, FormattingIdentifier};
    use crate::text::SelectionRange;

    #[test]
    fn test_empty_document() {
        assert_eq!(to_html(&Document::new()), "");
    }

    #[test]
    fn test_paragraphs_and_trailing_empty_paragraph() {
        assert_eq!(to_html(&Document::from_text("a\nb")), "<p>a</p><p>b</p>");
        assert_eq!(to_html(&Document::from_text("a\n")), "<p>a</p><p></p>");
    }

    #[test]
    fn test_inline_nesting_follows_key_order() {
        let mut doc = Document::from_text("abc");
        toggle(&mut doc, FormattingIdentifier::Italic, SelectionRange::new(0, 3)).unwrap();
        toggle(&mut doc, FormattingIdentifier::Bold, SelectionRange::new(1, 1)).unwrap();

        assert_eq!(
            to_html(&doc),
            "<p><em>a</em><strong><em>b</em></strong><em>c</em></p>"
        );
    }

    #[test]
    fn test_common_prefix_stays_open() {
        let mut doc = Document::from_text("abc");
        toggle(&mut doc, FormattingIdentifier::Bold, SelectionRange::new(0, 3)).unwrap();
        toggle(&mut doc, FormattingIdentifier::Underline, SelectionRange::new(1, 1)).unwrap();

        assert_eq!(to_html(&doc), "<p><strong>a<u>b</u>c</strong></p>");
    }

    #[test]
    fn test_lists_group_items() {
        let mut doc = Document::from_text("one\ntwo\nthree");
        toggle(&mut doc, FormattingIdentifier::UnorderedList, SelectionRange::new(0, 5)).unwrap();

        assert_eq!(
            to_html(&doc),
            "<ul><li>one</li><li>two</li></ul><p>three</p>"
        );
    }

    #[test]
    fn test_heading_and_escaping() {
        let mut doc = Document::from_text("a < b & c");
        toggle(&mut doc, FormattingIdentifier::Header2, SelectionRange::caret(0)).unwrap();
        assert_eq!(to_html(&doc), "<h2>a &lt; b &amp; c</h2>");
    }

    #[test]
    fn test_color_span() {
        let mut doc = Document::from_text("red");
        doc.apply_attribute(
            SelectionRange::new(0, 3),
            StyleKey::ForegroundColor,
            StyleValue::Color(Color::new(255, 0, 0)),
        )
        .unwrap();
        assert_eq!(to_html(&doc), "<p><span style=\"color: #ff0000\">red</span></p>");
    }

    #[test]
    fn test_attachments() {
        let mut doc = Document::from_text("ab");
        doc.insert_attachment(1, Attachment::comment("more")).unwrap();
        assert_eq!(to_html(&doc), "<p>a<!--more-->b</p>");

        let mut doc = Document::new();
        let media = MediaAttachment::new(MediaSource::Url("https://x.test/a.png".into()))
            .with_caption("A & B")
            .with_dimensions(20, 10);
        doc.insert_attachment(0, Attachment::Media(media)).unwrap();
        assert_eq!(
            to_html(&doc),
            "<p><figure><img src=\"https://x.test/a.png\" width=\"20\" height=\"10\" />\
             <figcaption>A &amp; B</figcaption></figure></p>"
        );
    }

    #[test]
    fn test_comment_text_cannot_close_the_comment() {
        assert_eq!(escape_comment("more"), "more");
        assert_eq!(escape_comment("page-break"), "page-break");
        assert_eq!(escape_comment("x-->y"), "x&#45;->y");
        assert_eq!(escape_comment("->a&b-"), "&#45;>a&amp;b&#45;");
        assert_eq!(escape_comment(">"), "&gt;");
    }

    #[test]
    fn test_embedded_html_is_kept_in_an_attribute() {
        let mut doc = Document::from_text("a");
        doc.insert_attachment(1, Attachment::html("<div class=\"x\">open"))
            .unwrap();
        assert_eq!(
            to_html(&doc),
            "<p>a<div class=\"rte-html\" data-raw=\"&lt;div class=&quot;x&quot;&gt;open\"></div></p>"
        );
    }

    #[test]
    fn test_inline_media_uses_data_url() {
        let mut doc = Document::new();
        let media = MediaAttachment::new(MediaSource::Inline {
            mime: "image/png".into(),
            data: vec![1, 2, 3],
        });
        doc.insert_attachment(0, Attachment::Media(media)).unwrap();
        assert_eq!(to_html(&doc), "<p><img src=\"data:image/png;base64,AQID\" /></p>");
    }
}
