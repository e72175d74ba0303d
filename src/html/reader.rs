//! HTML → Document
//!
//! Event-driven parse with quick-xml in lenient mode: end-tag names are not
//! checked, unknown elements are skipped but their content kept, and a syntax
//! error switches to plain-text extraction for the rest of the input.
//!
//! Paragraph handling: a block start opens a paragraph, a block end closes
//! it, and the `\n` between two paragraphs is only written when the next one
//! opens. The separator carries the attributes of the paragraph it ends.

use super::writer::{EMBEDDED_HTML_ATTRIBUTE, EMBEDDED_HTML_CLASS};
use crate::error::MalformedMarkup;
use crate::models::{
    Attachment, Attributes, Color, Font, ListStyle, MediaAttachment, MediaSource, StyleKey, StyleValue,
    PLACEHOLDER,
};
use crate::text::{Document, StyledRun};
use crate::utils::utf16_len;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;

/// Elements kept verbatim as embedded HTML
const OPAQUE_ELEMENTS: &[&str] = &[
    "iframe", "video", "audio", "table", "object", "embed", "form", "svg", "script", "style",
];

/// Elements whose content is not document text
const SKIPPED_ELEMENTS: &[&str] = &["head", "title"];

const PARAGRAPH_ELEMENTS: &[&str] = &["p", "div", "blockquote", "pre"];

/// Result of a lenient parse
#[derive(Debug, Clone, PartialEq)]
pub struct ParseReport {
    pub document: Document,
    /// Recovered problems, in input order
    pub anomalies: Vec<MalformedMarkup>,
}

/// Parse `html` into a document, reporting anomalies instead of failing
pub fn parse(html: &str) -> ParseReport {
    let mut builder = Builder::default();
    let mut anomalies = Vec::new();

    let mut reader = Reader::from_str(html);
    reader.trim_text(false);
    reader.check_end_names(false);

    loop {
        let position = reader.buffer_position();
        let result = match reader.read_event() {
            Ok(Event::Start(e)) => builder.start_element(&mut reader, html, &e, false),
            Ok(Event::Empty(e)) => builder.start_element(&mut reader, html, &e, true),
            Ok(Event::End(e)) => {
                builder.end_element(&tag_name(e.name().as_ref()));
                Ok(())
            }
            Ok(Event::Text(e)) => {
                builder.text(&unescape_text(&e));
                Ok(())
            }
            Ok(Event::CData(e)) => {
                builder.text(&String::from_utf8_lossy(&e));
                Ok(())
            }
            Ok(Event::Comment(e)) => {
                builder.attachment(Attachment::comment(unescape_text(&e)));
                Ok(())
            }
            Ok(Event::Eof) => break,
            // Declarations, processing instructions, doctype
            Ok(_) => Ok(()),
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            let anomaly = MalformedMarkup {
                position,
                message: err.to_string(),
            };
            log::warn!("Degrading to plain text: {}", anomaly);
            anomalies.push(anomaly);
            builder.text(&strip_tags(html.get(position..).unwrap_or_default()));
            break;
        }
    }

    ParseReport {
        document: builder.finish(),
        anomalies,
    }
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn unescape_text(text: &BytesText<'_>) -> String {
    match text.unescape_with(resolve_entity) {
        Ok(unescaped) => unescaped.into_owned(),
        Err(err) => {
            log::debug!("Keeping raw text, unescape failed: {}", err);
            String::from_utf8_lossy(text).into_owned()
        }
    }
}

/// HTML named entities beyond the XML five
fn resolve_entity(entity: &str) -> Option<&'static str> {
    match entity {
        "nbsp" => Some("\u{a0}"),
        "copy" => Some("©"),
        "reg" => Some("®"),
        "trade" => Some("™"),
        "hellip" => Some("…"),
        "mdash" => Some("—"),
        "ndash" => Some("–"),
        "lsquo" => Some("‘"),
        "rsquo" => Some("’"),
        "ldquo" => Some("“"),
        "rdquo" => Some("”"),
        "bull" => Some("•"),
        "middot" => Some("·"),
        "euro" => Some("€"),
        _ => None,
    }
}

/// Remove anything that looks like a tag and unescape what is left
fn strip_tags(input: &str) -> String {
    let mut text = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        let starts_tag = ch == '<'
            && chars
                .peek()
                .is_some_and(|next| next.is_ascii_alphabetic() || matches!(next, '/' | '!' | '?'));
        if starts_tag {
            for skipped in chars.by_ref() {
                if skipped == '>' {
                    break;
                }
            }
        } else {
            text.push(ch);
        }
    }
    match quick_xml::escape::unescape_with(&text, resolve_entity) {
        Ok(unescaped) => unescaped.into_owned(),
        Err(_) => text,
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Option<String> {
    element
        .attributes()
        .with_checks(false)
        .flatten()
        .find(|attr| attr.key.as_ref().eq_ignore_ascii_case(name.as_bytes()))
        .map(|attr| match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        })
}

/// A paragraph is a list item or a heading, never both; markup like
/// `<li><h2>` keeps the list
fn list_over_heading(attributes: &mut Attributes) {
    if attributes.has(StyleKey::ListStyle) {
        attributes.remove(StyleKey::HeadingLevel);
    }
}

/// Inline attributes declared by a `style="..."` value
fn style_declarations(style: &str) -> Vec<(StyleKey, StyleValue)> {
    let mut declarations = Vec::new();
    let mut family = None;
    let mut size = None;
    for declaration in style.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match property.trim().to_ascii_lowercase().as_str() {
            "color" => {
                if let Some(color) = Color::from_hex(value) {
                    declarations.push((StyleKey::ForegroundColor, StyleValue::Color(color)));
                }
            }
            "font-family" => family = Some(value.trim_matches(|c| c == '"' || c == '\'').to_string()),
            "font-size" => {
                size = value
                    .trim_end_matches("pt")
                    .trim_end_matches("px")
                    .trim()
                    .parse::<u16>()
                    .ok()
            }
            _ => {}
        }
    }
    if let (Some(family), Some(size)) = (family, size) {
        declarations.push((StyleKey::Font, StyleValue::Font(Font { family, size })));
    }
    declarations
}

fn media_from_img(element: &BytesStart<'_>) -> Option<MediaAttachment> {
    let src = attribute(element, "src")?;
    let source = parse_data_url(&src).unwrap_or(MediaSource::Url(src));
    let mut media = MediaAttachment::new(source);

    let dimension = |name| attribute(element, name).and_then(|v| v.trim().parse::<u32>().ok());
    if let (Some(width), Some(height)) = (dimension("width"), dimension("height")) {
        media = media.with_dimensions(width, height);
    }
    Some(media)
}

/// `data:<mime>;base64,<payload>`
fn parse_data_url(src: &str) -> Option<MediaSource> {
    let rest = src.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let data = BASE64.decode(payload.trim()).ok()?;
    Some(MediaSource::Inline {
        mime: mime.to_string(),
        data,
    })
}

/// A `<figure>` being read
#[derive(Default)]
struct Figure {
    media: Option<MediaAttachment>,
    caption: Option<String>,
    in_caption: bool,
}

#[derive(Default)]
struct Builder {
    runs: Vec<StyledRun>,
    attachments: Vec<(usize, Attachment)>,
    len: usize,

    in_paragraph: bool,
    paragraph_has_content: bool,
    paragraph: Attributes,
    /// Attributes of the paragraph that ended; its separator is written when
    /// the next paragraph starts
    pending_break: Option<Attributes>,

    lists: Vec<ListStyle>,
    inline: Vec<(String, Vec<(StyleKey, StyleValue)>)>,
    figure: Option<Figure>,
}

impl Builder {
    fn start_element(
        &mut self,
        reader: &mut Reader<&[u8]>,
        input: &str,
        element: &BytesStart<'_>,
        empty: bool,
    ) -> Result<(), quick_xml::Error> {
        let name = tag_name(element.name().as_ref());

        let embedded = name == "div"
            && attribute(element, "class")
                .is_some_and(|class| class.split_whitespace().any(|c| c == EMBEDDED_HTML_CLASS));
        if embedded {
            let kept = attribute(element, EMBEDDED_HTML_ATTRIBUTE);
            let raw = if empty {
                kept.unwrap_or_default()
            } else {
                let span = reader.read_to_end(element.name())?;
                kept.unwrap_or_else(|| input.get(span).unwrap_or_default().to_string())
            };
            self.attachment(Attachment::html(raw));
            return Ok(());
        }

        if OPAQUE_ELEMENTS.contains(&name.as_str()) {
            let start = String::from_utf8_lossy(element);
            let raw = if empty {
                format!("<{}/>", start.trim_end_matches('/').trim_end())
            } else {
                let span = reader.read_to_end(element.name())?;
                format!("<{}>{}</{}>", start, input.get(span).unwrap_or_default(), name)
            };
            self.attachment(Attachment::html(raw));
            return Ok(());
        }

        if SKIPPED_ELEMENTS.contains(&name.as_str()) {
            if !empty {
                reader.read_to_end(element.name())?;
            }
            return Ok(());
        }

        match name.as_str() {
            "br" => {
                let attributes = self.paragraph.clone();
                self.end_paragraph();
                self.start_paragraph(attributes);
            }
            "img" => {
                if let Some(media) = media_from_img(element) {
                    match self.figure.as_mut() {
                        Some(figure) => figure.media = Some(media),
                        None => self.attachment(Attachment::Media(media)),
                    }
                }
            }
            "figure" if !empty => self.figure = Some(Figure::default()),
            "figcaption" => {
                if let Some(figure) = self.figure.as_mut() {
                    figure.caption.get_or_insert_with(String::new);
                    figure.in_caption = !empty;
                }
            }
            "ul" | "ol" if !empty => {
                self.end_paragraph();
                self.lists.push(if name == "ol" {
                    ListStyle::Ordered
                } else {
                    ListStyle::Unordered
                });
            }
            "li" => {
                let attributes = self.context();
                self.start_paragraph(attributes);
                if empty {
                    self.end_paragraph();
                }
            }
            _ if heading_level(&name).is_some() => {
                let level = heading_level(&name).unwrap_or(1);
                let attributes = self.context().with(StyleKey::HeadingLevel, StyleValue::Heading(level));
                self.start_paragraph(attributes);
                if empty {
                    self.end_paragraph();
                }
            }
            _ if PARAGRAPH_ELEMENTS.contains(&name.as_str()) => {
                let attributes = self.context();
                self.start_paragraph(attributes);
                if empty {
                    self.end_paragraph();
                }
            }
            _ if !empty => {
                let declared = inline_attributes(&name, element);
                self.inline.push((name.clone(), declared));
            }
            _ => {}
        }
        Ok(())
    }

    fn end_element(&mut self, name: &str) {
        match name {
            "figure" => {
                if let Some(figure) = self.figure.take() {
                    if let Some(mut media) = figure.media {
                        media.caption = figure.caption;
                        self.attachment(Attachment::Media(media));
                    }
                }
            }
            "figcaption" => {
                if let Some(figure) = self.figure.as_mut() {
                    figure.in_caption = false;
                }
            }
            "ul" | "ol" => {
                self.end_paragraph();
                self.lists.pop();
            }
            "li" => self.end_paragraph(),
            _ if heading_level(name).is_some() || PARAGRAPH_ELEMENTS.contains(&name) => self.end_paragraph(),
            _ => {
                if let Some(index) = self.inline.iter().rposition(|(open, _)| open == name) {
                    self.inline.remove(index);
                }
            }
        }
    }

    /// Paragraph attributes implied by the enclosing elements
    fn context(&self) -> Attributes {
        match self.lists.last() {
            Some(style) => Attributes::new().with(StyleKey::ListStyle, StyleValue::List(*style)),
            None => Attributes::new(),
        }
    }

    fn start_paragraph(&mut self, attributes: Attributes) {
        if self.in_paragraph {
            // `<li><p>` or `<li><h2>`: refine the paragraph that just opened
            if !self.paragraph_has_content {
                self.paragraph.merge(&attributes);
                list_over_heading(&mut self.paragraph);
                return;
            }
            self.end_paragraph();
        }
        if let Some(ended) = self.pending_break.take() {
            self.push_run("\n", ended);
        }
        self.in_paragraph = true;
        self.paragraph_has_content = false;
        self.paragraph = attributes;
        list_over_heading(&mut self.paragraph);
    }

    fn end_paragraph(&mut self) {
        if self.in_paragraph {
            self.pending_break = Some(std::mem::take(&mut self.paragraph));
            self.in_paragraph = false;
        }
    }

    fn ensure_paragraph(&mut self) {
        if !self.in_paragraph {
            let attributes = self.context();
            self.start_paragraph(attributes);
        }
    }

    /// Attributes for content at the current point
    fn current_attributes(&self) -> Attributes {
        let mut attributes: Attributes = self
            .inline
            .iter()
            .flat_map(|(_, declared)| declared.iter().cloned())
            .collect();
        attributes.merge(&self.paragraph);
        attributes
    }

    fn text(&mut self, text: &str) {
        if let Some(figure) = self.figure.as_mut() {
            if figure.in_caption {
                figure.caption.get_or_insert_with(String::new).push_str(text);
            }
            return;
        }

        if !self.in_paragraph && text.chars().all(char::is_whitespace) {
            return;
        }
        let text: String = text
            .chars()
            .filter(|c| *c != PLACEHOLDER)
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        if text.is_empty() {
            return;
        }

        self.ensure_paragraph();
        let attributes = self.current_attributes();
        self.push_run(&text, attributes);
        self.paragraph_has_content = true;
    }

    fn attachment(&mut self, attachment: Attachment) {
        self.ensure_paragraph();
        let attributes = self.current_attributes();
        self.attachments.push((self.len, attachment));
        self.push_run(&PLACEHOLDER.to_string(), attributes);
        self.paragraph_has_content = true;
    }

    fn push_run(&mut self, text: &str, attributes: Attributes) {
        self.len += utf16_len(text);
        self.runs.push(StyledRun::new(text, attributes));
    }

    fn finish(self) -> Document {
        Document::from_parts(self.runs, self.attachments)
    }
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn inline_attributes(name: &str, element: &BytesStart<'_>) -> Vec<(StyleKey, StyleValue)> {
    match name {
        "strong" | "b" => vec![(StyleKey::Bold, StyleValue::Flag)],
        "em" | "i" => vec![(StyleKey::Italic, StyleValue::Flag)],
        "u" | "ins" => vec![(StyleKey::Underline, StyleValue::Flag)],
        "s" | "strike" | "del" => vec![(StyleKey::Strikethrough, StyleValue::Flag)],
        "span" => attribute(element, "style")
            .map(|style| style_declarations(&style))
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::SelectionRange;

    fn text_of(html: &str) -> String {
        parse(html).document.text()
    }

    #[test]
    fn test_paragraphs() {
        assert_eq!(text_of("<p>one</p><p>two</p>"), "one\ntwo");
        assert_eq!(text_of("<p>one</p><p></p>"), "one\n");
        assert_eq!(text_of(""), "");
    }

    #[test]
    fn test_inline_styles() {
        let doc = parse("<p>a<b>b<i>c</i></b></p>").document;
        assert_eq!(doc.text(), "abc");
        assert!(doc.attributes_at(0).unwrap().is_empty());
        assert!(doc.attributes_at(1).unwrap().has(StyleKey::Bold));
        let c = doc.attributes_at(2).unwrap();
        assert!(c.has(StyleKey::Bold) && c.has(StyleKey::Italic));
    }

    #[test]
    fn test_lists_and_headings() {
        let doc = parse("<ol><li>one</li><li><p>two</p></li></ol><h3>head</h3>").document;
        assert_eq!(doc.text(), "one\ntwo\nhead");
        assert_eq!(doc.paragraph_attributes(0).list_style(), Some(ListStyle::Ordered));
        assert_eq!(doc.paragraph_attributes(4).list_style(), Some(ListStyle::Ordered));
        assert_eq!(doc.attributes_at(7).unwrap().list_style(), Some(ListStyle::Ordered));
        assert_eq!(doc.paragraph_attributes(8).heading_level(), Some(3));
        assert!(doc.check_invariants());
    }

    #[test]
    fn test_unknown_tags_keep_content() {
        assert_eq!(text_of("<p>a <blink>b</blink> <x-foo>c</x-foo></p>"), "a b c");
    }

    #[test]
    fn test_whitespace_between_blocks_is_ignored() {
        assert_eq!(text_of("<p>a</p>\n  <p>b</p>\n"), "a\nb");
        assert_eq!(text_of("<p>a\nb</p>"), "a b");
    }

    #[test]
    fn test_entities() {
        assert_eq!(text_of("<p>a&amp;b&nbsp;c&hellip;</p>"), "a&b\u{a0}c…");
    }

    #[test]
    fn test_br_splits_paragraphs() {
        assert_eq!(text_of("<p>a<br>b</p>"), "a\nb");
    }

    #[test]
    fn test_opaque_elements_become_embedded_html() {
        let doc = parse("<p>x</p><iframe src=\"https://v.test\"><p>inner</p></iframe>").document;
        assert_eq!(doc.text(), "x\n\u{FFFC}");
        let entry = doc.attachment_at(2).unwrap();
        assert_eq!(
            entry.attachment,
            Attachment::html("<iframe src=\"https://v.test\"><p>inner</p></iframe>")
        );
    }

    #[test]
    fn test_embedded_html_wrapper() {
        let doc = parse("<p><div class=\"rte-html\"><video src=\"v.mp4\"></video></div></p>").document;
        let entry = doc.attachment_at(0).unwrap();
        assert_eq!(entry.attachment, Attachment::html("<video src=\"v.mp4\"></video>"));
    }

    #[test]
    fn test_embedded_html_attribute_wins_over_content() {
        let doc = parse("<div class=\"rte-html\" data-raw=\"&lt;div&gt;open\"></div><p>after</p>").document;
        assert_eq!(doc.text(), "\u{FFFC}\nafter");
        assert_eq!(doc.attachment_at(0).unwrap().attachment, Attachment::html("<div>open"));
    }

    #[test]
    fn test_comment_text_is_unescaped() {
        let doc = parse("<p><!--x&#45;&#45;>y--><!-- a & b --></p>").document;
        assert_eq!(doc.attachment_at(0).unwrap().attachment, Attachment::comment("x-->y"));
        assert_eq!(doc.attachment_at(1).unwrap().attachment, Attachment::comment(" a & b "));
    }

    #[test]
    fn test_empty_figcaption_keeps_an_empty_caption() {
        for html in [
            "<figure><img src=\"u.png\"><figcaption></figcaption></figure>",
            "<figure><img src=\"u.png\"><figcaption/></figure>",
        ] {
            let doc = parse(html).document;
            let Attachment::Media(media) = &doc.attachment_at(0).unwrap().attachment else {
                panic!("expected media in {}", html);
            };
            assert_eq!(media.caption.as_deref(), Some(""));
        }
    }

    #[test]
    fn test_heading_inside_list_item_stays_a_list_item() {
        let doc = parse("<ol><li><h2>one</h2></li><li>two</li></ol><h2>three</h2>").document;
        assert_eq!(doc.text(), "one\ntwo\nthree");
        let first = doc.attributes_at(0).unwrap();
        assert_eq!(first.list_style(), Some(ListStyle::Ordered));
        assert_eq!(first.heading_level(), None);
        assert_eq!(doc.attributes_at(3).unwrap().heading_level(), None);
        assert_eq!(doc.attributes_at(8).unwrap().heading_level(), Some(2));
        assert_eq!(doc.attributes_at(8).unwrap().list_style(), None);
    }

    #[test]
    fn test_head_is_skipped() {
        assert_eq!(
            text_of("<html><head><title>T</title></head><body><p>b</p></body></html>"),
            "b"
        );
    }

    #[test]
    fn test_comment_and_media() {
        let doc = parse(
            "<p>a<!--more--><figure><img src=\"u.png\" width=\"4\" height=\"3\"><figcaption>cap</figcaption></figure></p>",
        )
        .document;
        assert_eq!(doc.text(), "a\u{FFFC}\u{FFFC}");
        assert_eq!(doc.attachment_at(1).unwrap().attachment, Attachment::comment("more"));
        assert_eq!(
            doc.attachment_at(2).unwrap().attachment,
            Attachment::Media(
                MediaAttachment::new(MediaSource::Url("u.png".into()))
                    .with_caption("cap")
                    .with_dimensions(4, 3)
            )
        );
    }

    #[test]
    fn test_span_styles() {
        let doc = parse("<p><span style=\"color: #00ff00; font-family: Menlo; font-size: 14pt\">g</span></p>")
            .document;
        let attributes = doc.attributes_at(0).unwrap();
        assert_eq!(
            attributes.get(StyleKey::ForegroundColor),
            Some(&StyleValue::Color(Color::new(0, 255, 0)))
        );
        assert_eq!(
            attributes.get(StyleKey::Font),
            Some(&StyleValue::Font(Font {
                family: "Menlo".into(),
                size: 14
            }))
        );
    }

    #[test]
    fn test_malformed_markup_degrades_to_text() {
        let report = parse("<p>safe</p><p>broken <!-- never closed");
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.document.text(), "safe\nbroken ");
        assert!(report.document.check_invariants());
    }

    #[test]
    fn test_stray_angle_bracket_survives_degrading() {
        assert_eq!(strip_tags("a < b</p> &amp; c"), "a < b & c");
    }

    #[test]
    fn test_parsed_document_is_editable() {
        let mut doc = parse("<p><strong>bold</strong></p>").document;
        doc.insert_text(4, "er").unwrap();
        assert!(doc
            .attributes_spanning(SelectionRange::new(0, 6))
            .unwrap()
            .has(StyleKey::Bold));
    }
}
