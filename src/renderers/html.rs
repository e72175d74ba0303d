//! Embedded HTML attachments
//!
//! Raw markup is not rendered; the attachment takes a full-width line showing
//! the name of its root element.

use super::image::{Image, LabelImage};
use super::metrics::FontMetrics;
use super::{AttachmentRenderer, RenderedImage};
use crate::models::{Attachment, AttachmentKind};
use kurbo::{Rect, Size};

#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    metrics: FontMetrics,
}

impl HtmlRenderer {
    pub fn new(metrics: FontMetrics) -> Self {
        Self { metrics }
    }
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new(FontMetrics::new(24.0))
    }
}

impl AttachmentRenderer for HtmlRenderer {
    fn name(&self) -> &str {
        "html"
    }

    fn should_render(&self, attachment: &Attachment) -> bool {
        attachment.kind() == AttachmentKind::Html
    }

    fn bounds_for(&self, _attachment: &Attachment, line_fragment: Rect) -> Rect {
        Rect::from_origin_size(
            (0.0, -self.metrics.descent()),
            (line_fragment.width(), self.metrics.line_height()),
        )
    }

    fn image_for(&self, attachment: &Attachment, size: Size) -> RenderedImage {
        let text = match attachment {
            Attachment::Html(html) => html
                .root_tag_name()
                .map(|name| name.to_uppercase())
                .unwrap_or_else(|| "HTML".to_string()),
            _ => "HTML".to_string(),
        };
        RenderedImage::Ready(Image::Label(LabelImage {
            text,
            size,
            font_size: self.metrics.size,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_width_bounds() {
        let renderer = HtmlRenderer::default();
        let bounds = renderer.bounds_for(
            &Attachment::html("<iframe></iframe>"),
            Rect::new(0.0, 0.0, 320.0, 40.0),
        );
        assert_eq!(bounds, Rect::new(0.0, -6.0, 320.0, 23.0));
    }

    #[test]
    fn test_label_names_root_element() {
        let renderer = HtmlRenderer::default();
        let size = Size::new(320.0, 29.0);
        match renderer.image_for(&Attachment::html("<video src=\"a\"></video>"), size) {
            RenderedImage::Ready(Image::Label(label)) => assert_eq!(label.text, "VIDEO"),
            other => panic!("unexpected image {:?}", other),
        }
        match renderer.image_for(&Attachment::html("text only"), size) {
            RenderedImage::Ready(Image::Label(label)) => assert_eq!(label.text, "HTML"),
            other => panic!("unexpected image {:?}", other),
        }
    }
}
