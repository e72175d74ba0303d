//! Comment attachments (`<!--more-->` and friends)
//!
//! Drawn as the uppercased comment text, centred in the line fragment and
//! dropped below the baseline by the font descent.

use super::image::{Image, LabelImage};
use super::metrics::FontMetrics;
use super::{AttachmentRenderer, RenderedImage};
use crate::models::{Attachment, AttachmentKind};
use kurbo::{Rect, Size};

const EMPTY_LABEL: &str = "COMMENT";

#[derive(Debug, Clone)]
pub struct CommentRenderer {
    metrics: FontMetrics,
}

impl CommentRenderer {
    pub fn new(metrics: FontMetrics) -> Self {
        Self { metrics }
    }

    fn label(text: &str) -> String {
        let label = text.trim().to_uppercase();
        if label.is_empty() {
            EMPTY_LABEL.to_string()
        } else {
            label
        }
    }
}

impl Default for CommentRenderer {
    fn default() -> Self {
        Self::new(FontMetrics::new(12.0))
    }
}

impl AttachmentRenderer for CommentRenderer {
    fn name(&self) -> &str {
        "comment"
    }

    fn should_render(&self, attachment: &Attachment) -> bool {
        attachment.kind() == AttachmentKind::Comment
    }

    fn bounds_for(&self, attachment: &Attachment, line_fragment: Rect) -> Rect {
        let text = match attachment {
            Attachment::Comment(comment) => comment.text.as_str(),
            _ => "",
        };
        let available = line_fragment.width();
        let width = self.metrics.text_width(&Self::label(text)).min(available);
        Rect::from_origin_size(
            ((available - width) / 2.0, -self.metrics.descent()),
            (width, self.metrics.line_height()),
        )
    }

    fn image_for(&self, attachment: &Attachment, size: Size) -> RenderedImage {
        let text = match attachment {
            Attachment::Comment(comment) => comment.text.as_str(),
            _ => "",
        };
        RenderedImage::Ready(Image::Label(LabelImage {
            text: Self::label(text),
            size,
            font_size: self.metrics.size,
        }))
    }
}
