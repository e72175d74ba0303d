//! Renderer used when no registered renderer claims an attachment

use super::image::{Image, StockImage};
use super::metrics::FontMetrics;
use super::{AttachmentRenderer, RenderedImage};
use crate::models::Attachment;
use kurbo::{Rect, Size};

/// Generic square glyph one line high
#[derive(Debug, Clone)]
pub struct DefaultRenderer {
    metrics: FontMetrics,
}

impl DefaultRenderer {
    pub fn new(metrics: FontMetrics) -> Self {
        Self { metrics }
    }
}

impl Default for DefaultRenderer {
    fn default() -> Self {
        Self::new(FontMetrics::new(16.0))
    }
}

impl AttachmentRenderer for DefaultRenderer {
    fn name(&self) -> &str {
        "default"
    }

    fn should_render(&self, _attachment: &Attachment) -> bool {
        true
    }

    fn bounds_for(&self, _attachment: &Attachment, _line_fragment: Rect) -> Rect {
        let side = self.metrics.line_height();
        Rect::from_origin_size((0.0, -self.metrics.descent()), (side, side))
    }

    fn image_for(&self, _attachment: &Attachment, _size: Size) -> RenderedImage {
        RenderedImage::Ready(Image::Stock(StockImage::Generic))
    }
}
