//! Image attachments
//!
//! Inline images are decoded on the spot. Remote images come back as a
//! deferred job that fetches and decodes off the layout path; the pipeline
//! shows a placeholder until it finishes.

use super::image::Image;
use super::metrics::FontMetrics;
use super::pipeline::ImageFetcher;
use super::{AttachmentRenderer, RenderedImage};
use crate::error::FetchError;
use crate::models::{Attachment, AttachmentKind, MediaAttachment, MediaSource};
use kurbo::{Rect, Size};
use std::sync::Arc;

pub struct MediaRenderer {
    fetcher: Option<Arc<dyn ImageFetcher>>,
    /// Size reserved for images whose dimensions are unknown
    placeholder_size: Size,
    caption_metrics: FontMetrics,
}

impl MediaRenderer {
    pub fn new(fetcher: Option<Arc<dyn ImageFetcher>>, placeholder_size: Size, caption_metrics: FontMetrics) -> Self {
        Self {
            fetcher,
            placeholder_size,
            caption_metrics,
        }
    }

    fn natural_size(&self, media: &MediaAttachment) -> Size {
        match media.dimensions {
            Some((width, height)) if width > 0 && height > 0 => Size::new(f64::from(width), f64::from(height)),
            _ => self.placeholder_size,
        }
    }
}

impl Default for MediaRenderer {
    fn default() -> Self {
        Self::new(None, Size::new(300.0, 200.0), FontMetrics::new(14.0))
    }
}

impl AttachmentRenderer for MediaRenderer {
    fn name(&self) -> &str {
        "media"
    }

    fn should_render(&self, attachment: &Attachment) -> bool {
        attachment.kind() == AttachmentKind::Media
    }

    fn bounds_for(&self, attachment: &Attachment, line_fragment: Rect) -> Rect {
        let Attachment::Media(media) = attachment else {
            return Rect::ZERO;
        };
        let natural = self.natural_size(media);
        let scale = if natural.width > line_fragment.width() {
            line_fragment.width() / natural.width
        } else {
            1.0
        };
        let caption = if media.caption.is_some() {
            self.caption_metrics.line_height()
        } else {
            0.0
        };
        Rect::from_origin_size(
            (0.0, 0.0),
            (natural.width * scale, (natural.height * scale).round() + caption),
        )
    }

    fn image_for(&self, attachment: &Attachment, _size: Size) -> RenderedImage {
        let Attachment::Media(media) = attachment else {
            return RenderedImage::Failed(FetchError::Decode("not a media attachment".into()));
        };
        match &media.source {
            MediaSource::Inline { data, .. } => match Image::decode(data) {
                Ok(image) => RenderedImage::Ready(image),
                Err(err) => RenderedImage::Failed(err),
            },
            MediaSource::Url(url) => {
                let Some(fetcher) = &self.fetcher else {
                    return RenderedImage::Failed(FetchError::NoFetcher(url.clone()));
                };
                let fetch = fetcher.fetch(url);
                RenderedImage::Deferred(Box::pin(async move {
                    let bytes = fetch.await?;
                    Image::decode(&bytes)
                }))
            }
        }
    }
}
