//! Attachment renderers
//!
//! Attachments take part in text layout through an [`AttachmentRenderer`]:
//! the layout pass asks for bounds inside a line fragment, and the display
//! pass asks for an image. Renderers are looked up per attachment in
//! registration order; the first one that claims the attachment wins and the
//! built-in [`DefaultRenderer`] covers anything left over.
//!
//! Registration is closed once the first layout has happened.

pub mod comment;
pub mod fallback;
pub mod html;
pub mod image;
pub mod media;
pub mod metrics;
pub mod pipeline;

// Re-export commonly used types
pub use comment::CommentRenderer;
pub use fallback::DefaultRenderer;
pub use html::HtmlRenderer;
pub use image::{Image, LabelImage, StockImage};
pub use media::MediaRenderer;
pub use metrics::FontMetrics;
pub use pipeline::{ImageCallbacks, ImageFetcher, ImagePipeline, TaskSpawner};

use crate::error::{EditorError, FetchError};
use crate::models::Attachment;
use futures::future::BoxFuture;
use kurbo::{Rect, Size};
use std::fmt;
use std::sync::Arc;

/// Outcome of [`AttachmentRenderer::image_for`]
pub enum RenderedImage {
    Ready(Image),
    Failed(FetchError),
    /// Work to run off the layout path
    Deferred(BoxFuture<'static, Result<Image, FetchError>>),
}

impl fmt::Debug for RenderedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderedImage::Ready(image) => f.debug_tuple("Ready").field(image).finish(),
            RenderedImage::Failed(error) => f.debug_tuple("Failed").field(error).finish(),
            RenderedImage::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Layout and drawing for one family of attachments
pub trait AttachmentRenderer: Send {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Whether this renderer handles `attachment`
    fn should_render(&self, attachment: &Attachment) -> bool;

    /// Box reserved for the attachment inside `line_fragment`
    ///
    /// Must be pure: the same attachment and fragment always give the same
    /// rectangle.
    fn bounds_for(&self, attachment: &Attachment, line_fragment: Rect) -> Rect;

    /// Visual for the attachment at `size`
    fn image_for(&self, attachment: &Attachment, size: Size) -> RenderedImage;
}

pub struct RenderRegistry {
    renderers: Vec<Box<dyn AttachmentRenderer>>,
    fallback: DefaultRenderer,
    frozen: bool,
}

impl RenderRegistry {
    /// Empty registry: everything goes to `fallback`
    pub fn new(fallback: DefaultRenderer) -> Self {
        Self {
            renderers: Vec::new(),
            fallback,
            frozen: false,
        }
    }

    /// Registry pre-populated with `renderers`, tried in order
    pub fn with_renderers(fallback: DefaultRenderer, renderers: Vec<Box<dyn AttachmentRenderer>>) -> Self {
        Self {
            renderers,
            fallback,
            frozen: false,
        }
    }

    /// Registry with the comment, embedded-HTML and media renderers at their
    /// default metrics
    pub fn with_defaults(fetcher: Option<Arc<dyn ImageFetcher>>) -> Self {
        Self::with_renderers(
            DefaultRenderer::default(),
            vec![
                Box::new(CommentRenderer::default()),
                Box::new(HtmlRenderer::default()),
                Box::new(MediaRenderer::new(fetcher, Size::new(300.0, 200.0), FontMetrics::new(14.0))),
            ],
        )
    }

    /// Append a renderer; later registrations are tried after earlier ones
    pub fn register(&mut self, renderer: Box<dyn AttachmentRenderer>) -> Result<(), EditorError> {
        if self.frozen {
            log::warn!("Renderer {} registered after first layout", renderer.name());
            return Err(EditorError::RegistryFrozen);
        }
        log::debug!("Registered renderer {}", renderer.name());
        self.renderers.push(renderer);
        Ok(())
    }

    /// Close registration; called by the first layout pass
    pub fn freeze(&mut self) {
        if !self.frozen {
            log::debug!("Renderer registry frozen with {} renderers", self.renderers.len());
            self.frozen = true;
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Renderer for `attachment`
    pub fn resolve(&self, attachment: &Attachment) -> &dyn AttachmentRenderer {
        self.renderers
            .iter()
            .find(|renderer| renderer.should_render(attachment))
            .map(|renderer| renderer.as_ref())
            .unwrap_or(&self.fallback)
    }

    pub fn bounds_for(&self, attachment: &Attachment, line_fragment: Rect) -> Rect {
        self.resolve(attachment).bounds_for(attachment, line_fragment)
    }
}
