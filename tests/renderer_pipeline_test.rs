// Attachment renderers and the deferred image pipeline, driven the way a
// host would: layout asks for bounds, display asks for images, and the owner
// thread drains deliveries.

use futures::executor::block_on;
use futures::future::BoxFuture;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use kurbo::{Rect, Size};
use rich_text_editor::editor::{EditorConfig, RichTextEditor};
use rich_text_editor::models::Attachment;
use rich_text_editor::renderers::{
    AttachmentRenderer, CommentRenderer, ImageCallbacks, ImageFetcher, RenderRegistry,
    RenderedImage, StockImage, TaskSpawner,
};
use rich_text_editor::{EditorError, FetchError, SelectionRange};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct QueuedSpawner {
    tasks: Mutex<Vec<BoxFuture<'static, ()>>>,
}

impl QueuedSpawner {
    fn run_all(&self) {
        let tasks: Vec<_> = self.tasks.lock().unwrap().drain(..).collect();
        for task in tasks {
            block_on(task);
        }
    }
}

impl TaskSpawner for QueuedSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.tasks.lock().unwrap().push(task);
    }
}

struct StaticFetcher(Result<Vec<u8>, FetchError>);

impl ImageFetcher for StaticFetcher {
    fn fetch(&self, _url: &str) -> BoxFuture<'static, Result<Vec<u8>, FetchError>> {
        let bytes = self.0.clone();
        Box::pin(async move { bytes })
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 255])))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn editor(fetched: Result<Vec<u8>, FetchError>) -> (Arc<QueuedSpawner>, RichTextEditor) {
    let spawner = Arc::new(QueuedSpawner::default());
    let mut editor = RichTextEditor::with_services(
        EditorConfig::default(),
        Some(Arc::new(StaticFetcher(fetched))),
        Some(spawner.clone()),
    );
    editor
        .set_html("<p>before<img src=\"https://img.test/a.png\" />after</p>")
        .unwrap();
    (spawner, editor)
}

fn counting(ready: &Arc<AtomicUsize>, failed: &Arc<AtomicUsize>) -> ImageCallbacks {
    let ready = ready.clone();
    let failed = failed.clone();
    ImageCallbacks::new()
        .on_ready(move |_| {
            ready.fetch_add(1, Ordering::SeqCst);
        })
        .on_failed(move |_| {
            failed.fetch_add(1, Ordering::SeqCst);
        })
}

#[test]
fn test_comment_seed_bounds() {
    let registry = RenderRegistry::with_defaults(None);
    let bounds = registry.bounds_for(
        &Attachment::comment("Some comment!"),
        Rect::new(0.0, 0.0, 100.0, 50.0),
    );
    assert_eq!((bounds.x0, bounds.y0), (14.0, -3.0));
    assert_eq!((bounds.width(), bounds.height()), (72.0, 15.0));
}

#[test]
fn test_custom_renderer_registered_before_layout_wins() {
    struct Badge;

    impl AttachmentRenderer for Badge {
        fn name(&self) -> &str {
            "badge"
        }

        fn should_render(&self, attachment: &Attachment) -> bool {
            matches!(attachment, Attachment::Comment(c) if c.text == "more")
        }

        fn bounds_for(&self, _attachment: &Attachment, line_fragment: Rect) -> Rect {
            Rect::new(0.0, 0.0, line_fragment.width(), 4.0)
        }

        fn image_for(&self, _attachment: &Attachment, _size: Size) -> RenderedImage {
            RenderedImage::Failed(FetchError::Decode("no badge art".into()))
        }
    }

    let mut registry = RenderRegistry::with_defaults(None);
    registry.register(Box::new(Badge)).unwrap();
    let fragment = Rect::new(0.0, 0.0, 200.0, 20.0);

    // Built-in comment renderer was registered first and still claims comments
    let more = Attachment::comment("more");
    assert_eq!(
        registry.bounds_for(&more, fragment),
        CommentRenderer::default().bounds_for(&more, fragment)
    );

    let mut registry = RenderRegistry::new(Default::default());
    registry.register(Box::new(Badge)).unwrap();
    assert_eq!(registry.bounds_for(&more, fragment), Rect::new(0.0, 0.0, 200.0, 4.0));
    registry.freeze();
    assert_eq!(registry.register(Box::new(Badge)), Err(EditorError::RegistryFrozen));
}

#[test]
fn test_remote_image_arrives_after_delivery() {
    let (spawner, mut editor) = editor(Ok(png(4, 3)));
    let id = editor.document().attachment_at(6).unwrap().id;
    let (ready, failed) = (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));

    let shown = editor
        .request_image(id, Size::new(4.0, 3.0), counting(&ready, &failed))
        .unwrap();
    assert!(shown.is_stock(StockImage::Placeholder));

    spawner.run_all();
    assert_eq!(editor.process_image_deliveries(), vec![id]);
    assert_eq!(ready.load(Ordering::SeqCst), 1);

    let shown = editor
        .request_image(id, Size::new(4.0, 3.0), counting(&ready, &failed))
        .unwrap();
    assert_eq!(shown.pixel_size(), Some((4, 3)));
    assert_eq!(failed.load(Ordering::SeqCst), 0);
}

#[test]
fn test_failed_fetch_calls_failure_once() {
    let (spawner, mut editor) = editor(Err(FetchError::Network("offline".into())));
    let id = editor.document().attachment_at(6).unwrap().id;
    let (ready, failed) = (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));

    editor
        .request_image(id, Size::ZERO, counting(&ready, &failed))
        .unwrap();
    spawner.run_all();
    editor.process_image_deliveries();
    editor.process_image_deliveries();

    assert_eq!(failed.load(Ordering::SeqCst), 1);
    assert_eq!(ready.load(Ordering::SeqCst), 0);
    let shown = editor
        .request_image(id, Size::ZERO, ImageCallbacks::new())
        .unwrap();
    assert!(shown.is_stock(StockImage::BrokenImage));
}

#[test]
fn test_deleting_attachment_mid_fetch_ignores_delivery() {
    let (spawner, mut editor) = editor(Ok(png(1, 1)));
    let id = editor.document().attachment_at(6).unwrap().id;
    let (ready, failed) = (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));

    editor
        .request_image(id, Size::ZERO, counting(&ready, &failed))
        .unwrap();
    editor.delete(SelectionRange::new(6, 1)).unwrap();
    let html = editor.html();

    spawner.run_all();
    assert!(editor.process_image_deliveries().is_empty());
    assert_eq!(ready.load(Ordering::SeqCst) + failed.load(Ordering::SeqCst), 0);
    assert_eq!(editor.html(), html);
    assert_eq!(
        editor.request_image(id, Size::ZERO, ImageCallbacks::new()),
        Err(EditorError::UnknownAttachment(id))
    );
}
