//! Attachment image pipeline
//!
//! Deferred image jobs run on a host-provided spawner. Each job sends its
//! result back over a channel; the thread that owns the document drains the
//! channel with [`ImagePipeline::process_deliveries`], which fires the
//! callbacks and reports which attachments need a new layout. Nothing here
//! touches the document.
//!
//! Every request captures the attachment's liveness flag. A delivery for an
//! attachment that has since been deleted is dropped without a callback or an
//! invalidation; the job itself is never cancelled.

use super::image::{Image, StockImage};
use super::{AttachmentRenderer, RenderedImage};
use crate::error::FetchError;
use crate::models::AttachmentId;
use crate::text::{AttachmentEntry, Liveness};
use futures::future::BoxFuture;
use kurbo::Size;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// Runs background jobs for the pipeline
pub trait TaskSpawner: Send + Sync {
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

impl TaskSpawner for futures::executor::ThreadPool {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self.spawn_ok(task);
    }
}

/// Fetches remote image bytes
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>, FetchError>>;
}

pub type OnReady = Box<dyn FnOnce(&Image) + Send>;
pub type OnFailed = Box<dyn FnOnce(&FetchError) + Send>;

/// Completion callbacks for one image request
///
/// Exactly one of them fires, at most once.
#[derive(Default)]
pub struct ImageCallbacks {
    on_ready: Option<OnReady>,
    on_failed: Option<OnFailed>,
}

impl ImageCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_ready(mut self, callback: impl FnOnce(&Image) + Send + 'static) -> Self {
        self.on_ready = Some(Box::new(callback));
        self
    }

    pub fn on_failed(mut self, callback: impl FnOnce(&FetchError) + Send + 'static) -> Self {
        self.on_failed = Some(Box::new(callback));
        self
    }

    fn ready(self, image: &Image) {
        if let Some(callback) = self.on_ready {
            callback(image);
        }
    }

    fn failed(self, error: &FetchError) {
        if let Some(callback) = self.on_failed {
            callback(error);
        }
    }
}

struct Delivery {
    request: u64,
    result: Result<Image, FetchError>,
}

struct Pending {
    attachment: AttachmentId,
    liveness: Liveness,
    callbacks: Vec<ImageCallbacks>,
}

pub struct ImagePipeline {
    spawner: Option<Arc<dyn TaskSpawner>>,
    sender: Sender<Delivery>,
    receiver: Receiver<Delivery>,
    pending: HashMap<u64, Pending>,
    in_flight: HashMap<AttachmentId, u64>,
    next_request: u64,
    cache: HashMap<AttachmentId, Image>,
    /// Why a cached missing image is shown, replayed to later requests
    failures: HashMap<AttachmentId, FetchError>,
    missing_image: StockImage,
}

impl ImagePipeline {
    pub fn new(spawner: Option<Arc<dyn TaskSpawner>>, missing_image: StockImage) -> Self {
        let (sender, receiver) = channel();
        Self {
            spawner,
            sender,
            receiver,
            pending: HashMap::new(),
            in_flight: HashMap::new(),
            next_request: 0,
            cache: HashMap::new(),
            failures: HashMap::new(),
            missing_image,
        }
    }

    pub fn set_spawner(&mut self, spawner: Option<Arc<dyn TaskSpawner>>) {
        self.spawner = spawner;
    }

    /// Image to show for `entry` right now
    ///
    /// Cached and synchronous results are returned directly and their callback
    /// fires before this returns. A cached failure fires `on_failed` again. Deferred jobs are spawned and the placeholder
    /// is returned; the callback fires from a later
    /// [`Self::process_deliveries`]. Failures never surface as errors: the
    /// missing-image stock picture is returned and `on_failed` fires.
    pub fn request(
        &mut self,
        entry: &AttachmentEntry,
        renderer: &dyn AttachmentRenderer,
        size: Size,
        callbacks: ImageCallbacks,
    ) -> Image {
        if let Some(image) = self.cache.get(&entry.id) {
            match self.failures.get(&entry.id) {
                Some(error) => callbacks.failed(error),
                None => callbacks.ready(image),
            }
            return image.clone();
        }

        if let Some(request) = self.in_flight.get(&entry.id) {
            if let Some(pending) = self.pending.get_mut(request) {
                pending.callbacks.push(callbacks);
                return Image::Stock(StockImage::Placeholder);
            }
        }

        match renderer.image_for(&entry.attachment, size) {
            RenderedImage::Ready(image) => {
                self.cache.insert(entry.id, image.clone());
                callbacks.ready(&image);
                image
            }
            RenderedImage::Failed(error) => self.fail(entry.id, callbacks, &error),
            RenderedImage::Deferred(job) => {
                let Some(spawner) = self.spawner.clone() else {
                    return self.fail(entry.id, callbacks, &FetchError::NoSpawner);
                };

                self.next_request += 1;
                let request = self.next_request;
                self.pending.insert(
                    request,
                    Pending {
                        attachment: entry.id,
                        liveness: entry.liveness(),
                        callbacks: vec![callbacks],
                    },
                );
                self.in_flight.insert(entry.id, request);

                let sender = self.sender.clone();
                spawner.spawn(Box::pin(async move {
                    let result = job.await;
                    // The pipeline may be gone; nothing left to notify then
                    let _ = sender.send(Delivery { request, result });
                }));
                log::debug!("Image request {} spawned for attachment {}", request, entry.id);
                Image::Stock(StockImage::Placeholder)
            }
        }
    }

    fn fail(&mut self, attachment: AttachmentId, callbacks: ImageCallbacks, error: &FetchError) -> Image {
        log::warn!("Image for attachment {} unavailable: {}", attachment, error);
        let image = Image::Stock(self.missing_image);
        self.cache.insert(attachment, image.clone());
        self.failures.insert(attachment, error.clone());
        callbacks.failed(error);
        image
    }

    /// Drain finished jobs; returns the attachments whose layout must be
    /// recomputed
    pub fn process_deliveries(&mut self) -> Vec<AttachmentId> {
        let mut invalidated = Vec::new();
        while let Ok(Delivery { request, result }) = self.receiver.try_recv() {
            let Some(pending) = self.pending.remove(&request) else {
                log::debug!("Dropping stale image delivery {}", request);
                continue;
            };
            if self.in_flight.get(&pending.attachment) == Some(&request) {
                self.in_flight.remove(&pending.attachment);
            }
            if !pending.liveness.is_live() {
                log::debug!("Attachment {} was removed, ignoring its image", pending.attachment);
                continue;
            }

            match result {
                Ok(image) => {
                    for callbacks in pending.callbacks {
                        callbacks.ready(&image);
                    }
                    self.cache.insert(pending.attachment, image);
                }
                Err(error) => {
                    log::warn!("Image fetch for attachment {} failed: {}", pending.attachment, error);
                    self.cache.insert(pending.attachment, Image::Stock(self.missing_image));
                    for callbacks in pending.callbacks {
                        callbacks.failed(&error);
                    }
                    self.failures.insert(pending.attachment, error);
                }
            }
            invalidated.push(pending.attachment);
        }
        invalidated
    }

    pub fn cached(&self, attachment: AttachmentId) -> Option<&Image> {
        self.cache.get(&attachment)
    }

    /// Drop cached state for attachments that left the document
    pub fn forget(&mut self, attachments: impl IntoIterator<Item = AttachmentId>) {
        for attachment in attachments {
            self.cache.remove(&attachment);
            self.failures.remove(&attachment);
            self.in_flight.remove(&attachment);
        }
    }

    /// Forget everything, e.g. when the document is replaced
    ///
    /// Jobs still running deliver into the void.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.in_flight.clear();
        self.cache.clear();
        self.failures.clear();
    }
}
