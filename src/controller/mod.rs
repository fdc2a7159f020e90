//! Detection-request controller.
//!
//! `UiStateController` owns the image store, the camera manager, the current
//! threshold and the render state. It is driven from a single control thread:
//! user actions call into it directly, and request completions are fed back
//! through `apply` with the sequence number they were issued under.
//!
//! Requests are not cancelled when superseded. Instead every request is tagged
//! with a monotonically increasing sequence number and only the completion of
//! the latest issued request is applied.
//!
//! Threshold changes reprocess the stored image whenever one is held, whether
//! the last request succeeded or failed.

mod state;

use std::path::Path;

use crate::capture::{MediaCaptureManager, PreviewBinding};
use crate::detect::{DetectionRequestClient, DetectionResult};
use crate::error::ClientError;
use crate::media::Image;
use crate::store::ImageSourceStore;
use crate::threshold::Threshold;
use crate::view::View;

pub use state::UiState;

/// A detection request issued by the controller and waiting to be sent.
#[derive(Clone, Debug)]
pub struct DetectionTicket {
    pub seq: u64,
    pub image: Image,
    pub threshold: Threshold,
}

impl DetectionTicket {
    /// Send the request. Blocks for the network round trip.
    pub fn send(&self, client: &DetectionRequestClient) -> DetectionResult {
        client.send(&self.image, self.threshold)
    }
}

/// What happened to a completion handed to `apply`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// The result is now the visible state.
    Current,
    /// A newer request was issued since; the result was dropped.
    Stale,
}

pub struct UiStateController {
    store: ImageSourceStore,
    camera: MediaCaptureManager,
    threshold: Threshold,
    state: UiState,
    last_issued: u64,
    notice: Option<String>,
}

impl UiStateController {
    pub fn new(camera: MediaCaptureManager, threshold: Threshold) -> Self {
        Self {
            store: ImageSourceStore::new(),
            camera,
            threshold,
            state: UiState::Idle,
            last_issued: 0,
            notice: None,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn held_image(&self) -> Option<&Image> {
        self.store.get()
    }

    /// Message from the last operation that failed without changing state.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn camera_preview(&self) -> Option<&PreviewBinding> {
        self.camera.preview()
    }

    /// Sequence number of the most recently issued request (0 before any).
    pub fn last_issued(&self) -> u64 {
        self.last_issued
    }

    /// Hand a freshly acquired image to the controller.
    ///
    /// Valid from any state: the image replaces the stored one and a request
    /// is issued immediately.
    pub fn acquire(&mut self, image: Image) -> DetectionTicket {
        log::info!(
            "acquired {:?} image ({} bytes, {})",
            image.origin(),
            image.len(),
            image.mime()
        );
        self.store.set(image.clone());
        self.notice = None;
        self.issue(image)
    }

    /// Read an uploaded file and issue a request for it.
    ///
    /// Unreadable files surface a notice and leave the state unchanged.
    pub fn upload(&mut self, path: &Path) -> Result<DetectionTicket, ClientError> {
        match Image::read_file(path) {
            Ok(image) => Ok(self.acquire(image)),
            Err(err) => Err(self.surface(err)),
        }
    }

    /// Open the camera modal.
    ///
    /// Camera failures surface a notice and leave the state unchanged.
    pub fn open_camera(&mut self) -> Result<&PreviewBinding, ClientError> {
        let opened = self.camera.open().map(|_| ()).map_err(ClientError::from);
        if let Err(err) = opened {
            return Err(self.surface(err));
        }
        self.notice = None;
        self.camera.preview().ok_or_else(|| {
            ClientError::DeviceAccess("camera session closed unexpectedly".to_string())
        })
    }

    /// Take the photo, close the modal, and issue a request for it.
    pub fn capture_photo(&mut self) -> Result<DetectionTicket, ClientError> {
        match self.camera.capture() {
            Ok(image) => Ok(self.acquire(image)),
            Err(err) => Err(self.surface(err.into())),
        }
    }

    /// Close the camera modal without taking a photo.
    pub fn cancel_camera(&mut self) {
        self.camera.close();
    }

    /// Move the threshold slider.
    ///
    /// Returns a reprocessing request when the value changed and an image is
    /// held. The stored image is reused as-is.
    pub fn set_threshold_slider(&mut self, position: u32) -> Option<DetectionTicket> {
        self.set_threshold(Threshold::from_slider(position))
    }

    pub fn set_threshold(&mut self, threshold: Threshold) -> Option<DetectionTicket> {
        if threshold == self.threshold {
            return None;
        }
        log::debug!("threshold {} -> {}", self.threshold, threshold);
        self.threshold = threshold;
        self.request_detection()
    }

    /// Issue a request for the stored image under the current threshold.
    ///
    /// Returns `None` when no image is held.
    pub fn request_detection(&mut self) -> Option<DetectionTicket> {
        let image = self.store.get()?.clone();
        Some(self.issue(image))
    }

    /// Apply the completion of request `seq`.
    pub fn apply(&mut self, seq: u64, result: DetectionResult) -> Applied {
        if seq != self.last_issued || self.state != (UiState::Loading { seq }) {
            log::debug!(
                "dropping stale completion #{} (latest issued #{})",
                seq,
                self.last_issued
            );
            return Applied::Stale;
        }
        self.state = match result {
            DetectionResult::Success {
                annotated_image,
                detections,
            } => UiState::Result {
                annotated_image,
                detections,
            },
            DetectionResult::Failure { error } => {
                log::warn!("request #{} failed: {}", seq, error);
                UiState::Error { error }
            }
        };
        log::info!("request #{} applied; state {}", seq, self.state.name());
        Applied::Current
    }

    /// Send a ticket on the calling thread and apply its result.
    pub fn run(&mut self, ticket: DetectionTicket, client: &DetectionRequestClient) -> Applied {
        let result = ticket.send(client);
        self.apply(ticket.seq, result)
    }

    /// Current render projection.
    pub fn view(&self) -> View {
        View::project(&self.state, self.threshold, self.notice(), self.camera.preview())
    }

    /// Back to `Idle`: drop the held image, close the camera, clear notices.
    ///
    /// Completions of requests issued before the reset are stale.
    pub fn reset(&mut self) {
        self.camera.close();
        self.store.clear();
        self.notice = None;
        self.state = UiState::Idle;
        log::info!("session reset");
    }

    /// Release the camera. Called on every exit path.
    pub fn shutdown(&mut self) {
        self.camera.close();
    }

    fn issue(&mut self, image: Image) -> DetectionTicket {
        self.last_issued += 1;
        let seq = self.last_issued;
        self.state = UiState::Loading { seq };
        log::info!("issuing request #{} (threshold {})", seq, self.threshold);
        DetectionTicket {
            seq,
            image,
            threshold: self.threshold,
        }
    }

    fn surface(&mut self, err: ClientError) -> ClientError {
        debug_assert!(!err.changes_state(), "request failures go through apply");
        log::warn!("{}", err);
        self.notice = Some(err.to_string());
        err
    }
}
