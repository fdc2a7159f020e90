//! Detection client
//!
//! Lets a user supply an image, by file upload or by camera capture, sends it
//! to a remote object-detection service together with a confidence threshold,
//! and shows the annotated result.
//!
//! # Module Structure
//!
//! - `capture`: camera session lifecycle (`MediaCaptureManager`)
//! - `store`: the single held original image (`ImageSourceStore`)
//! - `detect`: request/response handling (`DetectionRequestClient`)
//! - `controller`: the Idle/Loading/Result/Error state machine
//! - `view`: pure render projection of controller state
//! - `console`: line-driven front end over the controller
//! - `media`, `threshold`, `error`, `config`, `ui`: supporting types

pub mod capture;
pub mod config;
pub mod console;
pub mod controller;
pub mod detect;
pub mod error;
pub mod media;
pub mod store;
pub mod threshold;
pub mod ui;
pub mod view;

pub use capture::{device_from_url, Facing, MediaCaptureManager, PreviewBinding};
pub use config::ClientConfig;
pub use controller::{Applied, DetectionTicket, UiState, UiStateController};
pub use detect::{
    Detection, DetectionRequestClient, DetectionResponse, DetectionResult, DetectionService,
    HttpDetectionService, StubService,
};
pub use error::{CaptureError, ClientError};
pub use media::{Image, ImageOrigin};
pub use store::ImageSourceStore;
pub use threshold::Threshold;
pub use view::{Panel, View};
