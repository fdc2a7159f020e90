//! Detection requests.
//!
//! The detection service is an opaque remote function: the client sends an
//! encoded image and a threshold and gets back an annotated image plus a list
//! of labelled detections. Filtering by threshold is the service's job.

mod backend;
mod backends;
mod client;
mod result;

pub use backend::{DetectionRequest, DetectionResponse, DetectionService, TransportError};
pub use backends::{HttpDetectionService, StubService};
pub use client::DetectionRequestClient;
pub use result::{Detection, DetectionResult};
