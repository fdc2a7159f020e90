//! Error taxonomy for the detection client.
//!
//! Every error is caught at the boundary of the operation that produced it and
//! turned into a user-visible message. None of them is fatal to the process.

use thiserror::Error;

/// User-facing error kinds.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Camera permission or hardware failure. The controller state is left untouched.
    #[error("camera unavailable: {0}")]
    DeviceAccess(String),

    /// Transport failure while talking to the detection service.
    #[error("network error: {0}")]
    Network(String),

    /// The detection service explicitly reported a failure. Shown verbatim.
    #[error("{0}")]
    Service(String),

    /// The uploaded file could not be read or decoded as an image.
    #[error("could not read image: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether this error moves the controller into the `Error` state.
    ///
    /// Device and decode failures happen before any request is issued, so they
    /// only surface a notice.
    pub fn changes_state(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Service(_))
    }
}

/// Camera-side failures reported by `MediaCaptureManager`.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("{0}")]
    DeviceAccess(String),

    #[error("no camera session is open")]
    NotOpen,

    #[error("failed to grab frame: {0}")]
    Frame(String),

    #[error("failed to encode captured frame: {0}")]
    Encode(String),
}

impl From<CaptureError> for ClientError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::DeviceAccess(message) => ClientError::DeviceAccess(message),
            other => ClientError::DeviceAccess(other.to_string()),
        }
    }
}
