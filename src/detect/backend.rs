use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detect::result::Detection;
use crate::threshold::Threshold;

/// Request body sent to the detection endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct DetectionRequest {
    /// Source image as a `data:<mime>;base64,...` URL.
    pub image: String,
    pub threshold: Threshold,
}

/// Response body returned by the detection endpoint.
///
/// `success` is required; a JSON body without it is not a detection
/// response. Classification into success or failure happens in
/// `DetectionRequestClient`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<Detection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetectionResponse {
    pub fn success(image: impl Into<String>, detections: Vec<Detection>) -> Self {
        Self {
            success: true,
            image: Some(image.into()),
            detections: Some(detections),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            image: None,
            detections: None,
            error: Some(error.into()),
        }
    }
}

/// The request never produced a usable response body.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Transport to a detection service.
///
/// One call is one attempt; implementations must not retry. Implementations
/// are shared with request worker threads, hence `Send + Sync`.
pub trait DetectionService: Send + Sync {
    /// Service identifier for logs.
    fn name(&self) -> &'static str;

    /// Perform the remote call and return the decoded response body.
    fn detect(&self, request: &DetectionRequest) -> Result<DetectionResponse, TransportError>;
}
