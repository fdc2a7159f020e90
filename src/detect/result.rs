use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::media::Image;

/// One labelled object reported by the detection service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label, as named by the service's model.
    pub class: String,
    /// Confidence in 0..1.
    pub confidence: f32,
    /// Box corners `[x1, y1, x2, y2]` in image pixels, when the service sends them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f32; 4]>,
}

/// Outcome of one detection request.
#[derive(Clone, Debug, PartialEq)]
pub enum DetectionResult {
    Success {
        annotated_image: Image,
        /// In the order the service returned them.
        detections: Vec<Detection>,
    },
    Failure {
        error: ClientError,
    },
}

impl DetectionResult {
    pub fn failure(error: ClientError) -> Self {
        DetectionResult::Failure { error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DetectionResult::Success { .. })
    }

    /// User-facing failure message, if this is a failure.
    pub fn error_message(&self) -> Option<String> {
        match self {
            DetectionResult::Success { .. } => None,
            DetectionResult::Failure { error } => Some(error.to_string()),
        }
    }

    pub fn detections(&self) -> &[Detection] {
        match self {
            DetectionResult::Success { detections, .. } => detections,
            DetectionResult::Failure { .. } => &[],
        }
    }
}
