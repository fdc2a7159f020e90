use std::sync::Arc;

use crate::detect::backend::{DetectionRequest, DetectionResponse, DetectionService};
use crate::detect::result::DetectionResult;
use crate::error::ClientError;
use crate::media::{Image, ImageOrigin};
use crate::threshold::Threshold;

const UNKNOWN_SERVICE_ERROR: &str = "unknown error";

/// Sends one image + threshold to the detection service and classifies the
/// outcome.
///
/// Cloning is cheap; clones share the underlying service so a request can be
/// handed to a worker thread.
#[derive(Clone)]
pub struct DetectionRequestClient {
    service: Arc<dyn DetectionService>,
}

impl DetectionRequestClient {
    pub fn new<S: DetectionService + 'static>(service: S) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn from_shared(service: Arc<dyn DetectionService>) -> Self {
        Self { service }
    }

    pub fn service_name(&self) -> &'static str {
        self.service.name()
    }

    /// Perform one detection attempt. Never retries.
    pub fn send(&self, image: &Image, threshold: Threshold) -> DetectionResult {
        let request = DetectionRequest {
            image: image.to_data_url(),
            threshold,
        };
        log::info!(
            "detection request via {}: {} bytes ({}), threshold {}",
            self.service.name(),
            image.len(),
            image.mime(),
            threshold
        );
        match self.service.detect(&request) {
            Ok(response) => classify(response),
            Err(err) => {
                log::warn!("detection request failed: {}", err);
                DetectionResult::failure(ClientError::Network(err.0))
            }
        }
    }
}

/// Turn a decoded response body into a `DetectionResult`.
///
/// Detections are passed through exactly as received.
pub(crate) fn classify(response: DetectionResponse) -> DetectionResult {
    if !response.success {
        let message = response
            .error
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| UNKNOWN_SERVICE_ERROR.to_string());
        log::warn!("detection service reported failure: {}", message);
        return DetectionResult::failure(ClientError::Service(message));
    }

    let annotated_image = match response.image.as_deref() {
        Some(url) => match Image::from_data_url(url, ImageOrigin::Annotated) {
            Ok(image) => image,
            Err(err) => {
                return DetectionResult::failure(ClientError::Service(format!(
                    "invalid annotated image: {}",
                    err
                )))
            }
        },
        None => {
            return DetectionResult::failure(ClientError::Service(
                "invalid annotated image: missing from response".to_string(),
            ))
        }
    };
    let detections = response.detections.unwrap_or_default();
    log::info!("detection succeeded: {} detection(s)", detections.len());
    DetectionResult::Success {
        annotated_image,
        detections,
    }
}
