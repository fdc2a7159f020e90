use std::collections::VecDeque;
use std::sync::Mutex;

use crate::detect::backend::{
    DetectionRequest, DetectionResponse, DetectionService, TransportError,
};

/// Canned detection service for tests and offline runs.
///
/// Replies are served in order; once the queue is empty the fallback reply is
/// repeated. Every request is recorded.
pub struct StubService {
    replies: Mutex<VecDeque<Result<DetectionResponse, TransportError>>>,
    fallback: Result<DetectionResponse, TransportError>,
    requests: Mutex<Vec<DetectionRequest>>,
}

impl StubService {
    pub fn new(fallback: Result<DetectionResponse, TransportError>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the given response.
    pub fn always(response: DetectionResponse) -> Self {
        Self::new(Ok(response))
    }

    /// Queue a one-off reply ahead of the fallback.
    pub fn push(&self, reply: Result<DetectionResponse, TransportError>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<DetectionRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl DetectionService for StubService {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&self, request: &DetectionRequest) -> Result<DetectionResponse, TransportError> {
        self.requests
            .lock()
            .map_err(|_| TransportError("stub request log poisoned".to_string()))?
            .push(request.clone());
        let queued = self
            .replies
            .lock()
            .map_err(|_| TransportError("stub reply queue poisoned".to_string()))?
            .pop_front();
        queued.unwrap_or_else(|| self.fallback.clone())
    }
}
