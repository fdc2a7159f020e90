//! HTTP detection service.
//!
//! POSTs `{image, threshold}` as JSON to the configured endpoint and decodes
//! the JSON reply. The service answers failures with a 5xx status and a
//! `{success: false, error}` body, so 5xx bodies are decoded too. Any other
//! error status, or a 5xx whose body is not a detection response, is a
//! transport failure.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use url::Url;

use crate::detect::backend::{
    DetectionRequest, DetectionResponse, DetectionService, TransportError,
};

pub struct HttpDetectionService {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpDetectionService {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(endpoint).context("parse detection endpoint")?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(anyhow!(
                    "unsupported detection endpoint scheme '{}'; expected http(s)",
                    other
                ))
            }
        }
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self {
            endpoint: url.to_string(),
            agent,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl DetectionService for HttpDetectionService {
    fn name(&self) -> &'static str {
        "http"
    }

    fn detect(&self, request: &DetectionRequest) -> Result<DetectionResponse, TransportError> {
        log::debug!(
            "POST {} (payload {} chars, threshold {})",
            self.endpoint,
            request.image.len(),
            request.threshold
        );
        match self.agent.post(&self.endpoint).send_json(request) {
            Ok(response) => response
                .into_json::<DetectionResponse>()
                .map_err(|e| TransportError(format!("invalid response body: {}", e))),
            Err(ureq::Error::Status(code, response)) if code >= 500 => {
                match response.into_json::<DetectionResponse>() {
                    Ok(body) => {
                        log::debug!("detection service replied {} with a json body", code);
                        Ok(body)
                    }
                    Err(_) => Err(TransportError(format!("server returned status {}", code))),
                }
            }
            Err(ureq::Error::Status(code, _)) => {
                Err(TransportError(format!("server returned status {}", code)))
            }
            Err(ureq::Error::Transport(transport)) => Err(TransportError(transport.to_string())),
        }
    }
}
