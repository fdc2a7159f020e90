use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::threshold::{Threshold, DEFAULT_SLIDER, SLIDER_MAX};

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/detect";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CAMERA_URL: &str = "stub://rear_camera";
const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;

#[derive(Debug, Deserialize, Default)]
struct ClientConfigFile {
    endpoint: Option<String>,
    threshold_percent: Option<u32>,
    timeout_secs: Option<u64>,
    camera: Option<CameraConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    /// Initial slider position, 0..=100.
    pub threshold_percent: u32,
    pub timeout: Duration,
    pub camera: CameraSettings,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_file(ClientConfigFile::default())
    }
}

impl ClientConfig {
    /// Load from the JSON file named by `DETECT_CONFIG` (if set), then apply
    /// environment overrides and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var_os("DETECT_CONFIG");
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    /// Like `load`, with the config file path given explicitly.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn threshold(&self) -> Threshold {
        Threshold::from_slider(self.threshold_percent)
    }

    fn from_file(file: ClientConfigFile) -> Self {
        let camera = file.camera.unwrap_or_default();
        Self {
            endpoint: file
                .endpoint
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            threshold_percent: file.threshold_percent.unwrap_or(DEFAULT_SLIDER),
            timeout: Duration::from_secs(file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            camera: CameraSettings {
                url: camera
                    .url
                    .unwrap_or_else(|| DEFAULT_CAMERA_URL.to_string()),
                width: camera.width.unwrap_or(DEFAULT_CAMERA_WIDTH),
                height: camera.height.unwrap_or(DEFAULT_CAMERA_HEIGHT),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(endpoint) = std::env::var("DETECT_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint.trim().to_string();
            }
        }
        if let Ok(threshold) = std::env::var("DETECT_THRESHOLD") {
            self.threshold_percent = threshold
                .trim()
                .parse()
                .map_err(|_| anyhow!("DETECT_THRESHOLD must be an integer percentage (0-100)"))?;
        }
        if let Ok(timeout) = std::env::var("DETECT_TIMEOUT_SECS") {
            let seconds: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!("DETECT_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.timeout = Duration::from_secs(seconds);
        }
        if let Ok(url) = std::env::var("DETECT_CAMERA_URL") {
            if !url.trim().is_empty() {
                self.camera.url = url.trim().to_string();
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let endpoint = Url::parse(&self.endpoint)
            .map_err(|e| anyhow!("invalid detection endpoint '{}': {}", self.endpoint, e))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(anyhow!(
                "detection endpoint must be http(s), got '{}'",
                endpoint.scheme()
            ));
        }
        if self.threshold_percent > SLIDER_MAX {
            return Err(anyhow!(
                "threshold must be between 0 and {}, got {}",
                SLIDER_MAX,
                self.threshold_percent
            ));
        }
        if self.timeout.as_secs() == 0 {
            return Err(anyhow!("timeout must be greater than zero"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera resolution must be non-zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<ClientConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ClientConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.endpoint, "http://127.0.0.1:5000/detect");
        assert_eq!(cfg.threshold_percent, 50);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.camera.url, "stub://rear_camera");
        assert_eq!((cfg.camera.width, cfg.camera.height), (640, 480));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut cfg = ClientConfig::default();
        cfg.threshold_percent = 101;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let mut cfg = ClientConfig::default();
        cfg.endpoint = "file:///tmp/detect".to_string();
        assert!(cfg.validate().is_err());
        cfg.endpoint = "detect".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut cfg = ClientConfig::default();
        cfg.timeout = Duration::from_secs(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file: ClientConfigFile =
            serde_json::from_str(r#"{ "camera": { "url": "http://10.0.0.9/capture" } }"#).unwrap();
        let cfg = ClientConfig::from_file(file);
        assert_eq!(cfg.camera.url, "http://10.0.0.9/capture");
        assert_eq!(cfg.camera.width, 640);
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
    }
}
