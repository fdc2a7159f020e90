// ----------------------------------------------------------------------------
// Synthetic camera (stub://) for tests and demos
// ----------------------------------------------------------------------------

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use url::Url;

use super::{CameraDevice, CameraStream, Facing, Frame};
use crate::error::CaptureError;

/// Shared counter of streams a synthetic camera has open.
#[derive(Clone, Debug, Default)]
pub struct LiveStreams(Arc<AtomicUsize>);

impl LiveStreams {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Camera that renders a moving gradient.
///
/// `stub://<name>?deny=<message>` simulates a refused permission prompt.
pub struct SyntheticCamera {
    name: String,
    width: u32,
    height: u32,
    deny: Option<String>,
    fail_grabs: bool,
    live: LiveStreams,
}

impl SyntheticCamera {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            deny: None,
            fail_grabs: false,
            live: LiveStreams::default(),
        }
    }

    pub fn from_url(url: &str, width: u32, height: u32) -> Result<Self> {
        let parsed = Url::parse(url).context("parse stub camera url")?;
        let name = parsed.host_str().unwrap_or("camera").to_string();
        let mut camera = Self::new(&name, width, height);
        if let Some((_, message)) = parsed.query_pairs().find(|(key, _)| key == "deny") {
            camera = camera.denying(&message);
        }
        Ok(camera)
    }

    /// Refuse every `open` with the given message.
    pub fn denying(mut self, message: &str) -> Self {
        self.deny = Some(message.to_string());
        self
    }

    /// Open fine but fail every frame grab.
    pub fn failing_grabs(mut self) -> Self {
        self.fail_grabs = true;
        self
    }

    pub fn live_streams(&self) -> LiveStreams {
        self.live.clone()
    }
}

impl CameraDevice for SyntheticCamera {
    fn describe(&self) -> String {
        format!("stub://{}", self.name)
    }

    fn open(&mut self, facing: Facing) -> Result<Box<dyn CameraStream>, CaptureError> {
        if let Some(message) = &self.deny {
            return Err(CaptureError::DeviceAccess(message.clone()));
        }
        log::debug!("SyntheticCamera: {} opened facing {:?}", self.name, facing);
        self.live.0.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SyntheticStream {
            width: self.width,
            height: self.height,
            fail_grabs: self.fail_grabs,
            frame_count: 0,
            live: self.live.clone(),
            stopped: false,
        }))
    }
}

struct SyntheticStream {
    width: u32,
    height: u32,
    fail_grabs: bool,
    frame_count: u64,
    live: LiveStreams,
    stopped: bool,
}

impl SyntheticStream {
    fn generate_pixels(&self) -> Vec<u8> {
        let (w, h) = (self.width as usize, self.height as usize);
        let shift = self.frame_count as usize;
        let mut pixels = vec![0u8; w * h * 3];
        for (i, px) in pixels.chunks_exact_mut(3).enumerate() {
            let (x, y) = (i % w, i / w);
            px[0] = ((x + shift) * 255 / w.max(1)) as u8;
            px[1] = (y * 255 / h.max(1)) as u8;
            px[2] = 96;
        }
        pixels
    }
}

impl CameraStream for SyntheticStream {
    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn grab(&mut self) -> Result<Frame, CaptureError> {
        if self.stopped {
            return Err(CaptureError::NotOpen);
        }
        if self.fail_grabs {
            return Err(CaptureError::Frame("synthetic grab failure".to_string()));
        }
        self.frame_count += 1;
        Ok(Frame::Rgb24 {
            pixels: self.generate_pixels(),
            width: self.width,
            height: self.height,
        })
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.0.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for SyntheticStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_query_configures_denial() {
        let mut camera = SyntheticCamera::from_url("stub://rear?deny=blocked", 4, 4).unwrap();
        assert_eq!(camera.describe(), "stub://rear");
        let err = camera.open(Facing::Environment).err().unwrap();
        assert_eq!(err.to_string(), "blocked");
    }

    #[test]
    fn frames_match_requested_resolution() {
        let mut camera = SyntheticCamera::new("rear", 5, 3);
        let mut stream = camera.open(Facing::Environment).unwrap();
        match stream.grab().unwrap() {
            Frame::Rgb24 {
                pixels,
                width,
                height,
            } => {
                assert_eq!((width, height), (5, 3));
                assert_eq!(pixels.len(), 5 * 3 * 3);
            }
            Frame::Jpeg(_) => panic!("synthetic camera yields rgb frames"),
        }
    }

    #[test]
    fn stop_releases_once() {
        let mut camera = SyntheticCamera::new("rear", 2, 2);
        let live = camera.live_streams();
        let mut stream = camera.open(Facing::Environment).unwrap();
        assert_eq!(live.count(), 1);
        stream.stop();
        stream.stop();
        drop(stream);
        assert_eq!(live.count(), 0);
    }

    #[test]
    fn stopped_stream_yields_no_frames() {
        let mut camera = SyntheticCamera::new("rear", 2, 2);
        let mut stream = camera.open(Facing::Environment).unwrap();
        stream.stop();
        assert!(matches!(stream.grab(), Err(CaptureError::NotOpen)));
    }
}
