//! Camera capture.
//!
//! `MediaCaptureManager` owns the camera session for the capture modal:
//! open a rear-facing stream and bind it to the preview, snapshot a still
//! frame, release the device. It is the only component that touches a camera
//! device.
//!
//! Backends, selected by the configured camera URL:
//! - `stub://<name>`: synthetic camera (tests, demos)
//! - `http(s)://...`: network camera, JPEG snapshots or an MJPEG stream
//! - `/dev/videoN`: local V4L2 device (feature: camera-v4l2)
//!
//! The session MUST be released on every exit path from the modal: capture,
//! cancel, error and drop.

mod http;
mod synthetic;
#[cfg(feature = "camera-v4l2")]
mod v4l2;

use anyhow::{anyhow, Result};

use crate::error::CaptureError;
use crate::media::{Image, ImageOrigin};

pub use http::HttpCamera;
pub use synthetic::{LiveStreams, SyntheticCamera};
#[cfg(feature = "camera-v4l2")]
pub use v4l2::V4l2Camera;

/// Which way the requested camera should face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Facing {
    /// Rear camera, pointing away from the user.
    Environment,
    /// Front camera.
    User,
}

/// A still frame grabbed from a live stream.
#[derive(Clone, Debug)]
pub enum Frame {
    /// Tightly packed RGB24 pixels.
    Rgb24 {
        pixels: Vec<u8>,
        width: u32,
        height: u32,
    },
    /// Already JPEG-encoded by the device.
    Jpeg(Vec<u8>),
}

impl Frame {
    /// Encode the frame as a captured `Image` at its native resolution.
    pub fn into_image(self) -> Result<Image, CaptureError> {
        match self {
            Frame::Rgb24 {
                pixels,
                width,
                height,
            } => {
                let expected = (width as usize) * (height as usize) * 3;
                if pixels.len() != expected {
                    return Err(CaptureError::Frame(format!(
                        "RGB frame length mismatch: expected {}, got {}",
                        expected,
                        pixels.len()
                    )));
                }
                Image::encode_rgb_jpeg(&pixels, width, height, ImageOrigin::Captured)
                    .map_err(|e| CaptureError::Encode(e.to_string()))
            }
            Frame::Jpeg(bytes) => Image::from_bytes(bytes, ImageOrigin::Captured)
                .map_err(|e| CaptureError::Encode(e.to_string())),
        }
    }
}

/// A camera that can be asked for a live stream.
pub trait CameraDevice {
    /// Human-readable device description for logs and the modal title.
    fn describe(&self) -> String;

    /// Acquire a live stream. Permission or hardware failures are
    /// `CaptureError::DeviceAccess`.
    fn open(&mut self, facing: Facing) -> Result<Box<dyn CameraStream>, CaptureError>;
}

/// A live device stream.
pub trait CameraStream {
    /// Native resolution of the stream.
    fn resolution(&self) -> (u32, u32);

    /// Take the current frame.
    fn grab(&mut self) -> Result<Frame, CaptureError>;

    /// Stop all tracks and release the device. Must be idempotent.
    fn stop(&mut self);
}

/// Preview binding shown in the capture modal while a session is open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewBinding {
    pub device: String,
    pub facing: Facing,
    pub width: u32,
    pub height: u32,
}

/// A live stream bound to the preview. Lives only while the modal is open.
pub struct CameraSession {
    stream: Box<dyn CameraStream>,
    preview: PreviewBinding,
}

impl CameraSession {
    fn release(mut self) {
        self.stream.stop();
        log::info!("camera session closed ({})", self.preview.device);
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.stream.stop();
    }
}

pub struct MediaCaptureManager {
    device: Box<dyn CameraDevice>,
    facing: Facing,
    session: Option<CameraSession>,
}

impl MediaCaptureManager {
    /// Manager requesting the rear-facing camera.
    pub fn new(device: Box<dyn CameraDevice>) -> Self {
        Self {
            device,
            facing: Facing::Environment,
            session: None,
        }
    }

    /// Acquire the camera and bind it to the preview.
    ///
    /// Opening while a session is already open keeps the existing session.
    pub fn open(&mut self) -> Result<&PreviewBinding, CaptureError> {
        if self.session.is_none() {
            let device = self.device.describe();
            let stream = self.device.open(self.facing).map_err(|err| {
                log::warn!("camera open failed ({}): {}", device, err);
                err
            })?;
            let (width, height) = stream.resolution();
            let preview = PreviewBinding {
                device,
                facing: self.facing,
                width,
                height,
            };
            log::info!(
                "camera session opened ({}, {}x{})",
                preview.device,
                width,
                height
            );
            self.session = Some(CameraSession { stream, preview });
        }
        match &self.session {
            Some(session) => Ok(&session.preview),
            None => Err(CaptureError::NotOpen),
        }
    }

    /// Snapshot the preview as a captured image and close the session.
    ///
    /// The session is closed whether or not grabbing and encoding succeed.
    pub fn capture(&mut self) -> Result<Image, CaptureError> {
        let mut session = self.session.take().ok_or(CaptureError::NotOpen)?;
        let image = session.stream.grab().and_then(Frame::into_image);
        session.release();
        let image = image?;
        log::info!("captured still frame ({} bytes)", image.len());
        Ok(image)
    }

    /// Release the camera. No-op when already closed.
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.release();
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn preview(&self) -> Option<&PreviewBinding> {
        self.session.as_ref().map(|session| &session.preview)
    }
}

impl Drop for MediaCaptureManager {
    fn drop(&mut self) {
        self.close();
    }
}

/// Build a camera device from its configured URL.
pub fn device_from_url(url: &str, width: u32, height: u32) -> Result<Box<dyn CameraDevice>> {
    if url.starts_with("stub://") {
        return Ok(Box::new(SyntheticCamera::from_url(url, width, height)?));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(Box::new(HttpCamera::new(url)?));
    }
    if url.contains("://") {
        return Err(anyhow!(
            "unsupported camera url '{}'; expected stub://, http(s):// or a device path",
            url
        ));
    }
    #[cfg(feature = "camera-v4l2")]
    {
        Ok(Box::new(V4l2Camera::new(url, width, height)))
    }
    #[cfg(not(feature = "camera-v4l2"))]
    {
        Err(anyhow!(
            "local camera device '{}' requires the camera-v4l2 feature",
            url
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(camera: SyntheticCamera) -> (MediaCaptureManager, LiveStreams) {
        let live = camera.live_streams();
        (MediaCaptureManager::new(Box::new(camera)), live)
    }

    #[test]
    fn open_binds_rear_facing_preview() {
        let (mut manager, live) = manager(SyntheticCamera::new("rear", 32, 24));
        let preview = manager.open().unwrap().clone();
        assert_eq!(preview.facing, Facing::Environment);
        assert_eq!((preview.width, preview.height), (32, 24));
        assert!(manager.is_open());
        assert_eq!(live.count(), 1);
    }

    #[test]
    fn capture_encodes_native_resolution_and_closes() {
        let (mut manager, live) = manager(SyntheticCamera::new("rear", 32, 24));
        manager.open().unwrap();

        let image = manager.capture().unwrap();
        assert_eq!(image.origin(), ImageOrigin::Captured);
        assert_eq!(image.mime(), "image/jpeg");
        assert_eq!(image.dimensions().unwrap(), (32, 24));
        assert!(!manager.is_open());
        assert_eq!(live.count(), 0);
    }

    #[test]
    fn capture_without_session_is_rejected() {
        let (mut manager, live) = manager(SyntheticCamera::new("rear", 8, 8));
        assert!(matches!(manager.capture(), Err(CaptureError::NotOpen)));
        assert_eq!(live.count(), 0);
    }

    #[test]
    fn close_is_idempotent() {
        let (mut manager, live) = manager(SyntheticCamera::new("rear", 8, 8));
        manager.close();
        manager.open().unwrap();
        manager.close();
        manager.close();
        assert!(!manager.is_open());
        assert_eq!(live.count(), 0);
    }

    #[test]
    fn second_open_reuses_session() {
        let (mut manager, live) = manager(SyntheticCamera::new("rear", 8, 8));
        manager.open().unwrap();
        manager.open().unwrap();
        assert_eq!(live.count(), 1);
    }

    #[test]
    fn denied_camera_leaves_nothing_open() {
        let (mut manager, live) =
            manager(SyntheticCamera::new("rear", 8, 8).denying("permission denied"));
        let err = manager.open().unwrap_err();
        assert!(matches!(err, CaptureError::DeviceAccess(ref m) if m == "permission denied"));
        assert!(!manager.is_open());
        assert_eq!(live.count(), 0);
    }

    #[test]
    fn failed_grab_still_releases_device() {
        let (mut manager, live) = manager(SyntheticCamera::new("rear", 8, 8).failing_grabs());
        manager.open().unwrap();
        assert!(matches!(manager.capture(), Err(CaptureError::Frame(_))));
        assert!(!manager.is_open());
        assert_eq!(live.count(), 0);
    }

    #[test]
    fn dropping_manager_releases_device() {
        let (mut manager, live) = manager(SyntheticCamera::new("rear", 8, 8));
        manager.open().unwrap();
        drop(manager);
        assert_eq!(live.count(), 0);
    }

    #[test]
    fn active_streams_never_exceed_one() {
        let (mut manager, live) = manager(SyntheticCamera::new("rear", 8, 8));
        let ops = ["open", "open", "capture", "close", "open", "close", "capture", "open"];
        for op in ops {
            match op {
                "open" => {
                    manager.open().unwrap();
                }
                "close" => manager.close(),
                _ => {
                    let _ = manager.capture();
                }
            }
            assert!(live.count() <= 1);
            assert_eq!(live.count() == 1, manager.is_open());
        }
    }

    #[test]
    fn rgb_frames_with_wrong_length_are_rejected() {
        let frame = Frame::Rgb24 {
            pixels: vec![0; 10],
            width: 4,
            height: 4,
        };
        assert!(matches!(frame.into_image(), Err(CaptureError::Frame(_))));
    }

    #[test]
    fn device_urls_select_backends() {
        assert!(device_from_url("stub://rear", 8, 8).is_ok());
        assert!(device_from_url("http://127.0.0.1:81/capture", 8, 8).is_ok());
        assert!(device_from_url("rtsp://camera", 8, 8).is_err());
    }
}
