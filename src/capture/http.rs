//! Network camera source.
//!
//! Talks to cameras that serve a single JPEG per request (a snapshot URL) or
//! an MJPEG `multipart/x-mixed-replace` stream, as ESP32-class cameras do.
//! Frames are passed through still JPEG-encoded.

use std::io::Read;

use anyhow::{anyhow, Context, Result};
use image::GenericImageView;
use url::Url;

use super::{CameraDevice, CameraStream, Facing, Frame};
use crate::error::CaptureError;

const MAX_JPEG_BYTES: usize = 5 * 1024 * 1024;

pub struct HttpCamera {
    url: String,
}

impl HttpCamera {
    pub fn new(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).context("parse camera url")?;
        match parsed.scheme() {
            "http" | "https" => Ok(Self {
                url: parsed.to_string(),
            }),
            other => Err(anyhow!(
                "unsupported camera scheme '{}'; expected http(s)",
                other
            )),
        }
    }
}

impl CameraDevice for HttpCamera {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn open(&mut self, facing: Facing) -> Result<Box<dyn CameraStream>, CaptureError> {
        log::debug!(
            "HttpCamera: facing {:?} requested; {} has a fixed orientation",
            facing,
            self.url
        );
        let response = ureq::get(&self.url)
            .call()
            .map_err(|e| CaptureError::DeviceAccess(format!("connect to {}: {}", self.url, e)))?;
        let content_type = response.header("Content-Type").unwrap_or("").to_lowercase();

        let mut stream = if content_type.contains("multipart") {
            HttpStream {
                url: self.url.clone(),
                mode: StreamMode::Mjpeg(MjpegStream::new(response.into_reader())),
                pending: None,
                width: 0,
                height: 0,
            }
        } else {
            let first = read_body(response.into_reader()).map_err(|e| {
                CaptureError::DeviceAccess(format!("read snapshot from {}: {}", self.url, e))
            })?;
            HttpStream {
                url: self.url.clone(),
                mode: StreamMode::Snapshot,
                pending: Some(first),
                width: 0,
                height: 0,
            }
        };
        stream.probe_resolution()?;
        Ok(Box::new(stream))
    }
}

enum StreamMode {
    Mjpeg(MjpegStream),
    Snapshot,
    Stopped,
}

struct HttpStream {
    url: String,
    mode: StreamMode,
    /// First frame, read while probing the resolution.
    pending: Option<Vec<u8>>,
    width: u32,
    height: u32,
}

impl HttpStream {
    fn probe_resolution(&mut self) -> Result<(), CaptureError> {
        let jpeg = match self.pending.take() {
            Some(jpeg) => jpeg,
            None => self.next_jpeg()?,
        };
        let (width, height) = jpeg_dimensions(&jpeg)
            .map_err(|e| CaptureError::DeviceAccess(format!("camera sent bad frame: {}", e)))?;
        self.width = width;
        self.height = height;
        self.pending = Some(jpeg);
        Ok(())
    }

    fn next_jpeg(&mut self) -> Result<Vec<u8>, CaptureError> {
        match &mut self.mode {
            StreamMode::Mjpeg(stream) => stream.read_next_jpeg(),
            StreamMode::Snapshot => {
                fetch_single_jpeg(&self.url).map_err(|e| CaptureError::Frame(e.to_string()))
            }
            StreamMode::Stopped => Err(CaptureError::NotOpen),
        }
    }
}

impl CameraStream for HttpStream {
    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn grab(&mut self) -> Result<Frame, CaptureError> {
        if matches!(self.mode, StreamMode::Stopped) {
            return Err(CaptureError::NotOpen);
        }
        // A snapshot URL is polled fresh for the still; a stream uses the
        // most recent complete frame.
        let pending = self.pending.take();
        let jpeg = match pending {
            Some(jpeg) if matches!(self.mode, StreamMode::Mjpeg(_)) => jpeg,
            _ => self.next_jpeg()?,
        };
        Ok(Frame::Jpeg(jpeg))
    }

    fn stop(&mut self) {
        if !matches!(self.mode, StreamMode::Stopped) {
            log::debug!("HttpCamera: released {}", self.url);
        }
        self.mode = StreamMode::Stopped;
        self.pending = None;
    }
}

/// Splits a multipart MJPEG body into JPEG frames by SOI/EOI markers.
struct MjpegStream {
    reader: Box<dyn Read + Send>,
    pending: Vec<u8>,
    /// Bytes of `pending` already searched for an end marker.
    scanned: usize,
}

impl MjpegStream {
    fn new(reader: Box<dyn Read + Send>) -> Self {
        Self {
            reader,
            pending: Vec::with_capacity(64 * 1024),
            scanned: 0,
        }
    }

    fn read_next_jpeg(&mut self) -> Result<Vec<u8>, CaptureError> {
        let mut chunk = [0u8; 8192];
        loop {
            if let Some(frame) = self.split_frame() {
                return Ok(frame);
            }
            let read = self
                .reader
                .read(&mut chunk)
                .map_err(|e| CaptureError::Frame(format!("mjpeg read: {}", e)))?;
            if read == 0 {
                return Err(CaptureError::Frame("mjpeg stream ended".to_string()));
            }
            self.pending.extend_from_slice(&chunk[..read]);
            if self.pending.len() > MAX_JPEG_BYTES {
                // Oversized or corrupt part: resync on the newest start marker.
                let resync = rfind_marker(&self.pending, SOI).unwrap_or(self.pending.len());
                self.pending.drain(..resync);
                self.scanned = 0;
            }
        }
    }

    fn split_frame(&mut self) -> Option<Vec<u8>> {
        let start = find_marker(&self.pending, SOI, 0)?;
        let from = self.scanned.max(start + 2);
        match find_marker(&self.pending, EOI, from) {
            Some(eoi) => {
                let end = eoi + 2;
                let frame = self.pending[start..end].to_vec();
                self.pending.drain(..end);
                self.scanned = 0;
                Some(frame)
            }
            None => {
                // Keep the last byte: it may be the first half of a marker.
                self.scanned = self.pending.len().saturating_sub(1).max(start + 2);
                None
            }
        }
    }
}

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

fn find_marker(buffer: &[u8], marker: [u8; 2], from: usize) -> Option<usize> {
    buffer
        .get(from..)?
        .windows(2)
        .position(|w| w == marker)
        .map(|pos| from + pos)
}

fn rfind_marker(buffer: &[u8], marker: [u8; 2]) -> Option<usize> {
    buffer.windows(2).rposition(|w| w == marker)
}

fn fetch_single_jpeg(url: &str) -> Result<Vec<u8>> {
    let response = ureq::get(url)
        .call()
        .with_context(|| format!("fetch jpeg snapshot from {}", url))?;
    read_body(response.into_reader())
}

fn read_body(reader: impl Read) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader
        .take(MAX_JPEG_BYTES as u64 + 1)
        .read_to_end(&mut bytes)
        .context("read jpeg snapshot")?;
    if bytes.is_empty() {
        return Err(anyhow!("empty jpeg snapshot"));
    }
    if bytes.len() > MAX_JPEG_BYTES {
        return Err(anyhow!("jpeg snapshot exceeds {} bytes", MAX_JPEG_BYTES));
    }
    Ok(bytes)
}

fn jpeg_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let image = image::load_from_memory(bytes).context("decode jpeg")?;
    Ok(image.dimensions())
}
