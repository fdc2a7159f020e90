//! Encoded image values.
//!
//! An `Image` is an opaque, immutable encoded buffer (JPEG/PNG bytes) with its
//! MIME type and where it came from. New acquisitions replace images
//! wholesale; nothing mutates an image in place.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageReader};

use crate::error::ClientError;

const DEFAULT_MIME: &str = "image/jpeg";
const CAPTURE_JPEG_QUALITY: u8 = 90;

/// Where an image came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageOrigin {
    /// Read from a user-selected file.
    Uploaded,
    /// Snapshot from the camera preview.
    Captured,
    /// Returned by the detection service with boxes drawn on it.
    Annotated,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    bytes: Arc<[u8]>,
    mime: String,
    origin: ImageOrigin,
}

impl Image {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>, origin: ImageOrigin) -> Self {
        Self {
            bytes: Arc::from(bytes),
            mime: mime.into(),
            origin,
        }
    }

    /// Build an image from raw file content.
    ///
    /// The format is sniffed from the content and the buffer must decode;
    /// anything else is a `Decode` error.
    pub fn from_bytes(bytes: Vec<u8>, origin: ImageOrigin) -> Result<Self, ClientError> {
        if bytes.is_empty() {
            return Err(ClientError::Decode("file is empty".to_string()));
        }
        let format =
            image::guess_format(&bytes).map_err(|e| ClientError::Decode(e.to_string()))?;
        image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(Self::new(bytes, format.to_mime_type(), origin))
    }

    /// Read and validate an uploaded file.
    pub fn read_file(path: &Path) -> Result<Self, ClientError> {
        let bytes = std::fs::read(path)
            .map_err(|e| ClientError::Decode(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(bytes, ImageOrigin::Uploaded)
    }

    /// Encode a tightly packed RGB24 frame as JPEG at its native resolution.
    pub fn encode_rgb_jpeg(
        rgb: &[u8],
        width: u32,
        height: u32,
        origin: ImageOrigin,
    ) -> image::ImageResult<Self> {
        let mut out = Vec::with_capacity(rgb.len() / 8);
        JpegEncoder::new_with_quality(&mut out, CAPTURE_JPEG_QUALITY).encode(
            rgb,
            width,
            height,
            ExtendedColorType::Rgb8,
        )?;
        Ok(Self::new(out, DEFAULT_MIME, origin))
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    ///
    /// A bare base64 payload (no `data:` header) is accepted and assumed JPEG.
    pub fn from_data_url(value: &str, origin: ImageOrigin) -> Result<Self, ClientError> {
        let (mime, payload) = match value.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest
                    .split_once(',')
                    .ok_or_else(|| ClientError::Decode("data url has no payload".to_string()))?;
                let mime = header
                    .strip_suffix(";base64")
                    .ok_or_else(|| ClientError::Decode("data url is not base64".to_string()))?;
                let mime = if mime.is_empty() { DEFAULT_MIME } else { mime };
                (mime, payload)
            }
            None => (DEFAULT_MIME, value),
        };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| ClientError::Decode(format!("invalid base64: {}", e)))?;
        if bytes.is_empty() {
            return Err(ClientError::Decode("data url payload is empty".to_string()));
        }
        Ok(Self::new(bytes, mime, origin))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Pixel dimensions, read from the encoded header only.
    pub fn dimensions(&self) -> image::ImageResult<(u32, u32)> {
        ImageReader::new(Cursor::new(&self.bytes[..]))
            .with_guessed_format()?
            .into_dimensions()
    }

    /// File extension matching the MIME type, for saving.
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/png" => "png",
            _ => "jpg",
        }
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }
}

// Never dump image bytes into logs.
impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("mime", &self.mime)
            .field("origin", &self.origin)
            .field("len", &self.bytes.len())
            .finish()
    }
}
