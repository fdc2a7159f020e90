//! Local V4L2 camera.
//!
//! Opens a device node (e.g. /dev/video0) in RGB24 with memory-mapped
//! buffers. The device is held only while the stream is open.

use ouroboros::self_referencing;

use super::{CameraDevice, CameraStream, Facing, Frame};
use crate::error::CaptureError;

const BUFFER_COUNT: u32 = 4;

pub struct V4l2Camera {
    device: String,
    width: u32,
    height: u32,
}

impl V4l2Camera {
    pub fn new(device: &str, width: u32, height: u32) -> Self {
        Self {
            device: device.to_string(),
            width,
            height,
        }
    }
}

#[self_referencing]
struct DeviceState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl CameraDevice for V4l2Camera {
    fn describe(&self) -> String {
        self.device.clone()
    }

    fn open(&mut self, facing: Facing) -> Result<Box<dyn CameraStream>, CaptureError> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        log::debug!(
            "V4l2Camera: facing {:?} requested; using {} as configured",
            facing,
            self.device
        );
        let device_err = |what: &str, err: std::io::Error| {
            CaptureError::DeviceAccess(format!("{} {}: {}", what, self.device, err))
        };

        let mut device =
            v4l::Device::with_path(&self.device).map_err(|e| device_err("open", e))?;
        let mut format = device.format().map_err(|e| device_err("read format of", e))?;
        format.width = self.width;
        format.height = self.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "V4l2Camera: failed to set format on {}: {}",
                    self.device,
                    err
                );
                device
                    .format()
                    .map_err(|e| device_err("read format of", e))?
            }
        };
        if &format.fourcc.repr != b"RGB3" {
            return Err(CaptureError::DeviceAccess(format!(
                "{} does not support RGB24 capture",
                self.device
            )));
        }

        let state = DeviceStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, BUFFER_COUNT)
            },
        }
        .try_build()
        .map_err(|e| device_err("create buffer stream for", e))?;

        log::info!(
            "V4l2Camera: streaming {} ({}x{})",
            self.device,
            format.width,
            format.height
        );
        Ok(Box::new(V4l2Stream {
            device: self.device.clone(),
            state: Some(state),
            width: format.width,
            height: format.height,
        }))
    }
}

struct V4l2Stream {
    device: String,
    state: Option<DeviceState>,
    width: u32,
    height: u32,
}

impl CameraStream for V4l2Stream {
    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn grab(&mut self) -> Result<Frame, CaptureError> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().ok_or(CaptureError::NotOpen)?;
        let pixels = state
            .with_mut(|fields| fields.stream.next().map(|(buf, _meta)| buf.to_vec()))
            .map_err(|e| CaptureError::Frame(format!("capture from {}: {}", self.device, e)))?;
        Ok(Frame::Rgb24 {
            pixels,
            width: self.width,
            height: self.height,
        })
    }

    fn stop(&mut self) {
        if self.state.take().is_some() {
            log::debug!("V4l2Camera: released {}", self.device);
        }
    }
}
