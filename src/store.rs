//! Single-slot holder for the current original image.
//!
//! The store keeps the most recent upload or capture so the controller can
//! reprocess it under a new threshold without acquiring input again. It never
//! triggers detection itself.

use crate::media::Image;

#[derive(Debug, Default)]
pub struct ImageSourceStore {
    current: Option<Image>,
}

impl ImageSourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current image unconditionally. The previous one is dropped.
    pub fn set(&mut self, image: Image) {
        if let Some(previous) = self.current.replace(image) {
            log::debug!(
                "image store: replaced {:?} image ({} bytes)",
                previous.origin(),
                previous.len()
            );
        }
    }

    pub fn get(&self) -> Option<&Image> {
        self.current.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.current.is_some()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
