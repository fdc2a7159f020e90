use serde::Serialize;
use std::fmt;

/// Upper bound of the integer threshold control.
pub const SLIDER_MAX: u32 = 100;
/// Default slider position (0.50).
pub const DEFAULT_SLIDER: u32 = 50;

/// Minimum confidence the detection service should report, in [0.0, 1.0].
///
/// The value is clamped when constructed, so an out-of-range threshold cannot
/// exist past the input boundary. The client never interprets it; it is only
/// transmitted.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Threshold(f32);

impl Threshold {
    /// Map an integer slider position (0..=100) linearly onto 0.0..=1.0.
    ///
    /// Positions above the maximum are clamped.
    pub fn from_slider(position: u32) -> Self {
        Self(position.min(SLIDER_MAX) as f32 / SLIDER_MAX as f32)
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::from_slider(DEFAULT_SLIDER)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
