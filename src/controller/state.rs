use crate::detect::Detection;
use crate::error::ClientError;
use crate::media::Image;

/// What the main panel is currently showing.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum UiState {
    /// Nothing acquired yet; placeholder shown.
    #[default]
    Idle,
    /// Request `seq` is in flight; loading indicator shown.
    Loading { seq: u64 },
    /// The latest request succeeded.
    Result {
        annotated_image: Image,
        detections: Vec<Detection>,
    },
    /// The latest request failed; placeholder shown with the error surfaced.
    Error { error: ClientError },
}

impl UiState {
    pub fn name(&self) -> &'static str {
        match self {
            UiState::Idle => "idle",
            UiState::Loading { .. } => "loading",
            UiState::Result { .. } => "result",
            UiState::Error { .. } => "error",
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, UiState::Loading { .. })
    }
}
