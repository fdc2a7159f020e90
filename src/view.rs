//! Render projection.
//!
//! `View` is computed from controller state in one place. The main panel is a
//! single enum, so the placeholder, loading indicator and result view can
//! never be visible at the same time.

use crate::capture::PreviewBinding;
use crate::controller::UiState;
use crate::detect::Detection;
use crate::media::Image;
use crate::threshold::Threshold;

#[derive(Clone, Debug, PartialEq)]
pub enum Panel {
    Placeholder,
    Loading,
    Result {
        image: Image,
        detection_count: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct View {
    pub panel: Panel,
    /// Detection entries; shown only with a result that has detections.
    pub detection_list: Option<Vec<String>>,
    /// Surfaced request failure, e.g. "Error: model unavailable".
    pub error: Option<String>,
    /// Transient message from a failure that did not change state.
    pub notice: Option<String>,
    /// Camera modal, when open.
    pub camera_modal: Option<PreviewBinding>,
    pub threshold_label: String,
}

impl View {
    pub fn project(
        state: &UiState,
        threshold: Threshold,
        notice: Option<&str>,
        preview: Option<&PreviewBinding>,
    ) -> Self {
        let (panel, detection_list, error) = match state {
            UiState::Idle => (Panel::Placeholder, None, None),
            UiState::Loading { .. } => (Panel::Loading, None, None),
            UiState::Result {
                annotated_image,
                detections,
            } => {
                let list = if detections.is_empty() {
                    None
                } else {
                    Some(detections.iter().map(format_detection).collect())
                };
                (
                    Panel::Result {
                        image: annotated_image.clone(),
                        detection_count: detections.len(),
                    },
                    list,
                    None,
                )
            }
            UiState::Error { error } => (Panel::Placeholder, None, Some(format!("Error: {}", error))),
        };
        Self {
            panel,
            detection_list,
            error,
            notice: notice.map(str::to_string),
            camera_modal: preview.cloned(),
            threshold_label: threshold.to_string(),
        }
    }
}

/// One detection list entry, e.g. "cat — 92.0%".
pub fn format_detection(detection: &Detection) -> String {
    format!(
        "{} — {:.1}%",
        detection.class,
        detection.confidence * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Facing;
    use crate::error::ClientError;
    use crate::media::ImageOrigin;

    fn annotated() -> Image {
        Image::new(vec![1, 2, 3], "image/jpeg", ImageOrigin::Annotated)
    }

    fn detection(class: &str, confidence: f32) -> Detection {
        Detection {
            class: class.to_string(),
            confidence,
            bbox: None,
        }
    }

    fn all_states() -> Vec<UiState> {
        vec![
            UiState::Idle,
            UiState::Loading { seq: 3 },
            UiState::Result {
                annotated_image: annotated(),
                detections: vec![detection("cat", 0.92)],
            },
            UiState::Result {
                annotated_image: annotated(),
                detections: vec![],
            },
            UiState::Error {
                error: ClientError::Network("timed out".to_string()),
            },
        ]
    }

    #[test]
    fn formats_confidence_as_percent() {
        assert_eq!(format_detection(&detection("cat", 0.92)), "cat — 92.0%");
        assert_eq!(format_detection(&detection("bad apple", 0.5)), "bad apple — 50.0%");
        assert_eq!(format_detection(&detection("good banana", 0.9876)), "good banana — 98.8%");
    }

    #[test]
    fn each_state_shows_exactly_one_panel() {
        let expected = [
            "placeholder",
            "loading",
            "result",
            "result",
            "placeholder",
        ];
        for (state, want) in all_states().iter().zip(expected) {
            let view = View::project(state, Threshold::default(), None, None);
            let got = match view.panel {
                Panel::Placeholder => "placeholder",
                Panel::Loading => "loading",
                Panel::Result { .. } => "result",
            };
            assert_eq!(got, want, "state {}", state.name());
        }
    }

    #[test]
    fn detection_list_only_with_non_empty_result() {
        let lists: Vec<_> = all_states()
            .iter()
            .map(|state| View::project(state, Threshold::default(), None, None).detection_list)
            .collect();
        assert_eq!(
            lists,
            vec![None, None, Some(vec!["cat — 92.0%".to_string()]), None, None]
        );
    }

    #[test]
    fn error_state_surfaces_prefixed_message() {
        let state = UiState::Error {
            error: ClientError::Service("model unavailable".to_string()),
        };
        let view = View::project(&state, Threshold::default(), None, None);
        assert_eq!(view.panel, Panel::Placeholder);
        assert_eq!(view.error.as_deref(), Some("Error: model unavailable"));
    }

    #[test]
    fn threshold_label_has_two_decimals() {
        let view = View::project(&UiState::Idle, Threshold::from_slider(7), None, None);
        assert_eq!(view.threshold_label, "0.07");
    }

    #[test]
    fn modal_and_notice_are_carried() {
        let preview = PreviewBinding {
            device: "stub://rear".to_string(),
            facing: Facing::Environment,
            width: 640,
            height: 480,
        };
        let view = View::project(
            &UiState::Idle,
            Threshold::default(),
            Some("camera unavailable: denied"),
            Some(&preview),
        );
        assert_eq!(view.camera_modal, Some(preview));
        assert_eq!(view.notice.as_deref(), Some("camera unavailable: denied"));
    }
}
