//! Terminal presentation: request progress and view printing.

use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::detect::DetectionResult;
use crate::view::{Panel, View};

/// How progress is reported on stderr.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum UiMode {
    /// Spinner on a terminal, plain lines otherwise.
    #[default]
    Auto,
    Plain,
    Pretty,
}

#[derive(Clone, Copy, Debug)]
pub struct Ui {
    pretty: bool,
}

impl Ui {
    /// `Pretty` still falls back to plain lines when stderr is not a terminal.
    pub fn new(mode: UiMode, is_tty: bool) -> Self {
        Self {
            pretty: is_tty && mode != UiMode::Plain,
        }
    }

    /// Report one in-flight detection request until `finish` is called.
    pub fn request(&self, target: &str) -> RequestProgress {
        let spinner = if self.pretty {
            let spinner = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
            let style = ProgressStyle::with_template("{spinner} detecting via {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(target.to_string());
            spinner.enable_steady_tick(Duration::from_millis(100));
            Some(spinner)
        } else {
            eprintln!("detecting via {}", target);
            None
        };
        RequestProgress {
            started: Instant::now(),
            spinner,
        }
    }
}

/// Progress line for a single request.
///
/// Dropped without `finish` (early return, panic) the spinner is abandoned
/// in place so the terminal is left clean.
pub struct RequestProgress {
    started: Instant,
    spinner: Option<ProgressBar>,
}

impl RequestProgress {
    pub fn finish(mut self, result: &DetectionResult) {
        let line = outcome_line(result, self.started.elapsed());
        match self.spinner.take() {
            Some(spinner) => spinner.finish_with_message(line),
            None => eprintln!("{}", line),
        }
    }
}

impl Drop for RequestProgress {
    fn drop(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.abandon();
        }
    }
}

fn outcome_line(result: &DetectionResult, elapsed: Duration) -> String {
    match result {
        DetectionResult::Success { detections, .. } => format!(
            "✔ {} detection(s) in {}",
            detections.len(),
            format_duration(elapsed)
        ),
        DetectionResult::Failure { .. } => {
            format!("✘ request failed after {}", format_duration(elapsed))
        }
    }
}

fn format_duration(duration: Duration) -> String {
    match duration.as_millis() {
        ms if ms < 1000 => format!("{}ms", ms),
        _ => format!("{:.1}s", duration.as_secs_f64()),
    }
}

/// Print a view as plain text lines.
pub fn print_view<W: Write>(out: &mut W, view: &View) -> io::Result<()> {
    if let Some(modal) = &view.camera_modal {
        writeln!(
            out,
            "[camera] {} preview {}x{} ({:?}) - `snap` to capture, `cancel` to close",
            modal.device, modal.width, modal.height, modal.facing
        )?;
    }
    match &view.panel {
        Panel::Placeholder => writeln!(out, "[ no image - `upload <path>` or `camera` ]")?,
        Panel::Loading => writeln!(out, "[ detecting… ]")?,
        Panel::Result {
            image,
            detection_count,
        } => {
            let size = image
                .dimensions()
                .map(|(w, h)| format!("{}x{}", w, h))
                .unwrap_or_else(|_| "unknown size".to_string());
            writeln!(
                out,
                "[ annotated image: {}, {} bytes, {} detection(s) ]",
                size,
                image.len(),
                detection_count
            )?;
        }
    }
    if let Some(list) = &view.detection_list {
        writeln!(out, "Detections:")?;
        for entry in list {
            writeln!(out, "  {}", entry)?;
        }
    }
    if let Some(error) = &view.error {
        writeln!(out, "{}", error)?;
    }
    if let Some(notice) = &view.notice {
        writeln!(out, "! {}", notice)?;
    }
    writeln!(out, "threshold: {}", view.threshold_label)
}
