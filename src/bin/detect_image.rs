//! detect_image - run detection on one image file.
//!
//! Sends the file once at the given threshold, prints the detections and
//! optionally writes the annotated image.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use detection_client::ui::{Ui, UiMode};
use detection_client::view::format_detection;
use detection_client::{
    ClientConfig, DetectionRequestClient, DetectionResult, HttpDetectionService, Image,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Send one image to the detection service")]
struct Args {
    /// Image file to send.
    image: PathBuf,

    /// JSON config file.
    #[arg(long, env = "DETECT_CONFIG")]
    config: Option<PathBuf>,

    /// Confidence threshold in percent, 0-100 (overrides config).
    #[arg(long)]
    threshold: Option<u32>,

    /// Detection endpoint URL (overrides config).
    #[arg(long)]
    endpoint: Option<String>,

    /// Request timeout in seconds (overrides config).
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Write the annotated image here.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Progress output on stderr.
    #[arg(long, value_enum, default_value_t = UiMode::Auto)]
    ui: UiMode,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let ui = Ui::new(args.ui, std::io::stderr().is_terminal());

    let mut cfg = ClientConfig::load_from(args.config.as_deref())?;
    if let Some(threshold) = args.threshold {
        cfg.threshold_percent = threshold;
    }
    if let Some(endpoint) = args.endpoint {
        cfg.endpoint = endpoint;
    }
    if let Some(secs) = args.timeout_secs {
        cfg.timeout = Duration::from_secs(secs);
    }
    cfg.validate()?;

    let image = Image::read_file(&args.image)?;
    let service = HttpDetectionService::new(&cfg.endpoint, cfg.timeout)?;
    let client = DetectionRequestClient::new(service);

    let progress = ui.request(&cfg.endpoint);
    let result = client.send(&image, cfg.threshold());
    progress.finish(&result);

    match result {
        DetectionResult::Success {
            annotated_image,
            detections,
        } => {
            if detections.is_empty() {
                println!("no detections at threshold {}", cfg.threshold());
            }
            for detection in &detections {
                println!("{}", format_detection(detection));
            }
            if let Some(out) = args.out {
                annotated_image
                    .write_to(&out)
                    .with_context(|| format!("write annotated image to {}", out.display()))?;
                log::info!("annotated image written to {}", out.display());
            }
            Ok(())
        }
        DetectionResult::Failure { error } => Err(anyhow!("Error: {}", error)),
    }
}
