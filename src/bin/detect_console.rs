//! detect_console - interactive detection client.
//!
//! Reads commands from stdin (`upload`, `camera`, `snap`, `threshold`, ...),
//! sends images to the detection service and prints the resulting view.
//! Requests run on worker threads; completions come back over the same event
//! channel as user input and are applied on the main thread.

use anyhow::Result;
use clap::Parser;
use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use detection_client::console::{Console, Event, Flow, ThreadDispatcher, HELP};
use detection_client::{
    device_from_url, ClientConfig, DetectionRequestClient, HttpDetectionService,
    MediaCaptureManager, UiStateController,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Interactive client for a remote object-detection service"
)]
struct Args {
    /// JSON config file.
    #[arg(long, env = "DETECT_CONFIG")]
    config: Option<PathBuf>,

    /// Detection endpoint URL (overrides config).
    #[arg(long)]
    endpoint: Option<String>,

    /// Initial confidence threshold in percent, 0-100 (overrides config).
    #[arg(long)]
    threshold: Option<u32>,

    /// Camera URL: stub://name, http(s)://snapshot-or-mjpeg, or /dev/videoN.
    #[arg(long)]
    camera: Option<String>,

    /// Request timeout in seconds (overrides config).
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = ClientConfig::load_from(args.config.as_deref())?;
    if let Some(endpoint) = args.endpoint {
        cfg.endpoint = endpoint;
    }
    if let Some(threshold) = args.threshold {
        cfg.threshold_percent = threshold;
    }
    if let Some(camera) = args.camera {
        cfg.camera.url = camera;
    }
    if let Some(secs) = args.timeout_secs {
        cfg.timeout = Duration::from_secs(secs);
    }
    cfg.validate()?;

    let service = HttpDetectionService::new(&cfg.endpoint, cfg.timeout)?;
    log::info!("detection endpoint: {}", service.endpoint());
    let client = DetectionRequestClient::new(service);
    let camera = device_from_url(&cfg.camera.url, cfg.camera.width, cfg.camera.height)?;
    let controller = UiStateController::new(MediaCaptureManager::new(camera), cfg.threshold());

    log::info!(
        "{} detection service, camera {}",
        client.service_name(),
        cfg.camera.url
    );

    let (tx, rx) = mpsc::channel();

    let shutdown_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(Event::Shutdown);
    })?;

    let input_tx = tx.clone();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if input_tx.send(Event::Input(line)).is_err() {
                return;
            }
        }
        let _ = input_tx.send(Event::InputClosed);
    });

    let dispatcher = ThreadDispatcher::new(client, tx);
    let mut console = Console::new(controller, dispatcher, io::stdout());

    if io::stdout().is_terminal() {
        println!("{}", HELP);
    }
    console.handle(Event::Input("show".to_string()))?;

    for event in rx {
        match console.handle(event) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => break,
            Err(err) => log::warn!("{:#}", err),
        }
    }
    console.shutdown();
    log::info!("detect_console exiting");
    Ok(())
}
