use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use detection_client::config::ClientConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "DETECT_CONFIG",
        "DETECT_ENDPOINT",
        "DETECT_THRESHOLD",
        "DETECT_TIMEOUT_SECS",
        "DETECT_CAMERA_URL",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "endpoint": "http://detector.local:5000/detect",
        "threshold_percent": 65,
        "timeout_secs": 12,
        "camera": {
            "url": "http://10.0.0.7/capture",
            "width": 800,
            "height": 600
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("DETECT_CONFIG", file.path());
    std::env::set_var("DETECT_THRESHOLD", "80");
    std::env::set_var("DETECT_CAMERA_URL", "stub://bench_camera");

    let cfg = ClientConfig::load().expect("load config");

    assert_eq!(cfg.endpoint, "http://detector.local:5000/detect");
    assert_eq!(cfg.threshold_percent, 80);
    assert!((cfg.threshold().value() - 0.8).abs() < 1e-6);
    assert_eq!(cfg.timeout, Duration::from_secs(12));
    assert_eq!(cfg.camera.url, "stub://bench_camera");
    assert_eq!(cfg.camera.width, 800);
    assert_eq!(cfg.camera.height, 600);

    clear_env();
}

#[test]
fn defaults_apply_without_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = ClientConfig::load().expect("load config");
    assert_eq!(cfg.endpoint, "http://127.0.0.1:5000/detect");
    assert_eq!(cfg.threshold_percent, 50);
    assert_eq!(cfg.camera.url, "stub://rear_camera");
}

#[test]
fn invalid_env_values_are_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("DETECT_THRESHOLD", "high");
    assert!(ClientConfig::load().is_err());
    clear_env();

    std::env::set_var("DETECT_THRESHOLD", "140");
    assert!(ClientConfig::load().is_err());
    clear_env();

    std::env::set_var("DETECT_ENDPOINT", "ftp://detector/detect");
    assert!(ClientConfig::load().is_err());
    clear_env();

    std::env::set_var("DETECT_TIMEOUT_SECS", "0");
    assert!(ClientConfig::load().is_err());
    clear_env();
}

#[test]
fn malformed_config_file_is_an_error() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, b"{ not json").expect("write config");
    std::env::set_var("DETECT_CONFIG", file.path());

    let err = ClientConfig::load().unwrap_err();
    assert!(err.to_string().contains("invalid config file"));

    clear_env();
}

#[test]
fn explicit_path_is_used_even_without_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, br#"{ "threshold_percent": 20 }"#).expect("write config");

    let cfg = ClientConfig::load_from(Some(file.path())).expect("load config");
    assert_eq!(cfg.threshold_percent, 20);
    assert_eq!(cfg.endpoint, "http://127.0.0.1:5000/detect");
    assert!(ClientConfig::load_from(Some(std::path::Path::new("/nonexistent/detect.json"))).is_err());
}
