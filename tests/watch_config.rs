use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use wildlife_watch::config::WatchConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "WILDLIFE_WATCH_CONFIG",
        "WILDLIFE_WATCH_MODEL_PATH",
        "WILDLIFE_WATCH_LABELS_PATH",
        "WILDLIFE_WATCH_SNAPSHOT_DIR",
        "WILDLIFE_WATCH_HISTORY_PATH",
        "WILDLIFE_WATCH_CONFIDENCE",
        "WILDLIFE_WATCH_FRAME_SKIP",
        "WILDLIFE_WATCH_COOLDOWN_SECS",
        "WILDLIFE_WATCH_NOTIFY_ENABLED",
        "WILDLIFE_WATCH_NOTIFY_COMMAND",
        "WILDLIFE_WATCH_NOTIFY_TIMEOUT_SECS",
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
        "model": {
            "path": "/models/wildlife.onnx",
            "confidence_threshold": 0.65
        },
        "sampling": { "frame_skip": 10 },
        "snapshots": {
            "dir": "/var/lib/wildlife/snapshots",
            "public_prefix": "/media/snapshots",
            "max_width": 640,
            "jpeg_quality": 80
        },
        "cooldown_secs": 300,
        "history": { "path": "/var/lib/wildlife/history.json", "limit": 20 },
        "notify": { "command": ["python3", "push.py"], "timeout_secs": 2.5 },
        "high_alert_species": ["lion", " rhino ", ""]
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("WILDLIFE_WATCH_CONFIG", file.path());
    std::env::set_var("WILDLIFE_WATCH_FRAME_SKIP", "3");
    std::env::set_var("WILDLIFE_WATCH_SNAPSHOT_DIR", "/tmp/snaps");

    let cfg = WatchConfig::load().expect("load config");

    assert_eq!(cfg.model_path, PathBuf::from("/models/wildlife.onnx"));
    assert_eq!(cfg.labels_path, PathBuf::from("/models/labels.txt"));
    assert_eq!(cfg.confidence_threshold, 0.65);
    assert_eq!(cfg.frame_skip, 3);
    assert_eq!(cfg.cooldown_secs, 300.0);
    assert_eq!(cfg.snapshots.dir, PathBuf::from("/tmp/snaps"));
    assert_eq!(cfg.snapshots.public_prefix, "/media/snapshots");
    assert_eq!(cfg.snapshots.max_width, 640);
    assert_eq!(cfg.snapshots.max_height, 480);
    assert_eq!(cfg.snapshots.jpeg_quality, 80);
    assert_eq!(cfg.snapshots.high_alert_species, vec!["lion", "rhino"]);
    assert_eq!(
        cfg.history_path,
        PathBuf::from("/var/lib/wildlife/history.json")
    );
    assert_eq!(cfg.history_limit, 20);
    assert_eq!(cfg.notify.command, vec!["python3", "push.py"]);
    assert_eq!(cfg.notify.timeout, Duration::from_millis(2500));
    assert!(cfg.notify.enabled);

    clear_env();
}

#[test]
fn env_only_configuration() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("WILDLIFE_WATCH_MODEL_PATH", "models/custom.onnx");
    std::env::set_var("WILDLIFE_WATCH_CONFIDENCE", "0.4");
    std::env::set_var("WILDLIFE_WATCH_COOLDOWN_SECS", "60");
    std::env::set_var("WILDLIFE_WATCH_NOTIFY_ENABLED", "off");
    std::env::set_var("WILDLIFE_WATCH_NOTIFY_COMMAND", "node  scripts/notify.js");
    std::env::set_var("WILDLIFE_WATCH_NOTIFY_TIMEOUT_SECS", "1");

    let cfg = WatchConfig::load().expect("load config");

    assert_eq!(cfg.model_path, PathBuf::from("models/custom.onnx"));
    assert_eq!(cfg.labels_path, PathBuf::from("models/labels.txt"));
    assert_eq!(cfg.confidence_threshold, 0.4);
    assert_eq!(cfg.cooldown_secs, 60.0);
    assert!(!cfg.notify.enabled);
    assert_eq!(cfg.notify.command, vec!["node", "scripts/notify.js"]);
    assert_eq!(cfg.notify.timeout, Duration::from_secs(1));

    clear_env();
}

#[test]
fn invalid_values_are_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("WILDLIFE_WATCH_FRAME_SKIP", "0");
    assert!(WatchConfig::load().is_err());
    clear_env();

    std::env::set_var("WILDLIFE_WATCH_CONFIDENCE", "high");
    assert!(WatchConfig::load().is_err());
    clear_env();

    std::env::set_var("WILDLIFE_WATCH_NOTIFY_ENABLED", "maybe");
    assert!(WatchConfig::load().is_err());
    clear_env();

    std::env::set_var("WILDLIFE_WATCH_CONFIG", "/nonexistent/wildlife.json");
    let err = WatchConfig::load().unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));

    clear_env();
}
