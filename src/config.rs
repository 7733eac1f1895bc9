use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::history::{DEFAULT_HISTORY_LIMIT, DEFAULT_HISTORY_PATH};
use crate::notify::{DEFAULT_NOTIFY_ARGS, DEFAULT_NOTIFY_PROGRAM, DEFAULT_NOTIFY_TIMEOUT};
use crate::snapshot::{
    SnapshotSettings, DEFAULT_HIGH_ALERT_SPECIES, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_HEIGHT,
    DEFAULT_MAX_WIDTH, DEFAULT_PUBLIC_PREFIX, DEFAULT_SNAPSHOT_DIR,
};

const DEFAULT_MODEL_PATH: &str = "../model_training/models/my_trained_wildlife_model.onnx";
const DEFAULT_LABELS_FILE: &str = "labels.txt";
const DEFAULT_CONFIDENCE: f32 = 0.50;
const DEFAULT_FRAME_SKIP: u64 = 5;
const DEFAULT_COOLDOWN_SECS: f64 = 180.0;

#[derive(Debug, Deserialize, Default)]
struct WatchConfigFile {
    model: Option<ModelConfigFile>,
    sampling: Option<SamplingConfigFile>,
    snapshots: Option<SnapshotConfigFile>,
    cooldown_secs: Option<f64>,
    history: Option<HistoryConfigFile>,
    notify: Option<NotifyConfigFile>,
    high_alert_species: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    confidence_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct SamplingConfigFile {
    frame_skip: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct SnapshotConfigFile {
    dir: Option<PathBuf>,
    public_prefix: Option<String>,
    max_width: Option<u32>,
    max_height: Option<u32>,
    jpeg_quality: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
struct HistoryConfigFile {
    path: Option<PathBuf>,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct NotifyConfigFile {
    enabled: Option<bool>,
    command: Option<Vec<String>>,
    timeout_secs: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub confidence_threshold: f32,
    pub frame_skip: u64,
    pub cooldown_secs: f64,
    pub snapshots: SnapshotSettings,
    pub history_path: PathBuf,
    pub history_limit: usize,
    pub notify: NotifySettings,
}

#[derive(Debug, Clone)]
pub struct NotifySettings {
    pub enabled: bool,
    pub command: Vec<String>,
    pub timeout: Duration,
}

impl WatchConfig {
    /// Defaults, then the JSON file named by `WILDLIFE_WATCH_CONFIG`, then
    /// `WILDLIFE_WATCH_*` environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("WILDLIFE_WATCH_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: WatchConfigFile) -> Result<Self> {
        let model = file.model.unwrap_or_default();
        let model_path = model
            .path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));
        let labels_path = model
            .labels_path
            .unwrap_or_else(|| default_labels_path(&model_path));

        let snapshots_file = file.snapshots.unwrap_or_default();
        let snapshots = SnapshotSettings {
            dir: snapshots_file
                .dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_DIR)),
            public_prefix: snapshots_file
                .public_prefix
                .unwrap_or_else(|| DEFAULT_PUBLIC_PREFIX.to_string()),
            max_width: snapshots_file.max_width.unwrap_or(DEFAULT_MAX_WIDTH),
            max_height: snapshots_file.max_height.unwrap_or(DEFAULT_MAX_HEIGHT),
            jpeg_quality: snapshots_file.jpeg_quality.unwrap_or(DEFAULT_JPEG_QUALITY),
            high_alert_species: file.high_alert_species.unwrap_or_else(|| {
                DEFAULT_HIGH_ALERT_SPECIES
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            }),
        };

        let history = file.history.unwrap_or_default();
        let notify = file.notify.unwrap_or_default();
        let notify_timeout = match notify.timeout_secs {
            Some(seconds) => parse_timeout(seconds)?,
            None => DEFAULT_NOTIFY_TIMEOUT,
        };

        Ok(Self {
            model_path,
            labels_path,
            confidence_threshold: model.confidence_threshold.unwrap_or(DEFAULT_CONFIDENCE),
            frame_skip: file
                .sampling
                .and_then(|sampling| sampling.frame_skip)
                .unwrap_or(DEFAULT_FRAME_SKIP),
            cooldown_secs: file.cooldown_secs.unwrap_or(DEFAULT_COOLDOWN_SECS),
            snapshots,
            history_path: history
                .path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY_PATH)),
            history_limit: history.limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
            notify: NotifySettings {
                enabled: notify.enabled.unwrap_or(true),
                command: notify.command.unwrap_or_else(default_notify_command),
                timeout: notify_timeout,
            },
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("WILDLIFE_WATCH_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.model_path = PathBuf::from(path);
                if std::env::var("WILDLIFE_WATCH_LABELS_PATH").is_err() {
                    self.labels_path = default_labels_path(&self.model_path);
                }
            }
        }
        if let Ok(path) = std::env::var("WILDLIFE_WATCH_LABELS_PATH") {
            if !path.trim().is_empty() {
                self.labels_path = PathBuf::from(path);
            }
        }
        if let Ok(dir) = std::env::var("WILDLIFE_WATCH_SNAPSHOT_DIR") {
            if !dir.trim().is_empty() {
                self.snapshots.dir = PathBuf::from(dir);
            }
        }
        if let Ok(path) = std::env::var("WILDLIFE_WATCH_HISTORY_PATH") {
            if !path.trim().is_empty() {
                self.history_path = PathBuf::from(path);
            }
        }
        if let Ok(confidence) = std::env::var("WILDLIFE_WATCH_CONFIDENCE") {
            self.confidence_threshold = confidence
                .trim()
                .parse()
                .map_err(|_| anyhow!("WILDLIFE_WATCH_CONFIDENCE must be a number in 0..=1"))?;
        }
        if let Ok(skip) = std::env::var("WILDLIFE_WATCH_FRAME_SKIP") {
            self.frame_skip = skip
                .trim()
                .parse()
                .map_err(|_| anyhow!("WILDLIFE_WATCH_FRAME_SKIP must be a positive integer"))?;
        }
        if let Ok(cooldown) = std::env::var("WILDLIFE_WATCH_COOLDOWN_SECS") {
            self.cooldown_secs = cooldown.trim().parse().map_err(|_| {
                anyhow!("WILDLIFE_WATCH_COOLDOWN_SECS must be a number of seconds")
            })?;
        }
        if let Ok(enabled) = std::env::var("WILDLIFE_WATCH_NOTIFY_ENABLED") {
            self.notify.enabled = match enabled.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(anyhow!(
                        "WILDLIFE_WATCH_NOTIFY_ENABLED must be true or false"
                    ))
                }
            };
        }
        if let Ok(command) = std::env::var("WILDLIFE_WATCH_NOTIFY_COMMAND") {
            let parsed = split_command(&command);
            if !parsed.is_empty() {
                self.notify.command = parsed;
            }
        }
        if let Ok(timeout) = std::env::var("WILDLIFE_WATCH_NOTIFY_TIMEOUT_SECS") {
            let seconds: f64 = timeout.trim().parse().map_err(|_| {
                anyhow!("WILDLIFE_WATCH_NOTIFY_TIMEOUT_SECS must be a number of seconds")
            })?;
            self.notify.timeout = parse_timeout(seconds)?;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(anyhow!("confidence threshold must be within 0..=1"));
        }
        if self.frame_skip == 0 {
            return Err(anyhow!("frame_skip must be at least 1"));
        }
        if !self.cooldown_secs.is_finite() || self.cooldown_secs < 0.0 {
            return Err(anyhow!("cooldown must be a non-negative number of seconds"));
        }
        if !(1..=100).contains(&self.snapshots.jpeg_quality) {
            return Err(anyhow!("jpeg quality must be within 1..=100"));
        }
        if self.snapshots.max_width == 0 || self.snapshots.max_height == 0 {
            return Err(anyhow!("snapshot max dimensions must be greater than zero"));
        }
        if self.history_limit == 0 {
            return Err(anyhow!("history limit must be greater than zero"));
        }
        if self.notify.enabled && self.notify.command.is_empty() {
            return Err(anyhow!("notification command cannot be empty"));
        }
        self.snapshots.high_alert_species = self
            .snapshots
            .high_alert_species
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Ok(())
    }
}

fn default_labels_path(model_path: &Path) -> PathBuf {
    model_path
        .parent()
        .map(|dir| dir.join(DEFAULT_LABELS_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LABELS_FILE))
}

fn default_notify_command() -> Vec<String> {
    std::iter::once(DEFAULT_NOTIFY_PROGRAM)
        .chain(DEFAULT_NOTIFY_ARGS)
        .map(|s| s.to_string())
        .collect()
}

fn parse_timeout(seconds: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| anyhow!("notification timeout must be a non-negative number of seconds"))
}

fn read_config_file(path: &Path) -> Result<WatchConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn split_command(value: &str) -> Vec<String> {
    value.split_whitespace().map(|part| part.to_string()).collect()
}
