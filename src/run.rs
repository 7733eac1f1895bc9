//! Top-level run: validation, processing and finalization.
//!
//! Stages, in order:
//! 1. `validate_inputs`: video and model paths must exist
//! 2. `load_detector` then `FileSource::open`
//! 3. `execute`: history read, frame loop, history update, result
//!
//! Any error from any stage is returned to the caller, which renders the
//! failure document. Nothing here retries.

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use std::path::Path;

use crate::config::WatchConfig;
use crate::detect::DetectorBackend;
use crate::history::HistoryStore;
use crate::ingest::FrameSource;
use crate::notify::{CommandNotifier, Notifier, NullNotifier};
use crate::pipeline::{Pipeline, PipelineSettings};
use crate::report::RunResult;
use crate::snapshot::SnapshotWriter;

/// Fail when either input path is missing.
pub fn validate_inputs(video_path: &Path, model_path: &Path) -> Result<()> {
    if !video_path.exists() {
        return Err(anyhow!("Video file not found: {}", video_path.display()));
    }
    if !model_path.exists() {
        return Err(anyhow!("Model not found: {}", model_path.display()));
    }
    Ok(())
}

/// Class names, one per line. A missing file yields an empty list and the
/// backend falls back to numeric class names.
pub fn load_labels(path: &Path) -> Result<Vec<String>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!(
                "no labels file at {}; using numeric class names",
                path.display()
            );
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read labels {}", path.display()))
        }
    };
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Load the configured model.
pub fn load_detector(cfg: &WatchConfig) -> Result<Box<dyn DetectorBackend>> {
    log::info!("loading model from {}", cfg.model_path.display());
    #[cfg(feature = "backend-tract")]
    {
        let labels = load_labels(&cfg.labels_path)?;
        let mut backend = crate::detect::TractBackend::new(&cfg.model_path, labels)?;
        backend.warm_up()?;
        Ok(Box::new(backend))
    }
    #[cfg(not(feature = "backend-tract"))]
    {
        Err(anyhow!(
            "cannot load model {}: inference requires the backend-tract feature (build with --features full)",
            cfg.model_path.display()
        ))
    }
}

pub fn build_notifier(cfg: &WatchConfig) -> Result<Box<dyn Notifier>> {
    if !cfg.notify.enabled {
        log::info!("push notifications disabled");
        return Ok(Box::new(NullNotifier));
    }
    Ok(Box::new(CommandNotifier::new(
        &cfg.notify.command,
        cfg.notify.timeout,
    )?))
}

/// Process an opened video and persist the outcome.
///
/// History is read before the first frame and written only after the whole
/// video has been processed, and only when there is something to add.
pub fn execute(
    cfg: &WatchConfig,
    video_path: &str,
    source: &mut dyn FrameSource,
    detector: &mut dyn DetectorBackend,
    notifier: &mut dyn Notifier,
) -> Result<RunResult> {
    let info = source.info();
    log::info!(
        "processing video: {} frames at {} FPS",
        info.total_frames,
        info.fps
    );

    let store = HistoryStore::new(&cfg.history_path, cfg.history_limit);
    let history = store.load();

    let writer = SnapshotWriter::new(cfg.snapshots.clone())?;
    let settings = PipelineSettings {
        confidence_threshold: cfg.confidence_threshold,
        frame_skip: cfg.frame_skip,
        cooldown_secs: cfg.cooldown_secs,
    };
    let ctx = Pipeline::new(settings, detector, &writer, notifier).run(source)?;

    let added = store.append(history, video_path, &ctx.snapshots, Local::now())?;
    if added > 0 {
        log::info!(
            "saved {} detections to history {}",
            added,
            store.path().display()
        );
    }

    Ok(RunResult::new(
        video_path,
        info,
        ctx.processed_frames,
        &writer.dir().display().to_string(),
        ctx.snapshots,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_reports_missing_video_first() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_inputs(
            &dir.path().join("missing.mp4"),
            &dir.path().join("missing.onnx"),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Video file not found"));
    }

    #[test]
    fn validate_reports_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"not really a video").unwrap();
        let err = validate_inputs(&video, &dir.path().join("missing.onnx")).unwrap_err();
        assert!(err.to_string().starts_with("Model not found"));
    }

    #[cfg(not(feature = "backend-tract"))]
    #[test]
    fn detector_error_names_the_build_feature() {
        let cfg = WatchConfig::load().unwrap();
        let err = load_detector(&cfg).err().expect("no inference backend compiled in");
        assert!(err.to_string().contains("--features full"));
    }

    #[test]
    fn labels_skip_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.txt");
        std::fs::write(&path, "lion\n\n elephant \nzebra\n").unwrap();
        assert_eq!(load_labels(&path).unwrap(), vec!["lion", "elephant", "zebra"]);
    }

    #[test]
    fn missing_labels_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_labels(&dir.path().join("labels.txt")).unwrap().is_empty());
    }
}
