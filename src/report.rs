//! Run result and failure documents written by `detect_animals`.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::ingest::VideoInfo;
use crate::snapshot::SnapshotRecord;

pub const SUCCESS_MESSAGE: &str = "Video processing complete";

#[derive(Clone, Debug, Serialize)]
pub struct RunResult {
    pub success: bool,
    pub message: String,
    pub video: VideoSummary,
    pub snapshots_folder: String,
    pub total_detections: usize,
    pub snapshots: Vec<SnapshotRecord>,
    pub species_summary: BTreeMap<String, usize>,
}

#[derive(Clone, Debug, Serialize)]
pub struct VideoSummary {
    pub path: String,
    pub total_frames: u64,
    pub processed_frames: u64,
    pub fps: f64,
    pub duration: f64,
}

impl RunResult {
    pub fn new(
        video_path: &str,
        info: VideoInfo,
        processed_frames: u64,
        snapshots_folder: &str,
        snapshots: Vec<SnapshotRecord>,
    ) -> Self {
        let species_summary = species_summary(&snapshots);
        Self {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
            video: VideoSummary {
                path: video_path.to_string(),
                total_frames: info.total_frames,
                processed_frames,
                fps: info.fps,
                duration: info.duration(),
            },
            snapshots_folder: snapshots_folder.to_string(),
            total_detections: snapshots.len(),
            snapshots,
            species_summary,
        }
    }
}

/// Number of snapshots that contain each species.
pub fn species_summary(snapshots: &[SnapshotRecord]) -> BTreeMap<String, usize> {
    let mut summary = BTreeMap::new();
    for snapshot in snapshots {
        let mut seen: Vec<&str> = snapshot
            .detections
            .iter()
            .map(|d| d.species.as_str())
            .collect();
        seen.sort_unstable();
        seen.dedup();
        for species in seen {
            *summary.entry(species.to_string()).or_insert(0) += 1;
        }
    }
    summary
}

/// Document emitted on stderr when a run fails.
pub fn failure_report(err: &anyhow::Error) -> Value {
    json!({
        "success": false,
        "error": format!("{:#}", err),
        "snapshots": [],
    })
}

/// Document emitted on stdout when the video argument is missing.
pub fn usage_report(program: &str) -> Value {
    json!({ "error": format!("Usage: {} <video_path>", program) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BoundingBox, Detection};
    use crate::snapshot::AlertLevel;
    use anyhow::{anyhow, Context};

    fn snapshot(species: &[&str]) -> SnapshotRecord {
        SnapshotRecord {
            file: "x.jpg".into(),
            path: "/snapshots/x.jpg".into(),
            frame: 5,
            timestamp: 0.2,
            detections: species
                .iter()
                .map(|s| Detection {
                    species: s.to_string(),
                    confidence: 0.9,
                    bbox: BoundingBox {
                        x1: 0,
                        y1: 0,
                        x2: 1,
                        y2: 1,
                    },
                })
                .collect(),
            alert_level: AlertLevel::Medium,
        }
    }

    #[test]
    fn summary_counts_snapshots_not_boxes() {
        let summary = species_summary(&[
            snapshot(&["lion", "lion"]),
            snapshot(&["zebra"]),
            snapshot(&["lion"]),
        ]);
        assert_eq!(summary.get("lion"), Some(&2));
        assert_eq!(summary.get("zebra"), Some(&1));
        assert_eq!(summary.len(), 2);
    }

    #[test]
    fn result_serializes_video_block() {
        let info = VideoInfo {
            total_frames: 900,
            fps: 30.0,
        };
        let result = RunResult::new("clip.mp4", info, 180, "snapshots", vec![snapshot(&["lion"])]);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Video processing complete");
        assert_eq!(json["video"]["duration"], 30.0);
        assert_eq!(json["video"]["processed_frames"], 180);
        assert_eq!(json["total_detections"], 1);
        assert_eq!(json["species_summary"]["lion"], 1);
    }

    #[test]
    fn failure_report_carries_error_chain() {
        let err = Err::<(), _>(anyhow!("file missing"))
            .context("Video file not found: clip.mp4")
            .unwrap_err();
        let json = failure_report(&err);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Video file not found: clip.mp4: file missing");
        assert_eq!(json["snapshots"], serde_json::json!([]));
    }
}
