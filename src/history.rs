//! Rolling detection history persisted as a JSON array.
//!
//! The file is read once per run and rewritten only when the run produced at
//! least one snapshot. It keeps the most recent `limit` entries.
//!
//! Entries are carried as raw JSON values between load and rewrite, so entries
//! written by other tools (or older versions) survive untouched.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::snapshot::{write_atomic, SnapshotRecord};

pub const DEFAULT_HISTORY_PATH: &str = "detection_history.json";
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    /// Source video file name, without directories.
    pub video: String,
    /// Wall-clock time the entry was recorded (ISO-8601, local).
    pub timestamp: String,
    pub snapshot: SnapshotRecord,
    /// Video time of the detection, in seconds.
    pub detected_at: f64,
}

pub struct HistoryStore {
    path: PathBuf,
    limit: usize,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the existing history as raw entries.
    ///
    /// A missing file, unparseable JSON or a top-level value that is not an
    /// array yields an empty history. The unreadable file is overwritten by the
    /// next successful append.
    pub fn load(&self) -> Vec<Value> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                log::debug!("no detection history at {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                log::warn!(
                    "ignoring detection history {}: not a JSON array",
                    self.path.display()
                );
                Vec::new()
            }
            Err(e) => {
                log::warn!(
                    "ignoring unreadable detection history {}: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Entries that match the `HistoryEntry` shape, in file order.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.load()
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect()
    }

    /// Append one entry per snapshot, cap the history and rewrite the file.
    ///
    /// Does nothing (and does not touch the file) when `snapshots` is empty.
    /// Returns the number of entries appended.
    pub fn append(
        &self,
        mut history: Vec<Value>,
        video_path: &str,
        snapshots: &[SnapshotRecord],
        recorded_at: DateTime<Local>,
    ) -> Result<usize> {
        if snapshots.is_empty() {
            return Ok(0);
        }

        let video = video_file_name(video_path);
        let timestamp = recorded_at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        let mut next_id = next_id(&history);
        for snapshot in snapshots {
            let entry = HistoryEntry {
                id: next_id,
                video: video.clone(),
                timestamp: timestamp.clone(),
                snapshot: snapshot.clone(),
                detected_at: snapshot.timestamp,
            };
            history.push(serde_json::to_value(entry)?);
            next_id += 1;
        }

        if history.len() > self.limit {
            history.drain(..history.len() - self.limit);
        }

        let json = serde_json::to_vec_pretty(&history)?;
        write_atomic(&self.path, &json).with_context(|| {
            format!(
                "failed to write detection history {}",
                self.path.display()
            )
        })?;
        Ok(snapshots.len())
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_PATH, DEFAULT_HISTORY_LIMIT)
    }
}

/// Ids continue past the highest numeric id so they stay consecutive after
/// older entries are evicted. Entries without one only count by position.
fn next_id(history: &[Value]) -> u64 {
    let by_position = history.len() as u64 + 1;
    history
        .iter()
        .filter_map(|entry| entry.get("id").and_then(Value::as_u64))
        .max()
        .map_or(by_position, |max_id| (max_id + 1).max(by_position))
}

fn video_file_name(video_path: &str) -> String {
    Path::new(video_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| video_path.to_string())
}
