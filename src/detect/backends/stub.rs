use std::ops::RangeInclusive;

use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::ModelDetection;
use crate::frame::Frame;

/// Stub backend for testing. Replays scripted detections by frame index.
#[derive(Default)]
pub struct StubBackend {
    script: Vec<(RangeInclusive<u64>, ModelDetection)>,
    fail_at: Option<u64>,
    calls: u64,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `detection` on every frame whose index falls in `frames`.
    pub fn with_detection(mut self, frames: RangeInclusive<u64>, detection: ModelDetection) -> Self {
        self.script.push((frames, detection));
        self
    }

    /// Fail inference when the given frame index is reached.
    pub fn failing_at(mut self, frame_index: u64) -> Self {
        self.fail_at = Some(frame_index);
        self
    }

    /// Number of frames this backend has been asked to process.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, frame: &Frame, _confidence_threshold: f32) -> Result<Vec<ModelDetection>> {
        self.calls += 1;
        if self.fail_at == Some(frame.index) {
            return Err(anyhow!("scripted failure at frame {}", frame.index));
        }
        Ok(self
            .script
            .iter()
            .filter(|(frames, _)| frames.contains(&frame.index))
            .map(|(_, detection)| detection.clone())
            .collect())
    }
}
