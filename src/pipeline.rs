//! Frame loop: sampling, detection, cooldown, snapshots and alerts.
//!
//! All per-run state lives in `RunContext`. The pipeline itself only borrows
//! its collaborators, so tests can drive it with a stub detector, a synthetic
//! source and a recording notifier.

use anyhow::Result;
use chrono::Local;

use crate::cooldown::CooldownGate;
use crate::detect::{detect_frame, Detection, DetectorBackend};
use crate::frame::{annotate, Frame};
use crate::ingest::{FrameSampler, FrameSource};
use crate::notify::Notifier;
use crate::snapshot::{SnapshotRecord, SnapshotWriter};

#[derive(Clone, Debug)]
pub struct PipelineSettings {
    pub confidence_threshold: f32,
    pub frame_skip: u64,
    pub cooldown_secs: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.50,
            frame_skip: 5,
            cooldown_secs: 180.0,
        }
    }
}

/// Mutable state of a single run.
#[derive(Debug)]
pub struct RunContext {
    pub cooldown: CooldownGate,
    pub snapshots: Vec<SnapshotRecord>,
    pub processed_frames: u64,
}

impl RunContext {
    pub fn new(cooldown_secs: f64) -> Self {
        Self {
            cooldown: CooldownGate::new(cooldown_secs),
            snapshots: Vec::new(),
            processed_frames: 0,
        }
    }
}

pub struct Pipeline<'a> {
    settings: PipelineSettings,
    detector: &'a mut dyn DetectorBackend,
    writer: &'a SnapshotWriter,
    notifier: &'a mut dyn Notifier,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        settings: PipelineSettings,
        detector: &'a mut dyn DetectorBackend,
        writer: &'a SnapshotWriter,
        notifier: &'a mut dyn Notifier,
    ) -> Self {
        Self {
            settings,
            detector,
            writer,
            notifier,
        }
    }

    /// Run the source to exhaustion.
    ///
    /// The first error aborts the run. Snapshots written before the error stay
    /// on disk.
    pub fn run(&mut self, source: &mut dyn FrameSource) -> Result<RunContext> {
        let fps = source.info().fps;
        let mut ctx = RunContext::new(self.settings.cooldown_secs);
        for frame in FrameSampler::new(source, self.settings.frame_skip) {
            let frame = frame?;
            self.process_frame(&mut ctx, &frame, fps)?;
        }
        Ok(ctx)
    }

    /// Handle one sampled frame.
    pub fn process_frame(&mut self, ctx: &mut RunContext, frame: &Frame, fps: f64) -> Result<()> {
        ctx.processed_frames += 1;

        let detections = detect_frame(
            &mut *self.detector,
            frame,
            self.settings.confidence_threshold,
        )?;
        if detections.is_empty() {
            return Ok(());
        }

        let now = frame.video_time(fps);
        let admitted = ctx.cooldown.admit_frame(&detections, now);
        if admitted.is_empty() {
            return Ok(());
        }

        // Every box in the frame is drawn, whichever species is admitted.
        let annotated = annotate(frame, &detections);
        for species in admitted {
            let species_detections: Vec<Detection> = detections
                .iter()
                .filter(|d| d.species == species)
                .cloned()
                .collect();
            let best = species_detections
                .iter()
                .map(|d| d.confidence)
                .fold(0.0, f64::max);

            let record = self.writer.write(
                &annotated,
                &species,
                frame.index,
                now,
                species_detections,
                Local::now(),
            )?;
            self.send_alert(&species, &record);
            log::info!(
                "snapshot saved: {} at {:.1}s (frame {}, conf: {})",
                species,
                now,
                frame.index,
                best
            );
            ctx.snapshots.push(record);
        }
        Ok(())
    }

    fn send_alert(&mut self, species: &str, record: &SnapshotRecord) {
        match self
            .notifier
            .notify(species, &record.path, record.alert_level)
        {
            Ok(()) => log::info!("push notification sent for {}", species),
            Err(e) => log::warn!("failed to send push notification for {}: {:#}", species, e),
        }
    }
}
