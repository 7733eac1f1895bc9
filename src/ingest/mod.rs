//! Frame ingestion sources.
//!
//! This module provides the sources of decoded frames:
//! - Local video files (feature: ingest-file-ffmpeg)
//! - Synthetic source (testing, demos)
//!
//! Every source yields `Frame`s with 1-based indexes in decode order and
//! reports the container's frame count and frame rate up front.
//! `FrameSampler` sits on top of any source and applies the frame-skip policy.
//!
//! Sources release their decoder state on drop, so every exit path of a run
//! closes the video.

use anyhow::Result;

pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;
pub mod sampler;
pub mod synthetic;

pub use file::FileSource;
pub use sampler::FrameSampler;
pub use synthetic::SyntheticSource;

use crate::frame::Frame;

/// Container-level properties of a video.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VideoInfo {
    /// Frame count reported by the container (may be an estimate).
    pub total_frames: u64,
    /// Frames per second. Zero when the container does not report one.
    pub fps: f64,
}

impl VideoInfo {
    /// Video length in seconds, zero when the frame rate is unknown.
    pub fn duration(&self) -> f64 {
        if self.fps > 0.0 {
            self.total_frames as f64 / self.fps
        } else {
            0.0
        }
    }
}

/// A finite, ordered, non-restartable stream of frames.
pub trait FrameSource {
    fn info(&self) -> VideoInfo;

    /// Next frame, or `None` once the video is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}
