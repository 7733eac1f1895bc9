//! Synthetic frame source for tests and demos.
//!
//! Produces a deterministic moving gradient with the requested geometry. No
//! file is opened.

use anyhow::{anyhow, Result};
use image::RgbImage;

use super::{FrameSource, VideoInfo};
use crate::frame::Frame;

pub struct SyntheticSource {
    width: u32,
    height: u32,
    info: VideoInfo,
    frame_count: u64,
    fail_at: Option<u64>,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, fps: f64, total_frames: u64) -> Self {
        Self {
            width,
            height,
            info: VideoInfo { total_frames, fps },
            frame_count: 0,
            fail_at: None,
        }
    }

    /// Simulate a decode error when the given frame index is reached.
    pub fn failing_at(mut self, frame_index: u64) -> Self {
        self.fail_at = Some(frame_index);
        self
    }

    fn generate_image(&self) -> RgbImage {
        let shift = self.frame_count;
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let base = (x as u64 + y as u64 + shift) % 256;
            image::Rgb([base as u8, (base / 2) as u8, 255 - base as u8])
        })
    }
}

impl FrameSource for SyntheticSource {
    fn info(&self) -> VideoInfo {
        self.info
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.frame_count >= self.info.total_frames {
            return Ok(None);
        }
        self.frame_count += 1;
        if self.fail_at == Some(self.frame_count) {
            return Err(anyhow!("synthetic decode error at frame {}", self.frame_count));
        }
        Ok(Some(Frame::new(self.frame_count, self.generate_image())))
    }
}
