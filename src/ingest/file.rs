//! Local file frame source.
//!
//! This module provides `FileSource` for decoding frames from local video files.
//! The file source is responsible for:
//! - Refusing anything that is not a local path
//! - Reporting frame count and frame rate before the first frame
//! - Decoding frames in order and numbering them from 1
//!
//! Decoding is delegated to FFmpeg (feature: ingest-file-ffmpeg). Without the
//! feature, opening a file fails with a configuration error.

use anyhow::{anyhow, Result};
#[cfg(feature = "ingest-file-ffmpeg")]
use anyhow::Context;
use std::path::Path;

#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegFileSource;
use super::{FrameSource, VideoInfo};
use crate::frame::Frame;

/// Local file frame source.
pub struct FileSource {
    path: String,
    frames_read: u64,
    #[cfg(feature = "ingest-file-ffmpeg")]
    decoder: FfmpegFileSource,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        if !is_local_file_path(&display) {
            return Err(anyhow!(
                "video input only supports local paths (no URL schemes): {}",
                display
            ));
        }
        #[cfg(feature = "ingest-file-ffmpeg")]
        {
            let decoder = FfmpegFileSource::open(path)
                .with_context(|| format!("Could not open video: {}", display))?;
            log::info!("FileSource: opened {} (ffmpeg)", display);
            Ok(Self {
                path: display,
                frames_read: 0,
                decoder,
            })
        }
        #[cfg(not(feature = "ingest-file-ffmpeg"))]
        {
            Err(anyhow!(
                "Could not open video: {} (video decoding requires the ingest-file-ffmpeg feature, build with --features full)",
                display
            ))
        }
    }

    /// Get frame statistics.
    pub fn stats(&self) -> FileStats {
        FileStats {
            frames_read: self.frames_read,
            path: self.path.clone(),
        }
    }
}

impl FrameSource for FileSource {
    fn info(&self) -> VideoInfo {
        #[cfg(feature = "ingest-file-ffmpeg")]
        {
            self.decoder.info()
        }
        #[cfg(not(feature = "ingest-file-ffmpeg"))]
        {
            VideoInfo::default()
        }
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        #[cfg(feature = "ingest-file-ffmpeg")]
        {
            let Some(image) = self.decoder.next_image()? else {
                return Ok(None);
            };
            self.frames_read += 1;
            Ok(Some(Frame::new(self.frames_read, image)))
        }
        #[cfg(not(feature = "ingest-file-ffmpeg"))]
        {
            Ok(None)
        }
    }
}

/// Statistics for a file source.
#[derive(Clone, Debug)]
pub struct FileStats {
    pub frames_read: u64,
    pub path: String,
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    !path.contains("://")
}
