//! Snapshot storage for admitted detections.
//!
//! Snapshots are annotated, downsampled JPEGs written under a fixed local
//! directory. Each write returns the `SnapshotRecord` that ends up in the run
//! result and in the detection history.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::detect::Detection;

/// Fixed local snapshot path, relative to the working directory.
pub const DEFAULT_SNAPSHOT_DIR: &str = "snapshots";
/// URL prefix under which the web backend serves the snapshot directory.
pub const DEFAULT_PUBLIC_PREFIX: &str = "/snapshots";
pub const DEFAULT_MAX_WIDTH: u32 = 480;
pub const DEFAULT_MAX_HEIGHT: u32 = 480;
pub const DEFAULT_JPEG_QUALITY: u8 = 70;

/// Species that raise a high alert.
pub const DEFAULT_HIGH_ALERT_SPECIES: [&str; 3] = ["lion", "elephant", "buffalo"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    High,
    Medium,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::High => "high",
            AlertLevel::Medium => "medium",
        }
    }
}

/// Metadata for one written snapshot. Detections cover a single species.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub file: String,
    pub path: String,
    pub frame: u64,
    /// Video time in seconds.
    pub timestamp: f64,
    pub detections: Vec<Detection>,
    pub alert_level: AlertLevel,
}

#[derive(Clone, Debug)]
pub struct SnapshotSettings {
    pub dir: PathBuf,
    pub public_prefix: String,
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
    pub high_alert_species: Vec<String>,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            high_alert_species: DEFAULT_HIGH_ALERT_SPECIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

pub struct SnapshotWriter {
    settings: SnapshotSettings,
}

impl SnapshotWriter {
    /// Create the writer, creating the snapshot directory if needed.
    pub fn new(settings: SnapshotSettings) -> Result<Self> {
        fs::create_dir_all(&settings.dir).with_context(|| {
            format!(
                "failed to create snapshot directory {}",
                settings.dir.display()
            )
        })?;
        Ok(Self { settings })
    }

    pub fn dir(&self) -> &Path {
        &self.settings.dir
    }

    pub fn alert_level(&self, species: &str) -> AlertLevel {
        if self
            .settings
            .high_alert_species
            .iter()
            .any(|s| s == species)
        {
            AlertLevel::High
        } else {
            AlertLevel::Medium
        }
    }

    /// Downsample, encode and store an annotated frame for one species.
    pub fn write(
        &self,
        annotated: &RgbImage,
        species: &str,
        frame_index: u64,
        video_time: f64,
        detections: Vec<Detection>,
        captured_at: DateTime<Local>,
    ) -> Result<SnapshotRecord> {
        let file = snapshot_file_name(species, &captured_at, frame_index);
        let target = self.settings.dir.join(&file);

        let (width, height) = annotated.dimensions();
        let (out_w, out_h) = fit_within(
            width,
            height,
            self.settings.max_width,
            self.settings.max_height,
        );
        let encoded = if (out_w, out_h) == (width, height) {
            encode_jpeg(annotated, self.settings.jpeg_quality)?
        } else {
            let resized = imageops::resize(annotated, out_w, out_h, FilterType::Triangle);
            encode_jpeg(&resized, self.settings.jpeg_quality)?
        };
        write_atomic(&target, &encoded)
            .with_context(|| format!("failed to write snapshot {}", target.display()))?;

        Ok(SnapshotRecord {
            path: format!("{}/{}", self.settings.public_prefix.trim_end_matches('/'), file),
            file,
            frame: frame_index,
            timestamp: video_time,
            detections,
            alert_level: self.alert_level(species),
        })
    }
}

/// Output geometry that fits `max_w x max_h`, preserving aspect ratio.
///
/// Never upscales. Dimensions are truncated and never drop below one pixel.
pub fn fit_within(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let scale = (max_w as f64 / width as f64)
        .min(max_h as f64 / height as f64)
        .min(1.0);
    if scale < 1.0 {
        let out_w = ((width as f64 * scale) as u32).clamp(1, max_w.max(1));
        let out_h = ((height as f64 * scale) as u32).clamp(1, max_h.max(1));
        (out_w, out_h)
    } else {
        (width, height)
    }
}

/// `{species}_{YYYYmmdd_HHMMSS}_frame{N}.jpg`, with the species reduced to a
/// filesystem-safe token.
pub fn snapshot_file_name(species: &str, captured_at: &DateTime<Local>, frame_index: u64) -> String {
    format!(
        "{}_{}_frame{}.jpg",
        sanitize_species(species),
        captured_at.format("%Y%m%d_%H%M%S"),
        frame_index
    )
}

fn sanitize_species(species: &str) -> String {
    let cleaned: String = species
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode_image(image)
        .context("jpeg encode failed")?;
    Ok(buf)
}

pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::BoundingBox;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    fn lion() -> Detection {
        Detection {
            species: "lion".into(),
            confidence: 0.8,
            bbox: BoundingBox {
                x1: 10,
                y1: 10,
                x2: 50,
                y2: 40,
            },
        }
    }

    #[test]
    fn fit_within_never_upscales() {
        assert_eq!(fit_within(320, 240, 480, 480), (320, 240));
        assert_eq!(fit_within(480, 480, 480, 480), (480, 480));
    }

    #[test]
    fn fit_within_respects_caps_and_aspect() {
        for (w, h) in [(1920, 1080), (1080, 1920), (1000, 999), (641, 3), (5000, 480)] {
            let (out_w, out_h) = fit_within(w, h, 480, 480);
            assert!(out_w <= 480 && out_h <= 480, "{w}x{h} -> {out_w}x{out_h}");
            // Truncation can shift the ratio by at most one pixel on each side.
            let expected_h = out_w as f64 * h as f64 / w as f64;
            assert!((out_h as f64 - expected_h).abs() <= 1.0, "{w}x{h} -> {out_w}x{out_h}");
        }
        assert_eq!(fit_within(1920, 1080, 480, 480), (480, 270));
    }

    #[test]
    fn fit_within_keeps_one_pixel_minimum() {
        let (out_w, out_h) = fit_within(4000, 1, 480, 480);
        assert!((479..=480).contains(&out_w));
        assert_eq!(out_h, 1);
    }

    #[test]
    fn file_name_is_deterministic() {
        assert_eq!(
            snapshot_file_name("lion", &fixed_time(), 150),
            "lion_20240309_140507_frame150.jpg"
        );
        assert_eq!(
            snapshot_file_name("wild dog/../x", &fixed_time(), 5),
            "wild_dog____x_20240309_140507_frame5.jpg"
        );
    }

    #[test]
    fn alert_level_uses_allow_list() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(SnapshotSettings {
            dir: dir.path().join("snaps"),
            ..SnapshotSettings::default()
        })
        .unwrap();
        assert_eq!(writer.alert_level("lion"), AlertLevel::High);
        assert_eq!(writer.alert_level("buffalo"), AlertLevel::High);
        assert_eq!(writer.alert_level("zebra"), AlertLevel::Medium);
        assert_eq!(AlertLevel::High.as_str(), "high");
    }

    #[test]
    fn write_downsamples_and_records_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(SnapshotSettings {
            dir: dir.path().join("snaps"),
            ..SnapshotSettings::default()
        })
        .unwrap();
        let frame = RgbImage::from_pixel(960, 540, image::Rgb([20, 120, 40]));

        let record = writer
            .write(&frame, "lion", 150, 5.0, vec![lion()], fixed_time())
            .unwrap();

        assert_eq!(record.file, "lion_20240309_140507_frame150.jpg");
        assert_eq!(record.path, "/snapshots/lion_20240309_140507_frame150.jpg");
        assert_eq!(record.frame, 150);
        assert_eq!(record.timestamp, 5.0);
        assert_eq!(record.alert_level, AlertLevel::High);
        assert_eq!(record.detections, vec![lion()]);

        let stored = image::open(dir.path().join("snaps").join(&record.file)).unwrap();
        assert_eq!((stored.width(), stored.height()), (480, 270));
        assert!(!dir.path().join("snaps").join("lion_20240309_140507_frame150.tmp").exists());
    }

    #[test]
    fn write_keeps_small_frames_at_original_size() {
        let dir = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(SnapshotSettings {
            dir: dir.path().to_path_buf(),
            ..SnapshotSettings::default()
        })
        .unwrap();
        let frame = RgbImage::from_pixel(64, 48, image::Rgb([200, 10, 10]));
        let record = writer
            .write(&frame, "zebra", 10, 0.3, vec![], fixed_time())
            .unwrap();
        let stored = image::open(dir.path().join(&record.file)).unwrap();
        assert_eq!((stored.width(), stored.height()), (64, 48));
        assert_eq!(record.alert_level, AlertLevel::Medium);
    }

    #[test]
    fn record_serializes_with_lowercase_alert_level() {
        let record = SnapshotRecord {
            file: "a.jpg".into(),
            path: "/snapshots/a.jpg".into(),
            frame: 5,
            timestamp: 0.5,
            detections: vec![lion()],
            alert_level: AlertLevel::Medium,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["alert_level"], "medium");
        assert_eq!(json["detections"][0]["species"], "lion");
    }
}
