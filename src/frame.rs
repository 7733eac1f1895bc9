//! Decoded video frames and in-place annotation.
//!
//! - `Frame`: one decoded RGB frame with its 1-based position in the video.
//! - `annotate`: draws labelled detection boxes onto a copy of the frame.
//!
//! Frames are owned by the pipeline for exactly one loop iteration. Only
//! annotated copies ever reach the disk, through the snapshot writer.

use font8x8::legacy::BASIC_LEGACY;
use image::{Rgb, RgbImage};

use crate::detect::Detection;

/// Box outline thickness in pixels at original resolution.
const BOX_THICKNESS: u32 = 3;
/// Glyph cell size of the built-in bitmap font.
const GLYPH_SIZE: u32 = 8;
/// Background padding around label text.
const LABEL_PADDING: u32 = 1;
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

// ----------------------------------------------------------------------------
// Frame
// ----------------------------------------------------------------------------

/// A decoded RGB frame.
pub struct Frame {
    /// 1-based frame number within the source video.
    pub index: u64,
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Position of this frame in video time. Zero when the frame rate is unknown.
    pub fn video_time(&self, fps: f64) -> f64 {
        video_time(self.index, fps)
    }

    /// Packed RGB24 bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }
}

pub fn video_time(frame_index: u64, fps: f64) -> f64 {
    if fps > 0.0 {
        frame_index as f64 / fps
    } else {
        0.0
    }
}

// ----------------------------------------------------------------------------
// Annotation
// ----------------------------------------------------------------------------

/// Returns a copy of the frame with every detection outlined and labelled
/// `species confidence`.
///
/// Boxes are clamped to the image; degenerate boxes are skipped. The label
/// sits above the box, or just inside its top edge when there is no room.
pub fn annotate(frame: &Frame, detections: &[Detection]) -> RgbImage {
    let mut canvas = frame.image.clone();
    for detection in detections {
        let color = species_color(&detection.species);
        if let Some((x1, y1)) = draw_box(&mut canvas, detection, color) {
            let label = format!("{} {:.2}", detection.species, detection.confidence);
            let label_height = GLYPH_SIZE + 2 * LABEL_PADDING;
            let top = y1.checked_sub(label_height).unwrap_or(y1);
            draw_label(&mut canvas, &label, x1, top, color);
        }
    }
    canvas
}

/// Draws the outline and returns its clamped top-left corner.
fn draw_box(canvas: &mut RgbImage, detection: &Detection, color: Rgb<u8>) -> Option<(u32, u32)> {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return None;
    }
    let bbox = &detection.bbox;
    let x1 = bbox.x1.clamp(0, width as i32 - 1) as u32;
    let y1 = bbox.y1.clamp(0, height as i32 - 1) as u32;
    let x2 = bbox.x2.clamp(0, width as i32 - 1) as u32;
    let y2 = bbox.y2.clamp(0, height as i32 - 1) as u32;
    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    for t in 0..BOX_THICKNESS {
        // Horizontal edges
        for x in x1..=x2 {
            if y1 + t <= y2 {
                canvas.put_pixel(x, y1 + t, color);
            }
            if y2 >= y1 + t {
                canvas.put_pixel(x, y2 - t, color);
            }
        }
        // Vertical edges
        for y in y1..=y2 {
            if x1 + t <= x2 {
                canvas.put_pixel(x1 + t, y, color);
            }
            if x2 >= x1 + t {
                canvas.put_pixel(x2 - t, y, color);
            }
        }
    }
    Some((x1, y1))
}

/// Filled label background with 8x8 bitmap text, clipped to the canvas.
fn draw_label(canvas: &mut RgbImage, text: &str, x: u32, y: u32, background: Rgb<u8>) {
    let (width, height) = canvas.dimensions();
    let label_w = text.chars().count() as u32 * GLYPH_SIZE + 2 * LABEL_PADDING;
    let label_h = GLYPH_SIZE + 2 * LABEL_PADDING;
    for py in y..(y + label_h).min(height) {
        for px in x..(x + label_w).min(width) {
            canvas.put_pixel(px, py, background);
        }
    }

    let origin_y = y + LABEL_PADDING;
    for (i, c) in text.chars().enumerate() {
        let glyph = BASIC_LEGACY[if c.is_ascii() { c as usize } else { '?' as usize }];
        let origin_x = x + LABEL_PADDING + i as u32 * GLYPH_SIZE;
        for (row, bits) in glyph.iter().enumerate() {
            for bit in 0..GLYPH_SIZE {
                if bits & (1 << bit) == 0 {
                    continue;
                }
                let (px, py) = (origin_x + bit, origin_y + row as u32);
                if px < width && py < height {
                    canvas.put_pixel(px, py, LABEL_TEXT_COLOR);
                }
            }
        }
    }
}

/// Stable per-species outline color.
pub fn species_color(species: &str) -> Rgb<u8> {
    let mut hash: u32 = 2166136261;
    for byte in species.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16777619);
    }
    // Keep channels bright enough to read against dark footage.
    Rgb([
        128 | (hash & 0x7f) as u8,
        128 | ((hash >> 8) & 0x7f) as u8,
        128 | ((hash >> 16) & 0x7f) as u8,
    ])
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
