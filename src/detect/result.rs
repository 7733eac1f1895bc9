use serde::{Deserialize, Serialize};

/// Raw output of a detector backend, before normalization.
///
/// Coordinates are corner points in frame pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelDetection {
    pub class_name: String,
    pub confidence: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Normalized detection as reported in snapshots and history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub species: String,
    /// Rounded to three decimals.
    pub confidence: f64,
    pub bbox: BoundingBox,
}

/// Integer pixel box, `(x1, y1)` top-left and `(x2, y2)` bottom-right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl From<&ModelDetection> for Detection {
    fn from(raw: &ModelDetection) -> Self {
        Self {
            species: raw.class_name.clone(),
            confidence: round_confidence(raw.confidence),
            bbox: BoundingBox {
                // Truncation toward zero
                x1: raw.x1 as i32,
                y1: raw.y1 as i32,
                x2: raw.x2 as i32,
                y2: raw.y2 as i32,
            },
        }
    }
}

/// Three decimals, exact halves to even.
fn round_confidence(confidence: f32) -> f64 {
    (confidence as f64 * 1000.0).round_ties_even() / 1000.0
}
