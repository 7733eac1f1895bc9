use anyhow::{Context, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::frame::Frame;

/// Run the backend on one sampled frame and normalize its output.
///
/// Candidates under `confidence_threshold` are dropped. An empty vector is a
/// normal outcome.
pub fn detect_frame(
    backend: &mut dyn DetectorBackend,
    frame: &Frame,
    confidence_threshold: f32,
) -> Result<Vec<Detection>> {
    let raw = backend
        .detect(frame, confidence_threshold)
        .with_context(|| format!("{} inference failed on frame {}", backend.name(), frame.index))?;

    Ok(raw
        .iter()
        .filter(|candidate| candidate.confidence >= confidence_threshold)
        .map(Detection::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{ModelDetection, StubBackend};
    use image::RgbImage;

    fn candidate(name: &str, confidence: f32) -> ModelDetection {
        ModelDetection {
            class_name: name.into(),
            confidence,
            x1: 1.0,
            y1: 1.0,
            x2: 5.0,
            y2: 5.0,
        }
    }

    #[test]
    fn drops_candidates_below_threshold() {
        let mut backend = StubBackend::new()
            .with_detection(1..=1, candidate("lion", 0.8))
            .with_detection(1..=1, candidate("zebra", 0.3));
        let frame = Frame::new(1, RgbImage::new(8, 8));

        let dets = detect_frame(&mut backend, &frame, 0.5).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].species, "lion");
    }

    #[test]
    fn empty_output_is_not_an_error() {
        let mut backend = StubBackend::new();
        let frame = Frame::new(3, RgbImage::new(8, 8));
        assert!(detect_frame(&mut backend, &frame, 0.5).unwrap().is_empty());
    }

    #[test]
    fn backend_errors_name_the_frame() {
        let mut backend = StubBackend::new().failing_at(7);
        let frame = Frame::new(7, RgbImage::new(8, 8));
        let err = detect_frame(&mut backend, &frame, 0.5).unwrap_err();
        assert!(format!("{err:#}").contains("frame 7"));
    }
}
