use anyhow::Result;

use crate::detect::result::ModelDetection;
use crate::frame::Frame;

/// Detector backend trait.
///
/// A backend wraps one pretrained model. It receives a decoded RGB frame and
/// returns raw model output in frame pixel coordinates. Rounding, species
/// naming and thresholding rules live in the adapter, not here.
pub trait DetectorBackend {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    ///
    /// Backends may use `confidence_threshold` to prune candidates early. The
    /// adapter re-applies it, so returning extra low-confidence boxes is harmless.
    fn detect(&mut self, frame: &Frame, confidence_threshold: f32) -> Result<Vec<ModelDetection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
