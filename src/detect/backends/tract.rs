#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::ModelDetection;
use crate::frame::Frame;

const INPUT_SIZE: u32 = 640;
const NMS_IOU_THRESHOLD: f32 = 0.45;

type TractPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>;

/// Tract-based backend for YOLO-style ONNX detectors.
///
/// Expects a single `[1, 4 + C, N]` output where the first four rows hold
/// `cx, cy, w, h` in model input pixels and the remaining `C` rows hold per-class
/// scores. The model is loaded from a local file; inference does no I/O.
pub struct TractBackend {
    model: TractPlan,
    labels: Vec<String>,
    width: u32,
    height: u32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, labels: Vec<String>) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            labels,
            width: INPUT_SIZE,
            height: INPUT_SIZE,
        })
    }

    fn build_input(&self, frame: &Frame) -> Tensor {
        let resized = imageops::resize(&frame.image, self.width, self.height, FilterType::Triangle);
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, self.height as usize, self.width as usize),
            |(_, channel, y, x)| resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0,
        );
        input.into_tensor()
    }

    fn label(&self, class_id: usize) -> String {
        self.labels
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{class_id}"))
    }

    fn decode(
        &self,
        outputs: TVec<TValue>,
        frame: &Frame,
        confidence_threshold: f32,
    ) -> Result<Vec<ModelDetection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let shape = view.shape().to_vec();
        let view = view
            .into_dimensionality::<tract_ndarray::Ix3>()
            .with_context(|| format!("unexpected model output shape {:?}", shape))?;
        let (batch, rows, anchors) = view.dim();
        if batch != 1 || rows <= 4 {
            return Err(anyhow!("unexpected model output shape {:?}", shape));
        }
        let classes = rows - 4;

        let sx = frame.width() as f32 / self.width as f32;
        let sy = frame.height() as f32 / self.height as f32;

        let mut candidates = Vec::new();
        for i in 0..anchors {
            let (mut best_score, mut best_class) = (0.0f32, 0usize);
            for class_id in 0..classes {
                let score = view[[0, 4 + class_id, i]];
                if score > best_score {
                    best_score = score;
                    best_class = class_id;
                }
            }
            if best_score < confidence_threshold {
                continue;
            }
            let (cx, cy, w, h) = (
                view[[0, 0, i]],
                view[[0, 1, i]],
                view[[0, 2, i]],
                view[[0, 3, i]],
            );
            candidates.push((
                best_class,
                ModelDetection {
                    class_name: self.label(best_class),
                    confidence: best_score,
                    x1: (cx - w / 2.0) * sx,
                    y1: (cy - h / 2.0) * sy,
                    x2: (cx + w / 2.0) * sx,
                    y2: (cy + h / 2.0) * sy,
                },
            ));
        }

        Ok(non_max_suppression(candidates, NMS_IOU_THRESHOLD))
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, frame: &Frame, confidence_threshold: f32) -> Result<Vec<ModelDetection>> {
        let input = self.build_input(frame);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode(outputs, frame, confidence_threshold)
    }
}

fn iou(a: &ModelDetection, b: &ModelDetection) -> f32 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);
    if x2 <= x1 || y2 <= y1 {
        return 0.0;
    }
    let inter = (x2 - x1) * (y2 - y1);
    let area_a = (a.x2 - a.x1) * (a.y2 - a.y1);
    let area_b = (b.x2 - b.x1) * (b.y2 - b.y1);
    inter / (area_a + area_b - inter)
}

/// Class-aware greedy NMS, highest confidence first.
fn non_max_suppression(
    mut candidates: Vec<(usize, ModelDetection)>,
    threshold: f32,
) -> Vec<ModelDetection> {
    candidates.sort_by(|a, b| b.1.confidence.total_cmp(&a.1.confidence));
    let mut suppressed = vec![false; candidates.len()];
    let mut keep = Vec::new();
    for i in 0..candidates.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(candidates[i].1.clone());
        for j in (i + 1)..candidates.len() {
            if suppressed[j] || candidates[i].0 != candidates[j].0 {
                continue;
            }
            if iou(&candidates[i].1, &candidates[j].1) > threshold {
                suppressed[j] = true;
            }
        }
    }
    keep
}
