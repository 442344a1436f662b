use serde::{Deserialize, Serialize};
use crate::common::{AlprError, BoundingBox};
use crate::detection_runners::ort_detector::nms::Nms;

#[derive(Deserialize)]
struct RawDetection {
    bounding_box: BoundingBox,
    confidence: f32,
    label: String,
    #[serde(default)]
    class_id: usize,
}

/// One detected plate region, as produced by a detector adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDetection")]
pub struct DetectionResult {
    bounding_box: BoundingBox,
    confidence: f32,
    label: String,
    class_id: usize,
}

impl TryFrom<RawDetection> for DetectionResult {
    type Error = AlprError;

    fn try_from(raw: RawDetection) -> Result<Self, Self::Error> {
        Ok(DetectionResult::new(raw.bounding_box, raw.confidence, &raw.label)?.with_class_id(raw.class_id))
    }
}

impl Nms for DetectionResult {
    /// Computes the intersection over union (IoU) between this detection and another.
    fn iou(&self, other: &Self) -> f32 {
        self.bounding_box.iou(&other.bounding_box)
    }

    fn confidence(&self) -> f32 {
        self.confidence
    }

    fn class_id(&self) -> usize {
        self.class_id
    }
}

impl DetectionResult {
    pub fn new(bounding_box: BoundingBox, confidence: f32, label: &str) -> Result<Self, AlprError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(AlprError::invalid_input(format!(
                "detection confidence {confidence} outside [0, 1]"
            )));
        }
        Ok(Self {
            bounding_box,
            confidence,
            label: label.to_string(),
            class_id: 0,
        })
    }

    /// Sets the class ID of the detection.
    pub fn with_class_id(mut self, class_id: usize) -> Self {
        self.class_id = class_id;
        self
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn class_id(&self) -> usize {
        self.class_id
    }

    /// Same detection with its box clamped into a `width x height` frame.
    pub(crate) fn clamped(&self, width: u32, height: u32) -> Option<Self> {
        let bounding_box = self.bounding_box.clamp_to(width, height)?;
        Some(Self {
            bounding_box,
            ..self.clone()
        })
    }
}
