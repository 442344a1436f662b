use serde::{Deserialize, Serialize};
use crate::common::{DetectionResult, OcrResult};

/// A detected plate paired with what the OCR adapter read from it.
///
/// `ocr` is `None` when no OCR adapter is configured or recognition failed for this crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateResult {
    pub detection: DetectionResult,
    pub ocr: Option<OcrResult>,
}

impl PlateResult {
    pub fn new(detection: DetectionResult, ocr: Option<OcrResult>) -> Self {
        Self { detection, ocr }
    }

    pub fn text(&self) -> Option<&str> {
        self.ocr.as_ref().map(|ocr| ocr.text())
    }
}
