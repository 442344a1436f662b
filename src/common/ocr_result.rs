use serde::{Deserialize, Serialize};
use crate::common::AlprError;

#[derive(Deserialize)]
struct RawOcr {
    text: String,
    confidence: f32,
    #[serde(default)]
    char_confidences: Vec<f32>,
}

/// Text read from a single plate crop.
///
/// `confidence` is the mean of `char_confidences`, one score per emitted character.
/// An unreadable plate is `("", 0.0, [])`, not an error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawOcr")]
pub struct OcrResult {
    text: String,
    confidence: f32,
    char_confidences: Vec<f32>,
}

impl TryFrom<RawOcr> for OcrResult {
    type Error = AlprError;

    fn try_from(raw: RawOcr) -> Result<Self, Self::Error> {
        if raw.char_confidences.is_empty() {
            return OcrResult::new(&raw.text, raw.confidence);
        }
        let result = OcrResult::from_chars(&raw.text, raw.char_confidences)?;
        if (result.confidence - raw.confidence).abs() > 1e-4 {
            return Err(AlprError::invalid_input(format!(
                "OCR confidence {} is not the mean {} of its character confidences",
                raw.confidence, result.confidence
            )));
        }
        Ok(result)
    }
}

impl OcrResult {
    pub fn new(text: &str, confidence: f32) -> Result<Self, AlprError> {
        check_unit("OCR confidence", confidence)?;
        Ok(Self {
            text: text.to_string(),
            confidence,
            char_confidences: Vec::new(),
        })
    }

    /// Builds a result from per-character scores; the scalar confidence is their mean.
    pub fn from_chars(text: &str, char_confidences: Vec<f32>) -> Result<Self, AlprError> {
        for &c in char_confidences.iter() {
            check_unit("character confidence", c)?;
        }
        let confidence = if char_confidences.is_empty() {
            0.0
        } else {
            (char_confidences.iter().sum::<f32>() / char_confidences.len() as f32).clamp(0.0, 1.0)
        };
        Ok(Self {
            text: text.to_string(),
            confidence,
            char_confidences,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn char_confidences(&self) -> &[f32] {
        &self.char_confidences
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

fn check_unit(what: &str, x: f32) -> Result<(), AlprError> {
    if (0.0..=1.0).contains(&x) {
        Ok(())
    } else {
        Err(AlprError::invalid_input(format!("{what} {x} outside [0, 1]")))
    }
}
