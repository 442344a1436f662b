use ndarray::ArrayViewD;
use crate::common::{AlprError, OcrResult, PlateAlphabet};

/// Reads a fixed-slot plate out of the recogniser's probabilities.
///
/// `probs` holds `slots x alphabet.len()` scores in row-major order, either as `(1, slots, vocab)`
/// or flattened to `(1, slots * vocab)`. Each slot takes its first maximal index; pad slots are
/// skipped and repeated characters are kept.
pub fn decode_plate(probs: ArrayViewD<'_, f32>, alphabet: &PlateAlphabet, slots: usize) -> Result<OcrResult, AlprError> {
    let vocab = alphabet.len();
    if slots == 0 || vocab == 0 {
        return Err(AlprError::invalid_input(format!("cannot decode {slots} slots over {vocab} characters")));
    }
    if probs.len() != slots * vocab {
        return Err(AlprError::Inference(format!(
            "OCR output has shape {:?} ({} values), expected {} slots x {} characters",
            probs.shape(),
            probs.len(),
            slots,
            vocab
        )));
    }
    let probs = probs
        .to_shape((slots, vocab))
        .map_err(|e| AlprError::Inference(format!("cannot reshape OCR output: {e}")))?;

    let mut text = String::with_capacity(slots);
    let mut char_confidences = Vec::with_capacity(slots);
    for row in probs.rows() {
        let (index, max) = first_argmax(row.iter().copied());
        let c = alphabet
            .get(index)
            .ok_or_else(|| AlprError::Inference(format!("class index {index} outside the alphabet")))?;
        if c == alphabet.pad() {
            continue;
        }
        text.push(c);
        char_confidences.push(if max.is_nan() { 0. } else { max.clamp(0., 1.) });
    }

    OcrResult::from_chars(&text, char_confidences)
}

/// Index and value of the first maximum.
fn first_argmax(values: impl Iterator<Item = f32>) -> (usize, f32) {
    let mut best = (0, f32::NAN);
    for (i, v) in values.enumerate() {
        if i == 0 || v > best.1 {
            best = (i, v);
        }
    }
    best
}
