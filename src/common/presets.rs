use std::path::Path;
use crate::common::{AlprError, ColorMode, DetectorConfig, ModelVersion, OcrConfig, PlateAlphabet, TensorLayout};

pub const DEFAULT_DETECTOR_MODEL: &str = "yolo-v9-t-384-license-plate-end2end";
pub const DEFAULT_OCR_MODEL: &str = "global-plates-mobile-vit-v2-model";

const PLATE_LABEL: &str = "License Plate";

// (name, square input size)
const DETECTOR_PRESETS: [(&str, u32); 6] = [
    ("yolo-v9-s-608-license-plate-end2end", 608),
    ("yolo-v9-t-640-license-plate-end2end", 640),
    ("yolo-v9-t-512-license-plate-end2end", 512),
    ("yolo-v9-t-416-license-plate-end2end", 416),
    ("yolo-v9-t-384-license-plate-end2end", 384),
    ("yolo-v9-t-256-license-plate-end2end", 256),
];

const LATIN_ALPHABET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_";
const MONGOLIAN_ALPHABET: &str = "0123456789АБВГДЕЁЖЗИЙКЛМНОӨПРСТУҮФХЦЧШЩЪЫЬЭЮЯ-";

const OCR_PRESETS: [&str; 3] = [
    "global-plates-mobile-vit-v2-model",
    "european-plates-mobile-vit-v2-model",
    "mongolian-plates-ocr",
];

pub fn detector_presets() -> Vec<&'static str> {
    DETECTOR_PRESETS.iter().map(|(name, _)| *name).collect()
}

pub fn ocr_presets() -> Vec<&'static str> {
    OCR_PRESETS.to_vec()
}

/// Detector settings for a named preset whose weights live at `<models_dir>/<name>.onnx`.
pub fn detector_preset(name: &str, models_dir: &Path) -> Result<DetectorConfig, AlprError> {
    let model_path = models_dir.join(format!("{name}.onnx"));
    let (_, size) = DETECTOR_PRESETS
        .iter()
        .find(|(preset, _)| *preset == name)
        .ok_or_else(|| {
            AlprError::model_load(&model_path, format!("unknown detector preset; available: {:?}", detector_presets()))
        })?;

    Ok(DetectorConfig::new(model_path)
        .with_model_version(ModelVersion::End2End)
        .with_input_size(*size, *size)
        .with_names(&[PLATE_LABEL])
        .with_letterbox_center(true))
}

/// OCR settings for a named preset whose weights live at `<models_dir>/<name>.onnx`.
pub fn ocr_preset(name: &str, models_dir: &Path) -> Result<OcrConfig, AlprError> {
    let model_path = models_dir.join(format!("{name}.onnx"));
    let config = match name {
        "global-plates-mobile-vit-v2-model" | "european-plates-mobile-vit-v2-model" => {
            // These exports rescale internally and take raw 0..255 intensities.
            OcrConfig::new(model_path, PlateAlphabet::new(LATIN_ALPHABET, '_')?, 9)
                .with_input_size(140, 70)
                .with_color_mode(ColorMode::Grayscale)
                .with_normalize(false)
                .with_layout(TensorLayout::Nhwc)
        }
        "mongolian-plates-ocr" => {
            OcrConfig::new(model_path, PlateAlphabet::new(MONGOLIAN_ALPHABET, '-')?, 10)
                .with_input_size(128, 64)
                .with_color_mode(ColorMode::Grayscale)
                .with_normalize(true)
                .with_layout(TensorLayout::Nhwc)
        }
        _ => {
            return Err(AlprError::model_load(
                model_path,
                format!("unknown OCR preset; available: {:?}", ocr_presets()),
            ))
        }
    };
    Ok(config)
}
