mod plate_decoder;
mod preprocess_trace;

pub use plate_decoder::*;
pub use preprocess_trace::*;

use anyhow::Result;
use crate::common::{AlprError, AlprImage, OcrConfig, OcrResult};
use crate::data::X;
use crate::detection_runners::image_ops::PlateInput;
use crate::detection_runners::inference_process::InferenceProcess;
use crate::detection_runners::OrtEngine;

/// Fixed-slot plate recogniser backed by an ONNX Runtime session.
pub struct OrtPlateOcr {
    engine: OrtEngine,
    config: OcrConfig,
    trace: Option<Box<dyn PreprocessTrace>>,
}

impl std::fmt::Debug for OrtPlateOcr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtPlateOcr")
            .field("engine", &self.engine)
            .field("config", &self.config)
            .field("trace", &self.trace.is_some())
            .finish()
    }
}

impl InferenceProcess for OrtPlateOcr {
    type Input = AlprImage;
    type Output = OcrResult;
    type Config = OcrConfig;

    fn new(config: OcrConfig) -> Result<Self> {
        let engine = OrtEngine::new(&config.config_ort())?;

        // static axes must agree with the configured preprocessing
        let expected = config.input_shape();
        if let Some(dims) = engine.in_dimss().first() {
            let mismatch = dims.len() != expected.len()
                || dims.iter().zip(expected.iter()).any(|(&d, &e)| d != 0 && d != e);
            if mismatch {
                anyhow::bail!("Model input {:?} does not match configured OCR input {:?}", dims, expected);
            }
        }
        let values = config.max_plate_slots * config.alphabet.len();
        if let Some(dims) = engine.out_dimss().first() {
            if dims.iter().all(|&d| d > 0) && dims.iter().product::<usize>() != values {
                anyhow::bail!(
                    "Model output {:?} does not hold {} slots x {} characters",
                    dims,
                    config.max_plate_slots,
                    config.alphabet.len()
                );
            }
        }

        log::info!(
            "Plate OCR | Slots: {} | Alphabet: {} chars (pad {:?}) | Input: {:?}",
            config.max_plate_slots,
            config.alphabet.len(),
            config.alphabet.pad(),
            expected
        );

        Ok(Self {
            engine,
            config,
            trace: None,
        })
    }

    fn preprocess(&mut self, x: &Self::Input) -> Result<Vec<X>> {
        let input = PlateInput::new(x, self.config.input_width, self.config.input_height, self.config.color_mode)?;
        if let Some(trace) = self.trace.as_mut() {
            trace.record_logged(&input.image);
        }
        Ok(vec![input.to_tensor(self.config.layout, self.config.normalize)?])
    }

    fn inference(&mut self, xs: Vec<X>) -> Result<Vec<X>> {
        self.engine.run(xs)
    }

    fn postprocess(&self, ys: Vec<X>, _x0: &Self::Input) -> Result<Self::Output> {
        let y = ys
            .first()
            .ok_or_else(|| anyhow::anyhow!("Model returned no outputs"))?;
        Ok(decode_plate(y.view(), &self.config.alphabet, self.config.max_plate_slots)?)
    }
}

impl OrtPlateOcr {
    /// Loads the session, reporting any failure as `ModelLoad`.
    pub fn load(config: OcrConfig) -> crate::Result<Self> {
        let path = config.model_path.clone();
        if !path.is_file() {
            return Err(AlprError::model_load(path, "model file not found"));
        }
        <Self as InferenceProcess>::new(config).map_err(|e| AlprError::model_load(path, format!("{e:#}")))
    }

    /// Hands every preprocessed crop to `trace` before inference.
    pub fn with_trace(self, trace: impl PreprocessTrace + 'static) -> Self {
        self.with_boxed_trace(Box::new(trace))
    }

    pub fn with_boxed_trace(mut self, trace: Box<dyn PreprocessTrace>) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Runs the full pipeline on one plate crop.
    pub fn recognize(&mut self, crop: &AlprImage) -> crate::Result<OcrResult> {
        crop.ensure_not_empty()?;
        let profile = self.config.profile;
        self.forward(crop, profile)
            .map_err(|e| e.downcast::<AlprError>().unwrap_or_else(AlprError::inference))
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    pub fn engine(&self) -> &OrtEngine {
        &self.engine
    }
}
