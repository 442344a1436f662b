use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::common::presets::{self, DEFAULT_DETECTOR_MODEL, DEFAULT_OCR_MODEL};
use crate::common::{AlprError, AlprImage, InferenceDevice, PlateResult};
use crate::data::{create_directory, FsAccess};
use crate::detection_runners::{DirectoryTrace, OrtPlateOcr, OrtYoloDetector, PreprocessTrace};
use crate::detectors::{PlateDetector, PlateOcr};

/// Settings of an [`Alpr`] pipeline built from named model presets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlprConfig {
    pub detector_model: Option<String>,
    pub ocr_model: Option<String>,
    /// Where preset weights live, `~/.cache/bvr_alpr/models` when unset.
    pub models_dir: Option<PathBuf>,
    pub ort_lib_path: Option<String>,
    pub device: InferenceDevice,
    pub detector_conf_threshold: f32,
    /// Detections below this confidence never reach OCR or the caller.
    pub detection_floor: f32,
    pub save_cropped_plates: bool,
    pub cropped_plates_dir: PathBuf,
    /// Dump every preprocessed OCR input here. Only valid with a preset OCR model.
    pub ocr_trace_dir: Option<PathBuf>,
    /// ONNX Runtime intra-op threads per session, runtime default when unset.
    pub intra_threads: Option<usize>,
}

impl Default for AlprConfig {
    fn default() -> Self {
        Self {
            detector_model: Some(DEFAULT_DETECTOR_MODEL.to_string()),
            ocr_model: Some(DEFAULT_OCR_MODEL.to_string()),
            models_dir: None,
            ort_lib_path: None,
            device: InferenceDevice::CPU,
            detector_conf_threshold: 0.4,
            detection_floor: 0.0,
            save_cropped_plates: false,
            cropped_plates_dir: PathBuf::from("cropped_plates"),
            ocr_trace_dir: None,
            intra_threads: None,
        }
    }
}

impl AlprConfig {
    /// Reads a JSON config file; missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| AlprError::invalid_input(format!("bad config {}: {}", path.display(), e)))
    }

    fn resolve_models_dir(&self) -> crate::Result<PathBuf> {
        match &self.models_dir {
            Some(dir) => Ok(dir.clone()),
            None => FsAccess::models_dir().map_err(|e| AlprError::invalid_input(format!("{e:#}"))),
        }
    }
}

/// Assembles an [`Alpr`] from presets or caller-supplied adapters, one source per role.
pub struct AlprBuilder {
    config: AlprConfig,
    detector: Option<Box<dyn PlateDetector + Send>>,
    ocr: Option<Box<dyn PlateOcr + Send>>,
    ocr_trace: Option<Box<dyn PreprocessTrace>>,
}

impl Default for AlprBuilder {
    fn default() -> Self {
        Self {
            config: AlprConfig {
                detector_model: None,
                ocr_model: None,
                ..Default::default()
            },
            detector: None,
            ocr: None,
            ocr_trace: None,
        }
    }
}

impl AlprBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Replaces every setting, preset names included.
    pub fn with_config(mut self, config: AlprConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_detector_model(mut self, name: &str) -> Self {
        self.config.detector_model = Some(name.to_string());
        self
    }

    pub fn with_detector(mut self, detector: impl PlateDetector + Send + 'static) -> Self {
        self.detector = Some(Box::new(detector));
        self
    }

    pub fn with_ocr_model(mut self, name: &str) -> Self {
        self.config.ocr_model = Some(name.to_string());
        self
    }

    pub fn with_ocr(mut self, ocr: impl PlateOcr + Send + 'static) -> Self {
        self.ocr = Some(Box::new(ocr));
        self
    }

    /// Hands every preprocessed crop of the preset OCR model to `trace`.
    pub fn with_ocr_trace(mut self, trace: impl PreprocessTrace + 'static) -> Self {
        self.ocr_trace = Some(Box::new(trace));
        self
    }

    pub fn with_ocr_trace_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.ocr_trace_dir = Some(dir.into());
        self
    }

    pub fn with_intra_threads(mut self, n: usize) -> Self {
        self.config.intra_threads = Some(n);
        self
    }

    pub fn with_models_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.models_dir = Some(dir.into());
        self
    }

    pub fn with_ort_lib_path(mut self, ort_lib_path: Option<String>) -> Self {
        self.config.ort_lib_path = ort_lib_path;
        self
    }

    pub fn with_device(mut self, device: InferenceDevice) -> Self {
        self.config.device = device;
        self
    }

    pub fn with_detector_conf_threshold(mut self, x: f32) -> Self {
        self.config.detector_conf_threshold = x;
        self
    }

    pub fn with_detection_floor(mut self, x: f32) -> Self {
        self.config.detection_floor = x;
        self
    }

    pub fn with_cropped_plates_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.save_cropped_plates = true;
        self.config.cropped_plates_dir = dir.into();
        self
    }

    pub fn build(self) -> crate::Result<Alpr> {
        let config = self.config;

        let ocr_trace = self.ocr_trace;
        if ocr_trace.is_some() && config.ocr_trace_dir.is_some() {
            return Err(AlprError::invalid_input("both a custom OCR trace and an OCR trace directory were given"));
        }
        let trace_requested = ocr_trace.is_some() || config.ocr_trace_dir.is_some();

        let detector: Box<dyn PlateDetector + Send> = match (self.detector, &config.detector_model) {
            (Some(_), Some(name)) => {
                return Err(AlprError::invalid_input(format!(
                    "both a custom detector and the detector preset `{name}` were given"
                )))
            }
            (Some(detector), None) => detector,
            (None, Some(name)) => {
                let detector_config = presets::detector_preset(name, &config.resolve_models_dir()?)?
                    .with_ort_lib_path(config.ort_lib_path.clone())
                    .with_device(config.device)
                    .with_intra_threads(config.intra_threads)
                    .with_conf_threshold(config.detector_conf_threshold);
                Box::new(OrtYoloDetector::load(detector_config)?)
            }
            (None, None) => return Err(AlprError::invalid_input("no detector configured")),
        };

        let ocr: Option<Box<dyn PlateOcr + Send>> = match (self.ocr, &config.ocr_model) {
            (Some(_), Some(name)) => {
                return Err(AlprError::invalid_input(format!(
                    "both a custom OCR and the OCR preset `{name}` were given"
                )))
            }
            (Some(_), None) | (None, None) if trace_requested => {
                return Err(AlprError::invalid_input("an OCR trace needs a preset OCR model"))
            }
            (Some(ocr), None) => Some(ocr),
            (None, Some(name)) => {
                let ocr_config = presets::ocr_preset(name, &config.resolve_models_dir()?)?
                    .with_ort_lib_path(config.ort_lib_path.clone())
                    .with_device(config.device)
                    .with_intra_threads(config.intra_threads);
                let mut ocr = OrtPlateOcr::load(ocr_config)?;
                let trace = match (ocr_trace, &config.ocr_trace_dir) {
                    (Some(trace), _) => Some(trace),
                    (None, Some(dir)) => Some(Box::new(DirectoryTrace::new(dir)?) as Box<dyn PreprocessTrace>),
                    (None, None) => None,
                };
                if let Some(trace) = trace {
                    ocr = ocr.with_boxed_trace(trace);
                }
                Some(Box::new(ocr) as Box<dyn PlateOcr + Send>)
            }
            (None, None) => None,
        };

        let crops_dir = if config.save_cropped_plates {
            create_directory(&config.cropped_plates_dir)?;
            Some(config.cropped_plates_dir.clone())
        } else {
            None
        };

        Ok(Alpr {
            detector,
            ocr,
            detection_floor: config.detection_floor,
            crops_dir,
            frames: 0,
        })
    }
}

/// Detect-then-read pipeline: one [`PlateResult`] per detected plate.
pub struct Alpr {
    detector: Box<dyn PlateDetector + Send>,
    ocr: Option<Box<dyn PlateOcr + Send>>,
    detection_floor: f32,
    crops_dir: Option<PathBuf>,
    frames: u64,
}

impl std::fmt::Debug for Alpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alpr")
            .field("ocr", &self.ocr.is_some())
            .field("detection_floor", &self.detection_floor)
            .field("crops_dir", &self.crops_dir)
            .field("frames", &self.frames)
            .finish()
    }
}

impl Alpr {
    /// Builds the pipeline from presets.
    pub fn new(config: AlprConfig) -> crate::Result<Self> {
        AlprBuilder::new().with_config(config).build()
    }

    pub fn builder() -> AlprBuilder {
        AlprBuilder::new()
    }

    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    pub fn predict(&mut self, frame: &AlprImage) -> crate::Result<Vec<PlateResult>> {
        frame.ensure_not_empty()?;
        let frame_index = self.frames;
        self.frames += 1;

        let detections = self.detector.predict(frame)?;
        let (width, height) = frame.dimensions();

        let mut results = Vec::with_capacity(detections.len());
        for (index, detection) in detections.into_iter().enumerate() {
            if detection.confidence() < self.detection_floor {
                continue;
            }
            let Some(detection) = detection.clamped(width, height) else {
                log::warn!(
                    "Skipping detection {:?} outside the {}x{} frame",
                    detection.bounding_box(),
                    width,
                    height
                );
                continue;
            };

            if self.ocr.is_none() && self.crops_dir.is_none() {
                results.push(PlateResult::new(detection, None));
                continue;
            }

            let crop = frame.crop(detection.bounding_box())?;
            if let Some(dir) = &self.crops_dir {
                if let Err(err) = save_crop(dir, &crop, frame_index, index) {
                    log::warn!("Failed to save cropped plate: {err}");
                }
            }

            let ocr = match self.ocr.as_mut() {
                None => None,
                Some(ocr) => match ocr.predict(&crop) {
                    Ok(result) => Some(result),
                    Err(err) => {
                        log::warn!("OCR failed on plate {index} of frame {frame_index}: {err}");
                        None
                    }
                },
            };
            results.push(PlateResult::new(detection, ocr));
        }

        Ok(results)
    }

    /// Decodes `path` and runs [`Alpr::predict`] on it.
    pub fn predict_path<P: AsRef<Path>>(&mut self, path: P) -> crate::Result<Vec<PlateResult>> {
        let frame = AlprImage::open(path)?;
        self.predict(&frame)
    }
}

fn save_crop(dir: &Path, crop: &AlprImage, frame: u64, index: usize) -> crate::Result<PathBuf> {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
    let path = dir.join(format!("plate_{frame}_{index}_{timestamp}.png"));
    crop.to_rgb8()
        .save(&path)
        .map_err(|e| std::io::Error::other(format!("{}: {}", path.display(), e)))?;
    Ok(path)
}
