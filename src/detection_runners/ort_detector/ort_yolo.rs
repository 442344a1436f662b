//! File/code adapted from https://github.com/jamjamjon/usls

use anyhow::Result;
use ndarray::{s, ArrayView2, Axis};
use regex::Regex;

use crate::common::{AlprError, AlprImage, BoundingBox, DetectionResult, DetectorConfig, ImageTransformInfo, ModelVersion, YoloPreds};
use crate::data::X;
use crate::detection_runners::inference_process::InferenceProcess;
use crate::detection_runners::ort_detector::image_ops;
use crate::detection_runners::ort_detector::nms::nms;
use crate::detection_runners::ort_detector::OrtEngine;
use crate::utils;

/// YOLO-family plate detector backed by an ONNX Runtime session.
#[derive(Debug)]
pub struct OrtYoloDetector {
    engine: OrtEngine,
    config: DetectorConfig,
    width: u32,
    height: u32,
    names: Vec<String>,
    nc: usize,
    layout: YoloPreds,
    transform: ImageTransformInfo,
}

/// Everything `decode_predictions` needs besides the raw rows.
#[derive(Debug, Clone)]
pub struct DecodeParams<'a> {
    pub layout: &'a YoloPreds,
    pub nc: usize,
    pub names: &'a [String],
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub min_box_side: f32,
    pub input_width: u32,
    pub input_height: u32,
    pub transform: &'a ImageTransformInfo,
}

impl InferenceProcess for OrtYoloDetector {
    type Input = AlprImage;
    type Output = Vec<DetectionResult>;
    type Config = DetectorConfig;

    fn new(config: DetectorConfig) -> Result<Self> {
        let engine = OrtEngine::new(&config.config_ort())?;

        // NCHW input, dynamic axes fall back to the configured size
        let height = engine.input_dim(2).map(|d| d as u32).unwrap_or(config.input_height);
        let width = engine.input_dim(3).map(|d| d as u32).unwrap_or(config.input_width);

        let layout = config.model_version.layout();

        // Class names: user-defined, labels file, onnx metadata
        let names = match (&config.names, &config.labels_path) {
            (Some(names), _) => Some(names.clone()),
            (None, Some(path)) => Some(utils::file_to_vec(path).map_err(|e| {
                anyhow::anyhow!("Failed to read labels file {}: {}", path.display(), e)
            })?),
            (None, None) => Self::fetch_names(&engine)?,
        };

        // nc: columns of the output (one score per class) or names.len()
        let columns = engine.out_dimss().first().and_then(|dims| {
            let dim = if layout.is_anchors_first() { dims.last() } else { dims.get(1) };
            dim.copied().filter(|&d| d > 0)
        });
        let nc_parsed = columns.and_then(|c| layout.nc_from_columns(c));
        let nc = match (&names, nc_parsed) {
            (Some(names), Some(nc)) if names.len() != nc => anyhow::bail!(
                "The model predicts {} classes but {} class names were given.",
                nc,
                names.len(),
            ),
            (_, Some(nc)) => nc,
            (Some(names), None) => names.len(),
            (None, None) if layout.is_cls_type() => 0,
            (None, None) => anyhow::bail!(
                "Unable to obtain the number of classes. Please specify them explicitly with class names or a labels file."
            ),
        };

        let names = match names {
            Some(names) => names,
            None => Self::n2s(nc),
        };

        log::info!(
            "YOLO Version: {} | Input: {}x{} | Classes: {:?}",
            config.model_version.name(),
            width,
            height,
            names
        );

        Ok(Self {
            engine,
            config,
            width,
            height,
            names,
            nc,
            layout,
            transform: ImageTransformInfo::default(),
        })
    }

    fn preprocess(&mut self, x: &Self::Input) -> Result<Vec<X>> {
        let (x, transform) = image_ops::detector_tensor(
            x,
            self.config.channel_order,
            self.width,
            self.height,
            self.config.letterbox_center,
        )?;
        self.transform = transform;
        Ok(vec![x])
    }

    fn inference(&mut self, xs: Vec<X>) -> Result<Vec<X>> {
        self.engine.run(xs)
    }

    fn postprocess(&self, ys: Vec<X>, _x0: &Self::Input) -> Result<Self::Output> {
        let y = ys
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Model returned no outputs"))?;

        // end2end exports drop the batch axis
        let y = if y.ndim() == 2 { y.insert_batch_axis() } else { y };
        let preds = y.batch_view2(0)?;

        decode_predictions(preds, &DecodeParams {
            layout: &self.layout,
            nc: self.nc,
            names: &self.names,
            conf_threshold: self.config.conf_threshold,
            iou_threshold: self.config.iou_threshold,
            min_box_side: self.config.min_box_side,
            input_width: self.width,
            input_height: self.height,
            transform: &self.transform,
        })
    }
}

/// Turns one image's raw prediction rows into detections in source-frame coordinates.
///
/// Rows below the threshold, with non-finite values, or whose box collapses or falls under
/// `min_box_side` once clamped into the frame are dropped. Output keeps model order unless the
/// layout needs NMS.
pub fn decode_predictions(preds: ArrayView2<'_, f32>, params: &DecodeParams<'_>) -> Result<Vec<DetectionResult>> {
    let slices = params.layout.parse_preds(preds, params.nc)?;
    let transform = params.transform;

    let mut detections = Vec::new();
    for (i, bbox) in slices.bboxes.axis_iter(Axis(0)).enumerate() {
        // confidence & class_id
        let (class_id, confidence) = match &slices.ids {
            Some(ids) => {
                let id = ids[[i, 0]];
                if !(id >= 0.) {
                    continue;
                }
                (id as usize, slices.clss[[i, 0]])
            }
            None => {
                let Some((class_id, &confidence)) = slices
                    .clss
                    .slice(s![i, ..])
                    .into_iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                else {
                    continue;
                };

                match &slices.confs {
                    None => (class_id, confidence),
                    Some(confs) => (class_id, confidence * confs[[i, 0]]),
                }
            }
        };

        // filtering low scores
        if !confidence.is_finite() || confidence < params.conf_threshold {
            continue;
        }

        let raw = if params.layout.is_bbox_normalized {
            (
                bbox[0] * params.input_width as f32,
                bbox[1] * params.input_height as f32,
                bbox[2] * params.input_width as f32,
                bbox[3] * params.input_height as f32,
            )
        } else {
            (bbox[0], bbox[1], bbox[2], bbox[3])
        };

        // undo letterbox
        let (x1, y1, x2, y2) = params.layout.bbox.to_xyxy(raw);
        let (x1, y1) = transform.to_source(x1, y1);
        let (x2, y2) = transform.to_source(x2, y2);

        let Some(bounding_box) = BoundingBox::from_xyxy_f32(x1, y1, x2, y2, transform.width_src, transform.height_src) else {
            log::debug!("Dropping degenerate box ({x1}, {y1}, {x2}, {y2})");
            continue;
        };

        // filtering unreliably small objects, measured on the visible part
        if (bounding_box.width() as f32) < params.min_box_side || (bounding_box.height() as f32) < params.min_box_side {
            continue;
        }

        let label = params
            .names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("# {}", class_id));

        let detection = DetectionResult::new(bounding_box, confidence.clamp(0., 1.), &label)
            .map_err(|e| anyhow::anyhow!(e))?
            .with_class_id(class_id);
        detections.push(detection);
    }

    if params.layout.apply_nms {
        nms(&mut detections, params.iou_threshold);
    }

    Ok(detections)
}

impl OrtYoloDetector {
    /// Loads the session, reporting any failure as `ModelLoad`.
    pub fn load(config: DetectorConfig) -> crate::Result<Self> {
        let path = config.model_path.clone();
        if !path.is_file() {
            return Err(AlprError::model_load(path, "model file not found"));
        }
        <Self as InferenceProcess>::new(config).map_err(|e| AlprError::model_load(path, format!("{e:#}")))
    }

    /// Runs the full pipeline on one frame.
    pub fn detect(&mut self, frame: &AlprImage) -> crate::Result<Vec<DetectionResult>> {
        frame.ensure_not_empty()?;
        let profile = self.config.profile;
        self.forward(frame, profile)
            .map_err(|e| e.downcast::<AlprError>().unwrap_or_else(AlprError::inference))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn version(&self) -> ModelVersion {
        self.config.model_version
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn layout(&self) -> &YoloPreds {
        &self.layout
    }

    pub fn engine(&self) -> &OrtEngine {
        &self.engine
    }

    fn fetch_names(engine: &OrtEngine) -> Result<Option<Vec<String>>> {
        // fetch class names from onnx metadata
        // String format: `{0: 'person', 1: 'bicycle', 2: 'sports ball', ..., 27: "yellow_lady's_slipper"}`
        let Some(names) = engine.try_fetch("names") else {
            return Ok(None);
        };
        let re = Regex::new(r#"(['"])([-()\w '"]+)(['"])"#)?;
        let mut names_ = vec![];
        for (_, [_, name, _]) in re.captures_iter(&names).map(|x| x.extract()) {
            names_.push(name.to_string());
        }
        Ok(Some(names_).filter(|n| !n.is_empty()))
    }

    fn n2s(n: usize) -> Vec<String> {
        (0..n).map(|x| format!("# {}", x)).collect::<Vec<String>>()
    }
}
