//! Output layouts of the YOLO family, adapted from https://github.com/jamjamjon/usls

use anyhow::{bail, Result};
use ndarray::{ArrayView2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelVersion {
    YoloV5,
    YoloV6,
    YoloV7,
    YoloV8,
    YoloV9,
    YoloV10,
    YoloV11,
    YoloV12,
    /// Exports with NMS baked into the graph, rows of `[batch, x1, y1, x2, y2, class, score]`.
    #[default] End2End,
}

impl ModelVersion {
    pub fn name(&self) -> String {
        match self {
            Self::YoloV5 => "YoloV5".to_string(),
            Self::YoloV6 => "YoloV6".to_string(),
            Self::YoloV7 => "YoloV7".to_string(),
            Self::YoloV8 => "YoloV8".to_string(),
            Self::YoloV9 => "YoloV9".to_string(),
            Self::YoloV10 => "YoloV10".to_string(),
            Self::YoloV11 => "YoloV11".to_string(),
            Self::YoloV12 => "YoloV12".to_string(),
            Self::End2End => "End2End".to_string(),
        }
    }

    pub fn layout(&self) -> YoloPreds {
        match self {
            Self::YoloV5 | Self::YoloV6 | Self::YoloV7 => YoloPreds::n_a_cxcywh_confclss(),
            Self::YoloV8 | Self::YoloV9 | Self::YoloV11 | Self::YoloV12 => YoloPreds::n_cxcywh_clss_a(),
            Self::YoloV10 => YoloPreds::n_a_xyxy_confcls().apply_nms(false),
            Self::End2End => YoloPreds::a_bxyxy_clsconf(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoxType {
    /// 1
    Cxcywh,

    /// 2 Cxcybr
    Cxcyxy,

    /// 3 Tlbr
    Xyxy,

    /// 4  Tlwh
    Xywh,

    /// 5  Tlcxcy
    XyCxcy,
}

impl BoxType {
    /// Converts the four raw box values into `(x1, y1, x2, y2)`.
    pub fn to_xyxy(&self, b: (f32, f32, f32, f32)) -> (f32, f32, f32, f32) {
        match self {
            BoxType::Cxcywh => {
                let (cx, cy, w, h) = b;
                (cx - w / 2., cy - h / 2., cx + w / 2., cy + h / 2.)
            }
            BoxType::Xyxy => b,
            BoxType::Xywh => {
                let (x, y, w, h) = b;
                (x, y, x + w, y + h)
            }
            BoxType::Cxcyxy => {
                let (cx, cy, x2, y2) = b;
                let (w, h) = ((x2 - cx) * 2., (y2 - cy) * 2.);
                (x2 - w, y2 - h, x2, y2)
            }
            BoxType::XyCxcy => {
                let (x, y, cx, cy) = b;
                let (w, h) = ((cx - x) * 2., (cy - y) * 2.);
                (x, y, x + w, y + h)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClssType {
    Clss,
    ConfCls,
    ClsConf,
    ConfClss,
    ClssConf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnchorsPosition {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YoloPreds {
    pub clss: ClssType,
    pub bbox: BoxType,
    pub anchors: AnchorsPosition,
    /// Columns preceding the box (e.g. the batch index of end-to-end exports).
    pub leading_columns: usize,
    pub is_bbox_normalized: bool,
    pub apply_nms: bool,
}

impl Default for YoloPreds {
    fn default() -> Self {
        Self {
            clss: ClssType::Clss,
            bbox: BoxType::Cxcywh,
            anchors: AnchorsPosition::Before,
            leading_columns: 0,
            is_bbox_normalized: false,
            apply_nms: true,
        }
    }
}

/// Per-anchor views of one image's predictions.
#[derive(Debug)]
pub struct PredSlices<'a> {
    pub bboxes: ArrayView2<'a, f32>,
    pub ids: Option<ArrayView2<'a, f32>>,
    pub clss: ArrayView2<'a, f32>,
    pub confs: Option<ArrayView2<'a, f32>>,
}

impl YoloPreds {
    pub fn apply_nms(mut self, x: bool) -> Self {
        self.apply_nms = x;
        self
    }

    pub fn n_a_cxcywh_confclss() -> Self {
        // YOLOv5 | YOLOv6 | YOLOv7 | YOLOX : NACxcywhConfClss
        Self {
            bbox: BoxType::Cxcywh,
            clss: ClssType::ConfClss,
            anchors: AnchorsPosition::Before,
            ..Default::default()
        }
    }

    pub fn n_cxcywh_clss_a() -> Self {
        // YOLOv8 | YOLOv9 | YOLO11 : NCxcywhClssA
        Self {
            bbox: BoxType::Cxcywh,
            clss: ClssType::Clss,
            anchors: AnchorsPosition::After,
            ..Default::default()
        }
    }

    pub fn n_a_xyxy_confcls() -> Self {
        // YOLOv10 : NAXyxyConfCls
        Self {
            bbox: BoxType::Xyxy,
            clss: ClssType::ConfCls,
            anchors: AnchorsPosition::Before,
            ..Default::default()
        }
    }

    pub fn a_bxyxy_clsconf() -> Self {
        // end2end exports : ABatchXyxyClsConf
        Self {
            bbox: BoxType::Xyxy,
            clss: ClssType::ClsConf,
            anchors: AnchorsPosition::Before,
            leading_columns: 1,
            apply_nms: false,
            ..Default::default()
        }
    }

    pub fn is_anchors_first(&self) -> bool {
        matches!(self.anchors, AnchorsPosition::Before)
    }

    pub fn is_cls_type(&self) -> bool {
        matches!(self.clss, ClssType::ClsConf | ClssType::ConfCls)
    }

    pub fn is_conf_independent(&self) -> bool {
        !matches!(self.clss, ClssType::Clss)
    }

    /// Number of classes implied by the width of a prediction row, for layouts with one score per class.
    pub fn nc_from_columns(&self, columns: usize) -> Option<usize> {
        if self.is_cls_type() {
            return None;
        }
        let fixed = self.leading_columns + 4 + usize::from(self.is_conf_independent());
        columns.checked_sub(fixed).filter(|nc| *nc > 0)
    }

    /// Splits one image's `(anchors, columns)` predictions into box, class and confidence views.
    ///
    /// `x` is given in the model's own axis order and transposed when anchors come last.
    pub fn parse_preds<'a>(&self, x: ArrayView2<'a, f32>, nc: usize) -> Result<PredSlices<'a>> {
        let x = if self.is_anchors_first() { x } else { x.reversed_axes() };

        let needed = self.leading_columns + 4 + match self.clss {
            ClssType::ConfClss | ClssType::ClssConf => 1 + nc,
            ClssType::ConfCls | ClssType::ClsConf => 2,
            ClssType::Clss => nc,
        };
        if x.len_of(Axis(1)) < needed {
            bail!(
                "Prediction rows have {} columns, layout {:?} with {} classes needs {}",
                x.len_of(Axis(1)),
                self.clss,
                nc,
                needed
            );
        }

        let (_leading, xs) = x.split_at(Axis(1), self.leading_columns);
        let (bboxes, xs) = xs.split_at(Axis(1), 4);

        let (ids, clss, confs) = match self.clss {
            ClssType::ConfClss => {
                let (confs, xs) = xs.split_at(Axis(1), 1);
                let (clss, _xs) = xs.split_at(Axis(1), nc);
                (None, clss, Some(confs))
            }
            ClssType::ClssConf => {
                let (clss, xs) = xs.split_at(Axis(1), nc);
                let (confs, _xs) = xs.split_at(Axis(1), 1);
                (None, clss, Some(confs))
            }
            ClssType::ConfCls => {
                let (clss, xs) = xs.split_at(Axis(1), 1);
                let (ids, _xs) = xs.split_at(Axis(1), 1);
                (Some(ids), clss, None)
            }
            ClssType::ClsConf => {
                let (ids, xs) = xs.split_at(Axis(1), 1);
                let (clss, _xs) = xs.split_at(Axis(1), 1);
                (Some(ids), clss, None)
            }
            ClssType::Clss => {
                let (clss, _xs) = xs.split_at(Axis(1), nc);
                (None, clss, None)
            }
        };

        Ok(PredSlices { bboxes, ids, clss, confs })
    }
}
