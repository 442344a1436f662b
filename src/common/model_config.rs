use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use crate::common::{AlprError, ChannelOrder, InferenceDevice, ModelVersion};
use crate::data::ConfigOrt;

/// Colour layout an OCR model consumes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    #[default] Grayscale,
    Rgb,
}

impl ColorMode {
    pub fn channels(&self) -> usize {
        match self {
            ColorMode::Grayscale => 1,
            ColorMode::Rgb => 3,
        }
    }
}

/// Axis order of an image tensor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TensorLayout {
    #[default] Nhwc,
    Nchw,
}

/// Characters an OCR model can emit per slot, including the pad symbol for unused slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAlphabet")]
pub struct PlateAlphabet {
    chars: Vec<char>,
    pad: char,
}

#[derive(Deserialize)]
struct RawAlphabet {
    chars: Vec<char>,
    pad: char,
}

impl TryFrom<RawAlphabet> for PlateAlphabet {
    type Error = AlprError;

    fn try_from(raw: RawAlphabet) -> Result<Self, Self::Error> {
        PlateAlphabet::from_chars(raw.chars, raw.pad)
    }
}

impl PlateAlphabet {
    pub fn new(alphabet: &str, pad: char) -> Result<Self, AlprError> {
        Self::from_chars(alphabet.chars().collect(), pad)
    }

    fn from_chars(chars: Vec<char>, pad: char) -> Result<Self, AlprError> {
        if chars.is_empty() {
            return Err(AlprError::invalid_input("empty OCR alphabet"));
        }
        if !chars.contains(&pad) {
            return Err(AlprError::invalid_input(format!("pad character {pad:?} is not in the alphabet")));
        }
        for (i, c) in chars.iter().enumerate() {
            if chars[..i].contains(c) {
                return Err(AlprError::invalid_input(format!("duplicate character {c:?} in the alphabet")));
            }
        }
        Ok(Self { chars, pad })
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn pad(&self) -> char {
        self.pad
    }

    pub fn get(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub model_path: PathBuf,
    pub ort_lib_path: Option<String>,
    pub device: InferenceDevice,
    pub model_version: ModelVersion,
    /// Used only when the model's input axes are dynamic.
    pub input_width: u32,
    pub input_height: u32,
    pub conf_threshold: f32,
    pub iou_threshold: f32,
    pub names: Option<Vec<String>>,
    pub labels_path: Option<PathBuf>,
    pub channel_order: ChannelOrder,
    pub letterbox_center: bool,
    pub min_box_side: f32,
    pub intra_threads: Option<usize>,
    pub profile: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            ort_lib_path: None,
            device: InferenceDevice::CPU,
            model_version: ModelVersion::End2End,
            input_width: 640,
            input_height: 640,
            conf_threshold: 0.4,
            iou_threshold: 0.45,
            names: None,
            labels_path: None,
            channel_order: ChannelOrder::Rgb,
            letterbox_center: true,
            min_box_side: 0.,
            intra_threads: None,
            profile: false,
        }
    }
}

impl DetectorConfig {
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: model_path.into(),
            ..Default::default()
        }
    }

    pub fn with_ort_lib_path(mut self, ort_lib_path: Option<String>) -> Self {
        self.ort_lib_path = ort_lib_path;
        self
    }

    pub fn with_device(mut self, device: InferenceDevice) -> Self {
        self.device = device;
        self
    }

    pub fn with_model_version(mut self, version: ModelVersion) -> Self {
        self.model_version = version;
        self
    }

    pub fn with_input_size(mut self, width: u32, height: u32) -> Self {
        self.input_width = width;
        self.input_height = height;
        self
    }

    pub fn with_conf_threshold(mut self, x: f32) -> Self {
        self.conf_threshold = x;
        self
    }

    pub fn with_iou_threshold(mut self, x: f32) -> Self {
        self.iou_threshold = x;
        self
    }

    pub fn with_names(mut self, names: &[&str]) -> Self {
        self.names = Some(names.iter().map(|x| x.to_string()).collect());
        self
    }

    pub fn with_labels_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.labels_path = Some(path.into());
        self
    }

    pub fn with_channel_order(mut self, order: ChannelOrder) -> Self {
        self.channel_order = order;
        self
    }

    pub fn with_letterbox_center(mut self, x: bool) -> Self {
        self.letterbox_center = x;
        self
    }

    pub fn with_min_box_side(mut self, x: f32) -> Self {
        self.min_box_side = x;
        self
    }

    pub fn with_intra_threads(mut self, n: Option<usize>) -> Self {
        self.intra_threads = n;
        self
    }

    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    pub fn config_ort(&self) -> ConfigOrt {
        ConfigOrt::new()
            .with_model(&self.model_path)
            .with_ort_lib_path(self.ort_lib_path.clone())
            .with_device(self.device)
            .with_intra_threads(self.intra_threads)
            .with_profile(self.profile)
    }

}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub model_path: PathBuf,
    pub ort_lib_path: Option<String>,
    pub device: InferenceDevice,
    pub alphabet: PlateAlphabet,
    pub max_plate_slots: usize,
    pub input_width: u32,
    pub input_height: u32,
    pub color_mode: ColorMode,
    /// Divide intensities by 255 before inference.
    pub normalize: bool,
    pub layout: TensorLayout,
    pub intra_threads: Option<usize>,
    pub profile: bool,
}

impl OcrConfig {
    pub fn new<P: Into<PathBuf>>(model_path: P, alphabet: PlateAlphabet, max_plate_slots: usize) -> Self {
        Self {
            model_path: model_path.into(),
            ort_lib_path: None,
            device: InferenceDevice::CPU,
            alphabet,
            max_plate_slots,
            input_width: 128,
            input_height: 64,
            color_mode: ColorMode::Grayscale,
            normalize: true,
            layout: TensorLayout::Nhwc,
            intra_threads: None,
            profile: false,
        }
    }

    pub fn with_ort_lib_path(mut self, ort_lib_path: Option<String>) -> Self {
        self.ort_lib_path = ort_lib_path;
        self
    }

    pub fn with_device(mut self, device: InferenceDevice) -> Self {
        self.device = device;
        self
    }

    pub fn with_input_size(mut self, width: u32, height: u32) -> Self {
        self.input_width = width;
        self.input_height = height;
        self
    }

    pub fn with_color_mode(mut self, mode: ColorMode) -> Self {
        self.color_mode = mode;
        self
    }

    pub fn with_normalize(mut self, x: bool) -> Self {
        self.normalize = x;
        self
    }

    pub fn with_layout(mut self, layout: TensorLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_intra_threads(mut self, n: Option<usize>) -> Self {
        self.intra_threads = n;
        self
    }

    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }

    pub fn config_ort(&self) -> ConfigOrt {
        ConfigOrt::new()
            .with_model(&self.model_path)
            .with_ort_lib_path(self.ort_lib_path.clone())
            .with_device(self.device)
            .with_intra_threads(self.intra_threads)
            .with_profile(self.profile)
    }

    /// Shape of the tensor the preprocessing step produces for one crop.
    pub fn input_shape(&self) -> [usize; 4] {
        let (h, w, c) = (self.input_height as usize, self.input_width as usize, self.color_mode.channels());
        match self.layout {
            TensorLayout::Nhwc => [1, h, w, c],
            TensorLayout::Nchw => [1, c, h, w],
        }
    }
}
