//! File/code adapted from https://github.com/jamjamjon/usls
//!
//! Options for building ONNX Runtime sessions.

use std::path::{Path, PathBuf};
use crate::common::InferenceDevice;

#[derive(Debug, Clone)]
pub struct ConfigOrt {
    pub onnx_path: PathBuf,
    /// Shared library to load ONNX Runtime from. `None` leaves it to `ORT_DYLIB_PATH`.
    pub ort_lib_path: Option<String>,
    pub device: InferenceDevice,
    pub profile: bool,
    pub intra_threads: Option<usize>,

    // trt related
    pub trt_engine_cache_enable: bool,
}

impl Default for ConfigOrt {
    fn default() -> Self {
        Self {
            onnx_path: PathBuf::new(),
            ort_lib_path: None,
            device: InferenceDevice::CPU,
            profile: false,
            intra_threads: None,

            trt_engine_cache_enable: true,
        }
    }
}

impl ConfigOrt {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_model<P: AsRef<Path>>(mut self, onnx_path: P) -> Self {
        self.onnx_path = onnx_path.as_ref().to_path_buf();
        self
    }

    pub fn with_ort_lib_path(mut self, ort_lib_path: Option<String>) -> Self {
        self.ort_lib_path = ort_lib_path;
        self
    }

    pub fn with_device(mut self, device_type: InferenceDevice) -> Self {
        self.device = device_type;
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
}
