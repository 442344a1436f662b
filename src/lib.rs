mod utils;
pub mod alpr;
pub mod common;
pub mod data;
pub mod detection_runners;
pub mod detectors;
pub mod directory_runner;
pub mod send_channels;

pub use crate::alpr::{Alpr, AlprBuilder, AlprConfig};
pub use crate::common::{
    AlprError, AlprImage, BoundingBox, ChannelOrder, DetectionResult, InferenceDevice, OcrResult, PlateResult,
};
pub use crate::detection_runners::{DirectoryTrace, OrtPlateOcr, OrtYoloDetector, PreprocessTrace};
pub use crate::detectors::{PlateDetector, PlateOcr};
pub use crate::directory_runner::{collect_images, run_directory, BatchReport};
pub use crate::send_channels::{spawn_alpr_worker, AlprWorkerHandle};

pub type Result<T, E = AlprError> = std::result::Result<T, E>;
