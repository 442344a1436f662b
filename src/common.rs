
mod alpr_box;
mod alpr_detection;
mod alpr_error;
mod alpr_image;
mod inference_device;
mod model_config;
mod model_version;
mod ocr_result;
mod plate_result;
pub mod presets;

pub use alpr_box::*;
pub use alpr_detection::*;
pub use alpr_error::*;
pub use alpr_image::*;
pub use inference_device::*;
pub use model_config::*;
pub use model_version::*;
pub use ocr_result::*;
pub use plate_result::*;
