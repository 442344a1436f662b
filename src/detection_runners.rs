pub mod inference_process;
pub mod ort_detector;
pub mod ort_ocr;

pub use ort_detector::*;
pub use ort_ocr::*;
