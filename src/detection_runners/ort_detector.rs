mod ort_engine;
mod ort_yolo;
pub mod image_ops;
pub mod input_wrapper;
pub mod nms;

pub use ort_engine::*;
pub use ort_yolo::*;
