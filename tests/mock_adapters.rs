#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use bvr_alpr::{AlprError, AlprImage, BoundingBox, DetectionResult, OcrResult, PlateDetector, PlateOcr};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

/// Returns the same detections for every frame.
pub struct FixedDetector {
    pub detections: Vec<DetectionResult>,
}

impl FixedDetector {
    pub fn new(boxes: &[(i32, i32, i32, i32, f32)]) -> Self {
        let detections = boxes
            .iter()
            .map(|&(x1, y1, x2, y2, conf)| {
                DetectionResult::new(BoundingBox::new(x1, y1, x2, y2).unwrap(), conf, "License Plate").unwrap()
            })
            .collect();
        Self { detections }
    }
}

impl PlateDetector for FixedDetector {
    fn predict(&mut self, _frame: &AlprImage) -> bvr_alpr::Result<Vec<DetectionResult>> {
        Ok(self.detections.clone())
    }
}

/// Reads back a fixed string and remembers the size of every crop it saw.
#[derive(Clone, Default)]
pub struct EchoOcr {
    pub text: String,
    pub seen: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl EchoOcr {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            seen: Default::default(),
        }
    }
}

impl PlateOcr for EchoOcr {
    fn predict(&mut self, crop: &AlprImage) -> bvr_alpr::Result<OcrResult> {
        self.seen.lock().unwrap().push(crop.dimensions());
        let confidences = vec![0.9; self.text.chars().count()];
        OcrResult::from_chars(&self.text, confidences)
    }
}

/// Fails on every crop.
pub struct FailingOcr;

impl PlateOcr for FailingOcr {
    fn predict(&mut self, _crop: &AlprImage) -> bvr_alpr::Result<OcrResult> {
        Err(AlprError::Inference("runtime exploded".to_string()))
    }
}

/// Grey frame with one dark "plate" rectangle.
pub fn frame_with_plate(width: u32, height: u32, plate: (i32, i32, u32, u32)) -> AlprImage {
    let mut image = RgbImage::from_pixel(width, height, Rgb([128, 128, 128]));
    let (x, y, w, h) = plate;
    draw_filled_rect_mut(&mut image, Rect::at(x, y).of_size(w, h), Rgb([20, 20, 20]));
    AlprImage::from(image)
}
