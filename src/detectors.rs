use crate::common::{AlprImage, DetectionResult, OcrResult};
use crate::detection_runners::{OrtPlateOcr, OrtYoloDetector};

/// Finds candidate plate regions in a frame.
///
/// Boxes are in the coordinate space of `frame`, in the order the model emitted them.
/// Implementations own their session and do no disk I/O while predicting.
pub trait PlateDetector {
    fn predict(&mut self, frame: &AlprImage) -> crate::Result<Vec<DetectionResult>>;
}

/// Reads the characters on a cropped plate.
///
/// An unreadable crop is an empty, zero-confidence result, not an error.
pub trait PlateOcr {
    fn predict(&mut self, crop: &AlprImage) -> crate::Result<OcrResult>;
}

impl PlateDetector for OrtYoloDetector {
    fn predict(&mut self, frame: &AlprImage) -> crate::Result<Vec<DetectionResult>> {
        self.detect(frame)
    }
}

impl PlateOcr for OrtPlateOcr {
    fn predict(&mut self, crop: &AlprImage) -> crate::Result<OcrResult> {
        self.recognize(crop)
    }
}

impl<T: PlateDetector + ?Sized> PlateDetector for Box<T> {
    fn predict(&mut self, frame: &AlprImage) -> crate::Result<Vec<DetectionResult>> {
        (**self).predict(frame)
    }
}

impl<T: PlateOcr + ?Sized> PlateOcr for Box<T> {
    fn predict(&mut self, crop: &AlprImage) -> crate::Result<OcrResult> {
        (**self).predict(crop)
    }
}
