use serde::{Deserialize, Serialize};
use crate::common::AlprError;

#[derive(Deserialize)]
struct RawBox {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

/// Axis-aligned plate region in source-image pixel coordinates.
///
/// Always satisfies `0 <= x1 < x2` and `0 <= y1 < y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBox")]
pub struct BoundingBox {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
}

impl TryFrom<RawBox> for BoundingBox {
    type Error = AlprError;

    fn try_from(raw: RawBox) -> Result<Self, Self::Error> {
        BoundingBox::new(raw.x1, raw.y1, raw.x2, raw.y2)
    }
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self, AlprError> {
        if x1 < 0 || y1 < 0 || x1 >= x2 || y1 >= y2 {
            return Err(AlprError::invalid_input(format!(
                "malformed bounding box ({x1}, {y1}, {x2}, {y2})"
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Builds a box from float model output already mapped into frame space.
    ///
    /// Coordinates are clamped into `[0, frame_w] x [0, frame_h]` and truncated
    /// toward zero. Returns `None` when nothing of the box survives.
    pub fn from_xyxy_f32(x1: f32, y1: f32, x2: f32, y2: f32, frame_w: u32, frame_h: u32) -> Option<Self> {
        if !(x1.is_finite() && y1.is_finite() && x2.is_finite() && y2.is_finite()) {
            return None;
        }
        let (w, h) = (frame_w as f32, frame_h as f32);
        let x1 = x1.clamp(0., w) as i32;
        let y1 = y1.clamp(0., h) as i32;
        let x2 = x2.clamp(0., w) as i32;
        let y2 = y2.clamp(0., h) as i32;
        Self::new(x1, y1, x2, y2).ok()
    }

    pub fn x1(&self) -> i32 {
        self.x1
    }

    pub fn y1(&self) -> i32 {
        self.y1
    }

    pub fn x2(&self) -> i32 {
        self.x2
    }

    pub fn y2(&self) -> i32 {
        self.y2
    }

    pub fn width(&self) -> u32 {
        (self.x2 - self.x1) as u32
    }

    pub fn height(&self) -> u32 {
        (self.y2 - self.y1) as u32
    }

    /// Returns the bounding box coordinates as `(x1, y1, x2, y2)`.
    pub fn xy1_xy2(&self) -> (i32, i32, i32, i32) {
        (self.x1, self.y1, self.x2, self.y2)
    }

    /// Returns the bounding box coordinates and size as `(x, y, w, h)`.
    pub fn xy1_wh(&self) -> (u32, u32, u32, u32) {
        (self.x1 as u32, self.y1 as u32, self.width(), self.height())
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Computes the intersection area between this bounding box and another.
    pub fn intersect(&self, other: &BoundingBox) -> u64 {
        let left = self.x1.max(other.x1);
        let right = self.x2.min(other.x2);
        let top = self.y1.max(other.y1);
        let bottom = self.y2.min(other.y2);
        ((right - left).max(0) as u64) * ((bottom - top).max(0) as u64)
    }

    /// Computes the union area between this bounding box and another.
    pub fn union(&self, other: &BoundingBox) -> u64 {
        self.area() + other.area() - self.intersect(other)
    }

    /// Computes the intersection over union (IoU) between this bounding box and another.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let union = self.union(other);
        if union == 0 {
            return 0.;
        }
        self.intersect(other) as f32 / union as f32
    }

    /// Checks if this bounding box completely contains another bounding box `other`.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.x1 <= other.x1 && self.x2 >= other.x2 && self.y1 <= other.y1 && self.y2 >= other.y2
    }

    /// Clamps the box into a `width x height` frame.
    ///
    /// `None` when the box lies entirely outside the frame.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        let x2 = self.x2.min(width.min(i32::MAX as u32) as i32);
        let y2 = self.y2.min(height.min(i32::MAX as u32) as i32);
        Self::new(self.x1, self.y1, x2, y2).ok()
    }
}
