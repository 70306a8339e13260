// SPDX-License-Identifier: MIT
//! Rectangle value types shared by every crop stage.

use serde::{Deserialize, Serialize};

/// Axis-aligned face bounding box in source-image pixel coordinates.
///
/// Detectors report sub-pixel boxes, so the fields are floating point. Width and
/// height are expected to be finite and non-negative.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FaceRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point of the box.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Box area, used to rank detections of equal confidence.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Axis-aligned square in integer pixel coordinates.
///
/// The origin may be negative between pipeline stages; only the clip stage
/// guarantees that the square lies inside an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SquareRect {
    pub x: i64,
    pub y: i64,
    pub size: i64,
}

impl SquareRect {
    pub const fn new(x: i64, y: i64, size: i64) -> Self {
        Self { x, y, size }
    }

    /// Center point of the square.
    pub fn center(&self) -> (f64, f64) {
        let half = self.size as f64 / 2.0;
        (self.x as f64 + half, self.y as f64 + half)
    }

    /// True when the square lies entirely inside a `width` x `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let (w, h) = (i64::from(width), i64::from(height));
        self.x >= 0
            && self.y >= 0
            && self.size <= w.min(h)
            && self.x <= w.saturating_sub(self.size)
            && self.y <= h.saturating_sub(self.size)
    }

    /// Unsigned `(x, y, width, height)` crop box, or `None` if the square has
    /// no area or does not fit inside the image.
    pub fn as_crop_box(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        if self.size <= 0 || !self.fits_within(width, height) {
            return None;
        }
        // fits_within bounds every field by a u32 dimension
        let size = self.size as u32;
        Some((self.x as u32, self.y as u32, size, size))
    }
}
