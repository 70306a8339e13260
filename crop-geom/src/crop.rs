// SPDX-License-Identifier: MIT
//! # Crop Stages
//!
//! Pure functions that move a face box through square, pad and clip. None of
//! them validate their inputs: a negative width or padding factor yields a
//! mathematically derived rectangle rather than an error. Range checks belong
//! to whoever reads the padding factor from configuration.

use crate::rect::{FaceRect, SquareRect};

/// Round to the nearest integer, ties toward positive infinity.
#[inline]
fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

/// Expand a face box into the smallest square centered on the same point.
///
/// The side is the longer of width and height. The top-left corner is rounded
/// to whole pixels; the result is not clipped to any image.
pub fn to_square_rect(rect: FaceRect) -> SquareRect {
    let side = rect.width.max(rect.height);
    let (cx, cy) = rect.center();
    SquareRect {
        x: round_half_up(cx - side / 2.0),
        y: round_half_up(cy - side / 2.0),
        size: round_half_up(side),
    }
}

/// Scale a square by `factor` around its center.
///
/// The change in size is split evenly between opposite sides, so the center
/// moves by at most half a pixel. Factors below 1.0 shrink the square.
pub fn apply_padding(square: SquareRect, factor: f64) -> SquareRect {
    let size = round_half_up(square.size as f64 * factor);
    let offset = (size as f64 - square.size as f64) / 2.0;
    SquareRect {
        x: round_half_up(square.x as f64 - offset),
        y: round_half_up(square.y as f64 - offset),
        size,
    }
}

/// Force a square inside a `image_width` x `image_height` image.
///
/// The side is capped to the shorter image dimension first (never enlarged),
/// then the origin is clamped so the square does not overhang any edge. Capping
/// before clamping keeps `image_width - size` and `image_height - size`
/// non-negative. Far edges are compared against `dimension - size` so origins
/// near `i64::MAX` cannot overflow.
pub fn clip_to_image_bounds(
    square: SquareRect,
    image_width: u32,
    image_height: u32,
) -> SquareRect {
    let (w, h) = (i64::from(image_width), i64::from(image_height));
    let size = square.size.min(w).min(h);

    let mut x = square.x;
    let mut y = square.y;
    if x < 0 {
        x = 0;
    }
    if y < 0 {
        y = 0;
    }
    let (max_x, max_y) = (w.saturating_sub(size), h.saturating_sub(size));
    if x > max_x {
        x = max_x;
    }
    if y > max_y {
        y = max_y;
    }

    SquareRect { x, y, size }
}

/// Compute the final crop for a face: square, then pad, then clip.
///
/// This is the entry point for callers; the stage order is fixed.
pub fn calculate_crop_rect(
    face: FaceRect,
    padding: f64,
    image_width: u32,
    image_height: u32,
) -> SquareRect {
    let square = to_square_rect(face);
    let padded = apply_padding(square, padding);
    clip_to_image_bounds(padded, image_width, image_height)
}

/// Largest square centered in the image. Used when no face is known.
pub fn center_square(image_width: u32, image_height: u32) -> SquareRect {
    let size = image_width.min(image_height);
    SquareRect {
        x: i64::from((image_width - size) / 2),
        y: i64::from((image_height - size) / 2),
        size: i64::from(size),
    }
}
