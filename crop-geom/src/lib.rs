// SPDX-License-Identifier: MIT
//! # crop-geom: Square Crop Geometry for Face-Aware Thumbnails
//!
//! This crate turns a detected face bounding box into a square crop region that
//! is guaranteed to fit inside the source image. It performs no I/O and holds no
//! state, so every function can be called from any thread.
//!
//! ## Pipeline
//!
//! A crop is computed in three fixed stages:
//! 1. **Square**: grow the shorter side of the face box so it becomes a square
//!    centered on the same point ([`crop::to_square_rect`])
//! 2. **Pad**: scale the square by a padding factor around its center
//!    ([`crop::apply_padding`])
//! 3. **Clip**: shrink and shift the square until it lies inside the image
//!    ([`crop::clip_to_image_bounds`])
//!
//! [`crop::calculate_crop_rect`] composes the three stages and is the entry
//! point callers should use. The intermediate stages are public so each one can
//! be tested on its own.
//!
//! ## Key Components
//!
//! - [`rect`]: `FaceRect` and `SquareRect` value types
//! - [`crop`]: the stage functions plus the centered fallback crop
//!
//! ## Usage Example
//!
//! ```rust
//! use crop_geom::{crop::calculate_crop_rect, rect::{FaceRect, SquareRect}};
//!
//! let face = FaceRect::new(0.0, 0.0, 50.0, 50.0);
//! let crop = calculate_crop_rect(face, 3.0, 100, 100);
//! assert_eq!(crop, SquareRect::new(0, 0, 100));
//! ```
//!
//! ## Rounding
//!
//! Every stage rounds to the nearest integer with ties going toward positive
//! infinity, so `-2.5` becomes `-2` and `2.5` becomes `3`.

pub mod crop;
pub mod rect;

pub use crop::{
    apply_padding, calculate_crop_rect, center_square, clip_to_image_bounds, to_square_rect,
};
pub use rect::{FaceRect, SquareRect};
