//! # facecrop
//!
//! Build-time face-aware thumbnailing for static gallery sites.
//!
//! ## Architecture
//!
//! - [`crop_geom`] (workspace crate): pure square/pad/clip geometry
//! - [`model`]: cached download of the face-detection model
//! - [`thumbnail`]: crop planning, center-crop fallback and resizing
//! - [`config`]: configuration structs and validation
//! - [`error`]: error taxonomy and classification traits
//!
//! ## Degradation
//!
//! A missing model never fails a build. [`model::ModelCache::ensure`] reports
//! transfer and filesystem problems as `Ok(None)` after logging a warning, and
//! [`thumbnail::FaceCropper`] then renders centered crops instead.
//!
//! ## Example
//!
//! ```rust,no_run
//! use facecrop::config::{ModelCacheConfig, ThumbConfig};
//! use facecrop::model::ModelCache;
//! use facecrop::thumbnail::FaceCropper;
//! use facecrop::FaceRect;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = ModelCache::with_reqwest(
//!     ModelCacheConfig::default().with_cache_dir(".cache/facecrop"),
//! )?;
//! let model = cache.ensure().await?;
//! println!("model available: {}", model.is_some());
//!
//! let cropper = FaceCropper::new(ThumbConfig::default())?;
//! let image = image::open("photo.jpg")?;
//! let face = FaceRect::new(410.0, 120.0, 96.0, 128.0);
//! for thumb in cropper.thumbnails_with_face(&image, Some(face))? {
//!     thumb.image.save(format!("thumb-{}.png", thumb.size))?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod thumbnail;

pub use crop_geom::{
    self, FaceRect, SquareRect, apply_padding, calculate_crop_rect, center_square,
    clip_to_image_bounds, to_square_rect,
};

/// Re-export error types for convenience
pub use error::{ErrorSeverity, FaceCropError, FaceCropResult, HasSeverity, Retryable};
