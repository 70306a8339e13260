//! # Configuration Module
//!
//! Configuration structures and validation for model caching and thumbnail
//! rendering. These are the common interface between the CLI and the library;
//! nothing in the library reads process-wide state, so every operation receives
//! the configuration it needs explicitly.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Default | Description |
//! |-----------|------|---------|-------------|
//! | `cache_dir` | `Option<PathBuf>` | `None` | Root of the model cache; models live in `<cache_dir>/models` |
//! | `url` | `String` | [`DEFAULT_MODEL_URL`] | Remote location of the detection model |
//! | `file_name` | `String` | [`DEFAULT_MODEL_FILE`] | Local file name of the cached model |
//! | `max_redirects` | `u8` | 5 | Redirect hops followed before giving up |
//! | `timeout` | `Duration` | 120 s | Deadline for one complete transfer |
//! | `padding` | `f64` | 2.0 | Multiplier applied to the face square side |
//! | `sizes` | `Vec<u32>` | `[256]` | Output thumbnail side lengths |
//!
//! ## Examples
//!
//! ```rust
//! use facecrop::config::{ModelCacheConfig, ThumbConfig};
//!
//! let model = ModelCacheConfig::default().with_cache_dir(".cache/facecrop");
//! assert!(model.validate().is_ok());
//!
//! let mut thumbs = ThumbConfig::default();
//! thumbs.padding = -1.0;
//! assert!(thumbs.validate().is_err());
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{FaceCropError, FaceCropResult};

/// UltraFace RFB-320 detector published in the ONNX model zoo.
pub const DEFAULT_MODEL_URL: &str = "https://github.com/onnx/models/raw/main/validated/vision/body_analysis/ultraface/models/version-RFB-320.onnx";

/// File name the model is stored under inside `<cache_dir>/models`.
pub const DEFAULT_MODEL_FILE: &str = "version-RFB-320.onnx";

/// Redirect hops followed before a download attempt fails.
pub const DEFAULT_MAX_REDIRECTS: u8 = 5;

/// Deadline for one complete model transfer.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Environment variable the CLI reads the cache directory from.
pub const CACHE_DIR_ENV: &str = "FACECROP_CACHE_DIR";

/// Where and how the detection model is cached.
#[derive(Debug, Clone)]
pub struct ModelCacheConfig {
    /// Root cache directory. `None` means the cache is unconfigured and every
    /// path resolution fails with [`FaceCropError::NotConfigured`].
    pub cache_dir: Option<PathBuf>,

    /// Remote URL of the model artifact.
    pub url: String,

    /// File name under `<cache_dir>/models`. Must not contain path separators.
    pub file_name: String,

    /// Maximum number of redirects followed per attempt.
    pub max_redirects: u8,

    /// Deadline for the whole transfer, redirects included.
    pub timeout: Duration,
}

impl Default for ModelCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            url: DEFAULT_MODEL_URL.to_string(),
            file_name: DEFAULT_MODEL_FILE.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ModelCacheConfig {
    /// Set the cache root.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Override the model URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Override the transfer deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates the configuration parameters.
    ///
    /// An unset `cache_dir` is not a validation failure: it is a legitimate
    /// state that makes the cache report `NotConfigured` when used.
    ///
    /// # Validation Rules
    ///
    /// - `url` must not be empty
    /// - `file_name` must be non-empty and a bare file name
    /// - `timeout` must be greater than zero
    pub fn validate(&self) -> FaceCropResult<()> {
        if self.url.trim().is_empty() {
            return Err(FaceCropError::config("url", "must not be empty"));
        }
        if self.file_name.is_empty() {
            return Err(FaceCropError::config("file_name", "must not be empty"));
        }
        if self.file_name.contains(['/', '\\']) || self.file_name == "." || self.file_name == ".." {
            return Err(FaceCropError::config(
                "file_name",
                format!("`{}` is not a bare file name", self.file_name),
            ));
        }
        if self.timeout.is_zero() {
            return Err(FaceCropError::config("timeout", "must be greater than zero"));
        }
        Ok(())
    }
}

/// How thumbnails are cropped and sized.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbConfig {
    /// Multiplier applied to the face square before clipping.
    pub padding: f64,

    /// Side lengths of the square thumbnails to render.
    pub sizes: Vec<u32>,
}

impl Default for ThumbConfig {
    fn default() -> Self {
        Self {
            padding: 2.0,
            sizes: vec![256],
        }
    }
}

impl ThumbConfig {
    /// Validates the configuration parameters.
    ///
    /// # Validation Rules
    ///
    /// - `padding` must be finite and greater than zero
    /// - `sizes` must be non-empty and contain no zero
    pub fn validate(&self) -> FaceCropResult<()> {
        if !self.padding.is_finite() || self.padding <= 0.0 {
            return Err(FaceCropError::config(
                "padding",
                format!("must be a finite number greater than 0, got {}", self.padding),
            ));
        }
        if self.sizes.is_empty() {
            return Err(FaceCropError::config("sizes", "at least one size is required"));
        }
        if self.sizes.contains(&0) {
            return Err(FaceCropError::config("sizes", "sizes must be greater than 0"));
        }
        Ok(())
    }
}
