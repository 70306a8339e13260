//! # Error Handling
//!
//! A single error type covers every fallible operation in the library. The
//! variants fall into three groups:
//!
//! - **Configuration**: the caller did not provide what the operation needs
//!   (`NotConfigured`, `Config`). These are never retried.
//! - **Transfer**: anything that goes wrong while fetching the model
//!   (`Network`, `HttpStatus`, `TooManyRedirects`, `MissingLocation`,
//!   `Timeout`). The next `ensure` call is the retry.
//! - **Image**: decoding, cropping or resizing failures.
//!
//! ## Classification
//!
//! - [`Retryable`]: whether a later attempt may succeed
//! - [`HasSeverity`]: how loudly the failure should be reported
//!
//! ```rust
//! use facecrop::error::{FaceCropError, Retryable};
//!
//! let err = FaceCropError::http_status("https://example.com/model.onnx", 503);
//! assert!(err.is_retryable());
//! assert!(!FaceCropError::NotConfigured.is_retryable());
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Severity levels for errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Degraded but the build continues (e.g. model unavailable).
    Warning,
    /// The requested operation failed.
    Error,
    /// The process cannot do anything useful until the caller fixes its input.
    Fatal,
}

/// Base error type for the library.
#[derive(Debug, Error)]
pub enum FaceCropError {
    /// The model cache directory was never provided.
    #[error("model cache directory is not configured")]
    NotConfigured,

    /// A configuration value is out of range.
    #[error("invalid configuration for `{field}`: {reason}")]
    Config { field: String, reason: String },

    /// Filesystem failure.
    #[error("I/O error during {operation}{}: {source}", path_suffix(.path))]
    Io {
        operation: String,
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// Connection or body-read failure.
    #[error("network error fetching {url}: {reason}")]
    Network { url: String, reason: String },

    /// The server answered with a status that is neither success nor redirect.
    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// The redirect chain exceeded the configured hop limit.
    #[error("more than {limit} redirects")]
    TooManyRedirects { limit: u8 },

    /// A redirect response carried no usable `Location` header.
    #[error("redirect from {url} has no valid Location header")]
    MissingLocation { url: String },

    /// The transfer did not finish before its deadline.
    #[error("transfer timed out after {duration_ms} ms")]
    Timeout { duration_ms: u64 },

    /// Image decode, crop or resize failure.
    #[error("image processing failed: {0}")]
    Image(String),

    /// The source image or requested output has a zero dimension.
    #[error("image dimensions are zero")]
    ZeroDimensions,

    /// The crop does not lie inside the image.
    #[error("crop rectangle does not fit inside the image")]
    InvalidCrop,
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" at {}", p.display()),
        None => String::new(),
    }
}

impl FaceCropError {
    /// Create a configuration error
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an I/O error bound to a path
    pub fn io(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: Some(path.into()),
            source,
        }
    }

    /// Create a network error
    pub fn network(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Create an image error from any displayable cause
    pub fn image(reason: impl std::fmt::Display) -> Self {
        Self::Image(reason.to_string())
    }

    /// Short category name, used as a structured logging field.
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotConfigured | Self::Config { .. } => "config",
            Self::Io { .. } => "io",
            Self::Network { .. }
            | Self::HttpStatus { .. }
            | Self::TooManyRedirects { .. }
            | Self::MissingLocation { .. }
            | Self::Timeout { .. } => "transfer",
            Self::Image(_) | Self::ZeroDimensions | Self::InvalidCrop => "image",
        }
    }
}

/// Result alias used across the library.
pub type FaceCropResult<T> = Result<T, FaceCropError>;

/// Errors that a later attempt may not reproduce.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for FaceCropError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } | Self::Io { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Errors that carry a reporting severity.
pub trait HasSeverity {
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for FaceCropError {
    fn severity(&self) -> ErrorSeverity {
        match self.category() {
            "config" => ErrorSeverity::Fatal,
            "transfer" => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_errors_are_retryable_warnings() {
        let errors = [
            FaceCropError::network("https://x", "connection reset"),
            FaceCropError::Timeout { duration_ms: 10 },
            FaceCropError::http_status("https://x", 500),
        ];
        for err in errors {
            assert!(err.is_retryable(), "{err}");
            assert_eq!(err.severity(), ErrorSeverity::Warning);
        }
    }

    #[test]
    fn client_errors_and_config_are_not_retryable() {
        assert!(!FaceCropError::http_status("https://x", 404).is_retryable());
        assert!(!FaceCropError::TooManyRedirects { limit: 5 }.is_retryable());
        assert!(!FaceCropError::NotConfigured.is_retryable());
        assert_eq!(FaceCropError::NotConfigured.severity(), ErrorSeverity::Fatal);
    }

    #[test]
    fn io_message_includes_path() {
        let err = FaceCropError::io(
            "create cache directory",
            "/tmp/cache/models",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("create cache directory"));
        assert!(msg.contains("/tmp/cache/models"));
        assert_eq!(err.category(), "io");
    }
}
