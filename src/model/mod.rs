//! # Detection Model Cache
//!
//! Makes sure the face-detection model is on local disk before detection runs.
//! The model is fetched at most once per cache directory and reused by every
//! later build.
//!
//! - [`cache`]: the cache state machine, single-flight guard and atomic commit
//! - [`transport`]: the HTTP seam, with a `reqwest` implementation
//!
//! Failures other than a missing cache directory never surface as errors:
//! [`ModelCache::ensure`] logs a warning and returns `Ok(None)` so thumbnailing
//! can fall back to center crops.

pub mod cache;
pub mod transport;

pub use cache::ModelCache;
pub use transport::{BodyStream, FetchResponse, ReqwestTransport, Transport};
