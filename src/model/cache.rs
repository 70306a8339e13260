//! # Model Cache
//!
//! Lifecycle of the cached model file for one cache directory:
//!
//! ```text
//! absent ──ensure──► downloading (<file>.tmp) ──rename──► present
//!                        │
//!                        └── error / timeout ──► temp removed, Ok(None)
//! ```
//!
//! `ensure` on a present file returns immediately without touching the
//! network. Concurrent `ensure` calls for the same destination are serialized on
//! a per-destination async lock; a caller that waited re-checks the disk and
//! picks up the file the first caller committed, so only one transfer runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::transport::{ReqwestTransport, Transport, resolve_location};
use crate::config::ModelCacheConfig;
use crate::error::{FaceCropError, FaceCropResult};

const MODELS_SUBDIR: &str = "models";
const TEMP_SUFFIX: &str = ".tmp";

/// Handle to the model cache. Clones share the transport and the in-flight
/// registry.
#[derive(Clone)]
pub struct ModelCache {
    inner: Arc<Inner>,
}

struct Inner {
    config: ModelCacheConfig,
    transport: Arc<dyn Transport>,
    inflight: Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>,
}

impl ModelCache {
    pub fn new(config: ModelCacheConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                inflight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Cache backed by [`ReqwestTransport`].
    pub fn with_reqwest(config: ModelCacheConfig) -> FaceCropResult<Self> {
        Ok(Self::new(config, Arc::new(ReqwestTransport::new()?)))
    }

    pub fn config(&self) -> &ModelCacheConfig {
        &self.inner.config
    }

    /// `<cache_dir>/models`
    pub fn models_dir(&self) -> FaceCropResult<PathBuf> {
        let root = self
            .inner
            .config
            .cache_dir
            .as_ref()
            .ok_or(FaceCropError::NotConfigured)?;
        Ok(root.join(MODELS_SUBDIR))
    }

    /// Deterministic location of the cached model.
    pub fn model_path(&self) -> FaceCropResult<PathBuf> {
        Ok(self.models_dir()?.join(&self.inner.config.file_name))
    }

    /// Side file written during a download.
    pub fn temp_path(&self) -> FaceCropResult<PathBuf> {
        let name = format!("{}{}", self.inner.config.file_name, TEMP_SUFFIX);
        Ok(self.models_dir()?.join(name))
    }

    /// True if the model file is already on disk.
    pub async fn is_present(&self) -> FaceCropResult<bool> {
        Ok(is_file(&self.model_path()?).await)
    }

    /// Delete the cached model. Returns whether a file was removed.
    pub async fn remove(&self) -> FaceCropResult<bool> {
        let path = self.model_path()?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %path.display(), "removed cached model");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FaceCropError::io("remove cached model", path, e)),
        }
    }

    /// Make sure the model is cached and return its path.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(path))` when the model is on disk, downloaded now or earlier
    /// - `Ok(None)` when the cache directory could not be created or the
    ///   download failed; a warning has been logged and nothing is left behind
    ///
    /// # Errors
    ///
    /// Only [`FaceCropError::NotConfigured`], before any I/O happens.
    pub async fn ensure(&self) -> FaceCropResult<Option<PathBuf>> {
        let path = self.model_path()?;
        if is_file(&path).await {
            debug!(path = %path.display(), "model already cached");
            return Ok(Some(path));
        }

        let flight = self.flight_lock(&path);
        let _guard = flight.lock().await;
        if is_file(&path).await {
            debug!(path = %path.display(), "model committed by a concurrent caller");
            return Ok(Some(path));
        }

        let dir = self.models_dir()?;
        if let Err(source) = fs::create_dir_all(&dir).await {
            let err = FaceCropError::io("create model cache directory", &dir, source);
            warn!(error = %err, category = err.category(), "model cache unavailable");
            return Ok(None);
        }

        let temp = self.temp_path()?;
        let bytes = match self.download(&temp).await {
            Ok(bytes) => bytes,
            Err(err) => {
                discard_temp(&temp).await;
                warn!(
                    error = %err,
                    category = err.category(),
                    url = %self.inner.config.url,
                    "model download failed"
                );
                return Ok(None);
            }
        };

        if let Err(source) = fs::rename(&temp, &path).await {
            discard_temp(&temp).await;
            let err = FaceCropError::io("commit downloaded model", &path, source);
            warn!(error = %err, category = err.category(), "model download failed");
            return Ok(None);
        }

        info!(path = %path.display(), bytes, "model downloaded");
        Ok(Some(path))
    }

    fn flight_lock(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut inflight = self.inner.inflight.lock();
        Arc::clone(inflight.entry(path.to_path_buf()).or_default())
    }

    /// Stream the model into `temp` under the configured deadline.
    async fn download(&self, temp: &Path) -> FaceCropResult<u64> {
        let mut file = fs::File::create(temp)
            .await
            .map_err(|e| FaceCropError::io("create temporary file", temp, e))?;

        let timeout = self.inner.config.timeout;
        let written = tokio::time::timeout(timeout, self.transfer(&mut file, temp))
            .await
            .map_err(|_| FaceCropError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })??;

        file.flush()
            .await
            .map_err(|e| FaceCropError::io("flush temporary file", temp, e))?;
        file.sync_all()
            .await
            .map_err(|e| FaceCropError::io("sync temporary file", temp, e))?;
        Ok(written)
    }

    async fn transfer(&self, file: &mut fs::File, temp: &Path) -> FaceCropResult<u64> {
        let config = &self.inner.config;
        let mut url = config.url.clone();
        let mut hops: u8 = 0;

        loop {
            debug!(%url, "requesting model");
            let response = self.inner.transport.get(&url).await?;

            if response.is_redirect() {
                if hops >= config.max_redirects {
                    return Err(FaceCropError::TooManyRedirects {
                        limit: config.max_redirects,
                    });
                }
                let location = response
                    .location
                    .as_deref()
                    .ok_or_else(|| FaceCropError::MissingLocation { url: url.clone() })?;
                let next = resolve_location(&url, location)?;
                hops += 1;
                debug!(from = %url, to = %next, hop = hops, "following redirect");
                url = next;
                continue;
            }

            if !response.is_success() {
                return Err(FaceCropError::http_status(url, response.status));
            }

            let mut body = response.body;
            let mut written: u64 = 0;
            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| FaceCropError::io("write temporary file", temp, e))?;
                written += chunk.len() as u64;
            }
            return Ok(written);
        }
    }
}

impl std::fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCache")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

async fn discard_temp(temp: &Path) {
    match fs::remove_file(temp).await {
        Ok(()) => debug!(path = %temp.display(), "removed temporary file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %temp.display(), error = %e, "could not remove temporary file"),
    }
}
