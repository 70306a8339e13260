//! Common test utilities for the facecrop integration tests
//!
//! Provides a scripted [`Transport`] double, a log capture helper and small
//! image fixtures.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use facecrop::FaceCropResult;
use facecrop::config::ModelCacheConfig;
use facecrop::error::FaceCropError;
use facecrop::model::{FetchResponse, ModelCache, Transport};
use futures_util::StreamExt;
use futures_util::stream;
use parking_lot::Mutex;

pub const MODEL_URL: &str = "https://models.example.test/face/model.onnx";
pub const MODEL_BYTES: &[u8] = b"\x08\x07\x12\x0bfacecrop-test-model\x00\x01\x02\x03";

/// Scripted transport double
pub mod transport {
    use super::*;

    /// What the next GET returns.
    #[derive(Clone, Debug)]
    pub enum Reply {
        /// 200 with the body split into two chunks
        Body(Vec<u8>),
        /// 200 after a delay
        DelayedBody(Duration, Vec<u8>),
        /// Bare status with an empty body
        Status(u16),
        /// 302 to the given location
        Redirect(String),
        /// 302 without a Location header
        RedirectWithoutLocation,
        /// Connection-level failure
        NetworkError,
        /// 200 whose body fails after the first chunk
        BrokenBody(Vec<u8>),
        /// Never answers
        Hang,
    }

    /// Transport that replays a fixed script and records every request.
    pub struct ScriptedTransport {
        script: Mutex<VecDeque<Reply>>,
        repeat: Option<Reply>,
        calls: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        pub fn new(script: impl IntoIterator<Item = Reply>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into_iter().collect()),
                repeat: None,
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            })
        }

        /// Transport that must never be called.
        pub fn empty() -> Arc<Self> {
            Self::new(Vec::<Reply>::new())
        }

        /// Answers every request with `reply`.
        pub fn repeating(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(VecDeque::new()),
                repeat: Some(reply),
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn urls(&self) -> Vec<String> {
            self.urls.lock().clone()
        }

        fn next_reply(&self, url: &str) -> Reply {
            if let Some(reply) = self.script.lock().pop_front() {
                return reply;
            }
            match &self.repeat {
                Some(reply) => reply.clone(),
                None => panic!("unscripted request to {url}"),
            }
        }
    }

    fn ok(body: Vec<u8>) -> FetchResponse {
        let mid = body.len() / 2;
        let chunks = vec![
            Ok(Bytes::copy_from_slice(&body[..mid])),
            Ok(Bytes::copy_from_slice(&body[mid..])),
        ];
        FetchResponse {
            status: 200,
            location: None,
            body: stream::iter(chunks).boxed(),
        }
    }

    fn status(status: u16, location: Option<String>) -> FetchResponse {
        FetchResponse {
            status,
            location,
            body: stream::empty().boxed(),
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, url: &str) -> FaceCropResult<FetchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().push(url.to_string());

            match self.next_reply(url) {
                Reply::Body(body) => Ok(ok(body)),
                Reply::DelayedBody(delay, body) => {
                    tokio::time::sleep(delay).await;
                    Ok(ok(body))
                }
                Reply::Status(code) => Ok(status(code, None)),
                Reply::Redirect(location) => Ok(status(302, Some(location))),
                Reply::RedirectWithoutLocation => Ok(status(302, None)),
                Reply::NetworkError => Err(FaceCropError::network(url, "connection refused")),
                Reply::BrokenBody(prefix) => {
                    let source = url.to_string();
                    let chunks = vec![
                        Ok(Bytes::from(prefix)),
                        Err(FaceCropError::network(source, "connection reset by peer")),
                    ];
                    Ok(FetchResponse {
                        status: 200,
                        location: None,
                        body: stream::iter(chunks).boxed(),
                    })
                }
                Reply::Hang => {
                    std::future::pending::<()>().await;
                    unreachable!("pending future resolved")
                }
            }
        }
    }
}

/// Log capture
pub mod logs {
    use super::*;

    /// Shared in-memory sink for formatted log lines.
    #[derive(Clone, Default)]
    pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Route this thread's events into a buffer until the guard is dropped.
    ///
    /// Use with the current-thread runtime that `#[tokio::test]` defaults to.
    pub fn capture() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        (buffer, tracing::subscriber::set_default(subscriber))
    }
}

/// Cache construction helpers
pub mod fixtures {
    use super::*;

    pub fn config(cache_dir: &Path) -> ModelCacheConfig {
        ModelCacheConfig::default()
            .with_cache_dir(cache_dir)
            .with_url(MODEL_URL)
    }

    pub fn cache(cache_dir: &Path, transport: Arc<dyn Transport>) -> ModelCache {
        ModelCache::new(config(cache_dir), transport)
    }

    /// Place a model file in the cache as if an earlier build downloaded it.
    pub fn seed_model(cache: &ModelCache, contents: &[u8]) {
        let path = cache.model_path().expect("configured cache");
        std::fs::create_dir_all(path.parent().expect("models dir")).expect("create models dir");
        std::fs::write(path, contents).expect("write model");
    }
}
