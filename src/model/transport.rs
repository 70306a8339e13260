//! HTTP transport used by the model cache.
//!
//! A transport performs exactly one GET and never follows redirects itself; the
//! cache walks the redirect chain so it can enforce its hop limit.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::Url;

use crate::error::{FaceCropError, FaceCropResult};

/// Response body as a stream of chunks.
pub type BodyStream = BoxStream<'static, FaceCropResult<Bytes>>;

/// Status, redirect target and body of a single GET.
pub struct FetchResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: BodyStream,
}

impl FetchResponse {
    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Status codes the cache follows by re-issuing a GET.
    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307 | 308)
    }
}

impl std::fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Issues a single, non-redirect-following GET.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> FaceCropResult<FetchResponse>;
}

/// Resolve a `Location` header against the URL that returned it.
pub fn resolve_location(current: &str, location: &str) -> FaceCropResult<String> {
    let base = Url::parse(current).map_err(|e| FaceCropError::network(current, e))?;
    base.join(location)
        .map(String::from)
        .map_err(|_| FaceCropError::MissingLocation {
            url: current.to_string(),
        })
}

/// [`Transport`] backed by a `reqwest` client with redirects disabled.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Connect timeout applied to every request.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> FaceCropResult<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Self::CONNECT_TIMEOUT)
            .user_agent(concat!("facecrop/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FaceCropError::network("<client>", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> FaceCropResult<FetchResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FaceCropError::network(url, e))?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let source = url.to_owned();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| FaceCropError::network(source.as_str(), e)))
            .boxed();

        Ok(FetchResponse {
            status,
            location,
            body,
        })
    }
}
