//! The transport boundary: one operation, send a prepared request.
//!
//! The pipeline composes requests and decodes responses; everything between
//! those two points — connections, pooling, TLS — belongs to the
//! [`Transport`]. The default implementation is [`reqwest::Client`]; tests
//! substitute scripted implementations at the same seam.

use async_trait::async_trait;
use http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::{Error, Result};

/// A fully built request, ready for dispatch.
///
/// Constructed once per [`Resource::request`](crate::Resource::request)
/// invocation and consumed by a single retry loop, which re-stamps its
/// `Date` header before every attempt.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// The HTTP method.
    pub method: Method,
    /// The fully resolved URL.
    pub url: Url,
    /// Request headers, including `Accept` and (when a body is present)
    /// `Content-Type`.
    pub headers: HeaderMap,
    /// The encoded request body, if any.
    pub body: Option<Vec<u8>>,
}

/// A response as seen at the transport boundary, with its body fully read.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The raw response body.
    pub body: Vec<u8>,
}

/// Sends a prepared request and produces a response or an error.
///
/// Implementations must read the response body to completion before
/// returning, whatever the outcome, so lower layers can reuse the
/// connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one send. Retrying is the caller's business, not the
    /// transport's.
    async fn send(&self, request: &PreparedRequest) -> Result<TransportResponse>;
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn send(&self, request: &PreparedRequest) -> Result<TransportResponse> {
        let mut builder = self.request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(normalize)?;
        let status = response.status();
        let headers = response.headers().clone();
        // Read to completion so the connection goes back to the pool,
        // whatever the decode step decides later.
        let body = response.bytes().await.map_err(normalize)?.to_vec();

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

/// Folds timeout-flavored reqwest errors into [`Error::Timeout`] so the
/// retry policy has a single shape to test for.
fn normalize(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Timeout
    } else {
        Error::Network(error)
    }
}
