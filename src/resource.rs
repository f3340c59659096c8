//! The resource orchestrator: endpoint configuration, request preparation,
//! and response decoding.
//!
//! A [`Resource`] bundles everything needed to call one REST endpoint — the
//! URL template, the transport, the serializer, the retry policy, and the
//! per-call timeout. [`Resource::request`] prepares a call and hands back a
//! deferred [`Call`] plus a [`CancelHandle`]; invoking the call drives the
//! retry policy against the transport and decodes whatever comes back into
//! an [`Exchange`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::retry::{ExponentialBackoff, Retrier};
use crate::search;
use crate::serialize::{JsonSerializer, Serializer};
use crate::template;
use crate::transport::{PreparedRequest, Transport, TransportResponse};
use crate::{Error, Result};

/// Per-call deadline applied unless configured otherwise.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A reusable, configurable client for one REST endpoint.
///
/// The endpoint is a URL template whose `{name}` placeholders are resolved
/// per call. Collaborators are installed up front with the `with_*` methods
/// and are read-only once calls are issued; concurrent calls share them
/// safely.
///
/// # Examples
///
/// ```no_run
/// use restive::{ExponentialBackoff, Resource};
/// use std::collections::HashMap;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), restive::Error> {
/// let resource = Resource::for_endpoint("https://api.example.com/v1/users/{user_id}")?
///     .with_timeout(Duration::from_secs(10))
///     .with_retrier(ExponentialBackoff::new().with_max_tries(5));
///
/// let params = HashMap::from([("user_id".to_string(), "42".to_string())]);
/// let exchange = resource.get(Some(&params)).await?;
/// println!("status: {}", exchange.status);
/// # Ok(())
/// # }
/// ```
pub struct Resource {
    transport: Arc<dyn Transport>,
    endpoint: Url,
    serializer: Arc<dyn Serializer>,
    retrier: Arc<dyn Retrier>,
    timeout: Duration,
}

impl Resource {
    /// Creates a resource for the given endpoint template with the default
    /// collaborators: a `reqwest` transport, the JSON serializer, the
    /// exponential-backoff retry policy, and a 30 second timeout.
    pub fn new(endpoint: Url) -> Self {
        Self {
            transport: Arc::new(reqwest::Client::new()),
            endpoint,
            serializer: Arc::new(JsonSerializer),
            retrier: Arc::new(ExponentialBackoff::new()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Parses the endpoint template and creates a resource for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the template is not a valid URL.
    pub fn for_endpoint(endpoint: impl AsRef<str>) -> Result<Self> {
        Ok(Self::new(Url::parse(endpoint.as_ref())?))
    }

    /// Replaces the transport.
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Replaces the serializer.
    pub fn with_serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Arc::new(serializer);
        self
    }

    /// Replaces the retry policy.
    pub fn with_retrier(mut self, retrier: impl Retrier + 'static) -> Self {
        self.retrier = Arc::new(retrier);
        self
    }

    /// Sets the per-call timeout. `Duration::ZERO` disables the deadline.
    ///
    /// The timeout spans the whole call — every attempt and every backoff
    /// wait — not each attempt individually.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Prepares a call: resolves the endpoint template against `params`,
    /// encodes `body` when present, and builds the request headers.
    ///
    /// Returns the deferred [`Call`] and a [`CancelHandle`] that aborts it.
    /// Nothing touches the network until the call is invoked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EncodingFailed`] if the body cannot be serialized —
    /// surfaced here, before any network activity.
    pub fn request<B: Serialize>(
        &self,
        method: Method,
        params: Option<&HashMap<String, String>>,
        body: Option<&B>,
    ) -> Result<(Call, CancelHandle)> {
        let url = template::resolve(&self.endpoint, params);

        let encoded = match body {
            Some(body) => {
                let value = serde_json::to_value(body)
                    .map_err(|error| Error::EncodingFailed(error.to_string()))?;
                let bytes = self
                    .serializer
                    .serialize(&value)
                    .map_err(|error| Error::EncodingFailed(error.to_string()))?;
                Some(bytes)
            }
            None => None,
        };

        let mut headers = HeaderMap::new();
        if encoded.is_some() {
            headers.insert(CONTENT_TYPE, header_value(self.serializer.content_type())?);
        }
        headers.insert(
            ACCEPT,
            header_value(&self.serializer.accepted_types().join(","))?,
        );

        let token = CancellationToken::new();
        let call = Call {
            transport: Arc::clone(&self.transport),
            serializer: Arc::clone(&self.serializer),
            retrier: Arc::clone(&self.retrier),
            prepared: PreparedRequest {
                method,
                url,
                headers,
                body: encoded,
            },
            token: token.clone(),
            timeout: self.timeout,
        };
        Ok((call, CancelHandle { token }))
    }

    /// Prepares and immediately invokes a GET call.
    pub async fn get(&self, params: Option<&HashMap<String, String>>) -> Result<Exchange> {
        let (call, _cancel) = self.request::<()>(Method::GET, params, None)?;
        call.invoke().await
    }

    /// Prepares and immediately invokes a POST call with a body.
    pub async fn post<B: Serialize>(
        &self,
        params: Option<&HashMap<String, String>>,
        body: &B,
    ) -> Result<Exchange> {
        let (call, _cancel) = self.request(Method::POST, params, Some(body))?;
        call.invoke().await
    }

    /// Prepares and immediately invokes a PUT call with a body.
    pub async fn put<B: Serialize>(
        &self,
        params: Option<&HashMap<String, String>>,
        body: &B,
    ) -> Result<Exchange> {
        let (call, _cancel) = self.request(Method::PUT, params, Some(body))?;
        call.invoke().await
    }

    /// Prepares and immediately invokes a PATCH call with a body.
    pub async fn patch<B: Serialize>(
        &self,
        params: Option<&HashMap<String, String>>,
        body: &B,
    ) -> Result<Exchange> {
        let (call, _cancel) = self.request(Method::PATCH, params, Some(body))?;
        call.invoke().await
    }

    /// Prepares and immediately invokes a DELETE call.
    pub async fn delete(&self, params: Option<&HashMap<String, String>>) -> Result<Exchange> {
        let (call, _cancel) = self.request::<()>(Method::DELETE, params, None)?;
        call.invoke().await
    }
}

/// A prepared, deferred call. Nothing happens until [`Call::invoke`] runs.
pub struct Call {
    transport: Arc<dyn Transport>,
    serializer: Arc<dyn Serializer>,
    retrier: Arc<dyn Retrier>,
    prepared: PreparedRequest,
    token: CancellationToken,
    timeout: Duration,
}

impl Call {
    /// Executes the call: drives the retry policy against the transport,
    /// then negotiates the content type and decodes the response body.
    ///
    /// The whole execution — transport sends and backoff waits alike — races
    /// against the cancel handle and the per-call deadline, so a blocked
    /// attempt unwinds promptly as [`Error::Cancelled`] or
    /// [`Error::Timeout`].
    ///
    /// A completed round-trip is returned as an [`Exchange`] whatever its
    /// status code; callers tell success from failure by reading
    /// [`Exchange::status`].
    pub async fn invoke(self) -> Result<Exchange> {
        let Self {
            transport,
            serializer,
            retrier,
            mut prepared,
            token,
            timeout,
        } = self;

        let started = Instant::now();
        let exchange = async {
            let outcome = retrier.try_send(transport.as_ref(), &mut prepared).await;
            let response = outcome.result?;
            decode_response(
                serializer.as_ref(),
                response,
                outcome.attempts,
                started.elapsed(),
            )
        };

        if timeout.is_zero() {
            tokio::select! {
                _ = token.cancelled() => Err(Error::Cancelled),
                result = exchange => result,
            }
        } else {
            tokio::select! {
                _ = token.cancelled() => Err(Error::Cancelled),
                result = tokio::time::timeout(timeout, exchange) => {
                    result.map_err(|_| Error::Timeout)?
                }
            }
        }
    }
}

/// Aborts the in-flight or pending call it was issued with.
///
/// Cancelling is idempotent: repeated calls, or cancelling after the call
/// completed, are no-ops.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Cancels the call, unblocking it with [`Error::Cancelled`].
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// A completed HTTP round-trip.
///
/// The status code is always present — an exhausted retryable status (say, a
/// 500 that never went away) lands here as a normal result, not as an error.
/// The body is the decoded polymorphic value, or `None` when the response
/// had no body; convert it into a domain type at the call site with
/// `serde_json::from_value`.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// The HTTP status code of the final attempt.
    pub status: StatusCode,
    /// The decoded response body, absent when the response was empty.
    pub body: Option<Value>,
    /// The response headers.
    pub headers: HeaderMap,
    /// Number of transport attempts the call took.
    pub attempts: u32,
    /// Total call latency, retries and backoff included.
    pub latency: Duration,
}

impl Exchange {
    /// Returns `true` if the call needed more than one attempt.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }
}

/// Validates the declared content type and decodes the response body.
fn decode_response(
    serializer: &dyn Serializer,
    response: TransportResponse,
    attempts: u32,
    latency: Duration,
) -> Result<Exchange> {
    let status = response.status;

    let declared: Vec<String> = response
        .headers
        .get_all(CONTENT_TYPE)
        .iter()
        .filter_map(|value| value.to_str().ok().map(str::to_owned))
        .collect();

    // When the response declares what it speaks, at least one declared type
    // must contain one of the accepted ones; a silent response is decoded on
    // trust.
    if !declared.is_empty() {
        let compatible = serializer
            .accepted_types()
            .iter()
            .any(|accepted| search::find(&declared, accepted, true).is_some());
        if !compatible {
            tracing::warn!(
                status = status.as_u16(),
                content_types = ?declared,
                "response content type not accepted by the serializer"
            );
            return Err(Error::IncompatibleContentType {
                status,
                content_types: declared,
            });
        }
    }

    let body = if response.body.is_empty() {
        None
    } else {
        let value = serializer
            .deserialize(&response.body)
            .map_err(|error| Error::DecodingFailed {
                raw_response: String::from_utf8_lossy(&response.body).into_owned(),
                detail: error.to_string(),
                status,
            })?;
        Some(value)
    };

    tracing::info!(
        status = status.as_u16(),
        attempts,
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );

    Ok(Exchange {
        status,
        body,
        headers: response.headers,
        attempts,
        latency,
    })
}

/// Builds a header value from a serializer-declared MIME type, surfacing a
/// bad declaration as programmer misuse.
fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|error| Error::ConfigurationError(format!("invalid header value {value:?}: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_response(content_type: Option<&str>, body: &[u8]) -> TransportResponse {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        }
        TransportResponse {
            status: StatusCode::OK,
            headers,
            body: body.to_vec(),
        }
    }

    #[test]
    fn empty_body_decodes_to_no_value() {
        let exchange = decode_response(
            &JsonSerializer,
            plain_response(Some("application/json"), b""),
            1,
            Duration::ZERO,
        )
        .unwrap();
        assert_eq!(exchange.status, StatusCode::OK);
        assert!(exchange.body.is_none());
    }

    #[test]
    fn undeclared_content_type_is_decoded_on_trust() {
        let exchange = decode_response(
            &JsonSerializer,
            plain_response(None, br#"{"ok":true}"#),
            1,
            Duration::ZERO,
        )
        .unwrap();
        assert_eq!(exchange.body.unwrap()["ok"], true);
    }

    #[test]
    fn content_type_parameters_still_match() {
        let exchange = decode_response(
            &JsonSerializer,
            plain_response(Some("application/json; charset=utf-8"), br#"{}"#),
            1,
            Duration::ZERO,
        )
        .unwrap();
        assert_eq!(exchange.status, StatusCode::OK);
    }

    #[test]
    fn alien_content_type_is_rejected_with_status() {
        let error = decode_response(
            &JsonSerializer,
            plain_response(Some("text/html"), b"<html></html>"),
            1,
            Duration::ZERO,
        )
        .unwrap_err();
        match error {
            Error::IncompatibleContentType {
                status,
                content_types,
            } => {
                assert_eq!(status, StatusCode::OK);
                assert_eq!(content_types, vec!["text/html".to_string()]);
            }
            other => panic!("expected IncompatibleContentType, got {other:?}"),
        }
    }

    #[test]
    fn malformed_body_preserves_raw_text_and_status() {
        let error = decode_response(
            &JsonSerializer,
            plain_response(Some("application/json"), b"not json"),
            1,
            Duration::ZERO,
        )
        .unwrap_err();
        assert_eq!(error.status(), Some(StatusCode::OK));
        assert_eq!(error.raw_response(), Some("not json"));
    }
}
