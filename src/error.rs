//! Error types for the request pipeline.
//!
//! A completed HTTP round-trip is never an error here, whatever its status
//! code: callers read `Exchange::status` to tell success from failure. The
//! variants below cover everything else — the network was never reached, the
//! call was cut short, or a body could not be encoded or decoded.

use http::StatusCode;

/// Boxed error type used at the [`Serializer`](crate::Serializer) boundary.
///
/// Concrete serializers surface their own error types through this alias;
/// the orchestrator wraps them into [`Error::EncodingFailed`] or
/// [`Error::DecodingFailed`], which is the layer that knows the status code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for calls made through a [`Resource`](crate::Resource).
///
/// When an error carries a status code, a response was received and the
/// failure happened while decoding it; [`Error::status`] returns `None` when
/// the network was never (successfully) reached.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection failed, DNS lookup failed,
    /// etc.).
    ///
    /// This wraps the underlying `reqwest::Error` and indicates problems at
    /// the network layer rather than the HTTP protocol layer.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The transport timed out, or the per-call deadline expired.
    ///
    /// Transport-level timeouts are retried by the default retry policy;
    /// this variant surfaces once attempts are exhausted or the overall
    /// deadline passes.
    #[error("request timed out")]
    Timeout,

    /// The call was cancelled through its [`CancelHandle`](crate::CancelHandle)
    /// before completing.
    #[error("call cancelled")]
    Cancelled,

    /// The request body could not be serialized.
    ///
    /// Surfaced before any network activity takes place.
    #[error("failed to encode request body: {0}")]
    EncodingFailed(String),

    /// The response body was non-empty but could not be deserialized.
    ///
    /// Preserves the raw body text and the serializer's error message so
    /// decode failures can be debugged in production.
    #[error("failed to decode response (status {status}): {detail}")]
    DecodingFailed {
        /// The raw response body that failed to decode.
        raw_response: String,
        /// The serializer's error message.
        detail: String,
        /// The HTTP status code of the response.
        status: StatusCode,
    },

    /// The response declared only content types outside the serializer's
    /// accepted set.
    #[error("no compatible content type in response (status {status}): {content_types:?}")]
    IncompatibleContentType {
        /// The HTTP status code of the response.
        status: StatusCode,
        /// The content types the response declared.
        content_types: Vec<String>,
    },

    /// Invalid configuration was provided.
    ///
    /// Indicates programmer misuse, such as a serializer declaring a MIME
    /// type that is not a valid header value.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid URL was provided.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns the HTTP status code if a response was obtained before the
    /// failure, `None` if the network was never reached.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::DecodingFailed { status, .. } => Some(*status),
            Error::IncompatibleContentType { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error preserved one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::DecodingFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Returns `true` if this error represents a timeout condition, the
    /// retryable flavor of transport failure.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout => true,
            Error::Network(inner) => inner.is_timeout(),
            _ => false,
        }
    }
}

/// A specialized `Result` type for calls made through this crate.
pub type Result<T> = std::result::Result<T, Error>;
