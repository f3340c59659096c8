//! # Restive - a retry-aware REST resource client
//!
//! Restive is a client-side request pipeline built on top of `reqwest`. A
//! [`Resource`] ties a parameterized endpoint template to a serializer and a
//! retry policy; each call resolves the template, encodes the body, drives
//! the transport with bounded exponential backoff, and decodes the response
//! after negotiating its content type.
//!
//! ## Quick Start
//!
//! ```no_run
//! use restive::Resource;
//! use http::Method;
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), restive::Error> {
//!     let resource = Resource::for_endpoint(
//!         "https://api.example.com/v1/users/{user_id}?version={version}",
//!     )?;
//!
//!     let params = HashMap::from([
//!         ("user_id".to_string(), "42".to_string()),
//!         ("version".to_string(), "7".to_string()),
//!     ]);
//!
//!     // Prepare the call; nothing touches the network yet.
//!     let (call, cancel) = resource.request::<()>(Method::GET, Some(&params), None)?;
//!
//!     // Hand the cancel handle to whoever may need to abort, then invoke.
//!     drop(cancel);
//!     let exchange = call.invoke().await?;
//!
//!     println!("status: {}", exchange.status);
//!     println!("attempts: {}", exchange.attempts);
//!     if let Some(body) = exchange.body {
//!         println!("body: {body}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **URL templates** - `{name}` placeholders in the path, fragment, or
//!   query string, resolved per call; unmatched values become query
//!   parameters instead of being dropped
//! - **Bounded retries** - exponential backoff with jitter, retrying on
//!   timeouts and a configurable status code set
//! - **Pluggable serialization** - a [`Serializer`] trait with a JSON:API
//!   default, negotiating the response content type before decoding
//! - **Cancellation and deadlines** - every call carries a cancel handle
//!   and a per-call timeout that interrupt both transport waits and
//!   backoff sleeps
//! - **Status-centric results** - a completed round-trip is never an error;
//!   callers read [`Exchange::status`], so an exhausted 500 comes back as
//!   data, not as a panic path
//! - **Structured logging** - attempt-level `tracing` spans for
//!   observability
//!
//! ## Error Handling
//!
//! Errors are reserved for calls that never completed a round-trip or whose
//! response could not be decoded:
//!
//! ```no_run
//! use restive::{Error, Resource};
//!
//! # async fn example() -> Result<(), Error> {
//! # let resource = Resource::for_endpoint("https://api.example.com/things")?;
//! match resource.get(None).await {
//!     Ok(exchange) if exchange.status.is_success() => {
//!         println!("ok: {:?}", exchange.body);
//!     }
//!     Ok(exchange) => {
//!         eprintln!("service answered {}", exchange.status);
//!     }
//!     Err(Error::DecodingFailed { raw_response, detail, status }) => {
//!         eprintln!("undecodable body (status {status}): {detail}");
//!         eprintln!("  raw: {raw_response}");
//!     }
//!     Err(e) => eprintln!("call failed: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod resource;
pub mod retry;
mod search;
pub mod serialize;
pub mod template;
pub mod transport;

pub use error::{BoxError, Error, Result};
pub use resource::{Call, CancelHandle, Exchange, Resource};
pub use retry::{ExponentialBackoff, Retrier, RetryOutcome};
pub use serialize::{JsonSerializer, Serializer};
pub use transport::{PreparedRequest, Transport, TransportResponse};
