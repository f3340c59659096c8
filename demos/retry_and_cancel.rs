//! Watch the retry policy back off against a flaky endpoint, then cancel a
//! hung call from another task.
//!
//! Run with: `cargo run --example retry_and_cancel`
//! Set `RUST_LOG=restive=debug` to see every attempt.

use http::Method;
use restive::{Error, ExponentialBackoff, Resource};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("restive=info,retry_and_cancel=info")
        .init();

    println!("=== Bounded retries with exponential backoff ===");
    let flaky = Resource::for_endpoint("http://localhost:8080/unstable")?
        .with_retrier(ExponentialBackoff::new().with_max_tries(4))
        .with_timeout(Duration::from_secs(20));

    match flaky.get(None).await {
        Ok(exchange) => println!(
            "finished with status {} after {} attempt(s) in {:?}",
            exchange.status, exchange.attempts, exchange.latency,
        ),
        Err(e) => println!("gave up: {e}"),
    }

    println!("=== Cancelling an in-flight call ===");
    let slow = Resource::for_endpoint("http://localhost:8080/slow")?.with_timeout(Duration::ZERO);
    let (call, cancel) = slow.request::<()>(Method::GET, None, None)?;

    let worker = tokio::spawn(call.invoke());
    tokio::time::sleep(Duration::from_millis(500)).await;
    cancel.cancel();

    match worker.await? {
        Err(Error::Cancelled) => println!("call unblocked with a cancellation error"),
        other => println!("call finished before the cancel landed: {other:?}"),
    }

    Ok(())
}
