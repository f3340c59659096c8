//! A thin "user" domain resource built on the pipeline.
//!
//! This example shows the intended division of labor: the resource layer
//! handles templates, retries, and decoding, while the domain layer only
//! shapes the payload and converts the polymorphic body into its own types
//! with `serde_json::from_value`.
//!
//! Run with: `cargo run --example user_crud`
//! Point it at a live API with `USER_API_HOST=https://staging.example.com`.

use restive::Resource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Serialize, Deserialize)]
struct User {
    id: String,
    first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
}

/// The API wraps every payload in an envelope carrying either data or an
/// error description.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

/// Converts the polymorphic response body into the envelope struct.
fn convert(body: Option<Value>) -> Result<Envelope, serde_json::Error> {
    match body {
        Some(value) => serde_json::from_value(value),
        None => Ok(Envelope::default()),
    }
}

async fn create(host: &str, save: &Envelope) -> Result<(Envelope, u16), Box<dyn std::error::Error>> {
    let resource = Resource::for_endpoint(format!("{host}/v1/membership/users"))?;
    let exchange = resource.post(None, save).await?;
    Ok((convert(exchange.body)?, exchange.status.as_u16()))
}

async fn fetch(host: &str, id: &str) -> Result<(Envelope, u16), Box<dyn std::error::Error>> {
    let resource = Resource::for_endpoint(format!("{host}/v1/membership/users/{{user_id}}"))?;
    let params = HashMap::from([("user_id".to_string(), id.to_string())]);
    let exchange = resource.get(Some(&params)).await?;
    Ok((convert(exchange.body)?, exchange.status.as_u16()))
}

async fn delete(
    host: &str,
    id: &str,
    version: u32,
) -> Result<(Envelope, u16), Box<dyn std::error::Error>> {
    let resource = Resource::for_endpoint(format!(
        "{host}/v1/membership/users/{{user_id}}?version={{version}}"
    ))?;
    let params = HashMap::from([
        ("user_id".to_string(), id.to_string()),
        ("version".to_string(), version.to_string()),
    ]);
    let exchange = resource.delete(Some(&params)).await?;
    Ok((convert(exchange.body)?, exchange.status.as_u16()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("restive=info,user_crud=info")
        .init();

    let host = std::env::var("USER_API_HOST").unwrap_or_else(|_| "http://localhost:8080".to_string());

    println!("=== Create a user ===");
    let save = Envelope {
        data: Some(User {
            id: "42".to_string(),
            first_name: "Julien".to_string(),
            last_name: None,
        }),
        ..Default::default()
    };
    match create(&host, &save).await {
        Ok((envelope, status)) => println!("status {status}: {envelope:?}"),
        Err(e) => println!("create failed: {e}"),
    }

    println!("=== Fetch the user back ===");
    match fetch(&host, "42").await {
        Ok((envelope, status)) => println!("status {status}: {envelope:?}"),
        Err(e) => println!("fetch failed: {e}"),
    }

    println!("=== Delete it ===");
    match delete(&host, "42", 1).await {
        Ok((envelope, status)) => println!("status {status}: {envelope:?}"),
        Err(e) => println!("delete failed: {e}"),
    }

    Ok(())
}
