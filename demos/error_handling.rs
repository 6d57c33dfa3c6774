//! Example demonstrating error handling.
//!
//! This example shows how to:
//! - Tell API rejections apart from transport failures
//! - Inspect the response attached to an API error
//! - Observe retries through a log sink
//!
//! Run with: `cargo run --example error_handling`

use amplitude_http::{Client, Error, Event, LogLevel};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("amplitude_http=info")
        .init();

    println!("=== Example 1: Rejected by the collector ===");
    // An invalid key is rejected with 400, which is never retried
    let client = Client::builder("not-a-real-key")
        .logger(|level: LogLevel, message: &str| println!("  [{level}] {message}"))
        .build()?;

    match client.track(Event::new("demo").user_id("demo-user")).await {
        Ok(record) => println!("Accepted: {}", record.text()),
        Err(Error::Api { message, response }) => {
            println!("API Error!");
            println!("  Message: {}", message);
            println!("  Status: {}", response.status);
            println!("  Retries: {}", response.retry_count);
            println!("  Body: {}", response.text());
            println!("  Content-Type: {:?}", response.header("content-type"));
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Example 2: Nothing listening ===");
    let client = Client::builder("demo")
        .endpoint("http://127.0.0.1:9")?
        .max_retries(5)
        .build()?;

    match client.track(Event::new("demo").user_id("demo-user")).await {
        Ok(_) => println!("Unexpected success"),
        Err(e) if e.is_transport() => {
            println!("Transport error (not retried): {}", e);
        }
        Err(e) => println!("Other error: {}", e),
    }

    Ok(())
}
