//! Basic example tracking an event and identifying the user behind it.
//!
//! This example shows how to:
//! - Create a client with basic configuration
//! - Track an event with properties
//! - Identify a user and a group
//! - Inspect the recorded response
//!
//! Run with: `AMPLITUDE_API_KEY=... cargo run --example track_event`

use amplitude_http::{Client, Error, Event, PropertyOperations, UserIdentification};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("amplitude_http=debug,track_event=info")
        .init();

    let api_key = std::env::var("AMPLITUDE_API_KEY").unwrap_or_default();
    let enabled = !api_key.is_empty();

    // Without a key the client runs disabled and never touches the network
    let client = Client::builder(api_key)
        .enabled(enabled)
        .app_version("0.1.0")
        .set_time(true)
        .build()?;

    println!("=== Track ===");
    let event = Event::new("demo run")
        .user_id("demo-user")
        .event_property("language", json!("rust"));
    let record = client.track(event).await?;

    println!("Status code: {}", record.status);
    println!("Retries: {}", record.retry_count);
    println!("Latency: {:?}", record.elapsed());
    println!(
        "Insert id: {:?}",
        record.request_data.events()[0].insert_id
    );
    println!();

    println!("=== Identify ===");
    let identification = UserIdentification::user("demo-user").user_properties(
        PropertyOperations::default()
            .set("plan", json!("free"))
            .add("demo_runs", json!(1)),
    );
    let record = client.identify(&identification).await?;
    println!("Status code: {}", record.status);
    println!();

    println!("=== Group Identify ===");
    let record = client
        .group_identify("team", "rustaceans", &json!({"size": 3}))
        .await?;
    println!("Status code: {}", record.status);
    println!("Body: {}", record.text());

    Ok(())
}
