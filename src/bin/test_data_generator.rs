//! Test Data Generator for Tidepool
//!
//! Sends synthetic sensor events to the ingester's `/ingest` endpoint,
//! wrapped in the same batch envelope the stream trigger delivers.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin test-data-generator -- \
//!   --endpoint http://localhost:8081 \
//!   --count 100 \
//!   --batch-size 10 \
//!   --interval 500ms
//! ```

use tidepool::ingester::decoder;

use clap::Parser;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

const LOCATIONS: [&str; 5] = ["tokyo", "osaka", "nagoya", "fukuoka", "sapporo"];
const ZONES: [&str; 3] = ["zone-a", "zone-b", "zone-c"];

/// Test Data Generator for Tidepool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ingester endpoint URL
    #[arg(long, default_value = "http://localhost:8081")]
    endpoint: String,

    /// Number of events to send
    #[arg(long, default_value = "10")]
    count: usize,

    /// Pause between requests (e.g., "1s", "250ms")
    #[arg(long, default_value = "1s")]
    interval: humantime::Duration,

    /// Events per HTTP request
    #[arg(long, default_value = "1")]
    batch_size: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Per-run totals
#[derive(Debug, Default)]
struct Stats {
    events_sent: usize,
    batches_sent: usize,
    errors: usize,
    processed: u64,
    failed: u64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn generate_event<R: Rng>(rng: &mut R) -> Value {
    json!({
        "timestamp": chrono::Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        "source": format!("sensor-{}", rng.gen_range(1..=10)),
        "metrics": {
            "temperature": round2(rng.gen_range(20.0..35.0)),
            "humidity": round2(rng.gen_range(30.0..80.0)),
            "pressure": round2(rng.gen_range(1000.0..1020.0)),
            "cpu_usage": round2(rng.gen_range(10.0..90.0)),
            "memory_usage": round2(rng.gen_range(20.0..85.0)),
            "network_throughput": round2(rng.gen_range(100.0..1000.0)),
        },
        "relationships": {
            "device_id": format!("device-{}", rng.gen_range(1..=5)),
            "location": LOCATIONS.choose(rng).copied().unwrap_or(LOCATIONS[0]),
            "zone": ZONES.choose(rng).copied().unwrap_or(ZONES[0]),
        }
    })
}

/// Wrap events in a stream-trigger batch, numbering them from `first_sequence`.
fn build_batch(events: &[Value], first_sequence: u64) -> Value {
    let records: Vec<Value> = events
        .iter()
        .enumerate()
        .map(|(offset, event)| {
            json!({
                "kinesis": {
                    "data": decoder::encode(event),
                    "sequenceNumber": (first_sequence + offset as u64).to_string(),
                }
            })
        })
        .collect();
    json!({ "Records": records })
}

/// HTTP client for the ingester
struct IngesterClient {
    client: Client,
    endpoint: String,
}

impl IngesterClient {
    fn new(endpoint: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn send_batch(&self, batch: &Value) -> Result<Value, String> {
        let resp = self
            .client
            .post(format!("{}/ingest", self.endpoint))
            .json(batch)
            .send()
            .await
            .map_err(|e| format!("HTTP request failed: {}", e))?;

        let status = resp.status();
        if status.is_success() {
            resp.json::<Value>()
                .await
                .map_err(|e| format!("invalid response body: {}", e))
        } else {
            Err(format!(
                "HTTP error: {} - {}",
                status,
                resp.text().await.unwrap_or_default()
            ))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let batch_size = args.batch_size.max(1);

    println!("Tidepool Test Data Generator");
    println!("============================");
    println!("Endpoint:      {}", args.endpoint);
    println!("Events:        {}", args.count);
    println!("Batch size:    {}", batch_size);
    println!("Interval:      {}", args.interval);
    println!();

    let client = IngesterClient::new(&args.endpoint)?;
    let mut rng = rand::thread_rng();
    let mut stats = Stats::default();
    let mut next_sequence = chrono::Utc::now().timestamp_millis().max(0) as u64 * 1000;
    let start_time = Instant::now();

    let mut remaining = args.count;
    while remaining > 0 {
        let n = remaining.min(batch_size);
        let events: Vec<Value> = (0..n).map(|_| generate_event(&mut rng)).collect();
        let batch = build_batch(&events, next_sequence);
        next_sequence += n as u64;

        match client.send_batch(&batch).await {
            Ok(body) => {
                stats.events_sent += n;
                stats.batches_sent += 1;
                stats.processed += body.get("processed").and_then(Value::as_u64).unwrap_or(0);
                stats.failed += body.get("failed").and_then(Value::as_u64).unwrap_or(0);
                if args.verbose {
                    println!("Sent batch of {} events: {}", n, body);
                }
            }
            Err(e) => {
                stats.errors += 1;
                eprintln!("Error sending batch: {}", e);
            }
        }

        remaining -= n;
        if remaining > 0 {
            tokio::time::sleep(*args.interval).await;
        }
    }

    let elapsed = start_time.elapsed();
    println!();
    println!("Summary");
    println!("-------");
    println!("Events sent:   {}/{}", stats.events_sent, args.count);
    println!("Batches sent:  {}", stats.batches_sent);
    println!("Processed:     {}", stats.processed);
    println!("Failed:        {}", stats.failed);
    println!("Send errors:   {}", stats.errors);
    println!("Elapsed:       {:.2?}", elapsed);

    if stats.errors > 0 || stats.failed > 0 {
        println!("Some events were not ingested. Check the ingester logs.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_event_shape() {
        let mut rng = rand::thread_rng();
        let event = generate_event(&mut rng);

        let metrics = event["metrics"].as_object().unwrap();
        assert_eq!(metrics.len(), 6);
        for (name, value) in metrics {
            let v = value.as_f64().unwrap();
            assert_eq!(v, round2(v), "{name} should be rounded to 2 decimals");
        }
        assert!(event["source"].as_str().unwrap().starts_with("sensor-"));
        assert!(LOCATIONS.contains(&event["relationships"]["location"].as_str().unwrap()));
    }

    #[test]
    fn test_batch_sequence_numbers_increase() {
        let events = vec![json!({"a": 1}), json!({"b": 2}), json!({"c": 3})];
        let batch = build_batch(&events, 41);
        let sequences: Vec<&str> = batch["Records"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["kinesis"]["sequenceNumber"].as_str().unwrap())
            .collect();
        assert_eq!(sequences, vec!["41", "42", "43"]);
    }
}
