//! Test Request Generator
//!
//! Writes random classifier requests as JSON lines to stdout, for piping into
//! the `transaction-classifier` binary:
//!
//! ```text
//! request-generator 200 0.1 0 | transaction-classifier
//! ```

use rand::Rng;
use serde_json::{json, Value};
use std::io::Write;
use std::time::Duration;
use tracing::info;

/// Known merchants with the description prefixes their statements use
const MERCHANTS: &[(&str, &[&str])] = &[
    ("Walmart", &["WALMART GROCERY", "WALMART SUPERCENTER"]),
    ("Whole Foods", &["WHOLE FOODS MARKET"]),
    ("Starbucks", &["STARBUCKS COFFEE", "STARBUCKS STORE"]),
    ("Chipotle", &["CHIPOTLE MEXICAN GRILL"]),
    ("Uber", &["UBER TRIP", "UBER EATS"]),
    ("Shell", &["SHELL OIL STATION", "SHELL GAS STATION"]),
    ("Amazon", &["AMAZON.COM PURCHASE", "AMAZON MKTPLACE"]),
    ("Netflix", &["NETFLIX SUBSCRIPTION"]),
    ("Comcast", &["COMCAST CABLE"]),
    ("CVS", &["CVS PHARMACY"]),
    ("Marriott", &["MARRIOTT HOTEL"]),
    ("Planet Fitness", &["PLANET FITNESS GYM"]),
];

/// Unrecognisable statement lines
const NOISE: &[&str] = &["POS DEBIT", "ACH WITHDRAWAL", "CHECKCARD PURCHASE", "MISC"];

/// Random request generator for testing
struct RequestGenerator {
    rng: rand::rngs::ThreadRng,
    counter: u64,
}

impl RequestGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            counter: 0,
        }
    }

    /// A transaction from a known merchant
    fn known_transaction(&mut self) -> Value {
        self.counter += 1;
        let (merchant, descriptions) = MERCHANTS[self.rng.gen_range(0..MERCHANTS.len())];
        let description = descriptions[self.rng.gen_range(0..descriptions.len())];
        let amount: f64 = self.rng.gen_range(2.0..400.0);
        // occasional refund
        let amount = if self.rng.gen_bool(0.05) { -amount } else { amount };

        json!({
            "description": format!("{} #{:04}", description, self.rng.gen_range(1..10000)),
            "merchant": merchant,
            "amount": (amount * 100.0).round() / 100.0,
        })
    }

    /// A transaction neither classifier has seen
    fn unknown_transaction(&mut self) -> Value {
        self.counter += 1;
        json!({
            "description": format!(
                "{} {:08}",
                NOISE[self.rng.gen_range(0..NOISE.len())],
                self.counter
            ),
            "amount": (self.rng.gen_range(1.0..2000.0_f64) * 100.0).round() / 100.0,
        })
    }

    fn transaction(&mut self, unknown_rate: f64) -> Value {
        if self.rng.gen_bool(unknown_rate) {
            self.unknown_transaction()
        } else {
            self.known_transaction()
        }
    }

    /// One request, mostly single predictions
    fn request(&mut self, unknown_rate: f64) -> Value {
        match self.rng.gen_range(0..10) {
            0 => {
                let size = self.rng.gen_range(2..8);
                let transactions: Vec<Value> = (0..size)
                    .map(|_| self.transaction(unknown_rate))
                    .collect();
                json!({ "op": "predict_batch", "transactions": transactions })
            }
            1 => {
                let tx = self.transaction(unknown_rate);
                json!({
                    "op": "classify",
                    "description": tx["description"],
                    "merchant": tx["merchant"],
                })
            }
            _ => json!({ "op": "predict", "transaction": self.transaction(unknown_rate) }),
        }
    }
}

/// Share of unknown transactions, 0.1 unless a finite number is given
fn parse_rate(arg: Option<&String>) -> f64 {
    arg.and_then(|s| s.parse::<f64>().ok())
        .filter(|rate| rate.is_finite())
        .map_or(0.1, |rate| rate.clamp(0.0, 1.0))
}

fn main() -> anyhow::Result<()> {
    // stdout carries the requests
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("request_generator=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let count: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(100);
    let unknown_rate = parse_rate(args.get(2));
    let delay_ms: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0);

    info!(
        count = count,
        unknown_rate = unknown_rate,
        delay_ms = delay_ms,
        "Generating requests"
    );

    let mut generator = RequestGenerator::new();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    out.write_all(br#"{"op":"status"}"#)?;
    out.write_all(b"\n")?;

    for i in 0..count {
        let request = generator.request(unknown_rate);
        serde_json::to_writer(&mut out, &request)?;
        out.write_all(b"\n")?;

        if (i + 1) % 50 == 0 {
            out.flush()?;
            info!("Generated {}/{} requests", i + 1, count);
        }
        if delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(delay_ms));
        }
    }

    out.write_all(br#"{"op":"metrics"}"#)?;
    out.write_all(b"\n")?;
    out.flush()?;

    info!(count = count, "Completed");
    Ok(())
}
