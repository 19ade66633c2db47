//! Transaction Classifier - Main Entry Point
//!
//! Reads JSON requests from stdin, one per line, and writes one JSON response
//! per line to stdout. Logs go to stderr.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use transaction_classifier::{
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, ServiceMetrics},
    service::ClassifierService,
};

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration before logging so the level comes from it
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Transaction Classifier");
    info!(
        n_estimators = config.model.n_estimators,
        max_terms = config.features.max_terms,
        train_on_startup = config.training.train_on_startup,
        load_on_startup = config.storage.load_on_startup,
        "Configuration loaded"
    );

    let metrics = Arc::new(ServiceMetrics::new());
    let service = Arc::new(ClassifierService::new(&config, metrics.clone()));

    // Training is CPU-bound; keep it off the async workers
    let warm = service.clone();
    match tokio::task::spawn_blocking(move || warm.warm_start())
        .await
        .context("Startup task panicked")?
    {
        Ok(Some(summary)) => info!(
            generation = %summary.generation,
            samples = summary.training_samples,
            categories = summary.category_count,
            accuracy = format!("{:.2}%", summary.accuracy * 100.0),
            "Model ready"
        ),
        Ok(None) => info!("No model at startup, predictions use the rule table"),
        Err(e) => warn!(error = %e, "Startup model unavailable, predictions use the rule table"),
    }

    if config.service.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.service.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut handled: u64 = 0;

    info!("Listening for requests on stdin");

    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        if line.trim().is_empty() {
            continue;
        }

        let service = service.clone();
        let reply = tokio::task::spawn_blocking(move || service.handle_line(&line))
            .await
            .context("Request task panicked")?;

        stdout.write_all(reply.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;

        handled += 1;
        debug!(handled = handled, "Request handled");
    }

    info!(handled = handled, "Input closed, shutting down");
    metrics.print_summary();

    Ok(())
}
