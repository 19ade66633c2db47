//! Serving statistics for the classifier service.

use crate::types::prediction::{Prediction, PredictionSource};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

const MAX_SAMPLES: usize = 10_000;

/// Metrics collector for served requests
pub struct ServiceMetrics {
    /// Predictions returned (single and batch items)
    pub predictions_served: AtomicU64,
    /// Predictions that carried a degradation flag
    pub degraded_predictions: AtomicU64,
    /// Predictions answered by the rule table
    pub rule_predictions: AtomicU64,
    /// Completed training runs
    pub trainings: AtomicU64,
    /// Requests that ended in an error response
    pub errors: AtomicU64,
    /// Per-request processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Confidence distribution buckets
    confidence_buckets: RwLock<[u64; 10]>,
    /// Predictions per category
    by_category: RwLock<BTreeMap<String, u64>>,
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            degraded_predictions: AtomicU64::new(0),
            rule_predictions: AtomicU64::new(0),
            trainings: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            confidence_buckets: RwLock::new([0; 10]),
            by_category: RwLock::new(BTreeMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record one returned prediction
    pub fn record_prediction(&self, prediction: &Prediction) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        if prediction.is_degraded() {
            self.degraded_predictions.fetch_add(1, Ordering::Relaxed);
        }
        if prediction.source == PredictionSource::Rules {
            self.rule_predictions.fetch_add(1, Ordering::Relaxed);
        }

        let bucket = (prediction.confidence.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.confidence_buckets.write() {
            buckets[bucket] += 1;
        }
        if let Ok(mut by_category) = self.by_category.write() {
            *by_category.entry(prediction.category.clone()).or_insert(0) += 1;
        }
    }

    /// Record how long a request took
    pub fn record_latency(&self, elapsed: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(elapsed.as_micros() as u64);
            if times.len() > MAX_SAMPLES {
                times.drain(0..MAX_SAMPLES / 2);
            }
        }
    }

    pub fn record_training(&self) {
        self.trainings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Processing time percentiles
    pub fn processing_stats(&self) -> ProcessingStats {
        let mut sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return ProcessingStats::default(),
        };
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.5),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Predictions per second since start
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_served.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn confidence_distribution(&self) -> [u64; 10] {
        self.confidence_buckets
            .read()
            .map(|buckets| *buckets)
            .unwrap_or_default()
    }

    pub fn predictions_by_category(&self) -> BTreeMap<String, u64> {
        self.by_category
            .read()
            .map(|by_category| by_category.clone())
            .unwrap_or_default()
    }

    /// Point-in-time copy for status responses
    pub fn snapshot(&self) -> ServingStats {
        ServingStats {
            predictions_served: self.predictions_served.load(Ordering::Relaxed),
            degraded_predictions: self.degraded_predictions.load(Ordering::Relaxed),
            rule_predictions: self.rule_predictions.load(Ordering::Relaxed),
            trainings: self.trainings.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            uptime_secs: self.start_time.elapsed().as_secs(),
            processing: self.processing_stats(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let stats = self.snapshot();
        let served = stats.predictions_served;
        let pct = |n: u64| {
            if served > 0 {
                (n as f64 / served as f64) * 100.0
            } else {
                0.0
            }
        };

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║          TRANSACTION CLASSIFIER - SERVING SUMMARY            ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Predictions Served: {:>8}  │  Throughput: {:>8.1} /s    ║",
            served,
            self.throughput()
        );
        info!(
            "║ Degraded:           {:>8}  │  Rate: {:>6.1}%              ║",
            stats.degraded_predictions,
            pct(stats.degraded_predictions)
        );
        info!(
            "║ Rule Fallbacks:     {:>8}  │  Trainings: {:>4}  Errors: {:>4} ║",
            stats.rule_predictions, stats.trainings, stats.errors
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            stats.processing.mean_us,
            stats.processing.p50_us,
            stats.processing.p95_us,
            stats.processing.p99_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Predictions by Category:                                     ║");
        for (category, count) in &self.predictions_by_category() {
            info!("║   {:20}: {:>6} ({:>5.1}%)", category, count, pct(*count));
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Confidence Distribution:                                     ║");
        let buckets = self.confidence_distribution();
        let total: u64 = buckets.iter().sum();
        for (i, &count) in buckets.iter().enumerate() {
            let share = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar = "█".repeat(((share / 2.0) as usize).min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                share,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Counters reported by the status operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServingStats {
    pub predictions_served: u64,
    pub degraded_predictions: u64,
    pub rule_predictions: u64,
    pub trainings: u64,
    pub errors: u64,
    pub uptime_secs: u64,
    pub processing: ProcessingStats,
}

/// Periodic summary printer
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Print a summary every interval, forever
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // the first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
