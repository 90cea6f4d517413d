//! Request and predictor statistics for the committee.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use tracing::info;

/// Metrics collector for committee requests
pub struct CommitteeMetrics {
    /// Requests received
    pub requests: AtomicU64,
    /// Requests that produced a consensus
    pub completed: AtomicU64,
    /// Requests rejected or left without any successful prediction
    pub failed: AtomicU64,
    /// Failures per predictor
    predictor_failures: RwLock<HashMap<String, u64>>,
    /// Inference times per predictor (in microseconds)
    predictor_times: RwLock<HashMap<String, Vec<u64>>>,
    /// Agreement ratio of each completed request
    agreements: RwLock<Vec<f64>>,
}

impl CommitteeMetrics {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            predictor_failures: RwLock::new(HashMap::new()),
            predictor_times: RwLock::new(HashMap::new()),
            agreements: RwLock::new(Vec::with_capacity(1000)),
        }
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request that reached consensus
    pub fn record_consensus(&self, agreement_ratio: f64) {
        self.completed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut agreements) = self.agreements.write() {
            agreements.push(agreement_ratio);
            if agreements.len() > 1000 {
                agreements.drain(0..500);
            }
        }
    }

    /// Record a request that ended in an error
    pub fn record_request_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_predictor_failure(&self, predictor: &str) {
        if let Ok(mut failures) = self.predictor_failures.write() {
            *failures.entry(predictor.to_string()).or_insert(0) += 1;
        }
    }

    pub fn record_predictor_time(&self, predictor: &str, duration: Duration) {
        if let Ok(mut times) = self.predictor_times.write() {
            let predictor_times = times.entry(predictor.to_string()).or_default();
            predictor_times.push(duration.as_micros() as u64);
            if predictor_times.len() > 1000 {
                predictor_times.drain(0..500);
            }
        }
    }

    /// Mean agreement ratio over recent requests
    pub fn avg_agreement(&self) -> f64 {
        match self.agreements.read() {
            Ok(agreements) if !agreements.is_empty() => {
                agreements.iter().sum::<f64>() / agreements.len() as f64
            }
            _ => 0.0,
        }
    }

    pub fn predictor_failures(&self) -> HashMap<String, u64> {
        self.predictor_failures
            .read()
            .map(|failures| failures.clone())
            .unwrap_or_default()
    }

    /// Latency statistics per predictor
    pub fn predictor_stats(&self) -> HashMap<String, PredictorStats> {
        let Ok(times) = self.predictor_times.read() else {
            return HashMap::new();
        };

        times
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(predictor, samples)| {
                let mut sorted = samples.clone();
                sorted.sort_unstable();
                let count = sorted.len();
                let stats = PredictorStats {
                    calls: count as u64,
                    mean_us: sorted.iter().sum::<u64>() / count as u64,
                    p50_us: sorted[count / 2],
                    max_us: sorted[count - 1],
                };
                (predictor.clone(), stats)
            })
            .collect()
    }

    pub fn print_summary(&self) {
        let requests = self.requests.load(Ordering::Relaxed);
        let completed = self.completed.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);

        info!(
            requests = requests,
            completed = completed,
            failed = failed,
            avg_agreement = format!("{:.1}%", self.avg_agreement() * 100.0),
            "Committee summary"
        );

        let failures = self.predictor_failures();
        for (predictor, stats) in &self.predictor_stats() {
            info!(
                predictor = %predictor,
                calls = stats.calls,
                mean_us = stats.mean_us,
                p50_us = stats.p50_us,
                max_us = stats.max_us,
                failures = failures.get(predictor).copied().unwrap_or(0),
                "Predictor stats"
            );
        }
    }
}

impl Default for CommitteeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-predictor latency statistics
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorStats {
    pub calls: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub max_us: u64,
}
