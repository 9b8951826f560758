//! Measured latency and availability baselines for seeding load-test thresholds.

use crate::config::SloSettings;
use serde::{Deserialize, Serialize};
use sonde_scanner::{Endpoint, Headers, HttpProbe};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// `None` everywhere means no attempt produced an HTTP response
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SloBaseline {
    pub p95_ms: Option<f64>,
    pub error_rate: Option<f64>,
    pub apdex_score: Option<f64>,
}

impl SloBaseline {
    pub fn is_empty(&self) -> bool {
        self.p95_ms.is_none() && self.error_rate.is_none() && self.apdex_score.is_none()
    }
}

/// Issues timed sequential GETs against a sample of endpoints
pub struct SloProber {
    probe: HttpProbe,
    settings: SloSettings,
    timeout: Duration,
}

impl SloProber {
    pub fn new(probe: HttpProbe, settings: SloSettings, timeout: Duration) -> Self {
        Self {
            probe,
            settings,
            timeout,
        }
    }

    pub fn with_sample(mut self, sample: usize) -> Self {
        self.settings.sample = sample;
        self
    }

    /// Probe the first `sample` GET endpoints with a non-zero weight.
    pub async fn probe(&self, base_url: &str, endpoints: &[Endpoint], headers: &Headers) -> SloBaseline {
        let base = base_url.trim_end_matches('/');
        let sampled: Vec<&Endpoint> = endpoints
            .iter()
            .filter(|ep| ep.method.eq_ignore_ascii_case("GET") && ep.weight > 0)
            .take(self.settings.sample)
            .collect();

        info!("Sampling {} endpoints for SLO baseline", sampled.len());

        let mut samples = Vec::new();
        let mut errors = 0;
        let mut attempts = 0;

        for endpoint in sampled {
            let url = format!("{}{}", base, endpoint.path);
            for _ in 0..self.settings.attempts {
                let start = Instant::now();
                let response = self.probe.get(&url, headers, self.timeout).await;
                let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
                attempts += 1;

                if response.status > 0 {
                    samples.push(elapsed_ms);
                    if response.status >= 400 {
                        errors += 1;
                    }
                } else {
                    errors += 1;
                }
                debug!("SLO {} -> {} in {:.1}ms", url, response.status, elapsed_ms);
            }
        }

        summarize(samples, errors, attempts, self.settings.apdex_threshold_ms)
    }
}

/// Reduce timed samples to p95, error rate and Apdex
pub fn summarize(mut samples: Vec<f64>, errors: usize, attempts: usize, threshold_ms: f64) -> SloBaseline {
    if samples.is_empty() {
        return SloBaseline::default();
    }

    samples.sort_by(f64::total_cmp);
    let n = samples.len();
    let p95_idx = ((n as f64 * 0.95) as usize).min(n - 1);
    let p95 = samples[p95_idx];

    let error_rate = if attempts == 0 {
        0.0
    } else {
        errors as f64 / attempts as f64
    };

    let satisfied = samples.iter().filter(|t| **t < threshold_ms).count();
    let tolerating = samples
        .iter()
        .filter(|t| **t >= threshold_ms && **t < 4.0 * threshold_ms)
        .count();
    let apdex = (satisfied as f64 + tolerating as f64 / 2.0) / n as f64;

    SloBaseline {
        p95_ms: Some(round_to(p95, 1)),
        error_rate: Some(round_to(error_rate, 4)),
        apdex_score: Some(round_to(apdex, 3)),
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
