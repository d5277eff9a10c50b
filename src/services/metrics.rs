//! Request counters reported by the health endpoint

use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Default)]
struct PipelineCounters {
    requests: AtomicUsize,
    failures: AtomicUsize,
    total_latency_ms: AtomicU64,
}

impl PipelineCounters {
    fn record(&self, latency: Duration, ok: bool) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        self.total_latency_ms
            .fetch_add(latency.as_millis() as u64, Ordering::Relaxed);
    }

    fn stats(&self) -> PipelineStats {
        let requests = self.requests.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);
        PipelineStats {
            requests,
            failures: self.failures.load(Ordering::Relaxed),
            avg_latency_ms: if requests > 0 { total_latency / requests as u64 } else { 0 },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Pipeline {
    Classify,
    Forecast,
}

pub struct MetricsService {
    classify: PipelineCounters,
    forecast: PipelineCounters,
    start_time: Instant,
}

impl Default for MetricsService {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsService {
    pub fn new() -> Self {
        Self {
            classify: PipelineCounters::default(),
            forecast: PipelineCounters::default(),
            start_time: Instant::now(),
        }
    }

    pub fn record(&self, pipeline: Pipeline, latency: Duration, ok: bool) {
        match pipeline {
            Pipeline::Classify => self.classify.record(latency, ok),
            Pipeline::Forecast => self.forecast.record(latency, ok),
        }
    }

    pub fn get_stats(&self) -> MetricsStats {
        MetricsStats {
            classify: self.classify.stats(),
            forecast: self.forecast.stats(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub requests: usize,
    pub failures: usize,
    pub avg_latency_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsStats {
    pub classify: PipelineStats,
    pub forecast: PipelineStats,
    pub uptime_seconds: u64,
}
