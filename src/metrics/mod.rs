// Metrics module - Prometheus counters and latency histogram
//
// Each `Metrics` owns its own `prometheus::Registry`, so several instances
// (one per test, say) never collide on metric names.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::time::Duration;

use crate::cache::CacheStats;

/// Serve latency buckets in seconds (1ms to 10s)
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

pub struct Metrics {
    registry: Registry,
    requests: IntCounterVec,
    cache_lookups: IntCounterVec,
    upstream_fetches: IntCounterVec,
    failures: IntCounterVec,
    serve_duration: Histogram,
    cache_size_bytes: IntGauge,
    cache_entries: IntGauge,
    cache_evictions: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounterVec::new(
            Opts::new(
                "placecreature_http_requests_total",
                "HTTP requests by route and status code",
            ),
            &["route", "status"],
        )?;
        let cache_lookups = IntCounterVec::new(
            Opts::new(
                "placecreature_cache_lookups_total",
                "Response cache lookups by result",
            ),
            &["result"], // hit, miss
        )?;
        let upstream_fetches = IntCounterVec::new(
            Opts::new(
                "placecreature_upstream_fetches_total",
                "Square image fetches from the image source by outcome",
            ),
            &["outcome"], // success, failure
        )?;
        let failures = IntCounterVec::new(
            Opts::new(
                "placecreature_serve_failures_total",
                "Failed image requests by failure kind",
            ),
            &["kind"],
        )?;
        let serve_duration = Histogram::with_opts(
            HistogramOpts::new(
                "placecreature_serve_duration_seconds",
                "Time to serve an image request in seconds",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
        )?;

        let cache_size_bytes = IntGauge::new(
            "placecreature_cache_size_bytes",
            "Bytes of encoded images held by the response cache",
        )?;
        let cache_entries = IntGauge::new(
            "placecreature_cache_entries",
            "Images held by the response cache",
        )?;
        // Cumulative, but copied from the cache's own counter on each scrape
        let cache_evictions = IntGauge::new(
            "placecreature_cache_evictions",
            "Cache entries dropped for size or TTL since startup",
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(cache_lookups.clone()))?;
        registry.register(Box::new(upstream_fetches.clone()))?;
        registry.register(Box::new(failures.clone()))?;
        registry.register(Box::new(serve_duration.clone()))?;
        registry.register(Box::new(cache_size_bytes.clone()))?;
        registry.register(Box::new(cache_entries.clone()))?;
        registry.register(Box::new(cache_evictions.clone()))?;

        Ok(Self {
            registry,
            requests,
            cache_lookups,
            upstream_fetches,
            failures,
            serve_duration,
            cache_size_bytes,
            cache_entries,
            cache_evictions,
        })
    }

    pub fn record_request(&self, route: &str, status: u16) {
        self.requests
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    pub fn record_cache_lookup(&self, hit: bool) {
        let result = if hit { "hit" } else { "miss" };
        self.cache_lookups.with_label_values(&[result]).inc();
    }

    pub fn record_upstream_fetch(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.upstream_fetches.with_label_values(&[outcome]).inc();
    }

    pub fn record_failure(&self, kind: &str) {
        self.failures.with_label_values(&[kind]).inc();
    }

    pub fn record_serve_duration(&self, duration: Duration) {
        self.serve_duration.observe(duration.as_secs_f64());
    }

    /// Copy a cache snapshot into the cache gauges
    pub fn record_cache_stats(&self, stats: &CacheStats) {
        let clamp = |value: u64| i64::try_from(value).unwrap_or(i64::MAX);
        self.cache_size_bytes.set(clamp(stats.current_size_bytes));
        self.cache_entries.set(clamp(stats.current_item_count));
        self.cache_evictions.set(clamp(stats.evictions));
    }

    pub fn request_count(&self, route: &str, status: u16) -> u64 {
        self.requests
            .with_label_values(&[route, &status.to_string()])
            .get()
    }

    pub fn cache_lookup_count(&self, hit: bool) -> u64 {
        let result = if hit { "hit" } else { "miss" };
        self.cache_lookups.with_label_values(&[result]).get()
    }

    pub fn upstream_fetch_count(&self, success: bool) -> u64 {
        let outcome = if success { "success" } else { "failure" };
        self.upstream_fetches.with_label_values(&[outcome]).get()
    }

    pub fn failure_count(&self, kind: &str) -> u64 {
        self.failures.with_label_values(&[kind]).get()
    }

    /// Prometheus text exposition format
    pub fn export_prometheus(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
