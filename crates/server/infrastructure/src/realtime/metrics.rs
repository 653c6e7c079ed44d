//! Realtime Metrics for the presence relay
//!
//! Prometheus metrics for session lifecycle, broadcast throughput,
//! delivery failures and transcript growth.

use prometheus::{Counter, Gauge, Histogram, HistogramOpts, Registry};
use std::sync::Arc;

/// Realtime metrics for relay sessions and broadcasts.
///
/// Cheap to clone; clones share the same collectors.
#[derive(Debug, Clone)]
pub struct RealtimeMetrics {
    inner: Arc<RealtimeMetricsInner>,
}

#[derive(Debug)]
struct RealtimeMetricsInner {
    sessions_active: Gauge,
    sessions_total: Counter,
    messages_delivered_total: Counter,
    deliveries_failed_total: Counter,
    backpressure_detected: Counter,
    broadcasts_total: Counter,
    transcript_entries: Gauge,
    transcript_evicted_total: Counter,
    broadcast_duration_ms: Histogram,
    session_duration_seconds: Histogram,
}

impl RealtimeMetrics {
    pub fn new() -> prometheus::Result<Self> {
        Ok(Self {
            inner: Arc::new(RealtimeMetricsInner {
                sessions_active: Gauge::new("relay_sessions_active", "Joined sessions")?,
                sessions_total: Counter::new("relay_sessions_total", "Sessions joined")?,
                messages_delivered_total: Counter::new(
                    "relay_messages_delivered_total",
                    "Frames handed to outbound queues",
                )?,
                deliveries_failed_total: Counter::new(
                    "relay_deliveries_failed_total",
                    "Frames dropped for a single recipient",
                )?,
                backpressure_detected: Counter::new(
                    "relay_backpressure_detected",
                    "Deliveries dropped because an outbound queue was full",
                )?,
                broadcasts_total: Counter::new("relay_broadcasts_total", "Broadcast operations")?,
                transcript_entries: Gauge::new(
                    "relay_transcript_entries",
                    "Entries currently retained in the transcript",
                )?,
                transcript_evicted_total: Counter::new(
                    "relay_transcript_evicted_total",
                    "Entries evicted by the transcript retention limit",
                )?,
                broadcast_duration_ms: Histogram::with_opts(HistogramOpts::new(
                    "relay_broadcast_duration_ms",
                    "Broadcast fan-out duration in milliseconds",
                ))?,
                session_duration_seconds: Histogram::with_opts(HistogramOpts::new(
                    "relay_session_duration_seconds",
                    "Session duration in seconds",
                ))?,
            }),
        })
    }

    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.inner.sessions_active.clone()))?;
        registry.register(Box::new(self.inner.sessions_total.clone()))?;
        registry.register(Box::new(self.inner.messages_delivered_total.clone()))?;
        registry.register(Box::new(self.inner.deliveries_failed_total.clone()))?;
        registry.register(Box::new(self.inner.backpressure_detected.clone()))?;
        registry.register(Box::new(self.inner.broadcasts_total.clone()))?;
        registry.register(Box::new(self.inner.transcript_entries.clone()))?;
        registry.register(Box::new(self.inner.transcript_evicted_total.clone()))?;
        registry.register(Box::new(self.inner.broadcast_duration_ms.clone()))?;
        registry.register(Box::new(self.inner.session_duration_seconds.clone()))?;
        Ok(())
    }

    pub fn session_joined(&self) {
        self.inner.sessions_active.inc();
        self.inner.sessions_total.inc();
    }

    pub fn session_left(&self, duration_seconds: f64) {
        self.inner.sessions_active.dec();
        self.inner
            .session_duration_seconds
            .observe(duration_seconds);
    }

    pub fn record_delivered(&self) {
        self.inner.messages_delivered_total.inc();
    }

    pub fn record_delivery_failed(&self) {
        self.inner.deliveries_failed_total.inc();
    }

    pub fn record_backpressure(&self) {
        self.inner.backpressure_detected.inc();
    }

    pub fn record_broadcast(&self, duration_ms: f64) {
        self.inner.broadcasts_total.inc();
        self.inner.broadcast_duration_ms.observe(duration_ms);
    }

    pub fn set_transcript_len(&self, len: usize) {
        self.inner.transcript_entries.set(len as f64);
    }

    pub fn record_evicted(&self, count: u64) {
        self.inner.transcript_evicted_total.inc_by(count as f64);
    }

    pub fn snapshot(&self) -> RealtimeMetricsSnapshot {
        RealtimeMetricsSnapshot {
            sessions_active: self.inner.sessions_active.get() as i64,
            sessions_total: self.inner.sessions_total.get() as u64,
            messages_delivered_total: self.inner.messages_delivered_total.get() as u64,
            deliveries_failed_total: self.inner.deliveries_failed_total.get() as u64,
            backpressure_detected: self.inner.backpressure_detected.get() as u64,
            broadcasts_total: self.inner.broadcasts_total.get() as u64,
            transcript_entries: self.inner.transcript_entries.get() as u64,
        }
    }
}

/// A snapshot of realtime metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeMetricsSnapshot {
    pub sessions_active: i64,
    pub sessions_total: u64,
    pub messages_delivered_total: u64,
    pub deliveries_failed_total: u64,
    pub backpressure_detected: u64,
    pub broadcasts_total: u64,
    pub transcript_entries: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_gauge_tracks_joins_and_leaves() {
        let metrics = RealtimeMetrics::new().unwrap();
        metrics.session_joined();
        metrics.session_joined();
        metrics.session_left(1.5);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.sessions_active, 1);
        assert_eq!(snapshot.sessions_total, 2);
    }

    #[test]
    fn test_register_exposes_collectors() {
        let metrics = RealtimeMetrics::new().unwrap();
        let registry = Registry::new();
        metrics.register(&registry).unwrap();

        metrics.record_broadcast(0.3);
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"relay_broadcasts_total".to_string()));
        assert!(names.contains(&"relay_transcript_entries".to_string()));
    }

    #[test]
    fn test_double_registration_fails() {
        let metrics = RealtimeMetrics::new().unwrap();
        let registry = Registry::new();
        metrics.register(&registry).unwrap();
        assert!(metrics.register(&registry).is_err());
    }
}
