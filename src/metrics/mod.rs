// Private module declaration
mod server;

use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};

// Re-export for public API
pub use server::configure;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Order mutations (creates, status updates, failures)
// - Push-channel fan-out (frames sent and dropped)
// - Live push connections
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Mutation Metrics
    pub orders_created: IntCounter,
    pub status_updates: IntCounterVec,
    pub mutations_failed: IntCounterVec,

    // Broadcast Metrics
    pub frames_sent: IntCounterVec,
    pub frames_dropped: IntCounterVec,
    pub active_connections: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Mutation Metrics
        let orders_created = IntCounter::new("orders_created_total", "Total orders created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let status_updates = IntCounterVec::new(
            Opts::new("order_status_updates_total", "Total committed status updates"),
            &["status"],
        )?;
        registry.register(Box::new(status_updates.clone()))?;

        let mutations_failed = IntCounterVec::new(
            Opts::new("order_mutations_failed_total", "Total rejected or failed mutations"),
            &["operation", "reason"],
        )?;
        registry.register(Box::new(mutations_failed.clone()))?;

        // Broadcast Metrics
        let frames_sent = IntCounterVec::new(
            Opts::new("broadcast_frames_sent_total", "Frames queued to push connections"),
            &["event"],
        )?;
        registry.register(Box::new(frames_sent.clone()))?;

        let frames_dropped = IntCounterVec::new(
            Opts::new("broadcast_frames_dropped_total", "Frames dropped during fan-out"),
            &["reason"],
        )?;
        registry.register(Box::new(frames_dropped.clone()))?;

        let active_connections = IntGauge::new(
            "push_connections_active",
            "Currently joined push-channel connections",
        )?;
        registry.register(Box::new(active_connections.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            status_updates,
            mutations_failed,
            frames_sent,
            frames_dropped,
            active_connections,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record a failed or rejected mutation
    pub fn record_failure(&self, operation: &str, reason: &str) {
        self.mutations_failed.with_label_values(&[operation, reason]).inc();
    }

    /// Helper to record the outcome of one fan-out
    pub fn record_fanout(&self, event: &str, sent: u64, full: u64, closed: u64) {
        self.frames_sent.with_label_values(&[event]).inc_by(sent);
        if full > 0 {
            self.frames_dropped.with_label_values(&["full"]).inc_by(full);
        }
        if closed > 0 {
            self.frames_dropped.with_label_values(&["closed"]).inc_by(closed);
        }
    }
}
