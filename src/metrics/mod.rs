use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Covers:
// - Order mutations (created, completed, failures by operation and reason)
// - Broadcasts (count, latency of list + fan-out)
// - Connected realtime clients
//
// Scraped from /metrics on the main HTTP server.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Order Mutation Metrics
    pub orders_created: IntCounter,
    pub orders_completed: IntCounter,
    pub mutation_failures: IntCounterVec,

    // Broadcast Metrics
    pub broadcasts_total: IntCounter,
    pub broadcast_duration: Histogram,
    pub connected_clients: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created = IntCounter::new("orders_created_total", "Total orders created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let orders_completed = IntCounter::new("orders_completed_total", "Total orders completed")?;
        registry.register(Box::new(orders_completed.clone()))?;

        let mutation_failures = IntCounterVec::new(
            Opts::new("order_mutation_failures_total", "Client calls that ended in an Error signal"),
            &["operation", "reason"],
        )?;
        registry.register(Box::new(mutation_failures.clone()))?;

        let broadcasts_total = IntCounter::new(
            "broadcasts_total",
            "Total ReceiveOrders broadcasts pushed to clients",
        )?;
        registry.register(Box::new(broadcasts_total.clone()))?;

        let broadcast_duration = Histogram::with_opts(
            HistogramOpts::new("broadcast_duration_seconds", "Order list scan and fan-out duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(broadcast_duration.clone()))?;

        let connected_clients = IntGauge::new(
            "connected_clients",
            "Realtime clients currently connected to the order hub",
        )?;
        registry.register(Box::new(connected_clients.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            orders_completed,
            mutation_failures,
            broadcasts_total,
            broadcast_duration,
            connected_clients,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_failure(&self, operation: &str, reason: &str) {
        self.mutation_failures.with_label_values(&[operation, reason]).inc();
    }

    pub fn record_broadcast(&self, duration_secs: f64) {
        self.broadcasts_total.inc();
        self.broadcast_duration.observe(duration_secs);
    }

    pub fn set_connected_clients(&self, count: usize) {
        self.connected_clients.set(count as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert!(!metrics.registry.gather().is_empty());
    }

    #[test]
    fn test_record_failure() {
        let metrics = Metrics::new().unwrap();
        metrics.record_failure("CompleteOrder", "receipt_conflict");
        metrics.record_failure("CompleteOrder", "receipt_conflict");
        metrics.record_failure("CreateOrder", "storage");

        let gathered = metrics.registry.gather();
        let failures = gathered
            .iter()
            .find(|m| m.name() == "order_mutation_failures_total")
            .unwrap();
        assert_eq!(failures.metric.len(), 2);
    }

    #[test]
    fn test_record_broadcast() {
        let metrics = Metrics::new().unwrap();
        metrics.record_broadcast(0.02);

        let gathered = metrics.registry.gather();
        let total = gathered.iter().find(|m| m.name() == "broadcasts_total").unwrap();
        assert_eq!(total.metric[0].counter.value, Some(1.0));
    }

    #[test]
    fn test_connected_clients_gauge() {
        let metrics = Metrics::new().unwrap();
        metrics.set_connected_clients(3);

        let gathered = metrics.registry.gather();
        let gauge = gathered.iter().find(|m| m.name() == "connected_clients").unwrap();
        assert_eq!(gauge.metric[0].gauge.value, Some(3.0));
    }
}
