//! Prometheus metrics for dashboard observability.

use metrics::{counter, histogram};

/// Initialize metrics exporter (Prometheus).
pub fn init_metrics() {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    if let Err(e) = builder.install() {
        tracing::warn!("Failed to install Prometheus exporter: {}", e);
    }
}

/// Record a login attempt.
pub fn login(outcome: &str) {
    counter!("alert_dashboard_logins_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record alerts returned to the grid.
pub fn alerts_listed(alert_type: &str, count: usize) {
    counter!("alert_dashboard_alerts_listed_total", "alert_type" => alert_type.to_string())
        .increment(count as u64);
}

/// Record an alert whose payload did not match its type.
pub fn payload_fault(alert_type: &str) {
    counter!("alert_dashboard_payload_faults_total", "alert_type" => alert_type.to_string())
        .increment(1);
}

/// Record a disposition written to the notes table.
pub fn disposition_recorded(disposition: &str) {
    counter!("alert_dashboard_dispositions_total", "disposition" => disposition.to_string())
        .increment(1);
}

/// Record a chat notification attempt.
pub fn notification_sent(outcome: &str) {
    counter!("alert_dashboard_notifications_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record warehouse statement latency.
pub fn warehouse_query(kind: &str, duration_ms: u64) {
    histogram!("alert_dashboard_warehouse_query_ms", "kind" => kind.to_string())
        .record(duration_ms as f64);
}
