//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the server:
//! - HTTP request metrics (latency, counts, auth failures)
//! - Ticket activity (creations, history entries, failed updates)
//! - RUN validation outcomes
//! - Tickets per stage and collaborator count (collected on scrape)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

use mesa_core::{CollaboratorFilter, ReferenceKind, TicketFilter};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mesa_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mesa_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mesa_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mesa_auth_failures_total", "Total authentication failures"),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Ticket Metrics
// =============================================================================

/// Tickets created total.
pub static TICKETS_CREATED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mesa_tickets_created_total",
        "Total tickets created since startup",
    )
    .unwrap()
});

/// History entries written, by tracked field.
pub static TICKET_HISTORY_ENTRIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mesa_ticket_history_entries_total",
            "Ticket history entries written",
        ),
        &["field"],
    )
    .unwrap()
});

/// Ticket updates that were rolled back because they could not be persisted.
pub static TICKET_UPDATE_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mesa_ticket_update_failures_total",
        "Ticket updates rolled back on a persistence failure",
    )
    .unwrap()
});

/// Tickets by current stage (collected dynamically).
pub static TICKETS_BY_STAGE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("mesa_tickets_by_stage", "Current ticket count by stage"),
        &["stage"],
    )
    .unwrap()
});

// =============================================================================
// Collaborator Metrics
// =============================================================================

/// RUN validations by outcome (`valid`, `format`, `checksum`).
pub static RUN_VALIDATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mesa_run_validations_total", "RUN validations by outcome"),
        &["result"],
    )
    .unwrap()
});

/// Registered collaborators (collected dynamically).
pub static COLLABORATORS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("mesa_collaborators", "Number of registered collaborators").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // HTTP
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        Box::new(AUTH_FAILURES_TOTAL.clone()),
        // Tickets
        Box::new(TICKETS_CREATED_TOTAL.clone()),
        Box::new(TICKET_HISTORY_ENTRIES_TOTAL.clone()),
        Box::new(TICKET_UPDATE_FAILURES_TOTAL.clone()),
        Box::new(TICKETS_BY_STAGE.clone()),
        // Collaborators
        Box::new(RUN_VALIDATIONS_TOTAL.clone()),
        Box::new(COLLABORATORS.clone()),
    ];

    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            warn!("Failed to register metric: {}", e);
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the database at scrape time.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    if let Ok(count) = state.collaborators().count(&CollaboratorFilter::new()) {
        COLLABORATORS.set(count);
    }

    TICKETS_BY_STAGE.reset();
    for stage in state.reference_cache().list(ReferenceKind::Stage) {
        let filter = TicketFilter::new().with_stage(stage.id);
        if let Ok(count) = state.tickets().count(&filter) {
            TICKETS_BY_STAGE
                .with_label_values(&[stage.name.as_str()])
                .set(count);
        }
    }
}

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_SEGMENT.replace_all(path, "{id}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/tickets/550e8400-e29b-41d4-a716-446655440000/history";
        assert_eq!(normalize_path(path), "/api/v1/tickets/{id}/history");
    }

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/reference/stage/12";
        assert_eq!(normalize_path(path), "/api/v1/reference/stage/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("mesa_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_domain_metrics() {
        // Vec metrics only appear once a label set has been touched
        TICKET_HISTORY_ENTRIES_TOTAL
            .with_label_values(&["stage"])
            .inc();
        RUN_VALIDATIONS_TOTAL.with_label_values(&["valid"]).inc();
        TICKETS_CREATED_TOTAL.inc();
        COLLABORATORS.set(0);

        let output = encode_metrics().unwrap();

        assert!(output.contains("mesa_ticket_history_entries_total"));
        assert!(output.contains("mesa_run_validations_total"));
        assert!(output.contains("mesa_tickets_created_total"));
        assert!(output.contains("mesa_collaborators"));
    }
}
