//! Prometheus metrics for the ampuo operator.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

/// Outcome of one reconcile call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Converged,
    Requeue,
    Error,
}

impl ReconcileOutcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Converged => "converged",
            Self::Requeue => "requeue",
            Self::Error => "error",
        }
    }
}

/// Labels for reconcile metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ReconcileLabels {
    pub namespace: String,
    pub name: String,
    pub result: String,
}

/// Labels identifying one `APIManager`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ResourceLabels {
    pub namespace: String,
    pub name: String,
}

/// Labels for upgrade errors.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ErrorLabels {
    pub namespace: String,
    pub name: String,
    /// `transient` or `permanent`.
    pub class: String,
}

/// All Prometheus metrics for the operator.
pub struct Metrics {
    pub reconcile_total: Family<ReconcileLabels, Counter>,
    pub reconcile_duration_seconds: Family<ResourceLabels, Histogram>,
    pub upgrade_requeue_total: Family<ResourceLabels, Counter>,
    pub upgrade_error_total: Family<ErrorLabels, Counter>,
}

const RECONCILE_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

impl Metrics {
    /// Create and register all metrics with the given registry.
    pub fn new(registry: &mut Registry) -> Self {
        let reconcile_total = Family::<ReconcileLabels, Counter>::default();
        registry.register(
            "ampuo_reconcile",
            "Total number of reconcile calls",
            reconcile_total.clone(),
        );

        let reconcile_duration_seconds =
            Family::<ResourceLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(RECONCILE_BUCKETS.iter().copied())
            });
        registry.register(
            "ampuo_reconcile_duration_seconds",
            "Duration of reconcile calls in seconds",
            reconcile_duration_seconds.clone(),
        );

        let upgrade_requeue_total = Family::<ResourceLabels, Counter>::default();
        registry.register(
            "ampuo_upgrade_requeue",
            "Total number of upgrade passes that applied a change and requeued",
            upgrade_requeue_total.clone(),
        );

        let upgrade_error_total = Family::<ErrorLabels, Counter>::default();
        registry.register(
            "ampuo_upgrade_error",
            "Total number of upgrade passes that stopped on an error",
            upgrade_error_total.clone(),
        );

        Self {
            reconcile_total,
            reconcile_duration_seconds,
            upgrade_requeue_total,
            upgrade_error_total,
        }
    }

    /// Record one finished reconcile call.
    pub fn observe_reconcile(
        &self,
        namespace: &str,
        name: &str,
        outcome: ReconcileOutcome,
        elapsed: Duration,
    ) {
        let resource = ResourceLabels {
            namespace: namespace.to_string(),
            name: name.to_string(),
        };

        self.reconcile_total
            .get_or_create(&ReconcileLabels {
                namespace: namespace.to_string(),
                name: name.to_string(),
                result: outcome.as_str().to_string(),
            })
            .inc();
        self.reconcile_duration_seconds
            .get_or_create(&resource)
            .observe(elapsed.as_secs_f64());

        if outcome == ReconcileOutcome::Requeue {
            self.upgrade_requeue_total.get_or_create(&resource).inc();
        }
    }

    pub fn observe_error(&self, namespace: &str, name: &str, transient: bool) {
        self.upgrade_error_total
            .get_or_create(&ErrorLabels {
                namespace: namespace.to_string(),
                name: name.to_string(),
                class: if transient { "transient" } else { "permanent" }.to_string(),
            })
            .inc();
    }
}

/// Axum handler that encodes the registry as OpenMetrics text.
async fn metrics_handler(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    let mut buf = String::new();
    if encode(&mut buf, &registry).is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics".to_string(),
        );
    }
    (StatusCode::OK, buf)
}

/// Start the metrics server on the given port.
pub async fn serve(port: u16, registry: Arc<Registry>) -> anyhow::Result<()> {
    use axum::Router;
    use axum::routing::get;
    use tokio::net::TcpListener;
    use tracing::info;

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(registry);

    let listener = TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    info!("Metrics server listening on port {}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
