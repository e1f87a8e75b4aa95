use crate::cli::ServeArgs;
use crate::infra::{in_memory_service, AppState};
use crate::routes::with_engagement_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use mindful_track::config::AppConfig;
use mindful_track::engagement::{ChangeSubscription, Table};
use mindful_track::error::AppError;
use mindful_track::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let service = in_memory_service(config.engagement);
    tokio::spawn(trace_changes(service.subscribe(Table::EngagementLogs)));
    tokio::spawn(trace_changes(service.subscribe(Table::Participants)));

    let app = with_engagement_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "mindful track engagement service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn trace_changes(mut subscription: ChangeSubscription) {
    while let Some(change) = subscription.recv().await {
        debug!(
            table = ?change.table,
            kind = ?change.kind,
            record = %change.record_id,
            "store change"
        );
    }
}
