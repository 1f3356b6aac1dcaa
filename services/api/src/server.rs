use crate::cli::ServeArgs;
use crate::infra::{AppState, DeskFixture, InMemoryReviewDesk};
use crate::routes::with_review_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use review_desk::assignment::ReviewAssignmentService;
use review_desk::config::AppConfig;
use review_desk::error::AppError;
use review_desk::telemetry::{self, LogSink};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, LogSink::Stdout)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let fixture = match args.fixture.as_deref() {
        Some(path) => {
            let fixture = DeskFixture::load(path)?;
            info!(
                path = %path.display(),
                reviewers = fixture.reviewers.len(),
                submissions = fixture.submissions.len(),
                "seeded review desk from fixture"
            );
            fixture
        }
        None => DeskFixture::default(),
    };
    let desk = Arc::new(InMemoryReviewDesk::from_fixture(fixture));
    let service = Arc::new(ReviewAssignmentService::from_config(
        desk.clone(),
        desk,
        &config.assignment,
    ));

    let app = with_review_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        strategy = config.assignment.strategy.label(),
        "review desk ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
