use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Submission, SubmissionId};
use super::repository::{LedgerError, ReviewLedger, ReviewerPool};
use super::service::{BatchOptions, ReviewAssignmentService};
use super::strategy::AssignmentStrategy;

/// Router builder exposing the bulk assignment and workload endpoints.
pub fn assignment_router<P, L>(service: Arc<ReviewAssignmentService<P, L>>) -> Router
where
    P: ReviewerPool + 'static,
    L: ReviewLedger + 'static,
{
    Router::new()
        .route("/api/v1/reviews/assignments", post(assign_handler::<P, L>))
        .route("/api/v1/reviews/workload", get(workload_handler::<P, L>))
        .route(
            "/api/v1/reviews/recommendation",
            post(recommend_handler::<P, L>),
        )
        .with_state(service)
}

/// Optional per-request overrides of the service defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct OptionOverrides {
    #[serde(default)]
    pub strategy: Option<AssignmentStrategy>,
    #[serde(default)]
    pub exclude_same_unit: Option<bool>,
    #[serde(default)]
    pub only_active_reviewers: Option<bool>,
}

impl OptionOverrides {
    pub fn apply(self, defaults: BatchOptions) -> BatchOptions {
        BatchOptions {
            strategy: self.strategy.unwrap_or(defaults.strategy),
            exclude_same_unit: self.exclude_same_unit.unwrap_or(defaults.exclude_same_unit),
            only_active_reviewers: self
                .only_active_reviewers
                .unwrap_or(defaults.only_active_reviewers),
        }
    }
}

/// Bulk action payload. Without ids every pending submission is assigned.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentRequest {
    #[serde(default)]
    pub submission_ids: Option<Vec<SubmissionId>>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(flatten)]
    pub overrides: OptionOverrides,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    pub submission: Submission,
    #[serde(flatten)]
    pub overrides: OptionOverrides,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WorkloadQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

pub(crate) async fn assign_handler<P, L>(
    State(service): State<Arc<ReviewAssignmentService<P, L>>>,
    axum::Json(request): axum::Json<AssignmentRequest>,
) -> Response
where
    P: ReviewerPool + 'static,
    L: ReviewLedger + 'static,
{
    let options = request.overrides.apply(service.defaults());
    let outcome = match &request.submission_ids {
        Some(ids) => service.assign_submissions(ids, &options),
        None => service.assign_pending(&options, request.limit),
    };

    match outcome {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => ledger_failure(error),
    }
}

pub(crate) async fn workload_handler<P, L>(
    State(service): State<Arc<ReviewAssignmentService<P, L>>>,
    Query(query): Query<WorkloadQuery>,
) -> Response
where
    P: ReviewerPool + 'static,
    L: ReviewLedger + 'static,
{
    match service.workload_statistics(!query.include_inactive) {
        Ok(statistics) => (StatusCode::OK, axum::Json(statistics)).into_response(),
        Err(error) => ledger_failure(error),
    }
}

pub(crate) async fn recommend_handler<P, L>(
    State(service): State<Arc<ReviewAssignmentService<P, L>>>,
    axum::Json(request): axum::Json<RecommendationRequest>,
) -> Response
where
    P: ReviewerPool + 'static,
    L: ReviewLedger + 'static,
{
    let options = request.overrides.apply(service.defaults());
    match service.recommend_reviewer(&request.submission, &options) {
        Ok(Some(entry)) => (StatusCode::OK, axum::Json(entry.view())).into_response(),
        Ok(None) => {
            let payload = json!({
                "submission_id": request.submission.id,
                "error": "no eligible reviewer",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error) => ledger_failure(error),
    }
}

fn ledger_failure(error: LedgerError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
}
