use crate::infra::{DeskFixture, InMemoryReviewDesk};
use clap::Args;
use review_desk::assignment::{
    AssignmentStrategy, BatchAssignmentResult, BatchOptions, ReviewAssignmentService,
    WorkloadStatistics,
};
use review_desk::config::AppConfig;
use review_desk::error::AppError;
use review_desk::telemetry::{self, LogSink};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct AssignArgs {
    /// JSON desk fixture holding reviewers, submissions, and reviews
    #[arg(long)]
    pub(crate) fixture: PathBuf,
    /// Selection strategy: balanced, round_robin, or random
    #[arg(long)]
    pub(crate) strategy: Option<AssignmentStrategy>,
    /// Allow reviewers from the student's own church or district
    #[arg(long)]
    pub(crate) allow_same_unit: bool,
    /// Include deactivated reviewers in the pool
    #[arg(long)]
    pub(crate) include_inactive: bool,
    /// Assign at most this many pending submissions
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Write the updated ledger back to the fixture file
    #[arg(long)]
    pub(crate) save: bool,
}

#[derive(Args, Debug)]
pub(crate) struct WorkloadArgs {
    /// JSON desk fixture holding reviewers, submissions, and reviews
    #[arg(long)]
    pub(crate) fixture: PathBuf,
    /// Include deactivated reviewers in the statistics
    #[arg(long)]
    pub(crate) include_inactive: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignReport {
    pub(crate) options: BatchOptions,
    pub(crate) before: WorkloadStatistics,
    pub(crate) result: BatchAssignmentResult,
    pub(crate) after: WorkloadStatistics,
}

type DeskService = ReviewAssignmentService<InMemoryReviewDesk, InMemoryReviewDesk>;

fn cli_service(fixture: DeskFixture) -> Result<(DeskService, InMemoryReviewDesk), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, LogSink::Stderr)?;

    let desk = InMemoryReviewDesk::from_fixture(fixture);
    let shared = Arc::new(desk.clone());
    let service = ReviewAssignmentService::from_config(shared.clone(), shared, &config.assignment);
    Ok((service, desk))
}

pub(crate) fn batch_options(args: &AssignArgs, defaults: BatchOptions) -> BatchOptions {
    BatchOptions {
        strategy: args.strategy.unwrap_or(defaults.strategy),
        exclude_same_unit: defaults.exclude_same_unit && !args.allow_same_unit,
        only_active_reviewers: defaults.only_active_reviewers && !args.include_inactive,
    }
}

pub(crate) fn assign_with(
    service: &DeskService,
    options: BatchOptions,
    limit: Option<usize>,
) -> Result<AssignReport, AppError> {
    let before = service.workload_statistics(options.only_active_reviewers)?;
    let result = service.assign_pending(&options, limit)?;
    let after = service.workload_statistics(options.only_active_reviewers)?;
    Ok(AssignReport {
        options,
        before,
        result,
        after,
    })
}

pub(crate) fn run_assign(args: AssignArgs) -> Result<(), AppError> {
    let fixture = DeskFixture::load(&args.fixture)?;
    let (service, desk) = cli_service(fixture)?;
    let options = batch_options(&args, service.defaults());

    let report = assign_with(&service, options, args.limit)?;
    info!(
        assigned = report.result.assigned_count,
        errors = report.result.errors.len(),
        fixture = %args.fixture.display(),
        "assignment run complete"
    );

    if args.save {
        desk.to_fixture()?.save(&args.fixture)?;
    }

    println!("{:#}", serde_json::json!(report));
    Ok(())
}

pub(crate) fn run_workload(args: WorkloadArgs) -> Result<(), AppError> {
    let fixture = DeskFixture::load(&args.fixture)?;
    let (service, _desk) = cli_service(fixture)?;
    let statistics = service.workload_statistics(!args.include_inactive)?;
    println!("{:#}", serde_json::json!(statistics));
    Ok(())
}
