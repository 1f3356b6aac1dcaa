use crate::commands::{run_assign, run_workload, AssignArgs, WorkloadArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use review_desk::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Review Desk",
    about = "Distribute pending task submissions across the reviewer pool",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Assign every pending submission in a desk fixture
    Assign(AssignArgs),
    /// Print reviewer workload statistics for a desk fixture
    Workload(WorkloadArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON desk fixture used to seed the in-memory ledger
    #[arg(long)]
    pub(crate) fixture: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Assign(args) => run_assign(args),
        Command::Workload(args) => run_workload(args),
    }
}
