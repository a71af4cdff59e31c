use crate::estimate::{run_estimate, run_markets, run_pipeline_export, EstimateArgs, ExportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use sourcer::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "sourcer",
    about = "Generate wholesale offer packets from the command line or over HTTP",
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
    /// Estimate ARV, MAO and offer bands for a subject property
    Estimate(EstimateArgs),
    /// List the markets with bundled valuation data
    Markets,
    /// Work with the saved-deal pipeline
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PipelineCommand {
    /// Export saved deals as CSV
    Export(ExportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Estimate(args) => run_estimate(args).await,
        Command::Markets => run_markets(),
        Command::Pipeline {
            command: PipelineCommand::Export(args),
        } => run_pipeline_export(args),
    }
}
