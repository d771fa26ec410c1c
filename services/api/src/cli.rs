use crate::ops::{run_ingest, run_inspect, IngestArgs, InspectArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use roadwatch::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Roadwatch Survey Service",
    about = "Ingest NSV highway survey spreadsheets and serve the condition dashboard API",
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
    /// Ingest a survey export from disk and print the outcome counts
    Ingest(IngestArgs),
    /// Print structural diagnostics for a survey export without ingesting
    Inspect(InspectArgs),
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
        Command::Ingest(args) => run_ingest(args),
        Command::Inspect(args) => run_inspect(args),
    }
}
