//! # fara CLI entry point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// Execution Governor — a policy-gated action lifecycle mediator for
/// autonomous software agents.
#[derive(Parser, Debug)]
#[command(name = "fara", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Boot the HTTP service.
    Serve(fara_cli::serve::ServeArgs),
    /// Parse a policy file and report errors without serving.
    ValidatePolicy(fara_cli::validate_policy::ValidatePolicyArgs),
    /// Seed demo actions against the configured store.
    SeedDemo(fara_cli::seed_demo::SeedDemoArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => fara_cli::serve::run(args).await,
        Commands::ValidatePolicy(args) => fara_cli::validate_policy::run(args),
        Commands::SeedDemo(args) => fara_cli::seed_demo::run(args).await,
    }
}
