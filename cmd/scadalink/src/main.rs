//! scadalink CLI - console endpoints for the tank process link.

use clap::{Parser, Subcommand};

mod commands;

use commands::{HmiCommand, PlantCommand, SimCommand};

/// scadalink - plant/operator link for a simplified tank process.
///
/// This tool runs either side of the link, or the process alone:
///   - plant: serve the ground-truth process state over TCP
///   - hmi:   connect to a plant and mirror its level remotely
///   - sim:   step the process locally without any networking
#[derive(Parser)]
#[command(name = "scadalink")]
#[command(about = "Plant/operator link for a simplified tank process")]
#[command(version)]
pub struct Cli {
    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the plant endpoint (server role, owns ground truth)
    Plant(PlantCommand),
    /// Run the operator HMI (client role, mirrors the plant)
    Hmi(HmiCommand),
    /// Step the process locally, no networking
    Sim(SimCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .init();
    }

    match &cli.command {
        Commands::Plant(cmd) => cmd.run().await,
        Commands::Hmi(cmd) => cmd.run().await,
        Commands::Sim(cmd) => cmd.run().await,
    }
}
