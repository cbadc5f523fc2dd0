use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "maestro")]
#[command(version = "0.1.0")]
#[command(about = "Planner/worker/judge coordination engine with budget governance", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory path
    #[arg(short, long, default_value = "config")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the coordination pipeline with the built-in dry-run collaborators
    Run {
        /// Campaign goal to seed
        #[arg(short, long, default_value = "Promote summer fashion line")]
        goal: String,
        /// Campaign identifier
        #[arg(long, default_value = "campaign-1")]
        campaign: String,
        /// Worker pool size (overrides config)
        #[arg(short, long)]
        workers: Option<usize>,
        /// Stop after this many seconds instead of waiting for ctrl-c
        #[arg(short, long)]
        duration: Option<u64>,
    },
    /// Load and validate the configuration, then exit
    CheckConfig,
}
