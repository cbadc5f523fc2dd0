use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use maestro::agents::{HeuristicPlanner, SimulatedExecutor};
use maestro::cli::{Cli, Commands};
use maestro::config::AppConfig;
use maestro::coordinator::Coordinator;
use maestro::error::{CoordinatorError, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run {
            goal,
            campaign,
            workers,
            duration,
        } => {
            let mut config = AppConfig::load_from(&cli.config)?;
            if let Some(workers) = workers {
                config.coordinator.num_workers = *workers;
            }
            init_logging(&config);
            validate(&config)?;
            run_pipeline(config, campaign, goal, *duration).await?;
        }
        Commands::CheckConfig => {
            let config = AppConfig::load_from(&cli.config)?;
            init_logging(&config);
            validate(&config)?;
            info!("configuration OK");
        }
    }

    Ok(())
}

fn validate(config: &AppConfig) -> Result<()> {
    config.validate().map_err(|errors| {
        for e in &errors {
            error!("config: {e}");
        }
        CoordinatorError::Internal(format!("invalid configuration ({} errors)", errors.len()))
    })
}

async fn run_pipeline(
    config: AppConfig,
    campaign: &str,
    goal: &str,
    duration: Option<u64>,
) -> Result<()> {
    let coordinator = Coordinator::new(
        config,
        Arc::new(HeuristicPlanner::new().with_style("Cyberpunk")),
        Arc::new(SimulatedExecutor::new()),
    );

    coordinator.start().await;
    coordinator.start_campaign(campaign, goal).await?;

    match duration {
        Some(secs) => {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            info!(secs, "run duration elapsed");
        }
        None => shutdown_signal().await,
    }

    coordinator.shutdown().await;

    let (work, review) = coordinator.queue_stats();
    info!(%work, %review, "final queue stats");

    let pending = coordinator.pending_escalations();
    if !pending.is_empty() {
        info!(count = pending.len(), "results awaiting human review:");
        for result in &pending {
            info!(
                work_item = %result.work_item_id,
                worker = %result.worker_id,
                confidence = result.confidence,
                "  pending"
            );
        }
    }

    let state = coordinator.store().snapshot();
    for (currency, spent) in &state.daily_spend {
        info!(currency = %currency, spent = %spent, "daily spend");
    }

    Ok(())
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("info,maestro={}", config.logging.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
