use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::sync::mpsc;

use ykw_core::api::{ApiClient, Credentials, PlatformApi};
use ykw_core::catalog;
use ykw_core::config;
use ykw_core::orchestrator::run_sessions;
use ykw_core::probe::{FfprobeProbe, MediaProbe};
use ykw_core::session::{WatchOptions, WatchStats};

/// Top-level CLI for the ykw watch-session simulator.
#[derive(Debug, Parser)]
#[command(name = "ykw")]
#[command(about = "ykw: simulated video-watch sessions for Yuketang classrooms", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Watch every unfinished video in a classroom.
    Run {
        /// Classroom identifier.
        classroom_id: i64,

        /// Only watch these leaf ids (skips the catalog walk).
        #[arg(long = "leaf")]
        leaf_ids: Vec<i64>,

        /// Override the configured playback rate.
        #[arg(long)]
        rate: Option<f64>,

        /// Override the configured concurrency limit.
        #[arg(long)]
        jobs: Option<usize>,
    },

    /// Print the effective configuration and its path.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        let mut cfg = config::load_or_init()?;

        match cli.command {
            CliCommand::Run {
                classroom_id,
                leaf_ids,
                rate,
                jobs,
            } => {
                if let Some(rate) = rate {
                    cfg.playback_rate = rate;
                }
                if let Some(jobs) = jobs {
                    cfg.concurrency = jobs;
                }
                cfg.validate()?;
                run(&cfg, classroom_id, leaf_ids).await
            }
            CliCommand::Config => {
                println!("config file: {}", config::config_path()?.display());
                // The cookie is a credential; show only whether it is set.
                cfg.cookie = if cfg.cookie.trim().is_empty() {
                    "(not set)".to_string()
                } else {
                    "(set)".to_string()
                };
                println!("{:#?}", cfg);
                Ok(())
            }
        }
    }
}

async fn run(cfg: &config::WatchConfig, classroom_id: i64, leaf_ids: Vec<i64>) -> Result<()> {
    let creds = Credentials {
        cookie: cfg.cookie.clone(),
        user_agent: cfg.user_agent.clone(),
    };
    let client = ApiClient::new(&creds)?;

    let leaf_ids = if leaf_ids.is_empty() {
        let leaves = catalog::collect_video_leaves(&client, classroom_id).await?;
        tracing::info!(count = leaves.len(), "total video count");
        leaves.into_iter().map(|l| l.id).collect()
    } else {
        leaf_ids
    };

    if leaf_ids.is_empty() {
        tracing::info!("no video leaves to watch");
        return Ok(());
    }

    // Progress observer: batch-level snapshots logged as they arrive.
    let (stats_tx, mut stats_rx) = mpsc::channel::<WatchStats>(64);
    let reporter = tokio::spawn(async move {
        while let Some(stats) = stats_rx.recv().await {
            let position = format!("{:.0}/{:.0}s", stats.progress, stats.duration);
            tracing::info!(
                video_id = stats.video_id,
                position = %position,
                watch_length = stats.watch_length,
                rate = stats.rate,
                "watching"
            );
        }
    });

    let api: Arc<dyn PlatformApi> = Arc::new(client);
    let probe: Arc<dyn MediaProbe> = Arc::new(FfprobeProbe);
    let summary = run_sessions(
        api,
        probe,
        WatchOptions::from_config(cfg),
        classroom_id,
        leaf_ids,
        cfg.concurrency,
        Some(stats_tx),
    )
    .await;

    // stats_tx was moved into run_sessions and dropped there, so the
    // reporter drains and exits on its own.
    let _ = reporter.await;

    tracing::info!(
        completed = summary.completed,
        skipped = summary.skipped,
        failed = summary.failed,
        "run finished"
    );
    if summary.failed > 0 {
        anyhow::bail!("{} of {} sessions failed", summary.failed, summary.total());
    }
    Ok(())
}
