//! Session orchestrator: run one pipeline per video under a global
//! concurrency gate.
//!
//! A counting semaphore bounds how many sessions run at once; a JoinSet
//! collects every session's terminal state. One session's fatal error is
//! logged and counted, never propagated to its siblings.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::api::PlatformApi;
use crate::probe::MediaProbe;
use crate::session::{run_session, SessionOutcome, WatchOptions, WatchStats};

/// Aggregated terminal states of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.completed + self.skipped + self.failed
    }
}

/// Run a session pipeline for every leaf, at most `concurrency` at a time.
/// Waits for every session to reach a terminal state before returning.
pub async fn run_sessions(
    api: Arc<dyn PlatformApi>,
    probe: Arc<dyn MediaProbe>,
    opts: WatchOptions,
    classroom_id: i64,
    leaf_ids: Vec<i64>,
    concurrency: usize,
    stats_tx: Option<mpsc::Sender<WatchStats>>,
) -> RunSummary {
    let gate = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set = JoinSet::new();

    for leaf_id in leaf_ids {
        let api = Arc::clone(&api);
        let probe = Arc::clone(&probe);
        let opts = opts.clone();
        let gate = Arc::clone(&gate);
        let stats_tx = stats_tx.clone();

        join_set.spawn(async move {
            // The semaphore is never closed, so acquisition only fails if the
            // gate is dropped first, which cannot happen while tasks hold it.
            let _permit = gate.acquire_owned().await;
            run_session(
                api.as_ref(),
                probe.as_ref(),
                &opts,
                classroom_id,
                leaf_id,
                stats_tx.as_ref(),
            )
            .await
            .map_err(|e| (leaf_id, e))
        });
    }

    let mut summary = RunSummary::default();
    while let Some(res) = join_set.join_next().await {
        match res {
            Ok(Ok(SessionOutcome::Completed)) => summary.completed += 1,
            Ok(Ok(SessionOutcome::Skipped)) => summary.skipped += 1,
            Ok(Err((leaf_id, e))) => {
                let chain = format!("{:#}", e);
                tracing::error!(leaf_id, error = %chain, "session failed");
                summary.failed += 1;
            }
            Err(e) => {
                tracing::error!("session task join: {}", e);
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        completed = summary.completed,
        skipped = summary.skipped,
        failed = summary.failed,
        "all sessions reached a terminal state"
    );
    summary
}
