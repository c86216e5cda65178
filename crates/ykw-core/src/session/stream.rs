//! Streaming: pace batches to wall clock and deliver them with retry.
//!
//! Each batch is due at its last record's timestamp. The loop sleeps until
//! the due instant (or proceeds immediately when already past it), submits
//! through the unbounded fixed-delay retry policy, then re-reads the remote
//! watch progress for display. The pacing sleep is the system's natural
//! backpressure: traffic never outruns simulated playback speed.

use anyhow::Result;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::api::PlatformApi;
use crate::heartbeat::{batched, HeartbeatSequencer, BATCH_SIZE};
use crate::retry::run_with_retry;

use super::{VideoSession, WatchOptions};

/// Sequencing starts this far in the past so the first batch is due
/// immediately instead of idling through one full batch interval.
const START_LEAD_SECS: f64 = 30.0;

/// Per-batch display snapshot handed to the progress observer.
/// `watch_length` and `rate` echo the platform's own record.
#[derive(Debug, Clone)]
pub struct WatchStats {
    pub video_id: i64,
    pub progress: f64,
    pub duration: f64,
    pub watch_length: f64,
    pub rate: f64,
}

fn epoch_now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Deliver every heartbeat batch for `session`, paced to real time.
pub async fn stream_session(
    api: &dyn PlatformApi,
    session: &VideoSession,
    opts: &WatchOptions,
    start_progress: f64,
    stats_tx: Option<&mpsc::Sender<WatchStats>>,
) -> Result<()> {
    let now = epoch_now_secs();
    let sequencer =
        HeartbeatSequencer::new(session, opts, now - START_LEAD_SECS, start_progress)?;

    // All due times are scheduled against one anchor captured here, so the
    // pacing math stays consistent even if the system clock is adjusted
    // mid-run.
    let anchor_epoch_ms = (now * 1000.0) as i64;
    let anchor = Instant::now();

    let query = session.progress_query();
    let (mut watch_length, mut rate) = (0.0, 0.0);

    for batch in batched(sequencer, BATCH_SIZE) {
        if let Some(due_ms) = batch.due_epoch_ms() {
            let offset_ms = due_ms - anchor_epoch_ms;
            if offset_ms > 0 {
                // No-op when the due instant is already behind us.
                tokio::time::sleep_until(anchor + Duration::from_millis(offset_ms as u64)).await;
            }
        }

        run_with_retry(&opts.retry, "heartbeat", || {
            api.send_heartbeat(session.classroom_id, batch.records())
        })
        .await?;

        // Display-only; a stale read must not block the next batch.
        match api.watch_progress(&query).await {
            Ok(Some(p)) => {
                watch_length = p.watch_length;
                rate = p.rate;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(video_id = session.video_id, error = %e, "progress read failed");
            }
        }

        if let Some(tx) = stats_tx {
            let _ = tx.try_send(WatchStats {
                video_id: session.video_id,
                progress: batch.final_progress(),
                duration: session.duration,
                watch_length,
                rate,
            });
        }
    }

    Ok(())
}
