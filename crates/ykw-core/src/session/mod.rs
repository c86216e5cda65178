//! Watch-session pipeline for one video.
//!
//! Resolving (leaf metadata + prior progress + media URL) -> Skip when the
//! platform already reports completion -> Seeding (start point + duration)
//! -> Streaming (sequencer + pacing + delivery) -> Done. Any unresolved error
//! here is fatal for this session only; the orchestrator keeps siblings
//! running.

mod stream;

pub use stream::{stream_session, WatchStats};

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::api::{LeafInfo, PlatformApi, ProgressQuery};
use crate::config::WatchConfig;
use crate::probe::MediaProbe;
use crate::retry::RetryPolicy;
use std::time::Duration;

/// One video being "watched". Immutable for the session's lifetime.
#[derive(Debug, Clone)]
pub struct VideoSession {
    pub user_id: i64,
    pub course_id: i64,
    pub classroom_id: i64,
    pub video_id: i64,
    pub sku_id: i64,
    pub ccid: String,
    pub media_url: String,
    /// Total duration in seconds.
    pub duration: f64,
}

impl VideoSession {
    pub fn progress_query(&self) -> ProgressQuery {
        ProgressQuery {
            user_id: self.user_id,
            course_id: self.course_id,
            classroom_id: self.classroom_id,
            video_id: self.video_id,
        }
    }
}

/// Terminal state of a session pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Prior watch progress already reported completion; nothing sent.
    Skipped,
    /// All heartbeats delivered.
    Completed,
}

/// Runtime knobs for sequencing and delivery, derived from [`WatchConfig`].
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub interval_secs: f64,
    pub playback_rate: f64,
    pub jitter_std_dev: f64,
    pub retry: RetryPolicy,
    /// Fixed rng seed for deterministic sequences (tests); entropy when None.
    pub seed: Option<u64>,
}

impl WatchOptions {
    pub fn from_config(cfg: &WatchConfig) -> Self {
        Self {
            interval_secs: cfg.interval_secs,
            playback_rate: cfg.playback_rate,
            jitter_std_dev: cfg.jitter_std_dev,
            retry: RetryPolicy {
                delay: Duration::from_secs_f64(cfg.retry_delay_secs),
            },
            seed: None,
        }
    }
}

/// Run the full pipeline for one leaf. Returns the terminal state, or an
/// error when resolution fails (fatal to this session only).
pub async fn run_session(
    api: &dyn PlatformApi,
    probe: &dyn MediaProbe,
    opts: &WatchOptions,
    classroom_id: i64,
    leaf_id: i64,
    stats_tx: Option<&mpsc::Sender<WatchStats>>,
) -> Result<SessionOutcome> {
    // Resolving.
    let leaf = api
        .leaf_info(classroom_id, leaf_id)
        .await
        .with_context(|| format!("resolving leaf {}", leaf_id))?;
    let query = ProgressQuery {
        user_id: leaf.user_id,
        course_id: leaf.course_id,
        classroom_id,
        video_id: leaf.id,
    };
    let prior = api
        .watch_progress(&query)
        .await
        .with_context(|| format!("reading prior progress for leaf {}", leaf_id))?;

    if let Some(progress) = &prior {
        if progress.is_completed() {
            tracing::info!(leaf_id, name = %leaf.name, "already completed, skipping");
            return Ok(SessionOutcome::Skipped);
        }
    }

    let media_url = resolve_media_url(api, classroom_id, &leaf).await?;
    tracing::info!(leaf_id, name = %leaf.name, media_url = %media_url, "resolved");

    // Seeding: prior progress wins; otherwise embedded metadata, then probe.
    let (start_progress, duration) = match &prior {
        Some(p) => (p.last_point, p.video_length),
        None => {
            let duration = match leaf.content_info.media.duration.filter(|d| *d > 0.0) {
                Some(d) => d,
                None => probe
                    .duration_secs(&media_url)
                    .await
                    .with_context(|| format!("probing duration for leaf {}", leaf_id))?,
            };
            (0.0, duration)
        }
    };
    tracing::info!(leaf_id, start_progress, duration, "seeded");

    let session = VideoSession {
        user_id: leaf.user_id,
        course_id: leaf.course_id,
        classroom_id,
        video_id: leaf.id,
        sku_id: leaf.sku_id,
        ccid: leaf.content_info.media.ccid.clone(),
        media_url,
        duration,
    };

    // Streaming.
    stream_session(api, &session, opts, start_progress, stats_tx).await?;

    tracing::info!(leaf_id, name = %leaf.name, "finished sending heartbeats");
    Ok(SessionOutcome::Completed)
}

/// Prefer an embedded play URL when the metadata carries one (newer API
/// variant); fall back to the lookup by content id.
async fn resolve_media_url(
    api: &dyn PlatformApi,
    classroom_id: i64,
    leaf: &LeafInfo,
) -> Result<String> {
    if let Some(url) = &leaf.content_info.media.play_url {
        return Ok(url.clone());
    }
    let url = api
        .play_url(classroom_id, &leaf.content_info.media.ccid)
        .await
        .with_context(|| format!("resolving play URL for ccid {}", leaf.content_info.media.ccid))?;
    Ok(url)
}
