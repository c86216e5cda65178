//! In-memory PlatformApi/MediaProbe stubs for pipeline tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use ykw_core::api::{
    ApiError, ContentInfo, LeafInfo, MediaInfo, PlatformApi, ProgressQuery, WatchProgress,
};
use ykw_core::heartbeat::HeartbeatRecord;
use ykw_core::probe::MediaProbe;

/// One successfully delivered batch, with the virtual instant it was sent.
#[derive(Debug, Clone)]
pub struct Submission {
    pub video_id: i64,
    pub sequences: Vec<u64>,
    pub final_progress: f64,
    pub at: Instant,
}

/// Scripted platform stub. Sessions see one leaf per id, with configurable
/// prior progress, embedded metadata, and submit failure injection.
pub struct StubApi {
    /// Embedded metadata duration hint (None = platform omits it).
    pub duration_hint: Option<f64>,
    /// Embedded play URL (None = sessions must use the playurl lookup).
    pub embedded_play_url: Option<String>,
    /// Prior watch progress keyed by video id.
    pub prior: Mutex<HashMap<i64, WatchProgress>>,
    /// Leaf ids whose metadata lookup fails (session-fatal).
    pub broken_leaves: Vec<i64>,
    /// Number of leading submit attempts to fail with HTTP 503.
    pub submit_failures: AtomicUsize,
    /// How long each successful submit "takes" (virtual time).
    pub submit_hold: Duration,

    pub submissions: Mutex<Vec<Submission>>,
    pub submit_attempts: Mutex<Vec<Instant>>,
    pub play_url_calls: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
}

impl Default for StubApi {
    fn default() -> Self {
        Self {
            duration_hint: None,
            embedded_play_url: Some("https://cdn.example.com/media/video.m3u8".to_string()),
            prior: Mutex::new(HashMap::new()),
            broken_leaves: Vec::new(),
            submit_failures: AtomicUsize::new(0),
            submit_hold: Duration::ZERO,
            submissions: Mutex::new(Vec::new()),
            submit_attempts: Mutex::new(Vec::new()),
            play_url_calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }
}

impl StubApi {
    pub fn with_prior(video_id: i64, last_point: f64, video_length: f64) -> Self {
        let stub = Self::default();
        stub.set_prior(video_id, last_point, video_length, false);
        stub
    }

    pub fn set_prior(&self, video_id: i64, last_point: f64, video_length: f64, completed: bool) {
        self.prior.lock().unwrap().insert(
            video_id,
            WatchProgress {
                last_point,
                video_length,
                completed: completed as i64,
                watch_length: last_point,
                rate: 0.5,
            },
        );
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl PlatformApi for StubApi {
    async fn leaf_info(&self, classroom_id: i64, leaf_id: i64) -> Result<LeafInfo, ApiError> {
        if self.broken_leaves.contains(&leaf_id) {
            return Err(ApiError::api(Some(4), Some("leaf not accessible".to_string())));
        }
        Ok(LeafInfo {
            id: leaf_id,
            name: format!("Video {}", leaf_id),
            user_id: 11,
            course_id: 22,
            classroom_id,
            sku_id: 44,
            content_info: ContentInfo {
                media: MediaInfo {
                    ccid: format!("cc-{}", leaf_id),
                    duration: self.duration_hint,
                    play_url: self.embedded_play_url.clone(),
                },
            },
        })
    }

    async fn watch_progress(
        &self,
        query: &ProgressQuery,
    ) -> Result<Option<WatchProgress>, ApiError> {
        Ok(self.prior.lock().unwrap().get(&query.video_id).cloned())
    }

    async fn play_url(&self, _classroom_id: i64, ccid: &str) -> Result<String, ApiError> {
        self.play_url_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://cdn.example.com/media/{}.m3u8", ccid))
    }

    async fn send_heartbeat(
        &self,
        _classroom_id: i64,
        batch: &[HeartbeatRecord],
    ) -> Result<(), ApiError> {
        self.submit_attempts.lock().unwrap().push(Instant::now());

        let failures = &self.submit_failures;
        if failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ApiError::Status(503));
        }

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        if self.submit_hold > Duration::ZERO {
            tokio::time::sleep(self.submit_hold).await;
        }

        let last = batch.last().expect("batch is non-empty");
        self.submissions.lock().unwrap().push(Submission {
            video_id: last.video_id,
            sequences: batch.iter().map(|r| r.sequence).collect(),
            final_progress: last.progress,
            at: Instant::now(),
        });
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Probe stub reporting a fixed duration and counting calls.
pub struct StubProbe {
    pub duration: f64,
    pub calls: AtomicUsize,
}

impl StubProbe {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MediaProbe for StubProbe {
    async fn duration_secs(&self, _media_url: &str) -> anyhow::Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.duration)
    }
}
