//! Heartbeat sequencer: turns a session into an ordered, finite stream of
//! records that look like genuine continuous playback.
//!
//! Progress advances by `interval * playback_rate` per tick (clamped to the
//! duration); timestamps advance by `interval` plus zero-mean Gaussian jitter
//! so the spacing isn't perfectly uniform. The random source is session-scoped
//! and optionally seeded, so concurrent sessions never share state and tests
//! are deterministic.

use anyhow::{anyhow, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use url::Url;

use crate::session::{VideoSession, WatchOptions};

use super::{
    EventKind, HeartbeatRecord, CONTENT_TYPE_TAG, LOB_TAG, PLATFORM_TAG,
};

const PAGE_SUFFIX_LEN: usize = 4;
const PAGE_SUFFIX_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Lazily produces one session's heartbeat records, in order. Consumed once;
/// a fresh sequencer (fresh rng, fresh sequence counter) is built per session.
pub struct HeartbeatSequencer {
    interval: f64,
    playback_rate: f64,
    duration: f64,
    user_id: i64,
    course_id: i64,
    classroom_id: i64,
    video_id: i64,
    sku_id: i64,
    ccid: String,
    cdn_host: String,
    page_tag: String,

    progress: f64,
    timestamp: f64,
    sequence: u64,
    rng: StdRng,
    jitter: Normal<f64>,
    /// A `ratechange` event is emitted first when playback is accelerated.
    lead_pending: bool,
}

impl HeartbeatSequencer {
    /// Build a sequencer starting at `start_progress` seconds into the video,
    /// with `start_timestamp` as the epoch (seconds) of the session start.
    pub fn new(
        session: &VideoSession,
        opts: &WatchOptions,
        start_timestamp: f64,
        start_progress: f64,
    ) -> Result<Self> {
        let cdn_host = Url::parse(&session.media_url)
            .context("invalid media URL")?
            .host_str()
            .context("media URL has no host")?
            .to_string();

        let jitter = Normal::new(0.0, opts.jitter_std_dev)
            .map_err(|e| anyhow!("invalid jitter std dev {}: {}", opts.jitter_std_dev, e))?;

        let mut rng = match opts.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let page_tag = format!("{}_{}", session.video_id, page_suffix(&mut rng));

        Ok(Self {
            interval: opts.interval_secs,
            playback_rate: opts.playback_rate,
            duration: session.duration,
            user_id: session.user_id,
            course_id: session.course_id,
            classroom_id: session.classroom_id,
            video_id: session.video_id,
            sku_id: session.sku_id,
            ccid: session.ccid.clone(),
            cdn_host,
            page_tag,
            progress: start_progress,
            timestamp: start_timestamp,
            sequence: 0,
            rng,
            jitter,
            lead_pending: opts.playback_rate != 1.0,
        })
    }

    fn record(&mut self, event: EventKind, progress: f64, timestamp: f64) -> HeartbeatRecord {
        self.sequence += 1;
        HeartbeatRecord {
            interval: self.interval,
            event,
            platform: PLATFORM_TAG,
            cdn_host: self.cdn_host.clone(),
            lob: LOB_TAG,
            progress,
            fp: 0,
            tp: 0,
            playback_rate: self.playback_rate,
            timestamp: ((timestamp * 1000.0) as i64).to_string(),
            user_id: self.user_id,
            uip: "",
            course_id: self.course_id,
            video_id: self.video_id,
            sku_id: self.sku_id,
            classroom_id: self.classroom_id,
            ccid: self.ccid.clone(),
            duration: self.duration,
            page_tag: self.page_tag.clone(),
            sequence: self.sequence,
            content_type: CONTENT_TYPE_TAG,
            cards_id: 0,
            slide: 0,
            v_url: "",
        }
    }
}

impl Iterator for HeartbeatSequencer {
    type Item = HeartbeatRecord;

    fn next(&mut self) -> Option<HeartbeatRecord> {
        if self.lead_pending {
            self.lead_pending = false;
            let ts = self.timestamp;
            return Some(self.record(EventKind::RateChange, 0.0, ts));
        }

        if self.progress >= self.duration {
            return None;
        }

        self.progress = (self.progress + self.interval * self.playback_rate).min(self.duration);
        // Jitter is unbounded; a pathological draw could step a timestamp
        // backwards. Left unguarded (see DESIGN.md).
        self.timestamp += self.interval + self.jitter.sample(&mut self.rng);
        let (progress, ts) = (self.progress, self.timestamp);
        Some(self.record(EventKind::Heartbeat, progress, ts))
    }
}

fn page_suffix(rng: &mut StdRng) -> String {
    (0..PAGE_SUFFIX_LEN)
        .map(|_| PAGE_SUFFIX_CHARSET[rng.gen_range(0..PAGE_SUFFIX_CHARSET.len())] as char)
        .collect()
}
