//! Heartbeat wire records.
//!
//! Field names and the payload shape are a fixed remote contract; the serde
//! renames below must round-trip byte-for-byte against it. Declaration order
//! matches the order the platform's own web client emits.

mod batch;
mod sequencer;

pub use batch::{batched, Batched, HeartbeatBatch};
pub use sequencer::HeartbeatSequencer;

use serde::Serialize;

/// Records per submitted batch. Fixed by the remote contract.
pub const BATCH_SIZE: usize = 6;

/// Platform tag (`p`).
pub const PLATFORM_TAG: &str = "web";
/// Line-of-business tag (`lob`).
pub const LOB_TAG: &str = "ykt";
/// Content type tag (`t`).
pub const CONTENT_TYPE_TAG: &str = "video";

/// Telemetry event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    #[serde(rename = "heartbeat")]
    Heartbeat,
    #[serde(rename = "ratechange")]
    RateChange,
}

/// One telemetry event reporting simulated playback progress at a point in
/// time. Owned by the session pipeline that created it; never shared.
#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatRecord {
    #[serde(rename = "i")]
    pub interval: f64,
    #[serde(rename = "et")]
    pub event: EventKind,
    #[serde(rename = "p")]
    pub platform: &'static str,
    /// CDN host of the media URL.
    #[serde(rename = "n")]
    pub cdn_host: String,
    pub lob: &'static str,
    /// Cumulative progress in seconds; non-decreasing, clamped to duration.
    #[serde(rename = "cp")]
    pub progress: f64,
    pub fp: u32,
    pub tp: u32,
    #[serde(rename = "sp")]
    pub playback_rate: f64,
    /// Millisecond epoch timestamp, string-encoded.
    #[serde(rename = "ts")]
    pub timestamp: String,
    #[serde(rename = "u")]
    pub user_id: i64,
    pub uip: &'static str,
    #[serde(rename = "c")]
    pub course_id: i64,
    #[serde(rename = "v")]
    pub video_id: i64,
    #[serde(rename = "skuid")]
    pub sku_id: i64,
    #[serde(rename = "classroomid")]
    pub classroom_id: i64,
    #[serde(rename = "cc")]
    pub ccid: String,
    #[serde(rename = "d")]
    pub duration: f64,
    /// `"{video_id}_{4-char session suffix}"`.
    #[serde(rename = "pg")]
    pub page_tag: String,
    /// Per-session sequence number, 1-based and contiguous.
    #[serde(rename = "sq")]
    pub sequence: u64,
    #[serde(rename = "t")]
    pub content_type: &'static str,
    pub cards_id: u32,
    pub slide: u32,
    pub v_url: &'static str,
}

impl HeartbeatRecord {
    /// Millisecond epoch of this record, decoded from the wire string.
    pub fn epoch_ms(&self) -> Option<i64> {
        self.timestamp.parse().ok()
    }
}
