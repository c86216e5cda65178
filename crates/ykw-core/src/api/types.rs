//! Typed records for the platform endpoints.
//!
//! Every endpoint wraps its payload in an envelope: either `{success, data,
//! msg}` or `{code, data, msg}` with `code == 0` meaning success. Required
//! fields are plain; fields the platform sometimes omits are `Option` or
//! defaulted. A missing required field surfaces as `ApiError::Shape`.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::error::ApiError;

/// Common response envelope. `success` and `code` are mutually exclusive in
/// practice but both are handled so one envelope type covers all endpoints.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl Envelope {
    /// Unwrap the envelope: API-level failure becomes `ApiError::Api`,
    /// a missing `data` field becomes `ApiError::Shape`.
    pub fn into_data(self) -> Result<serde_json::Value, ApiError> {
        if self.success == Some(false) {
            return Err(ApiError::api(self.code, self.msg));
        }
        if let Some(code) = self.code {
            if code != 0 {
                return Err(ApiError::api(Some(code), self.msg));
            }
        }
        self.data
            .ok_or_else(|| ApiError::Shape("missing field `data`".to_string()))
    }
}

/// Classroom metadata used to drive the chapter walk.
#[derive(Debug, Clone, Deserialize)]
pub struct Classroom {
    pub name: String,
    pub course_name: String,
    #[serde(default)]
    pub teacher_name: Option<String>,
    pub course_sign: String,
    pub uv_id: i64,
}

/// Chapter tree for one classroom.
#[derive(Debug, Clone, Deserialize)]
pub struct ChapterTree {
    pub course_chapter: Vec<Chapter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chapter {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub section_leaf_list: Vec<SectionOrLeaf>,
}

/// An entry under a chapter: either a section carrying a nested `leaf_list`,
/// or a bare leaf with its own `leaf_type`.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionOrLeaf {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub leaf_type: Option<i64>,
    #[serde(default)]
    pub leaf_list: Option<Vec<LeafEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeafEntry {
    pub id: i64,
    pub name: String,
    pub leaf_type: i64,
}

/// Full leaf metadata for one video unit.
#[derive(Debug, Clone, Deserialize)]
pub struct LeafInfo {
    pub id: i64,
    pub name: String,
    pub user_id: i64,
    pub course_id: i64,
    pub classroom_id: i64,
    pub sku_id: i64,
    pub content_info: ContentInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentInfo {
    pub media: MediaInfo,
}

/// Media block of a leaf. `duration` as reported here is unreliable on some
/// courses, so callers treat it as a hint. Newer API variants embed the play
/// URL directly; older ones require the `playurl` lookup by ccid.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaInfo {
    pub ccid: String,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub play_url: Option<String>,
}

/// Watch-progress snapshot for one video. Read-only view over remote state;
/// `watch_length` and `rate` are informational (display only).
#[derive(Debug, Clone, Deserialize)]
pub struct WatchProgress {
    pub last_point: f64,
    pub video_length: f64,
    #[serde(default)]
    pub completed: i64,
    #[serde(default)]
    pub watch_length: f64,
    #[serde(default)]
    pub rate: f64,
}

impl WatchProgress {
    pub fn is_completed(&self) -> bool {
        self.completed == 1
    }
}

/// `data.playurl` of the playurl endpoint: quality name -> candidate URLs.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayUrlData {
    pub playurl: PlayUrl,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayUrl {
    pub sources: BTreeMap<String, Vec<String>>,
}

impl PlayUrl {
    /// First URL of the first available source, if any.
    pub fn first_url(&self) -> Option<&str> {
        self.sources
            .values()
            .next()
            .and_then(|urls| urls.first())
            .map(String::as_str)
    }
}

/// Identifiers needed to read one video's watch progress.
#[derive(Debug, Clone)]
pub struct ProgressQuery {
    pub user_id: i64,
    pub course_id: i64,
    pub classroom_id: i64,
    pub video_id: i64,
}
