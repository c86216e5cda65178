//! Platform API client.
//!
//! One shared `reqwest::Client` carries the session headers (platform tags,
//! User-Agent, Cookie) for every concurrent watch task; `reqwest::Client` is
//! internally reference-counted, so clones are cheap and concurrent use needs
//! no locking. Per-request context is limited to the `classroom-id` header.

mod error;
mod types;

pub use error::ApiError;
pub use types::{
    Chapter, ChapterTree, Classroom, ContentInfo, Envelope, LeafEntry, LeafInfo, MediaInfo,
    PlayUrl, PlayUrlData, ProgressQuery, SectionOrLeaf, WatchProgress,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, COOKIE, USER_AGENT};
use serde::de::DeserializeOwned;

use crate::heartbeat::HeartbeatRecord;

pub const BASE_URL: &str = "https://pro.yuketang.cn";

const ACCEPT_JSON: &str = "application/json, text/plain, */*";

/// Cookies that double as request headers on this platform.
const COOKIE_HEADER_MAP: &[(&str, &str)] = &[
    ("university-id", "university_id"),
    ("uv-id", "uv_id"),
    ("X-CSRFToken", "csrftoken"),
];

/// Opaque credentials carried on every request. Acquisition is the caller's
/// problem; the core only forwards them.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Raw `Cookie` header value ("name=value; name2=value2").
    pub cookie: String,
    pub user_agent: String,
}

/// Remote calls the session pipeline depends on. Split out as a trait so the
/// pipeline and orchestrator can run against stubs in tests.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn leaf_info(&self, classroom_id: i64, leaf_id: i64) -> Result<LeafInfo, ApiError>;

    /// Watch progress for one video, or `None` when the platform has no
    /// record yet (never watched).
    async fn watch_progress(
        &self,
        query: &ProgressQuery,
    ) -> Result<Option<WatchProgress>, ApiError>;

    /// Resolve a playable media URL for a content id (legacy lookup path).
    async fn play_url(&self, classroom_id: i64, ccid: &str) -> Result<String, ApiError>;

    /// Submit one heartbeat batch for the classroom.
    async fn send_heartbeat(
        &self,
        classroom_id: i64,
        batch: &[HeartbeatRecord],
    ) -> Result<(), ApiError>;
}

/// HTTP client against the production platform.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    /// Build the shared client. Fails on malformed credentials (configuration
    /// error, fatal at startup).
    pub fn new(creds: &Credentials) -> Result<Self> {
        Self::with_base(creds, BASE_URL)
    }

    /// Like [`ApiClient::new`] but against a custom base URL (tests).
    pub fn with_base(creds: &Credentials, base: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("Xt-Agent", HeaderValue::from_static("web"));
        headers.insert("X-Client", HeaderValue::from_static("web"));
        headers.insert("xtbz", HeaderValue::from_static("ykt"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&creds.user_agent).context("invalid user agent")?,
        );
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&creds.cookie).context("invalid cookie string")?,
        );

        for (header, cookie_name) in COOKIE_HEADER_MAP {
            if let Some(value) = cookie_value(&creds.cookie, cookie_name) {
                let name: HeaderName = header.parse().context("invalid header name")?;
                headers.insert(
                    name,
                    HeaderValue::from_str(value)
                        .with_context(|| format!("invalid value for cookie `{}`", cookie_name))?,
                );
            }
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// Classroom metadata (drives the chapter walk).
    pub async fn classroom(&self, classroom_id: i64) -> Result<Classroom, ApiError> {
        let url = format!("{}/v2/api/web/classrooms/{}?role=5", self.base, classroom_id);
        self.get_data(&url, classroom_id, &[]).await
    }

    /// Full chapter tree for a classroom.
    pub async fn course_chapter(
        &self,
        classroom_id: i64,
        sign: &str,
        uv_id: i64,
    ) -> Result<ChapterTree, ApiError> {
        let url = format!(
            "{}/mooc-api/v1/lms/learn/course_chapter/{}/?sign={}",
            self.base, classroom_id, sign
        );
        let uv = uv_id.to_string();
        self.get_data(&url, classroom_id, &[("uv-id", uv.as_str())])
            .await
    }

    /// GET an enveloped endpoint and decode `data` into `T`.
    async fn get_data<T: DeserializeOwned>(
        &self,
        url: &str,
        classroom_id: i64,
        extra_headers: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let mut req = self
            .http
            .get(url)
            .header(ACCEPT, ACCEPT_JSON)
            .header("classroom-id", classroom_id.to_string());
        for (name, value) in extra_headers {
            req = req.header(*name, *value);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        let body = resp.bytes().await?;
        let envelope: Envelope = serde_json::from_slice(&body)
            .map_err(|e| ApiError::Shape(format!("envelope: {}", e)))?;
        let data = envelope.into_data()?;
        serde_json::from_value(data).map_err(|e| ApiError::Shape(e.to_string()))
    }
}

#[async_trait]
impl PlatformApi for ApiClient {
    async fn leaf_info(&self, classroom_id: i64, leaf_id: i64) -> Result<LeafInfo, ApiError> {
        let url = format!(
            "{}/mooc-api/v1/lms/learn/leaf_info/{}/{}/",
            self.base, classroom_id, leaf_id
        );
        self.get_data(&url, classroom_id, &[]).await
    }

    async fn watch_progress(
        &self,
        query: &ProgressQuery,
    ) -> Result<Option<WatchProgress>, ApiError> {
        let url = format!(
            "{}/video-log/get_video_watch_progress/?cid={}&user_id={}&classroom_id={}&video_type=video&vtype=rate&video_id={}&snapshot=1",
            self.base, query.course_id, query.user_id, query.classroom_id, query.video_id
        );
        // data is keyed by stringified video id; the key is absent when the
        // platform has never seen this user watch this video.
        let mut map: std::collections::HashMap<String, WatchProgress> =
            self.get_data(&url, query.classroom_id, &[]).await?;
        Ok(map.remove(&query.video_id.to_string()))
    }

    async fn play_url(&self, classroom_id: i64, ccid: &str) -> Result<String, ApiError> {
        let url = format!(
            "{}/api/open/audiovideo/playurl?video_id={}&provider=cc&file_type=1&is_single=0&domain=pro.yuketang.cn",
            self.base, ccid
        );
        let data: PlayUrlData = self.get_data(&url, classroom_id, &[]).await?;
        data.playurl
            .first_url()
            .map(str::to_string)
            .ok_or_else(|| ApiError::Shape("playurl has no sources".to_string()))
    }

    async fn send_heartbeat(
        &self,
        classroom_id: i64,
        batch: &[HeartbeatRecord],
    ) -> Result<(), ApiError> {
        let url = format!("{}/video-log/heartbeat/", self.base);
        let payload = serde_json::json!({ "heart_data": batch });
        let resp = self
            .http
            .post(&url)
            .header(ACCEPT, ACCEPT_JSON)
            .header("classroom-id", classroom_id.to_string())
            .json(&payload)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Extract one cookie's value from a raw `Cookie` header string.
fn cookie_value<'a>(cookie: &'a str, name: &str) -> Option<&'a str> {
    cookie.split("; ").find_map(|kv| {
        let (k, v) = kv.split_once('=')?;
        (k == name).then_some(v)
    })
}
