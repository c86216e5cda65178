//! Minimal HTTP/1.1 server speaking the platform's JSON envelopes, for
//! integration tests of the real client. Serves one canned classroom with a
//! chapter of two video leaves; records every request it receives.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

/// One request as seen by the server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

pub type RequestLog = Arc<Mutex<Vec<Recorded>>>;

/// Starts the canned server in a background thread. Returns the base URL and
/// the request log. The server runs until the process exits.
pub fn start() -> (String, RequestLog) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let log: RequestLog = Arc::new(Mutex::new(Vec::new()));
    let log_for_thread = Arc::clone(&log);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let log = Arc::clone(&log_for_thread);
            thread::spawn(move || handle(stream, &log));
        }
    });
    (format!("http://127.0.0.1:{}", port), log)
}

fn handle(mut stream: std::net::TcpStream, log: &RequestLog) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));

    let Some(recorded) = read_request(&mut stream) else {
        return;
    };
    let body = route(&recorded.method, &recorded.path);
    log.lock().unwrap().push(recorded);

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Read one request: headers, then exactly Content-Length body bytes.
fn read_request(stream: &mut std::net::TcpStream) -> Option<Recorded> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        raw.extend_from_slice(&buf[..n]);
        if let Some(pos) = find_header_end(&raw) {
            break pos;
        }
        if raw.len() > 64 * 1024 {
            return None;
        }
    };

    let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
    let mut lines = head.lines();
    let request_line = lines.next()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body_bytes = raw[header_end + 4..].to_vec();
    while body_bytes.len() < content_length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        body_bytes.extend_from_slice(&buf[..n]);
    }

    Some(Recorded {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body_bytes).to_string(),
    })
}

fn find_header_end(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Canned classroom: leaf 100 is an unwatched 20s video (no embedded play
/// URL, so the client must use the playurl lookup); leaf 101 is already
/// completed.
fn route(method: &str, path: &str) -> String {
    if path.starts_with("/v2/api/web/classrooms/") {
        return r#"{"success": true, "data": {
            "name": "Class 1", "course_name": "Systems", "teacher_name": "Prof X",
            "course_sign": "sig42", "uv_id": 900}}"#
            .to_string();
    }
    if path.starts_with("/mooc-api/v1/lms/learn/course_chapter/") {
        return r#"{"success": true, "data": {"course_chapter": [
            {"id": 1, "name": "Week 1", "section_leaf_list": [
                {"id": 10, "name": "Intro", "leaf_list": [
                    {"id": 100, "name": "Lecture 1", "leaf_type": 0},
                    {"id": 101, "name": "Lecture 2", "leaf_type": 0},
                    {"id": 102, "name": "Quiz 1", "leaf_type": 6}
                ]}
            ]}
        ]}}"#
            .to_string();
    }
    if path.starts_with("/mooc-api/v1/lms/learn/leaf_info/") {
        let leaf_id = if path.contains("/100/") { 100 } else { 101 };
        return format!(
            r#"{{"success": true, "data": {{
                "id": {id}, "name": "Lecture", "user_id": 11, "course_id": 22,
                "classroom_id": 33, "sku_id": 44,
                "content_info": {{"media": {{"ccid": "cc-{id}"}}}}}}}}"#,
            id = leaf_id
        );
    }
    if path.starts_with("/video-log/get_video_watch_progress/") {
        if path.contains("video_id=101") {
            return r#"{"code": 0, "data": {"101": {
                "last_point": 20.0, "video_length": 20.0, "completed": 1,
                "watch_length": 20.0, "rate": 1.0}}}"#
                .to_string();
        }
        return r#"{"code": 0, "data": {"100": {
            "last_point": 0.0, "video_length": 20.0, "completed": 0,
            "watch_length": 0.0, "rate": 0.0}}}"#
            .to_string();
    }
    if path.starts_with("/api/open/audiovideo/playurl") {
        return r#"{"success": true, "data": {"playurl": {"sources": {
            "quality10": ["https://cdn.example.com/media/cc-100.m3u8"]}}}}"#
            .to_string();
    }
    if method == "POST" && path.starts_with("/video-log/heartbeat/") {
        return r#"{"code": 0, "data": {}}"#.to_string();
    }
    r#"{"success": false, "msg": "no such endpoint"}"#.to_string()
}
