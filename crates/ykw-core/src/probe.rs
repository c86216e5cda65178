//! External media duration probing.
//!
//! The duration embedded in leaf metadata is unreliable on some courses, so
//! when no prior watch progress exists the duration is read from the media
//! itself via `ffprobe`. Behind a trait so the session pipeline can run
//! against a stub in tests.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

/// Resolves the duration (seconds) of a remote media resource.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn duration_secs(&self, media_url: &str) -> Result<f64>;
}

/// `ffprobe`-backed probe. Requires `ffprobe` on PATH.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfprobeProbe;

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: String,
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn duration_secs(&self, media_url: &str) -> Result<f64> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "json",
                media_url,
            ])
            .output()
            .await
            .context("spawning ffprobe")?;

        if !output.status.success() {
            bail!(
                "ffprobe failed with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let parsed: FfprobeOutput =
            serde_json::from_slice(&output.stdout).context("parsing ffprobe output")?;
        parsed
            .format
            .duration
            .parse::<f64>()
            .context("ffprobe duration is not a number")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ffprobe_json_parses_duration_string() {
        let json = r#"{"format": {"duration": "1234.567000"}}"#;
        let parsed: FfprobeOutput = serde_json::from_slice(json.as_bytes()).unwrap();
        let secs: f64 = parsed.format.duration.parse().unwrap();
        assert!((secs - 1234.567).abs() < 1e-9);
    }
}
