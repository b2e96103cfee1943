//! Tag and duration probing of completed downloads.
//!
//! `FfprobeProbe` asks ffprobe for the container format as JSON and picks the
//! title, performer and duration out of it. A missing or failing ffprobe gives
//! empty metadata rather than an error; only an unopenable file is fatal.

use crate::download::error::ParseError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Upper bound for one ffprobe run.
const FFPROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Tags consulted for the performer, in order of preference.
const PERFORMER_TAGS: &[&str] = &["artist", "album_artist", "performer"];

/// Essential tags of a finished download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaMetadata {
    pub title: Option<String>,
    pub performer: Option<String>,
    /// Whole seconds, rounded down
    pub duration_secs: u32,
}

/// Reads [`MediaMetadata`] from a local file.
#[async_trait]
pub trait MetadataProbe: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<MediaMetadata, ParseError>;
}

/// Probe backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: String,
}

impl FfprobeProbe {
    pub fn new() -> Self {
        Self {
            program: "ffprobe".to_string(),
        }
    }

    /// Uses a different ffprobe executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataProbe for FfprobeProbe {
    async fn extract(&self, path: &Path) -> Result<MediaMetadata, ParseError> {
        tokio::fs::File::open(path)
            .await
            .map_err(|e| ParseError::Unreadable(format!("{}: {}", path.display(), e)))?;

        let run = Command::new(&self.program)
            .args(["-v", "error", "-print_format", "json", "-show_format"])
            .arg(path)
            .kill_on_drop(true)
            .output();

        let output = match timeout(FFPROBE_TIMEOUT, run).await {
            Ok(Ok(output)) if output.status.success() => output,
            Ok(Ok(output)) => {
                log::warn!(
                    "ffprobe exited with {} for {}: {}",
                    output.status,
                    path.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                return Ok(MediaMetadata::default());
            }
            Ok(Err(e)) => {
                log::warn!("Failed to run {}: {}", self.program, e);
                return Ok(MediaMetadata::default());
            }
            Err(_) => {
                log::warn!("ffprobe timed out after {:?} for {}", FFPROBE_TIMEOUT, path.display());
                return Ok(MediaMetadata::default());
            }
        };

        Ok(parse_ffprobe_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Extracts metadata from `ffprobe -print_format json -show_format` output.
///
/// Tag names are matched case-insensitively; blank values count as absent.
/// Anything unparsable yields empty metadata.
pub fn parse_ffprobe_output(json: &str) -> MediaMetadata {
    let format = match serde_json::from_str::<ProbeOutput>(json) {
        Ok(ProbeOutput { format: Some(format) }) => format,
        Ok(_) => return MediaMetadata::default(),
        Err(e) => {
            log::warn!("Unrecognised ffprobe output: {}", e);
            return MediaMetadata::default();
        }
    };

    let tags: HashMap<String, String> = format
        .tags
        .into_iter()
        .map(|(k, v)| (k.to_lowercase(), v.trim().to_string()))
        .filter(|(_, v)| !v.is_empty())
        .collect();

    let duration_secs = format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(|d| d.floor().min(u32::MAX as f64) as u32)
        .unwrap_or(0);

    MediaMetadata {
        title: tags.get("title").cloned(),
        performer: PERFORMER_TAGS.iter().find_map(|key| tags.get(*key).cloned()),
        duration_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_tags() {
        let json = r#"{
            "format": {
                "filename": "/tmp/track-ABC",
                "format_name": "mp3",
                "duration": "215.986939",
                "tags": { "TITLE": "Song", "ARTIST": "Band", "album": "Record" }
            }
        }"#;
        assert_eq!(
            parse_ffprobe_output(json),
            MediaMetadata {
                title: Some("Song".into()),
                performer: Some("Band".into()),
                duration_secs: 215,
            }
        );
    }

    #[test]
    fn test_parse_performer_fallback() {
        let json = r#"{"format": {"duration": "9.99", "tags": {"album_artist": "Various"}}}"#;
        let meta = parse_ffprobe_output(json);
        assert_eq!(meta.title, None);
        assert_eq!(meta.performer.as_deref(), Some("Various"));
        assert_eq!(meta.duration_secs, 9);
    }

    #[test]
    fn test_parse_blank_tags_are_absent() {
        let json = r#"{"format": {"tags": {"title": "  ", "artist": ""}}}"#;
        assert_eq!(parse_ffprobe_output(json), MediaMetadata::default());
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_ffprobe_output("not json"), MediaMetadata::default());
        assert_eq!(parse_ffprobe_output("{}"), MediaMetadata::default());
        assert_eq!(
            parse_ffprobe_output(r#"{"format": {"duration": "N/A"}}"#),
            MediaMetadata::default()
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let result = FfprobeProbe::new().extract(&dir.path().join("track-NOPE")).await;
        assert!(matches!(result, Err(ParseError::Unreadable(_))));
    }

    #[tokio::test]
    async fn test_missing_ffprobe_gives_empty_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track-DATA");
        std::fs::write(&path, b"not really audio").unwrap();

        let probe = FfprobeProbe::with_program("/nonexistent/ffprobe-for-tests");
        assert_eq!(probe.extract(&path).await.unwrap(), MediaMetadata::default());
    }
}
