//! Playlist files: locator extraction from uploaded documents.

use crate::relay::{ConversationId, MessageRef};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

static URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s"'<>\x00-\x1f\x7f]+"#).expect("Failed to compile URL regex"));

/// A document uploaded by the user, to be read as a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistUpload {
    pub conversation: ConversationId,
    /// Front-end identifier of the uploaded file
    pub file_id: String,
    pub message: Option<MessageRef>,
}

/// Turns a local playlist file into the locators it contains, in order.
pub trait PlaylistParser: Send + Sync {
    fn parse(&self, path: &Path) -> std::io::Result<Vec<String>>;
}

/// Scans any text-ish playlist (M3U, PLS, XSPF, plist) for `http(s)://` links.
///
/// Invalid UTF-8 is replaced rather than rejected, so binary plists with
/// embedded ASCII URLs still work.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlScanParser;

impl UrlScanParser {
    /// Extracts unique locators from `text`, keeping first-seen order.
    pub fn scan(text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        URL_REGEX
            .find_iter(text)
            .map(|m| m.as_str().trim_end_matches([',', ';', ')', ']']).to_string())
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }
}

impl PlaylistParser for UrlScanParser {
    fn parse(&self, path: &Path) -> std::io::Result<Vec<String>> {
        let bytes = fs_err::read(path)?;
        Ok(Self::scan(&String::from_utf8_lossy(&bytes)))
    }
}
