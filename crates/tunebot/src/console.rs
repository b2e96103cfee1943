//! Terminal `Messenger` used by `tunerelay fetch`.
//!
//! Status texts are printed as plain lines; the delivered file is copied into
//! an output directory under a name built from its tags.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;
use tunecore::download::MediaMetadata;
use tunecore::{ConversationId, MessageRef, Messenger, StatusMessage};
use url::Url;

pub struct ConsoleMessenger {
    output_dir: PathBuf,
    fallback_name: String,
    next_id: AtomicI32,
    delivered: Mutex<Option<PathBuf>>,
}

impl ConsoleMessenger {
    /// `fallback_name` is used when the file carries no title tag.
    pub fn new(output_dir: impl Into<PathBuf>, fallback_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            fallback_name: fallback_name.into(),
            next_id: AtomicI32::new(1),
            delivered: Mutex::new(None),
        }
    }

    /// Where the last delivered file was copied to.
    pub fn delivered(&self) -> Option<PathBuf> {
        self.delivered.lock().ok().and_then(|guard| guard.clone())
    }

    /// File name for a delivered track: `Performer - Title`, `Title`, or the fallback.
    pub fn file_name_for(&self, metadata: &MediaMetadata) -> String {
        let name = match (&metadata.performer, &metadata.title) {
            (Some(performer), Some(title)) => format!("{} - {}", performer, title),
            (None, Some(title)) => title.clone(),
            _ => self.fallback_name.clone(),
        };
        sanitize_file_name(&name)
    }
}

/// Last non-empty path segment of `url`, or `track`.
pub fn fallback_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(str::to_string))
        .unwrap_or_else(|| "track".to_string())
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        "track".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Strips the few tags the notice catalog uses and undoes HTML escaping.
fn plain_text(text: &str) -> String {
    text.replace("<b>", "")
        .replace("</b>", "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[async_trait]
impl Messenger for ConsoleMessenger {
    async fn send_message(&self, _conversation: ConversationId, text: &str, html: bool) -> anyhow::Result<()> {
        if html {
            println!("{}", plain_text(text));
        } else {
            println!("{}", text);
        }
        Ok(())
    }

    async fn send_listing(&self, _conversation: ConversationId, text: &str) -> anyhow::Result<()> {
        println!("{}", plain_text(text));
        Ok(())
    }

    async fn reply_to(
        &self,
        conversation: ConversationId,
        _reply_to: Option<MessageRef>,
        text: &str,
    ) -> anyhow::Result<StatusMessage> {
        println!("{}", plain_text(text));
        Ok(StatusMessage {
            conversation,
            message: MessageRef(self.next_id.fetch_add(1, Ordering::SeqCst)),
        })
    }

    async fn edit_message_text(&self, _status: &StatusMessage, text: &str) -> anyhow::Result<()> {
        println!("{}", plain_text(text));
        Ok(())
    }

    async fn delete_message(&self, _status: &StatusMessage) -> anyhow::Result<()> {
        Ok(())
    }

    async fn send_audio(
        &self,
        _conversation: ConversationId,
        path: &Path,
        metadata: &MediaMetadata,
    ) -> anyhow::Result<()> {
        let destination = self.output_dir.join(self.file_name_for(metadata));
        fs_err::tokio::copy(path, &destination).await?;
        println!(
            "✅ Saved {} ({}s)",
            destination.display(),
            metadata.duration_secs
        );
        if let Ok(mut guard) = self.delivered.lock() {
            *guard = Some(destination);
        }
        Ok(())
    }

    async fn file_download_url(&self, file_id: &str) -> anyhow::Result<Url> {
        anyhow::bail!("uploaded files are not available in console mode ({})", file_id)
    }
}
