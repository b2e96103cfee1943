//! Relay layer: how finished requests reach the user
//!
//! - `Messenger`: the outbound messaging capability the pipeline calls into
//! - `notice`: every user-visible text
//! - `dispatch`: delivery, error notices, best-effort side effects
//! - `scratch`: temporary files with guaranteed cleanup

pub mod dispatch;
pub mod notice;
pub mod scratch;

use crate::download::metadata::MediaMetadata;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use url::Url;

pub use dispatch::{attempt, deliver, notify, send_pages};
pub use notice::Notice;
pub use scratch::{ScratchFile, ScratchKind};

/// Identifier of the conversation a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one message inside a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef(pub i32);

/// An outbound message the pipeline edits in place and deletes on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMessage {
    pub conversation: ConversationId,
    pub message: MessageRef,
}

/// Outbound messaging capability.
///
/// Every call is fallible. The pipeline treats `edit_message_text` and
/// `delete_message` as best-effort and everything else as required.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends a standalone message. `html` selects HTML parse mode.
    async fn send_message(&self, conversation: ConversationId, text: &str, html: bool) -> anyhow::Result<()>;

    /// Sends an HTML message made of links, with link previews turned off.
    async fn send_listing(&self, conversation: ConversationId, text: &str) -> anyhow::Result<()>;

    /// Sends an HTML message, as a reply when `reply_to` is given, and returns its handle.
    async fn reply_to(
        &self,
        conversation: ConversationId,
        reply_to: Option<MessageRef>,
        text: &str,
    ) -> anyhow::Result<StatusMessage>;

    /// Replaces the text of a previously sent message (HTML).
    async fn edit_message_text(&self, status: &StatusMessage, text: &str) -> anyhow::Result<()>;

    async fn delete_message(&self, status: &StatusMessage) -> anyhow::Result<()>;

    /// Uploads a local file as an audio attachment.
    async fn send_audio(
        &self,
        conversation: ConversationId,
        path: &Path,
        metadata: &MediaMetadata,
    ) -> anyhow::Result<()>;

    /// Resolves a file uploaded by the user to a URL it can be downloaded from.
    async fn file_download_url(&self, file_id: &str) -> anyhow::Result<Url>;
}
