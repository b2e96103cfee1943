//! Delivery of finished downloads and failure notices.

use crate::download::error::DeliveryError;
use crate::download::metadata::MediaMetadata;
use crate::relay::notice::UPLOADING;
use crate::relay::{ConversationId, Messenger, StatusMessage};
use std::future::Future;
use std::path::Path;

/// Runs a best-effort side effect: on failure, logs it and carries on.
///
/// Returns `true` when the operation succeeded.
pub async fn attempt<F, T, E>(what: &str, operation: F) -> bool
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match operation.await {
        Ok(_) => true,
        Err(e) => {
            log::warn!("Best-effort {} failed: {}", what, e);
            false
        }
    }
}

/// Sends one explanatory message to the conversation.
///
/// There is nothing left to fall back to if this fails, so the error is only logged.
pub async fn notify(messenger: &dyn Messenger, conversation: ConversationId, text: &str) {
    if let Err(e) = messenger.send_message(conversation, text, true).await {
        log::error!("Failed to send notice to chat {}: {}", conversation, e);
    }
}

/// Sends a paged listing in order. Unlike `notify`, a failed page fails the delivery.
pub async fn send_pages(
    messenger: &dyn Messenger,
    conversation: ConversationId,
    pages: &[String],
) -> Result<(), DeliveryError> {
    for (index, page) in pages.iter().enumerate() {
        log::debug!("Sending listing page {}/{} to chat {}", index + 1, pages.len(), conversation);
        messenger.send_listing(conversation, page).await?;
    }
    Ok(())
}

/// Uploads the finished file and retires the status message.
///
/// The status edit and the final delete are best-effort; only the upload
/// itself can fail the delivery.
pub async fn deliver(
    messenger: &dyn Messenger,
    status: &StatusMessage,
    path: &Path,
    metadata: &MediaMetadata,
) -> Result<(), DeliveryError> {
    attempt("status edit", messenger.edit_message_text(status, UPLOADING)).await;

    log::info!(
        "📤 Sending {} to chat {} (title: {:?}, performer: {:?}, duration: {}s)",
        path.display(),
        status.conversation,
        metadata.title,
        metadata.performer,
        metadata.duration_secs
    );
    messenger.send_audio(status.conversation, path, metadata).await?;

    attempt("status delete", messenger.delete_message(status)).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_attempt_reports_outcome() {
        assert!(attempt("ok", async { Ok::<_, String>(()) }).await);
        assert!(!attempt("err", async { Err::<(), _>("boom".to_string()) }).await);
    }
}
