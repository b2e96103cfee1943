//! Live download progress on the status message.

use crate::core::utils::human_size;
use crate::download::downloader::DownloadHandle;
use crate::relay::dispatch::attempt;
use crate::relay::notice::Notice;
use crate::relay::{Messenger, StatusMessage};
use std::time::Duration;

/// Bytes-so-far over declared total, both on the binary scale.
///
/// # Example
///
/// ```
/// use tunecore::download::progress::ProgressSnapshot;
///
/// assert_eq!(ProgressSnapshot::render(1_048_576, 49_283_072), "1 MB / 47 MB");
/// ```
pub struct ProgressSnapshot;

impl ProgressSnapshot {
    pub fn render(bytes_written: u64, declared_total: u64) -> String {
        format!("{} / {}", human_size(bytes_written), human_size(declared_total))
    }
}

/// Remembers the last emitted progress text so unchanged values are skipped.
#[derive(Debug, Default)]
pub struct ProgressReporter {
    last: Option<String>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the text to emit, or `None` when it equals the previous emission.
    pub fn observe(&mut self, bytes_written: u64, declared_total: u64) -> Option<String> {
        let text = ProgressSnapshot::render(bytes_written, declared_total);
        if self.last.as_deref() == Some(text.as_str()) {
            return None;
        }
        self.last = Some(text.clone());
        Some(text)
    }

    /// Polls `handle` every `interval` and edits `status` whenever the
    /// rendered progress changes. Returns once the download task stops.
    ///
    /// Edit failures are logged and ignored. Success or failure of the
    /// download is left to the caller.
    pub async fn report(
        &mut self,
        handle: &DownloadHandle,
        messenger: &dyn Messenger,
        status: &StatusMessage,
        interval: Duration,
    ) {
        let transfer = handle.transfer();
        while handle.is_running() {
            if let Some(progress) = self.observe(transfer.bytes_written(), transfer.declared_total()) {
                attempt(
                    "progress edit",
                    messenger.edit_message_text(status, &Notice::downloading(&progress)),
                )
                .await;
            }
            tokio::time::sleep(interval).await;
        }
    }
}
