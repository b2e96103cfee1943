//! Streaming downloader: copies a response body to disk on its own task.
//!
//! The writer publishes its byte count through an atomic counter updated after
//! every chunk, so a progress loop can watch it without touching the filesystem.

use crate::download::fetch::ByteStream;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Completion state of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    InProgress,
    Completed,
    Failed,
}

impl TransferState {
    fn as_u8(self) -> u8 {
        match self {
            TransferState::InProgress => 0,
            TransferState::Completed => 1,
            TransferState::Failed => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => TransferState::InProgress,
            1 => TransferState::Completed,
            _ => TransferState::Failed,
        }
    }
}

struct TransferShared {
    declared_total: u64,
    bytes_written: AtomicU64,
    state: AtomicU8,
}

/// Observable side of one download: declared size, bytes on disk, state.
///
/// Cloning is cheap; all clones see the same counters.
#[derive(Clone)]
pub struct Transfer {
    shared: Arc<TransferShared>,
    path: PathBuf,
}

impl Transfer {
    fn new(path: PathBuf, declared_total: u64) -> Self {
        Self {
            shared: Arc::new(TransferShared {
                declared_total,
                bytes_written: AtomicU64::new(0),
                state: AtomicU8::new(TransferState::InProgress.as_u8()),
            }),
            path,
        }
    }

    /// Size the server declared for this resource.
    pub fn declared_total(&self) -> u64 {
        self.shared.declared_total
    }

    /// Bytes handed to the file so far. Never exceeds [`Self::declared_total`].
    pub fn bytes_written(&self) -> u64 {
        self.shared.bytes_written.load(Ordering::Acquire)
    }

    pub fn state(&self) -> TransferState {
        TransferState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    /// Destination file of this transfer.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn finish(&self, state: TransferState) {
        self.shared.state.store(state.as_u8(), Ordering::Release);
    }
}

impl std::fmt::Debug for Transfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transfer")
            .field("path", &self.path)
            .field("declared_total", &self.declared_total())
            .field("bytes_written", &self.bytes_written())
            .field("state", &self.state())
            .finish()
    }
}

/// Handle to a running download task.
pub struct DownloadHandle {
    transfer: Transfer,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl DownloadHandle {
    pub fn transfer(&self) -> &Transfer {
        &self.transfer
    }

    /// Whether the writer task is still copying bytes.
    pub fn is_running(&self) -> bool {
        self.transfer.state() == TransferState::InProgress && !self.task.is_finished()
    }

    /// Final state once the task has stopped.
    ///
    /// A task that died without recording a state (panic) counts as failed.
    pub fn final_state(&self) -> TransferState {
        match self.transfer.state() {
            TransferState::InProgress if self.task.is_finished() => TransferState::Failed,
            state => state,
        }
    }

    /// Asks the writer to stop after the current chunk.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Waits for the writer task and returns the final state.
    pub async fn wait(mut self) -> TransferState {
        if let Err(e) = (&mut self.task).await {
            log::error!("Download task for {} ended abnormally: {}", self.transfer.path.display(), e);
            if self.transfer.state() == TransferState::InProgress {
                self.transfer.finish(TransferState::Failed);
            }
        }
        self.transfer.state()
    }
}

// Dropping the handle stops the writer: nothing may refill a scratch path after its cleanup.
impl Drop for DownloadHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawns the writer task copying `body` into a new file at `destination`.
///
/// The destination is opened with create-new semantics: if something already
/// exists there, the transfer fails without touching it.
pub fn start(body: ByteStream, destination: PathBuf, declared_total: u64) -> DownloadHandle {
    let transfer = Transfer::new(destination, declared_total);
    let cancel = CancellationToken::new();

    let task = {
        let transfer = transfer.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match copy_body(body, &transfer, &cancel).await {
                Ok(()) => {
                    log::info!(
                        "✅ Download complete: {} ({} bytes)",
                        transfer.path.display(),
                        transfer.bytes_written()
                    );
                    transfer.finish(TransferState::Completed);
                }
                Err(e) => {
                    log::warn!(
                        "Download to {} stopped at {}/{} bytes: {}",
                        transfer.path.display(),
                        transfer.bytes_written(),
                        transfer.declared_total(),
                        e
                    );
                    transfer.finish(TransferState::Failed);
                }
            }
        })
    };

    DownloadHandle { transfer, cancel, task }
}

async fn copy_body(mut body: ByteStream, transfer: &Transfer, cancel: &CancellationToken) -> Result<(), String> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&transfer.path)
        .await
        .map_err(|e| format!("Failed to create file: {}", e))?;

    let declared = transfer.declared_total();
    let mut written: u64 = 0;

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => return Err("cancelled".to_string()),
            next = body.next() => next,
        };

        let chunk = match next {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => return Err(format!("Error reading chunk: {}", e)),
            None => break,
        };

        let after = written + chunk.len() as u64;
        if after > declared {
            return Err(format!("body exceeds declared length of {} bytes", declared));
        }

        file.write_all(&chunk)
            .await
            .map_err(|e| format!("Error writing to file: {}", e))?;
        written = after;
        transfer.shared.bytes_written.store(written, Ordering::Release);
    }

    file.flush().await.map_err(|e| format!("Failed to flush file: {}", e))?;

    if written != declared {
        return Err(format!("body ended after {} of {} bytes", written, declared));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures_util::stream;
    use std::time::Duration;

    fn chunks(parts: Vec<&'static [u8]>) -> ByteStream {
        stream::iter(parts.into_iter().map(|p| Ok(Bytes::from_static(p)))).boxed()
    }

    #[tokio::test]
    async fn test_writes_chunks_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track-ORDER");

        let handle = start(chunks(vec![b"abc", b"def", b"gh"]), path.clone(), 8);
        assert_eq!(handle.wait().await, TransferState::Completed);
        assert_eq!(std::fs::read(&path).unwrap(), b"abcdefgh");
    }

    #[tokio::test]
    async fn test_truncated_body_fails_and_freezes_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track-SHORT");

        let handle = start(chunks(vec![b"abc"]), path, 10);
        let transfer = handle.transfer().clone();
        assert_eq!(handle.wait().await, TransferState::Failed);
        assert_eq!(transfer.bytes_written(), 3);
    }

    #[tokio::test]
    async fn test_overflow_never_exceeds_declared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track-LONG");

        let handle = start(chunks(vec![b"abcd", b"efgh"]), path.clone(), 6);
        let transfer = handle.transfer().clone();
        assert_eq!(handle.wait().await, TransferState::Failed);
        assert_eq!(transfer.bytes_written(), 4);
        assert!(transfer.bytes_written() <= transfer.declared_total());
    }

    #[tokio::test]
    async fn test_stream_error_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track-ERR");

        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"abc")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ])
        .boxed();
        let handle = start(body, path, 6);
        assert_eq!(handle.wait().await, TransferState::Failed);
    }

    #[tokio::test]
    async fn test_existing_file_is_not_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track-TAKEN");
        std::fs::write(&path, b"keep me").unwrap();

        let handle = start(chunks(vec![b"xy"]), path.clone(), 2);
        assert_eq!(handle.wait().await, TransferState::Failed);
        assert_eq!(std::fs::read(&path).unwrap(), b"keep me");
    }

    #[tokio::test]
    async fn test_cancel_stops_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track-CANCEL");

        let handle = start(stream::pending().boxed(), path, 100);
        assert!(handle.is_running());
        handle.cancel();
        assert_eq!(handle.wait().await, TransferState::Failed);
    }

    #[tokio::test]
    async fn test_dropping_handle_stops_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track-DROPPED");

        let handle = start(stream::pending().boxed(), path, 100);
        let transfer = handle.transfer().clone();
        drop(handle);

        tokio::time::timeout(Duration::from_secs(2), async {
            while transfer.state() == TransferState::InProgress {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(transfer.state(), TransferState::Failed);
    }

    #[tokio::test]
    async fn test_counter_advances_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track-SLOW");

        let body = stream::iter((0..10).map(|_| Ok(Bytes::from(vec![7u8; 100_000]))))
            .then(|chunk| async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                chunk
            })
            .boxed();
        let handle = start(body, path.clone(), 1_000_000);

        let mut seen = Vec::new();
        while handle.is_running() {
            seen.push(handle.transfer().bytes_written());
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(handle.final_state(), TransferState::Completed);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 1_000_000);
    }
}
