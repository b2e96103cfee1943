//! Request orchestration.
//!
//! One `Pipeline` is shared by every request; each request runs on its own task:
//!   fetch + validate headers → status message → stream to scratch file with progress
//!   → probe tags → upload → cleanup
//!
//! Every failure ends in exactly one notice to the user, and the scratch file
//! is removed on every path.

use crate::core::config;
use crate::download::downloader::{self, TransferState};
use crate::download::error::RequestError;
use crate::download::fetch::{fetch_to_file, ByteStream, Transport};
use crate::download::metadata::MetadataProbe;
use crate::download::playlist::{PlaylistParser, PlaylistUpload};
use crate::download::progress::ProgressReporter;
use crate::relay::dispatch::{attempt, deliver, notify, send_pages};
use crate::relay::notice::Notice;
use crate::relay::scratch::{ScratchFile, ScratchKind};
use crate::relay::{ConversationId, MessageRef, Messenger, StatusMessage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use url::Url;

/// A direct-link request from a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRequest {
    pub url: Url,
    pub conversation: ConversationId,
    /// Message the status reply should quote
    pub message: Option<MessageRef>,
}

/// Lifecycle of one request. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    Fetching,
    Downloading,
    Extracting,
    Uploading,
    Done,
    Failed(RequestError),
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Done | RequestState::Failed(_))
    }

    /// Short name for logs
    pub fn label(&self) -> &'static str {
        match self {
            RequestState::Fetching => "fetching",
            RequestState::Downloading => "downloading",
            RequestState::Extracting => "extracting",
            RequestState::Uploading => "uploading",
            RequestState::Done => "done",
            RequestState::Failed(_) => "failed",
        }
    }
}

/// Terminal state of a request plus the scratch path it used, if any.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub state: RequestState,
    pub scratch_path: Option<PathBuf>,
}

impl RequestOutcome {
    pub fn is_done(&self) -> bool {
        self.state == RequestState::Done
    }

    pub fn error(&self) -> Option<&RequestError> {
        match &self.state {
            RequestState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Knobs of the pipeline. `Default` reads them from `core::config`.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tunecore::PipelineConfig;
///
/// let config = PipelineConfig::default()
///     .with_scratch_dir("/var/tmp")
///     .with_poll_interval(Duration::from_millis(100));
/// assert_eq!(config.max_file_size, 50 * 1024 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory for `track-*` and `playlist-*` files
    pub scratch_dir: PathBuf,
    /// Exclusive ceiling on the declared Content-Length
    pub max_file_size: u64,
    /// Progress polling cadence
    pub poll_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from(config::TEMP_FILES_DIR.as_str()),
            max_file_size: config::limits::MAX_FILE_SIZE_BYTES,
            poll_interval: config::progress::interval(),
        }
    }
}

impl PipelineConfig {
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Shared collaborators of every request.
pub struct Pipeline {
    messenger: Arc<dyn Messenger>,
    transport: Arc<dyn Transport>,
    probe: Arc<dyn MetadataProbe>,
    parser: Arc<dyn PlaylistParser>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        transport: Arc<dyn Transport>,
        probe: Arc<dyn MetadataProbe>,
        parser: Arc<dyn PlaylistParser>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            messenger,
            transport,
            probe,
            parser,
            config,
        }
    }

    pub fn messenger(&self) -> &Arc<dyn Messenger> {
        &self.messenger
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs one direct-link request to completion.
    pub async fn run_track(&self, request: TrackRequest) -> RequestOutcome {
        let conversation = request.conversation;
        log::info!(
            "▶️ Track request from chat {} ({} via {})",
            conversation,
            request.url.host_str().unwrap_or("<no host>"),
            self.transport.name()
        );
        let mut state = RequestState::Fetching;

        let max_file_size = self.config.max_file_size;
        let response = match self
            .transport
            .fetch(&request.url)
            .await
            .and_then(|response| response.validate(max_file_size))
        {
            Ok(response) => response,
            Err(e) => {
                let err = RequestError::from(e);
                self.report_failure(conversation, &err).await;
                transition(conversation, &mut state, RequestState::Failed(err));
                return RequestOutcome {
                    state,
                    scratch_path: None,
                };
            }
        };

        let status = match self
            .messenger
            .reply_to(conversation, request.message, &Notice::downloading(""))
            .await
        {
            Ok(status) => status,
            Err(e) => {
                log::error!("Failed to send status message to chat {}: {}", conversation, e);
                let err = RequestError::DeliveryFailure(e.to_string());
                self.report_failure(conversation, &err).await;
                transition(conversation, &mut state, RequestState::Failed(err));
                return RequestOutcome {
                    state,
                    scratch_path: None,
                };
            }
        };

        let scratch = ScratchFile::new(&self.config.scratch_dir, ScratchKind::Track);
        let scratch_path = scratch.path().to_path_buf();

        transition(conversation, &mut state, RequestState::Downloading);
        let result = self
            .download_and_deliver(response.body, response.declared_total, &status, &scratch_path, &mut state)
            .await;

        match result {
            Ok(()) => transition(conversation, &mut state, RequestState::Done),
            Err(err) => {
                log::warn!(
                    "Track request for chat {} failed while {} ({}): {}",
                    conversation,
                    state.label(),
                    err.subcategory(),
                    err
                );
                self.report_failure(conversation, &err).await;
                attempt("status delete", self.messenger.delete_message(&status)).await;
                transition(conversation, &mut state, RequestState::Failed(err));
            }
        }

        scratch.remove().await;
        RequestOutcome {
            state,
            scratch_path: Some(scratch_path),
        }
    }

    async fn download_and_deliver(
        &self,
        body: ByteStream,
        declared_total: u64,
        status: &StatusMessage,
        path: &Path,
        state: &mut RequestState,
    ) -> Result<(), RequestError> {
        let conversation = status.conversation;
        let handle = downloader::start(body, path.to_path_buf(), declared_total);
        ProgressReporter::new()
            .report(&handle, self.messenger.as_ref(), status, self.config.poll_interval)
            .await;

        let transfer = handle.transfer().clone();
        if handle.wait().await != TransferState::Completed {
            return Err(RequestError::Unreachable(format!(
                "transfer stopped at {} of {} bytes",
                transfer.bytes_written(),
                transfer.declared_total()
            )));
        }

        transition(conversation, state, RequestState::Extracting);
        let metadata = self.probe.extract(path).await?;

        transition(conversation, state, RequestState::Uploading);
        deliver(self.messenger.as_ref(), status, path, &metadata).await?;
        Ok(())
    }

    /// Runs one playlist upload to completion: replies with the enumerated locators.
    pub async fn run_playlist(&self, upload: PlaylistUpload) -> RequestOutcome {
        let conversation = upload.conversation;
        log::info!("▶️ Playlist upload from chat {}", conversation);

        let scratch = ScratchFile::new(&self.config.scratch_dir, ScratchKind::Playlist);
        let scratch_path = scratch.path().to_path_buf();

        let state = match self.list_playlist(&upload, &scratch_path).await {
            Ok(()) => RequestState::Done,
            Err(err) => {
                log::warn!(
                    "Playlist from chat {} failed ({}): {}",
                    conversation,
                    err.subcategory(),
                    err
                );
                self.report_failure(conversation, &err).await;
                RequestState::Failed(err)
            }
        };

        scratch.remove().await;
        RequestOutcome {
            state,
            scratch_path: Some(scratch_path),
        }
    }

    async fn list_playlist(&self, upload: &PlaylistUpload, path: &Path) -> Result<(), RequestError> {
        let urls = self.collect_playlist(upload, path).await?;
        let pages = Notice::playlist(&urls);
        log::info!(
            "Found {} locators in playlist from chat {} ({} message(s))",
            urls.len(),
            upload.conversation,
            pages.len()
        );
        send_pages(self.messenger.as_ref(), upload.conversation, &pages).await?;
        Ok(())
    }

    async fn collect_playlist(&self, upload: &PlaylistUpload, path: &Path) -> Result<Vec<String>, RequestError> {
        let url = self
            .messenger
            .file_download_url(&upload.file_id)
            .await
            .map_err(|e| RequestError::Unreachable(format!("cannot resolve uploaded file: {}", e)))?;

        let bytes = fetch_to_file(self.transport.as_ref(), &url, path).await?;
        log::debug!("Stored playlist as {} ({} bytes)", path.display(), bytes);

        let parser = Arc::clone(&self.parser);
        let owned_path = path.to_path_buf();
        let urls = tokio::task::spawn_blocking(move || parser.parse(&owned_path))
            .await
            .map_err(|e| RequestError::Unreadable(format!("parser task failed: {}", e)))?
            .map_err(|e| RequestError::Unreadable(e.to_string()))?;

        if urls.is_empty() {
            return Err(RequestError::ParseFailure);
        }
        Ok(urls)
    }

    async fn report_failure(&self, conversation: ConversationId, err: &RequestError) {
        notify(self.messenger.as_ref(), conversation, &Notice::for_failure(err)).await;
    }
}

fn transition(conversation: ConversationId, state: &mut RequestState, next: RequestState) {
    log::debug!("Request for chat {}: {} → {}", conversation, state.label(), next.label());
    *state = next;
}

/// Spawns requests as independent tasks, at most `max_concurrent` at a time.
#[derive(Clone)]
pub struct RequestRunner {
    pipeline: Arc<Pipeline>,
    permits: Arc<Semaphore>,
}

impl RequestRunner {
    /// A `max_concurrent` of zero is treated as one.
    pub fn new(pipeline: Arc<Pipeline>, max_concurrent: usize) -> Self {
        Self {
            pipeline,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Runner sized by `MAX_CONCURRENT_DOWNLOADS`.
    pub fn from_env(pipeline: Arc<Pipeline>) -> Self {
        Self::new(pipeline, *config::queue::MAX_CONCURRENT_DOWNLOADS)
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn spawn_track(&self, request: TrackRequest) -> JoinHandle<RequestOutcome> {
        let pipeline = Arc::clone(&self.pipeline);
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            let conversation = request.conversation;
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return refuse(&pipeline, conversation, e).await,
            };
            pipeline.run_track(request).await
        })
    }

    pub fn spawn_playlist(&self, upload: PlaylistUpload) -> JoinHandle<RequestOutcome> {
        let pipeline = Arc::clone(&self.pipeline);
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            let conversation = upload.conversation;
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => return refuse(&pipeline, conversation, e).await,
            };
            pipeline.run_playlist(upload).await
        })
    }
}

async fn refuse(
    pipeline: &Pipeline,
    conversation: ConversationId,
    e: tokio::sync::AcquireError,
) -> RequestOutcome {
    log::error!("Failed to acquire semaphore permit for chat {}: {}", conversation, e);
    let err = RequestError::Unreachable(format!("request runner closed: {}", e));
    pipeline.report_failure(conversation, &err).await;
    RequestOutcome {
        state: RequestState::Failed(err),
        scratch_path: None,
    }
}
