//! Common test utilities
//!
//! In-memory stand-ins for the pipeline's collaborators:
//! - `RecordingMessenger` records every outbound call
//! - `FakeTransport` serves canned headers and (optionally slow) chunks
//! - `FakeProbe` returns fixed metadata and remembers what it was asked to read

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tunecore::download::error::{FetchError, ParseError};
use tunecore::download::fetch::{RemoteResponse, Transport};
use tunecore::download::metadata::{MediaMetadata, MetadataProbe};
use tunecore::relay::{ConversationId, MessageRef, Messenger, StatusMessage};
use tunecore::{Pipeline, PipelineConfig, UrlScanParser};
use url::Url;

pub const CHAT: ConversationId = ConversationId(4242);

/// One outbound call seen by [`RecordingMessenger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Sent {
        text: String,
        html: bool,
        link_preview: bool,
    },
    Reply {
        reply_to: Option<i32>,
        text: String,
        message: i32,
    },
    Edit {
        message: i32,
        text: String,
    },
    Delete {
        message: i32,
    },
    Audio {
        title: Option<String>,
        performer: Option<String>,
        duration_secs: u32,
        /// Size of the file at upload time
        size: u64,
    },
}

/// Messenger that records calls instead of talking to a chat service.
#[derive(Default)]
pub struct RecordingMessenger {
    events: Mutex<Vec<Event>>,
    next_id: AtomicI32,
    fail_reply: bool,
    fail_edits: bool,
    fail_audio: bool,
    fail_listing: bool,
    max_text_chars: Option<usize>,
    file_url: Option<Url>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI32::new(100),
            file_url: Some(Url::parse("https://files.example/playlist.m3u").unwrap()),
            ..Default::default()
        }
    }

    /// Status replies fail, as for a user who blocked the bot.
    pub fn failing_reply(mut self) -> Self {
        self.fail_reply = true;
        self
    }

    /// Edits and deletes fail.
    pub fn failing_edits(mut self) -> Self {
        self.fail_edits = true;
        self
    }

    /// Uploads fail after being recorded.
    pub fn failing_audio(mut self) -> Self {
        self.fail_audio = true;
        self
    }

    /// Listings fail; plain notices still go through.
    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Standalone texts longer than `chars` are rejected, like the Bot API does past 4096.
    pub fn rejecting_texts_over(mut self, chars: usize) -> Self {
        self.max_text_chars = Some(chars);
        self
    }

    /// Uploaded files cannot be resolved.
    pub fn without_file_url(mut self) -> Self {
        self.file_url = None;
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Texts of standalone messages, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Sent { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Texts of edits, in order.
    pub fn edit_texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn check_length(&self, text: &str) -> anyhow::Result<()> {
        match self.max_text_chars {
            Some(max) if text.chars().count() > max => anyhow::bail!("Bad Request: message is too long"),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(&self, _conversation: ConversationId, text: &str, html: bool) -> anyhow::Result<()> {
        self.check_length(text)?;
        self.record(Event::Sent {
            text: text.to_string(),
            html,
            link_preview: true,
        });
        Ok(())
    }

    async fn send_listing(&self, _conversation: ConversationId, text: &str) -> anyhow::Result<()> {
        if self.fail_listing {
            anyhow::bail!("Forbidden: bot was kicked from the group chat");
        }
        self.check_length(text)?;
        self.record(Event::Sent {
            text: text.to_string(),
            html: true,
            link_preview: false,
        });
        Ok(())
    }

    async fn reply_to(
        &self,
        conversation: ConversationId,
        reply_to: Option<MessageRef>,
        text: &str,
    ) -> anyhow::Result<StatusMessage> {
        if self.fail_reply {
            anyhow::bail!("Forbidden: bot was blocked by the user");
        }
        let message = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.record(Event::Reply {
            reply_to: reply_to.map(|m| m.0),
            text: text.to_string(),
            message,
        });
        Ok(StatusMessage {
            conversation,
            message: MessageRef(message),
        })
    }

    async fn edit_message_text(&self, status: &StatusMessage, text: &str) -> anyhow::Result<()> {
        self.record(Event::Edit {
            message: status.message.0,
            text: text.to_string(),
        });
        if self.fail_edits {
            anyhow::bail!("Bad Request: message to edit not found");
        }
        Ok(())
    }

    async fn delete_message(&self, status: &StatusMessage) -> anyhow::Result<()> {
        self.record(Event::Delete {
            message: status.message.0,
        });
        if self.fail_edits {
            anyhow::bail!("Bad Request: message can't be deleted");
        }
        Ok(())
    }

    async fn send_audio(
        &self,
        _conversation: ConversationId,
        path: &Path,
        metadata: &MediaMetadata,
    ) -> anyhow::Result<()> {
        let size = std::fs::metadata(path)?.len();
        self.record(Event::Audio {
            title: metadata.title.clone(),
            performer: metadata.performer.clone(),
            duration_secs: metadata.duration_secs,
            size,
        });
        if self.fail_audio {
            anyhow::bail!("Bad Request: file is too big");
        }
        Ok(())
    }

    async fn file_download_url(&self, file_id: &str) -> anyhow::Result<Url> {
        self.file_url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Bad Request: invalid file_id {}", file_id))
    }
}

/// Decrements the live-stream counter when a served body is dropped.
struct StreamGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Transport serving the same canned response to every request.
pub struct FakeTransport {
    status: u16,
    content_length: Option<u64>,
    chunks: Vec<Vec<u8>>,
    delay: Duration,
    unreachable: Option<String>,
    calls: AtomicUsize,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl FakeTransport {
    /// 200 with a Content-Length equal to the total chunk size.
    pub fn serving(chunks: Vec<Vec<u8>>) -> Self {
        let total = chunks.iter().map(|c| c.len() as u64).sum();
        Self {
            status: 200,
            content_length: Some(total),
            chunks,
            delay: Duration::ZERO,
            unreachable: None,
            calls: AtomicUsize::new(0),
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn serving_text(text: &str) -> Self {
        Self::serving(vec![text.as_bytes().to_vec()])
    }

    pub fn unreachable(reason: &str) -> Self {
        let mut transport = Self::serving(Vec::new());
        transport.unreachable = Some(reason.to_string());
        transport
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_content_length(mut self, content_length: Option<u64>) -> Self {
        self.content_length = content_length;
        self
    }

    /// Sleeps this long before yielding each chunk.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of response bodies alive at the same time.
    pub fn peak_active(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    fn name(&self) -> &str {
        "fake"
    }

    async fn fetch(&self, _url: &Url) -> Result<RemoteResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.unreachable {
            return Err(FetchError::Unreachable(reason.clone()));
        }

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        // Lives as long as the body stream does
        let guard = StreamGuard {
            active: Arc::clone(&self.active),
        };

        let delay = self.delay;
        let body = stream::iter(self.chunks.clone())
            .then(move |chunk| {
                let _alive = &guard;
                async move {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    Ok::<_, std::io::Error>(Bytes::from(chunk))
                }
            })
            .boxed();

        Ok(RemoteResponse {
            status: self.status,
            content_length: self.content_length,
            body,
        })
    }
}

/// Probe returning fixed metadata; records the size of every file it reads.
#[derive(Default)]
pub struct FakeProbe {
    metadata: MediaMetadata,
    fail: bool,
    seen: Mutex<Vec<(PathBuf, u64)>>,
}

impl FakeProbe {
    pub fn returning(metadata: MediaMetadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn seen(&self) -> Vec<(PathBuf, u64)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataProbe for FakeProbe {
    async fn extract(&self, path: &Path) -> Result<MediaMetadata, ParseError> {
        if self.fail {
            return Err(ParseError::Unreadable(format!("{}: invalid data", path.display())));
        }
        let size = std::fs::metadata(path)
            .map_err(|e| ParseError::Unreadable(e.to_string()))?
            .len();
        self.seen.lock().unwrap().push((path.to_path_buf(), size));
        Ok(self.metadata.clone())
    }
}

pub fn sample_metadata() -> MediaMetadata {
    MediaMetadata {
        title: Some("Night Drive".to_string()),
        performer: Some("The Relays".to_string()),
        duration_secs: 187,
    }
}

/// Pipeline over the given fakes, writing into `scratch_dir` and polling fast.
pub fn pipeline(
    messenger: Arc<RecordingMessenger>,
    transport: Arc<FakeTransport>,
    probe: Arc<FakeProbe>,
    scratch_dir: &Path,
) -> Pipeline {
    Pipeline::new(
        messenger,
        transport,
        probe,
        Arc::new(UrlScanParser),
        test_config(scratch_dir),
    )
}

pub fn test_config(scratch_dir: &Path) -> PipelineConfig {
    PipelineConfig::default()
        .with_scratch_dir(scratch_dir)
        .with_poll_interval(Duration::from_millis(10))
}

/// Entries left in a scratch directory.
pub fn leftover_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}
