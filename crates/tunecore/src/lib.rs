//! tunecore - download-and-relay pipeline behind the tunerelay bot
//!
//! This library holds everything that does not need a Telegram client:
//! fetching remote media, streaming it to scratch storage with live progress,
//! probing tags, and relaying the result through a [`relay::Messenger`].
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, and small helpers
//! - `download`: transport, streaming downloader, progress, metadata, request orchestration
//! - `relay`: messaging seam, user-facing text catalog, delivery and scratch-file cleanup

pub mod core;
pub mod download;
pub mod relay;

// Re-export commonly used types for convenience
pub use core::{config, AppError};
pub use download::pipeline::{Pipeline, PipelineConfig, RequestOutcome, RequestRunner, RequestState, TrackRequest};
pub use download::playlist::{PlaylistParser, PlaylistUpload, UrlScanParser};
pub use relay::{ConversationId, MessageRef, Messenger, StatusMessage};
