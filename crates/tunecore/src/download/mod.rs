//! Download management: transport, streaming, progress, tags, orchestration

pub mod downloader;
pub mod error;
pub mod fetch;
pub mod metadata;
pub mod pipeline;
pub mod playlist;
pub mod progress;

// Re-exports for convenience
pub use downloader::{DownloadHandle, Transfer, TransferState};
pub use error::{DeliveryError, FetchError, ParseError, RequestError};
pub use fetch::{fetch_to_file, HttpTransport, Transport};
pub use metadata::{FfprobeProbe, MediaMetadata, MetadataProbe};
