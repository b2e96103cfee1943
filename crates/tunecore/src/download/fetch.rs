//! Transport layer: streaming HTTP GET with header validation.
//!
//! Handles direct file URLs (e.g., `https://example.com/file.mp3`).
//! - `Accept-Encoding: identity` so Content-Length is the real body size
//! - Headers are validated before a single body byte is read
//! - `Transport` is the seam the pipeline uses; `HttpTransport` is the reqwest backend

use crate::core::config;
use crate::core::error::AppError;
use crate::download::error::FetchError;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_LENGTH};
use reqwest::Client;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Response body as a stream of chunks.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// A response whose headers arrived but whose body has not been read yet.
pub struct RemoteResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed Content-Length header, if present and numeric
    pub content_length: Option<u64>,
    /// Body chunks, in order
    pub body: ByteStream,
}

/// A response that passed header validation.
pub struct ValidatedResponse {
    /// Size the server promised, always below the ceiling
    pub declared_total: u64,
    pub body: ByteStream,
}

impl RemoteResponse {
    /// Applies the status / length / ceiling checks, consuming the response.
    pub fn validate(self, max_file_size: u64) -> Result<ValidatedResponse, FetchError> {
        let declared_total = check_headers(self.status, self.content_length, max_file_size)?;
        Ok(ValidatedResponse {
            declared_total,
            body: self.body,
        })
    }
}

/// Checks response headers in order: status, then declared length, then ceiling.
///
/// Returns the declared length on success.
///
/// # Example
///
/// ```
/// use tunecore::download::error::FetchError;
/// use tunecore::download::fetch::check_headers;
///
/// assert_eq!(check_headers(200, Some(10), 100), Ok(10));
/// assert_eq!(check_headers(404, Some(10), 100), Err(FetchError::BadStatus(404)));
/// assert_eq!(check_headers(200, None, 100), Err(FetchError::LengthUnknown));
/// ```
pub fn check_headers(status: u16, content_length: Option<u64>, max_file_size: u64) -> Result<u64, FetchError> {
    if status != 200 {
        return Err(FetchError::BadStatus(status));
    }
    let declared = content_length.ok_or(FetchError::LengthUnknown)?;
    if declared >= max_file_size {
        return Err(FetchError::TooLarge {
            declared,
            limit: max_file_size,
        });
    }
    Ok(declared)
}

/// Something that can open a streaming GET to a locator.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable name of this transport (for logs)
    fn name(&self) -> &str;

    /// Sends the request and returns once headers are in.
    ///
    /// Only transport-level failures are errors here; status and length
    /// are left for [`RemoteResponse::validate`].
    async fn fetch(&self, url: &Url) -> Result<RemoteResponse, FetchError>;
}

/// Transport backed by a shared reqwest client.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds the client with the fixed identity and timeouts from `config::network`.
    pub fn new() -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(config::network::USER_AGENT)
            .connect_timeout(config::network::connect_timeout())
            .read_timeout(config::network::read_timeout())
            .build()?;

        Ok(Self { client })
    }

    /// Wraps an existing client (tests, custom proxies).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, url: &Url) -> Result<RemoteResponse, FetchError> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(FetchError::Unreachable(format!("unsupported scheme: {}", scheme)));
        }

        // Bot API file URLs carry the token in their path, so only the host is logged
        let host = url.host_str().unwrap_or("<no host>");
        log::info!("📥 HTTP GET from {}", host);

        let response = self
            .client
            .get(url.as_str())
            .header(ACCEPT_ENCODING, "identity")
            .send()
            .await
            .map_err(|e| FetchError::Unreachable(e.to_string()))?;

        let status = response.status().as_u16();
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());

        log::info!("HTTP {} from {} (Content-Length: {:?})", status, host, content_length);

        let body = response.bytes_stream().map(|chunk| chunk.map_err(std::io::Error::other)).boxed();

        Ok(RemoteResponse {
            status,
            content_length,
            body,
        })
    }
}

/// Copies a whole resource into a new file at `destination`.
///
/// Only the status is checked; the caller owns `destination` and its cleanup.
/// Returns the number of bytes written.
pub async fn fetch_to_file(transport: &dyn Transport, url: &Url, destination: &Path) -> Result<u64, FetchError> {
    let response = transport.fetch(url).await?;
    if response.status != 200 {
        return Err(FetchError::BadStatus(response.status));
    }

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .await
        .map_err(|e| FetchError::Unreachable(format!("Failed to create {}: {}", destination.display(), e)))?;

    let mut written: u64 = 0;
    let mut body = response.body;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| FetchError::Unreachable(format!("Error reading chunk: {}", e)))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| FetchError::Unreachable(format!("Error writing to file: {}", e)))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| FetchError::Unreachable(format!("Failed to flush file: {}", e)))?;

    Ok(written)
}
