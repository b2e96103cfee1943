use thiserror::Error;

/// Centralized error type for the library surface
///
/// Per-request failures have their own taxonomy (`download::error::RequestError`)
/// and are turned into user messages inside the pipeline. `AppError` covers the
/// things that fail outside a single request: startup, configuration, logging,
/// and the standalone helpers.
///
/// # Example
///
/// ```no_run
/// use tunecore::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anyhow errors (for general error handling)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
