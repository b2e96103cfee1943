use thiserror::Error;

/// Header validation and transport failures of the fetch stage.
///
/// Variants are checked in declaration order: a transport failure wins over a
/// bad status, a bad status over a missing length, and so on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network or transport failure before any usable response arrived
    #[error("remote resource unreachable: {0}")]
    Unreachable(String),
    /// Response status other than 200
    #[error("remote resource answered HTTP {0}")]
    BadStatus(u16),
    /// No (parsable) Content-Length header
    #[error("remote resource did not declare its length")]
    LengthUnknown,
    /// Declared length at or above the size ceiling
    #[error("declared size {declared} bytes is not below the {limit} byte ceiling")]
    TooLarge { declared: u64, limit: u64 },
}

/// Failure to read a completed download back from disk.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("downloaded file is unreadable: {0}")]
    Unreadable(String),
}

/// Failure of the final upload to the conversation.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("messenger call failed: {0}")]
    Messenger(#[from] anyhow::Error),
}

/// Terminal reason of a failed request.
///
/// Every variant maps to exactly one user-facing notice
/// (see `relay::notice::Notice::for_failure`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Transport failure before or during the transfer, or a truncated body
    #[error("unreachable: {0}")]
    Unreachable(String),
    #[error("bad status code {0}")]
    BadStatus(u16),
    #[error("length unknown")]
    LengthUnknown,
    #[error("too large: {declared} bytes (limit {limit})")]
    TooLarge { declared: u64, limit: u64 },
    #[error("unreadable: {0}")]
    Unreadable(String),
    /// Playlist yielded zero locators
    #[error("playlist has no locators")]
    ParseFailure,
    /// The upload (or another required messenger call) failed
    #[error("delivery failed: {0}")]
    DeliveryFailure(String),
}

impl RequestError {
    /// Returns subcategory for logs
    pub fn subcategory(&self) -> &'static str {
        match self {
            RequestError::Unreachable(_) => "unreachable",
            RequestError::BadStatus(_) => "bad_status",
            RequestError::LengthUnknown => "length_unknown",
            RequestError::TooLarge { .. } => "too_large",
            RequestError::Unreadable(_) => "unreadable",
            RequestError::ParseFailure => "parse_failure",
            RequestError::DeliveryFailure(_) => "delivery_failure",
        }
    }
}

impl From<FetchError> for RequestError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Unreachable(msg) => RequestError::Unreachable(msg),
            FetchError::BadStatus(code) => RequestError::BadStatus(code),
            FetchError::LengthUnknown => RequestError::LengthUnknown,
            FetchError::TooLarge { declared, limit } => RequestError::TooLarge { declared, limit },
        }
    }
}

impl From<ParseError> for RequestError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Unreadable(msg) => RequestError::Unreadable(msg),
        }
    }
}

impl From<DeliveryError> for RequestError {
    fn from(err: DeliveryError) -> Self {
        RequestError::DeliveryFailure(err.to_string())
    }
}
