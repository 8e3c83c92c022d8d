use thiserror::Error;

/// Everything that can go wrong while resolving or persisting link cards.
///
/// None of these escape the transformer: fetch errors turn into unresolved
/// metadata records and cache errors are logged and swallowed. They are
/// surfaced as values so the individual steps stay testable.
#[derive(Error, Debug)]
pub enum LinkCardError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Unexpected status: {0}")]
    Status(reqwest::StatusCode),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Map reqwest errors to LinkCardError, pulling timeouts out into their own
/// variant so callers can log them distinctly from connection failures.
impl From<reqwest::Error> for LinkCardError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return LinkCardError::Timeout;
        }
        if let Some(status) = e.status() {
            return LinkCardError::Status(status);
        }
        LinkCardError::Http(e)
    }
}

pub type LinkCardResult<T> = Result<T, LinkCardError>;
