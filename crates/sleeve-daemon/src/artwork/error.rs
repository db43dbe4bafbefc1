use thiserror::Error;

/// Every way an artwork lookup can fail. None of these reach the widget; the
/// pipeline logs them and keeps the fallback artwork.
#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("no search results")]
    ZeroResults,
    #[error("filesystem failure: {0}")]
    Filesystem(#[from] std::io::Error),
}
