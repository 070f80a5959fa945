// Custom error type for proxy operations
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network unavailable: {0}")]
    Network(String),

    #[error("No auth token")]
    MissingAuthToken,

    #[error("Reply channel closed")]
    ChannelClosed,
}
