use thiserror::Error;

#[derive(Error, Debug)]
pub enum FreshetError {
    #[error("invalid URL {0}: only http and https are supported")]
    InvalidUrl(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("unrecognized feed format: root element <{0}> is neither RSS nor Atom")]
    UnrecognizedFormat(String),

    #[error("feed parse error: {0}")]
    FeedParse(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("source not found: {0}")]
    SourceNotFound(String),

    #[error("article not found: {0}")]
    ArticleNotFound(String),
}

impl FreshetError {
    /// Classify a reqwest failure into the fetch taxonomy. 403 gets an
    /// actionable hint because many feed hosts block non-browser clients.
    pub fn from_http(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return FreshetError::Timeout;
        }
        if let Some(status) = err.status() {
            return Self::from_status(status.as_u16());
        }
        FreshetError::Network(err.to_string())
    }

    pub fn from_status(status: u16) -> Self {
        let message = if status == 403 {
            "HTTP 403: the server refused the request; it likely blocks \
             automated clients rather than this URL being wrong"
                .to_string()
        } else {
            format!("HTTP error {status}")
        };
        FreshetError::Http { status, message }
    }
}

pub type Result<T> = std::result::Result<T, FreshetError>;
