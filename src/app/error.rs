use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkimmerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Schema migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out fetching {0}")]
    Timeout(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Feed not found: {0}")]
    FeedNotFound(i64),

    #[error("Item not found: {0}")]
    ItemNotFound(i64),

    #[error("Feed already exists: {0}")]
    FeedExists(String),

    #[error("Feed {0} is a directory and has no source to fetch")]
    NotALeaf(i64),

    #[error("Feed {0} is not a directory")]
    NotADirectory(i64),

    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(String),

    #[error("Initialization failed: {0}")]
    Init(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl SkimmerError {
    /// True for failures that come from obtaining or parsing a remote document.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            SkimmerError::Http(_)
                | SkimmerError::HttpStatus { .. }
                | SkimmerError::FeedParse(_)
                | SkimmerError::Timeout(_)
                | SkimmerError::Cancelled
        )
    }
}

pub type Result<T> = std::result::Result<T, SkimmerError>;
