use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum HiveStatsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed stats payload: {0}")]
    Payload(String),

    #[error("Failed to write snapshot {}: {source}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse snapshot {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl HiveStatsError {
    /// Network, HTTP status, or payload-shape failure while fetching.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Payload(_))
    }

    /// Filesystem failure while persisting a snapshot.
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store { .. })
    }

    /// A stored snapshot that could not be read back.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, HiveStatsError>;
