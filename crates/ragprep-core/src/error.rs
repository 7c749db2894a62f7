use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load corpus from {location}/{key}: {reason}")]
    Load {
        location: String,
        key: String,
        reason: String,
    },

    #[error("Failed to store {location}/{key}: {reason}")]
    Store {
        location: String,
        key: String,
        reason: String,
    },

    #[error("Embedding provider error: {0}")]
    Provider(String),

    #[error("Embedding provider still throttling after {attempts} attempts")]
    ExhaustedRetries { attempts: u32 },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Access denied ({status}). Check that the collection's data access policy includes your principal. {message}")]
    Permission { status: u16, message: String },

    #[error("Collection did not become responsive after {attempts} probes")]
    Timeout { attempts: u32 },

    #[error("Search API error: {0}")]
    SearchApi(String),
}

pub type Result<T> = std::result::Result<T, Error>;
