//! Error kinds reported at the orchestrator boundary. The drivers themselves
//! are total: given well-formed cursors they cannot fail.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("algorithm {0} requires a secondary capacity greater than zero")]
    SecondaryCapacity(String),

    #[error("invalid posting list: {0}")]
    InvalidPostings(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index codec error: {0}")]
    Codec(String),
}

pub type Result<T> = std::result::Result<T, Error>;
