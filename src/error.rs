//! Error types for the DDV decoder

use thiserror::Error;

/// Result type alias for DDV operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the DDV decoder
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream does not start with the `DDV\0` magic tag
    #[error("invalid DDV magic tag")]
    InvalidMagic,

    /// The container declares a version other than 1
    #[error("unsupported DDV version {0}")]
    UnsupportedVersion(u32),

    /// Fewer bytes were available than a declared region requires
    #[error("truncated stream: {0}")]
    Truncated(String),

    /// The frame payload is internally inconsistent
    #[error("corrupt frame: {0}")]
    CorruptFrame(String),

    /// A caller-provided buffer does not fit the declared dimensions
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The decoder was used after a fatal error
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Create a truncated-stream error
    pub fn truncated<S: Into<String>>(msg: S) -> Self {
        Error::Truncated(msg.into())
    }

    /// Create a corrupt-frame error
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        Error::CorruptFrame(msg.into())
    }

    /// Create an invalid-argument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Create an invalid-state error
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Error::InvalidState(msg.into())
    }
}
