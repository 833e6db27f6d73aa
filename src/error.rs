//! Error types for the duolog storage engine.

use std::fmt;
use std::io;

/// The result type used throughout duolog.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for duolog operations.
#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred.
    Io(io::Error),

    /// A write could not be committed through the pipeline.
    ///
    /// The failure is confined to the request that triggered it; the engine
    /// keeps serving other requests.
    WriteFailed(String),

    /// The engine is in a state that does not allow the operation
    /// (e.g. writing after shutdown).
    InvalidState(String),

    /// An invalid argument was provided.
    InvalidArgument(String),
}

impl Error {
    /// Creates a new write-failed error.
    pub fn write_failed(msg: impl Into<String>) -> Self {
        Error::WriteFailed(msg.into())
    }

    /// Creates a new invalid state error.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Error::InvalidState(msg.into())
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::WriteFailed(msg) => write!(f, "Write failed: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
