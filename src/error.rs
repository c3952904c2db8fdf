//! Error types for the IPD measurement library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input parameters provided (malformed detections, non-finite values)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Division by zero in a geometric or scale computation
    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    /// Operation not permitted in the current measurement state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An external collaborator (detector, frame source) failed
    #[error("Collaborator fault: {0}")]
    CollaboratorFault(String),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
