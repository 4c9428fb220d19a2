//! Error types for vidflow.

use thiserror::Error;

/// Result type alias using vidflow's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vidflow operations.
///
/// Per-source failures (`SourceInput`, `Processing`, `Sink`) are caught at
/// the supervisor boundary and recorded in that source's outcome; they never
/// abort sibling sources or the coordinator. `Configuration` is the only
/// class that is fatal at pipeline construction.
#[derive(Error, Debug)]
pub enum Error {
    /// The frame source could not produce the next frame.
    #[error("source input error: {0}")]
    SourceInput(String),

    /// The per-frame transformation failed.
    #[error("processing error: {0}")]
    Processing(String),

    /// The sink rejected a batch.
    #[error("sink error: {0}")]
    Sink(String),

    /// Invalid pipeline configuration (zero batch size, zero concurrency).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The bounded executor can no longer grant slots.
    #[error("executor unavailable: {0}")]
    Executor(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Configuration("batch size must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: batch size must be at least 1"
        );

        let err = Error::Sink("write refused".to_string());
        assert_eq!(err.to_string(), "sink error: write refused");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
