//! Error types for the fftfpga CLI.

use thiserror::Error;

/// CLI result type alias.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error type.
#[derive(Error, Debug)]
pub enum CliError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Engine error.
    #[error(transparent)]
    Engine(#[from] fftfpga::FftFpgaError),

    /// Invalid argument value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Round trip exceeded the tolerance.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Feature not available.
    #[error("Feature not available: {0}. Enable with --features {1}")]
    FeatureNotAvailable(String, String),
}
