//! Error types for the FFT engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::{ChannelId, StageKind};
use crate::types::{Precision, ProblemShape, TransferDirection};

/// Result type alias using FftFpgaError.
pub type Result<T> = std::result::Result<T, FftFpgaError>;

/// Comprehensive error type for engine operations.
#[derive(Error, Debug)]
pub enum FftFpgaError {
    // ===== Session Errors =====
    /// Platform, device or context setup failed.
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// An operation needed a live session.
    #[error("Engine not initialized: call initialize() before {0}")]
    NotInitialized(&'static str),

    /// Backend not compiled in or not present on this host.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    // ===== Configuration Errors =====
    /// No configuration image exists for the shape.
    #[error("Unsupported shape {0}: images exist only for 16³, 32³ and 64³")]
    UnsupportedShape(ProblemShape),

    /// The expected image is absent.
    #[error("Configuration image for {shape} ({precision} precision) not found at {}", .path.display())]
    ConfigurationNotFound {
        /// Requested shape.
        shape: ProblemShape,
        /// Engine precision.
        precision: Precision,
        /// Path that was checked.
        path: PathBuf,
    },

    /// The image could not be turned into kernel units.
    #[error("Failed to build configuration image {}: {reason}", .path.display())]
    Build {
        /// Image path.
        path: PathBuf,
        /// Driver or IO message.
        reason: String,
    },

    /// Device memory allocation failed.
    #[error("Device allocation of {size} bytes failed: {reason}")]
    Allocation {
        /// Requested bytes.
        size: usize,
        /// Driver message.
        reason: String,
    },

    /// Host staging memory allocation failed.
    #[error("Host staging allocation of {size} bytes failed")]
    HostAllocation {
        /// Requested bytes.
        size: usize,
    },

    // ===== Execution Errors =====
    /// An execution channel could not be created or was used after close.
    #[error("Channel {channel} unavailable: {reason}")]
    ChannelSetup {
        /// Channel concerned.
        channel: ChannelId,
        /// Driver message.
        reason: String,
    },

    /// A pipeline stage failed to bind, enqueue or drain.
    #[error("Pipeline stage {stage} failed: {reason}")]
    Execution {
        /// First failing stage.
        stage: StageKind,
        /// Driver message.
        reason: String,
    },

    /// Host/device copy failed.
    #[error("{direction} transfer failed: {reason}")]
    Transfer {
        /// Copy direction.
        direction: TransferDirection,
        /// Driver message.
        reason: String,
    },

    // ===== Argument Errors =====
    /// Direction integer outside {+1, -1}.
    #[error("Invalid transform direction {0}: expected 1 (forward) or -1 (backward)")]
    InvalidDirection(i32),

    /// Caller buffer does not match the shape.
    #[error("Buffer holds {actual} samples but shape {shape} needs {expected}")]
    BufferSizeMismatch {
        /// Requested shape.
        shape: ProblemShape,
        /// Samples required.
        expected: usize,
        /// Samples provided.
        actual: usize,
    },

    // ===== Generic =====
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FftFpgaError {
    /// Whether this error means the engine has no usable session.
    pub fn is_initialization_error(&self) -> bool {
        matches!(
            self,
            Self::Initialization(_) | Self::NotInitialized(_) | Self::BackendUnavailable(_)
        )
    }

    /// Whether the error came out of a reconfiguration attempt.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedShape(_)
                | Self::ConfigurationNotFound { .. }
                | Self::Build { .. }
                | Self::Allocation { .. }
        )
    }

    /// Pipeline stage that failed, if any.
    pub fn failed_stage(&self) -> Option<StageKind> {
        match self {
            Self::Execution { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FftFpgaError::UnsupportedShape(ProblemShape::cubic(8));
        assert!(err.to_string().contains("8x8x8"));

        let err = FftFpgaError::ConfigurationNotFound {
            shape: ProblemShape::cubic(32),
            precision: Precision::Double,
            path: PathBuf::from("/opt/images/emu32/fft3d.aocx"),
        };
        let msg = err.to_string();
        assert!(msg.contains("32x32x32"));
        assert!(msg.contains("double"));
        assert!(msg.contains("/opt/images/emu32/fft3d.aocx"));

        let err = FftFpgaError::Execution {
            stage: StageKind::FftB,
            reason: "queue lost".to_string(),
        };
        assert_eq!(err.to_string(), "Pipeline stage fft-B failed: queue lost");
    }

    #[test]
    fn test_error_classification() {
        assert!(FftFpgaError::NotInitialized("run_transform").is_initialization_error());
        assert!(FftFpgaError::Initialization("no platform".into()).is_initialization_error());
        assert!(!FftFpgaError::InvalidDirection(3).is_initialization_error());

        let build = FftFpgaError::Build {
            path: PathBuf::from("x.aocx"),
            reason: "bad binary".into(),
        };
        assert!(build.is_configuration_error());
        assert_eq!(build.failed_stage(), None);

        let exec = FftFpgaError::Execution {
            stage: StageKind::Fetch,
            reason: String::new(),
        };
        assert_eq!(exec.failed_stage(), Some(StageKind::Fetch));
    }
}
