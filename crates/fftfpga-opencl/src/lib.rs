//! OpenCL Backend for fftfpga
//!
//! Drives a real accelerator board through the vendor's OpenCL runtime
//! using opencl3. Configuration images are precompiled `.aocx` binaries
//! loaded with `clCreateProgramWithBinary`.
//!
//! # Requirements
//!
//! - An installed OpenCL ICD for the board (e.g. the Intel FPGA runtime)
//! - Images synthesized for 16³, 32³ and 64³ in the expected layout
//!
//! # Example
//!
//! ```ignore
//! use fftfpga_core::{EngineConfig, FftEngine};
//! use fftfpga_opencl::OpenClDriver;
//!
//! let driver = OpenClDriver::new()?;
//! let mut engine: FftEngine<_, num_complex::Complex32> =
//!     FftEngine::new(driver, EngineConfig::from_env());
//! engine.initialize()?;
//! ```

#![warn(missing_docs)]

#[cfg(feature = "opencl")]
mod driver;

#[cfg(feature = "opencl")]
pub use driver::OpenClDriver;

/// Whether this build can talk to an OpenCL runtime with at least one
/// platform installed.
pub fn is_opencl_available() -> bool {
    #[cfg(feature = "opencl")]
    {
        opencl3::platform::get_platforms()
            .map(|p| !p.is_empty())
            .unwrap_or(false)
    }
    #[cfg(not(feature = "opencl"))]
    {
        false
    }
}

// Placeholder implementation when OpenCL is not available
#[cfg(not(feature = "opencl"))]
mod stub {
    use fftfpga_core::{FftFpgaError, Result};

    /// Stub OpenCL driver when the `opencl` feature is disabled.
    #[derive(Debug)]
    pub struct OpenClDriver;

    impl OpenClDriver {
        /// Create fails when OpenCL is not available.
        pub fn new() -> Result<Self> {
            Err(FftFpgaError::BackendUnavailable(
                "OpenCL feature not enabled".to_string(),
            ))
        }
    }
}

#[cfg(not(feature = "opencl"))]
pub use stub::OpenClDriver;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(feature = "opencl"))]
    fn test_stub_reports_unavailable() {
        assert!(!is_opencl_available());
        let err = OpenClDriver::new().unwrap_err();
        assert!(err.is_initialization_error());
    }
}
