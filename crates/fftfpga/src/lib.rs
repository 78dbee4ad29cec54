//! # fftfpga
//!
//! Offloads 3-D complex FFTs of size 16³, 32³ or 64³ to an FPGA board
//! carrying a five-stage streaming pipeline. The host side selects the
//! precompiled configuration image for the requested size, reconfigures the
//! board when the size changes, and moves data through the pipeline.
//!
//! ## Quick Start
//!
//! ```ignore
//! use fftfpga::prelude::*;
//!
//! let mut engine = fftfpga::emulated(EngineConfig::from_env());
//! engine.initialize()?;
//!
//! let shape = ProblemShape::cubic(32);
//! let mut data = vec![Sample::default(); shape.volume()];
//! data[0] = Sample::new(1.0, 0.0);
//!
//! if engine.supports_shape(32, 32, 32) {
//!     engine.run_transform(Direction::Forward, shape, &mut data)?;
//! }
//! engine.finalize();
//! ```
//!
//! ## Backends
//!
//! - **Emulator** - software model of the board (always available)
//! - **OpenCL** - real hardware through the vendor runtime (requires the
//!   `opencl` feature)
//!
//! ## Precision
//!
//! [`Sample`] is `Complex<f32>` by default and `Complex<f64>` with the
//! `double-precision` feature. The engine itself is generic over both.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(hidden_glob_reexports)]

// Re-export core types
pub use fftfpga_core::*;

pub use fftfpga_emu as emu;
pub use fftfpga_emu::EmulatorDriver;

pub use fftfpga_opencl::{is_opencl_available, OpenClDriver};

pub use num_complex;

/// Sample type selected by the precision feature.
#[cfg(not(feature = "double-precision"))]
pub type Sample = num_complex::Complex32;

/// Sample type selected by the precision feature.
#[cfg(feature = "double-precision")]
pub type Sample = num_complex::Complex64;

/// Component type of [`Sample`].
#[cfg(not(feature = "double-precision"))]
pub type Real = f32;

/// Component type of [`Sample`].
#[cfg(feature = "double-precision")]
pub type Real = f64;

/// Engine running on the software emulator.
pub type EmulatedEngine<S = Sample> = FftEngine<EmulatorDriver, S>;

/// Engine running on a board through OpenCL.
#[cfg(feature = "opencl")]
pub type OpenClEngine<S = Sample> = FftEngine<OpenClDriver, S>;

/// Engine over a default emulator.
pub fn emulated(config: EngineConfig) -> EmulatedEngine {
    FftEngine::new(EmulatorDriver::new(), config)
}

/// Engine over the OpenCL runtime.
#[cfg(feature = "opencl")]
pub fn opencl(config: EngineConfig) -> Result<OpenClEngine> {
    Ok(FftEngine::new(OpenClDriver::new()?, config))
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{emulated, EmulatedEngine, EmulatorDriver, Real, Sample};
    pub use fftfpga_core::prelude::*;

    #[cfg(feature = "opencl")]
    pub use crate::{opencl, OpenClEngine};
}
