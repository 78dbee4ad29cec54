//! # fftfpga Emulator
//!
//! Software model of an FPGA board carrying the five-stage 3-D FFT
//! pipeline. It implements the [`Driver`](fftfpga_core::Driver) trait, so an
//! engine runs against it exactly as it would against real hardware:
//!
//! - platforms, devices and contexts are enumerated and created as usual
//! - configuration images are small text manifests (see [`image`])
//! - every kernel task runs on its own thread, and stages exchange samples
//!   over crossbeam pipes the way on-chip channels connect the real units
//! - live handles are counted, so tests can check that nothing leaks
//! - failures can be injected into any primitive through a [`FaultPlan`]
//!
//! ## Example
//!
//! ```ignore
//! use fftfpga_core::{EngineConfig, FftEngine, Precision};
//! use fftfpga_emu::{install_images, EmulatorDriver};
//!
//! install_images(&dir, Precision::Single, &[16, 32, 64])?;
//! let config = EngineConfig::builder().with_image_dir(&dir).build();
//! let mut engine: FftEngine<_, num_complex::Complex32> =
//!     FftEngine::new(EmulatorDriver::new(), config);
//! engine.initialize()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
mod driver;
mod fabric;
pub mod image;
mod kernels;
mod stats;

pub use config::{EmulatorConfig, FaultPlan, EMULATOR_DEVICE, EMULATOR_PLATFORM};
pub use driver::{EmuBuffer, EmuContext, EmuDevice, EmuKernel, EmuPlatform, EmuProgram, EmuQueue, EmulatorDriver};
pub use image::{install_images, write_image, ImageManifest};
pub use stats::EmulatorStats;
