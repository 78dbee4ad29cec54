//! # fftfpga Core
//!
//! Host-side control plane for a 3-D complex FFT computed by a five-stage
//! kernel pipeline on a reconfigurable accelerator.
//!
//! The engine selects the precompiled configuration image for a problem
//! size, builds it into kernel units, allocates the device working buffers,
//! and drives one transform through the pipeline:
//!
//! ```text
//!  host buffer ──► staging ──► [transfer] ──► input buffer
//!                                                  │
//!      ┌───────────────────────────────────────────┘
//!      ▼
//!   fetch ──► fft-A ──► transpose-A ──► fft-B ──► transpose-B
//!   (ch 1)    (ch 2)     (ch 3)         (ch 4)     (ch 5)
//!                                                  │
//!  host buffer ◄── staging ◄── [read on ch 5] ◄── output buffer
//! ```
//!
//! The accelerator runtime itself is consumed through the [`Driver`] trait;
//! backends live in their own crates.
//!
//! ## Example
//!
//! ```ignore
//! use fftfpga_core::prelude::*;
//! use num_complex::Complex32;
//!
//! let mut engine: FftEngine<_, Complex32> = FftEngine::new(driver, EngineConfig::from_env());
//! engine.initialize()?;
//!
//! let shape = ProblemShape::cubic(32);
//! let mut data = vec![Complex32::default(); shape.volume()];
//! if engine.supports_shape(32, 32, 32) {
//!     engine.run_transform(Direction::Forward, shape, &mut data)?;
//! }
//! engine.finalize();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod loader;
#[cfg(test)]
mod mock;
pub mod pipeline;
pub mod queue_set;
pub mod resolver;
pub mod session;
pub mod staging;
pub mod types;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{EngineConfig, EngineConfigBuilder, ImageBase};
    pub use crate::driver::{Driver, DriverError, DriverResult, KernelArg};
    pub use crate::engine::{EngineStats, FftEngine};
    pub use crate::error::{FftFpgaError, Result};
    pub use crate::executor::{PipelineExecutor, TransformReport};
    pub use crate::lifecycle::LifecycleManager;
    pub use crate::loader::{LoadedConfiguration, PipelineLoader};
    pub use crate::pipeline::{ChannelId, StageBinding, StageDescriptor, StageKind, PIPELINE};
    pub use crate::queue_set::QueueSet;
    pub use crate::resolver::{ConfigurationResolver, ImageLocator, TemplateLocator};
    pub use crate::session::Session;
    pub use crate::staging::StagingBuffer;
    pub use crate::types::{
        ComplexSample, Direction, Precision, ProblemShape, TransferDirection, SUPPORTED_SIZES,
    };
}

// Re-exports for convenience
pub use config::{EngineConfig, EngineConfigBuilder, ImageBase};
pub use driver::{Driver, DriverError, DriverResult, KernelArg};
pub use engine::{EngineStats, FftEngine};
pub use error::{FftFpgaError, Result};
pub use executor::TransformReport;
pub use pipeline::{ChannelId, StageKind, PIPELINE};
pub use resolver::{ImageLocator, TemplateLocator};
pub use session::Session;
pub use types::{
    ComplexSample, Direction, Precision, ProblemShape, TransferDirection, SUPPORTED_SIZES,
};
