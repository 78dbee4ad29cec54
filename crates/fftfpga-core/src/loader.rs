//! Configuration image loading.
//!
//! Loading turns an image file into a built program, the five pipeline
//! kernel units and the two device working buffers. Every piece is an
//! owned driver handle, so a failure part-way drops whatever was already
//! created and leaves nothing behind.

use std::path::{Path, PathBuf};

use crate::driver::Driver;
use crate::error::{FftFpgaError, Result};
use crate::pipeline::{StageDescriptor, StageKind, PIPELINE};
use crate::session::Session;
use crate::types::{Precision, ProblemShape};

/// A kernel unit instantiated for one pipeline stage.
pub struct KernelUnit<D: Driver> {
    /// Stage served by this unit.
    pub stage: StageKind,
    /// Driver kernel handle.
    pub kernel: D::Kernel,
}

impl<D: Driver> KernelUnit<D> {
    /// Static description of the stage.
    pub fn descriptor(&self) -> &'static StageDescriptor {
        self.stage.descriptor()
    }
}

/// Device-side state of one loaded configuration.
///
/// Field order is the release order: kernel units, then the program, then
/// the input and output buffers.
pub struct LoadedConfiguration<D: Driver> {
    pub(crate) kernels: Vec<KernelUnit<D>>,
    pub(crate) program: D::Program,
    pub(crate) input: D::Buffer,
    pub(crate) output: D::Buffer,
    shape: ProblemShape,
    precision: Precision,
    image_path: PathBuf,
}

impl<D: Driver> LoadedConfiguration<D> {
    /// Shape this configuration was built for.
    pub fn shape(&self) -> ProblemShape {
        self.shape
    }

    /// Sample precision of the device buffers.
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Image the program was built from.
    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    /// Size of each device buffer in bytes.
    pub fn buffer_bytes(&self) -> usize {
        self.shape.byte_len(self.precision)
    }

    /// Kernel units in pipeline order.
    pub fn kernels(&self) -> &[KernelUnit<D>] {
        &self.kernels
    }

    /// The built program.
    pub fn program(&self) -> &D::Program {
        &self.program
    }

    /// Release everything in dependency order.
    pub fn release(self) {
        let Self {
            kernels,
            program,
            input,
            output,
            shape,
            image_path,
            ..
        } = self;

        for unit in kernels {
            tracing::trace!(stage = %unit.stage, "Releasing kernel unit");
            drop(unit);
        }
        drop(program);
        drop(input);
        drop(output);

        tracing::debug!(
            shape = %shape,
            image = %image_path.display(),
            "Released configuration"
        );
    }
}

impl<D: Driver> std::fmt::Debug for LoadedConfiguration<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedConfiguration")
            .field("shape", &self.shape)
            .field("precision", &self.precision)
            .field("image_path", &self.image_path)
            .field("kernels", &self.kernels.len())
            .finish()
    }
}

/// Builds configurations from image files.
pub struct PipelineLoader;

impl PipelineLoader {
    /// Load the image at `path` for `shape`.
    ///
    /// Reads the image, builds it for the session's device, instantiates the
    /// five pipeline units and allocates an input and an output buffer of
    /// `shape.volume()` samples each.
    pub fn load<D: Driver>(
        driver: &D,
        session: &Session<D>,
        shape: ProblemShape,
        precision: Precision,
        path: &Path,
    ) -> Result<LoadedConfiguration<D>> {
        let build_error = |reason: String| FftFpgaError::Build {
            path: path.to_path_buf(),
            reason,
        };

        let binary = std::fs::read(path).map_err(|e| build_error(e.to_string()))?;
        tracing::debug!(
            image = %path.display(),
            bytes = binary.len(),
            "Read configuration image"
        );

        let mut program = driver
            .create_program(session.context(), session.device(), &binary)
            .map_err(|e| build_error(e.to_string()))?;
        driver
            .build_program(&mut program, session.device())
            .map_err(|e| build_error(e.to_string()))?;

        let kernels = PIPELINE
            .iter()
            .map(|desc| {
                driver
                    .create_kernel(&program, desc.kernel)
                    .map(|kernel| KernelUnit {
                        stage: desc.stage,
                        kernel,
                    })
                    .map_err(|e| build_error(format!("kernel '{}': {}", desc.kernel, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        let size = shape.byte_len(precision);
        let allocate = || {
            driver
                .create_buffer(session.context(), size)
                .map_err(|e| FftFpgaError::Allocation {
                    size,
                    reason: e.to_string(),
                })
        };
        let input = allocate()?;
        let output = allocate()?;

        tracing::info!(
            shape = %shape,
            precision = %precision,
            buffer_bytes = size,
            kernels = kernels.len(),
            "Configuration loaded"
        );

        Ok(LoadedConfiguration {
            kernels,
            program,
            input,
            output,
            shape,
            precision,
            image_path: path.to_path_buf(),
        })
    }
}
