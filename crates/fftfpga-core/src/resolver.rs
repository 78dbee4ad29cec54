//! Configuration image resolution and change detection.
//!
//! Images are laid out per precision and size relative to a base directory:
//!
//! ```text
//! <base>/../../fpgabitstream/fft3d/synthesis/syn{16,32,64}/fft3d.aocx      (single)
//! <base>/../../fpgabitstream/fft3d/emulation_dp/emu{16,32,64}/fft3d.aocx   (double)
//! ```
//!
//! The base is the running executable's directory unless configured
//! otherwise. Rebuilding the accelerator configuration is expensive, so the
//! resolver also remembers which shape is currently loaded and reports
//! whether a request needs a reload.

use std::path::{Path, PathBuf};

use crate::config::ImageBase;
use crate::error::{FftFpgaError, Result};
use crate::types::{Precision, ProblemShape};

/// Path template for single-precision images; `{N}` is the edge length.
pub const SINGLE_TEMPLATE: &str = "../../fpgabitstream/fft3d/synthesis/syn{N}/fft3d";

/// Path template for double-precision images; `{N}` is the edge length.
pub const DOUBLE_TEMPLATE: &str = "../../fpgabitstream/fft3d/emulation_dp/emu{N}/fft3d";

/// File extension of configuration images.
pub const IMAGE_EXTENSION: &str = "aocx";

/// Maps a shape and precision to an existing configuration image.
pub trait ImageLocator: Send + Sync {
    /// Return the path of the image, or `ConfigurationNotFound`.
    fn locate(&self, shape: ProblemShape, precision: Precision) -> Result<PathBuf>;
}

impl<F> ImageLocator for F
where
    F: Fn(ProblemShape, Precision) -> Result<PathBuf> + Send + Sync,
{
    fn locate(&self, shape: ProblemShape, precision: Precision) -> Result<PathBuf> {
        self(shape, precision)
    }
}

/// Locator using the fixed per-precision templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLocator {
    base: ImageBase,
}

impl TemplateLocator {
    /// Create a locator resolving against `base`.
    pub fn new(base: ImageBase) -> Self {
        Self { base }
    }

    /// Locator rooted at a fixed directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(ImageBase::Directory(dir.into()))
    }

    /// Image path relative to the base directory, `None` for unsupported shapes.
    pub fn relative_path(shape: ProblemShape, precision: Precision) -> Option<PathBuf> {
        if !shape.is_supported() {
            return None;
        }
        let template = match precision {
            Precision::Single => SINGLE_TEMPLATE,
            Precision::Double => DOUBLE_TEMPLATE,
        };
        let stem = template.replace("{N}", &shape.nx.to_string());
        Some(PathBuf::from(stem).with_extension(IMAGE_EXTENSION))
    }

    /// Full path where the image is expected, without checking it exists.
    pub fn candidate(&self, shape: ProblemShape, precision: Precision) -> Result<PathBuf> {
        let relative = Self::relative_path(shape, precision)
            .ok_or(FftFpgaError::UnsupportedShape(shape))?;

        let base = match &self.base {
            ImageBase::Directory(dir) => dir.clone(),
            ImageBase::ExecutableDir => executable_dir().map_err(|e| {
                tracing::warn!(error = %e, "Cannot determine executable directory");
                FftFpgaError::ConfigurationNotFound {
                    shape,
                    precision,
                    path: relative.clone(),
                }
            })?,
        };

        Ok(base.join(relative))
    }

    /// The configured base.
    pub fn base(&self) -> &ImageBase {
        &self.base
    }
}

impl Default for TemplateLocator {
    fn default() -> Self {
        Self::new(ImageBase::ExecutableDir)
    }
}

impl ImageLocator for TemplateLocator {
    fn locate(&self, shape: ProblemShape, precision: Precision) -> Result<PathBuf> {
        let path = self.candidate(shape, precision)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(FftFpgaError::ConfigurationNotFound {
                shape,
                precision,
                path,
            })
        }
    }
}

/// Directory containing the running executable.
pub fn executable_dir() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("executable path {} has no parent", exe.display()),
        )
    })
}

/// Decides shape support and whether the loaded configuration is stale.
pub struct ConfigurationResolver {
    /// Image lookup.
    locator: Box<dyn ImageLocator>,
    /// Precision the engine was built for.
    precision: Precision,
    /// Shape of the configuration currently loaded.
    committed: Option<ProblemShape>,
    /// Outcome of the last supported-shape query.
    changed: bool,
}

impl ConfigurationResolver {
    /// Create a resolver with nothing loaded.
    pub fn new(locator: Box<dyn ImageLocator>, precision: Precision) -> Self {
        Self {
            locator,
            precision,
            committed: None,
            changed: true,
        }
    }

    /// Whether `shape` has an image set, recording whether it differs from the
    /// loaded configuration. Unsupported shapes leave the state untouched.
    pub fn is_supported(&mut self, shape: ProblemShape) -> bool {
        if !shape.is_supported() {
            return false;
        }
        self.changed = self.committed != Some(shape);
        tracing::debug!(
            shape = %shape,
            loaded = ?self.committed,
            changed = self.changed,
            "Checked shape support"
        );
        true
    }

    /// Whether the last supported query requires a reload.
    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Shape of the loaded configuration.
    pub fn committed(&self) -> Option<ProblemShape> {
        self.committed
    }

    /// Engine precision.
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Path of the image for `shape` at the engine precision.
    pub fn resolve_path(&self, shape: ProblemShape) -> Result<PathBuf> {
        if !shape.is_supported() {
            return Err(FftFpgaError::UnsupportedShape(shape));
        }
        let path = self.locator.locate(shape, self.precision)?;
        tracing::info!(
            shape = %shape,
            precision = %self.precision,
            path = %path.display(),
            "Selected configuration image"
        );
        Ok(path)
    }

    /// Record that `shape` is now loaded.
    pub fn commit(&mut self, shape: ProblemShape) {
        self.committed = Some(shape);
        self.changed = false;
    }

    /// Forget the loaded shape so that the next request reloads.
    pub fn invalidate(&mut self) {
        self.committed = None;
        self.changed = true;
    }
}

impl std::fmt::Debug for ConfigurationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationResolver")
            .field("precision", &self.precision)
            .field("committed", &self.committed)
            .field("changed", &self.changed)
            .finish_non_exhaustive()
    }
}
