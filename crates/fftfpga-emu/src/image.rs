//! Emulator configuration images.
//!
//! An emulator image is a short text manifest naming the transform size and
//! precision the "bitstream" was synthesized for:
//!
//! ```text
//! FFTFPGA-EMU 1
//! size 32
//! precision single
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use fftfpga_core::driver::{status, DriverError, DriverResult};
use fftfpga_core::{Precision, ProblemShape, Result, TemplateLocator};

/// First line of every image.
pub const MAGIC: &str = "FFTFPGA-EMU 1";

/// Parsed image contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageManifest {
    /// Cubic edge length.
    pub size: usize,
    /// Sample precision.
    pub precision: Precision,
}

impl ImageManifest {
    /// Manifest for a size and precision.
    pub fn new(size: usize, precision: Precision) -> Self {
        Self { size, precision }
    }

    /// Shape the image transforms.
    pub fn shape(&self) -> ProblemShape {
        ProblemShape::cubic(self.size)
    }

    /// Bytes of one device volume.
    pub fn volume_bytes(&self) -> usize {
        self.shape().byte_len(self.precision)
    }

    /// Serialized form.
    pub fn render(&self) -> String {
        format!("{}\nsize {}\nprecision {}\n", MAGIC, self.size, self.precision)
    }

    /// Parse an image binary.
    pub fn parse(binary: &[u8]) -> DriverResult<Self> {
        let invalid = |msg: String| DriverError::new("create_program", status::INVALID_BINARY, msg);

        let text = std::str::from_utf8(binary)
            .map_err(|_| invalid("image is not an emulator manifest".to_string()))?;
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

        if lines.next() != Some(MAGIC) {
            return Err(invalid("missing emulator image header".to_string()));
        }

        let mut size = None;
        let mut precision = None;
        for line in lines {
            match line.split_once(' ') {
                Some(("size", v)) => {
                    size = Some(
                        v.trim()
                            .parse::<usize>()
                            .map_err(|e| invalid(format!("bad size '{}': {}", v, e)))?,
                    )
                }
                Some(("precision", v)) => precision = Some(v.trim().parse::<Precision>().map_err(invalid)?),
                _ => return Err(invalid(format!("unexpected line '{}'", line))),
            }
        }

        let size = size.ok_or_else(|| invalid("missing size".to_string()))?;
        let precision = precision.ok_or_else(|| invalid("missing precision".to_string()))?;
        if !ProblemShape::cubic(size).is_supported() {
            return Err(invalid(format!("no pipeline synthesized for size {}", size)));
        }
        Ok(Self { size, precision })
    }
}

/// Write one image file, creating parent directories.
pub fn write_image(path: &Path, manifest: ImageManifest) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, manifest.render())?;
    Ok(())
}

/// Install images for `sizes` at `precision` under the template layout
/// rooted at `base_dir`. Returns the written paths.
pub fn install_images(
    base_dir: &Path,
    precision: Precision,
    sizes: &[usize],
) -> Result<Vec<PathBuf>> {
    let locator = TemplateLocator::in_dir(base_dir);
    sizes
        .iter()
        .map(|&n| {
            let path = locator.candidate(ProblemShape::cubic(n), precision)?;
            write_image(&path, ImageManifest::new(n, precision))?;
            tracing::debug!(path = %path.display(), size = n, "Installed emulator image");
            Ok(path)
        })
        .collect()
}
