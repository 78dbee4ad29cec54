//! CLI command implementations.

pub mod check;
pub mod images;
pub mod run;

use std::path::PathBuf;

use fftfpga::{ImageBase, Precision};

use crate::error::{CliError, CliResult};

/// Parse a precision list: `single`, `double` or `both`.
pub fn parse_precisions(value: &str) -> CliResult<Vec<Precision>> {
    match value.trim().to_lowercase().as_str() {
        "both" | "all" => Ok(vec![Precision::Single, Precision::Double]),
        other => other
            .parse::<Precision>()
            .map(|p| vec![p])
            .map_err(CliError::InvalidArgument),
    }
}

/// Image base from an optional `--image-root`.
pub fn image_base(root: Option<&str>) -> ImageBase {
    match root {
        Some(dir) => ImageBase::Directory(PathBuf::from(dir)),
        None => ImageBase::ExecutableDir,
    }
}
