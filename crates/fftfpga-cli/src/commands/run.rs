//! `fftfpga run` command - Forward plus backward round trip on random data.

use std::time::Duration;

use colored::Colorize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

use fftfpga::emu::install_images;
use fftfpga::prelude::*;

use crate::error::{CliError, CliResult};

use super::image_base;

/// Largest acceptable `|x - ifft(fft(x)) / N³|` per sample.
pub fn tolerance(precision: Precision) -> f64 {
    match precision {
        Precision::Single => 1e-4,
        Precision::Double => 1e-10,
    }
}

/// Backend to run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Software emulator.
    Emulator,
    /// OpenCL runtime.
    OpenCl,
}

impl std::str::FromStr for Backend {
    type Err = CliError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "emu" | "emulator" => Ok(Self::Emulator),
            "opencl" | "ocl" | "fpga" => Ok(Self::OpenCl),
            other => Err(CliError::InvalidArgument(format!(
                "unknown backend '{}' (expected emu or opencl)",
                other
            ))),
        }
    }
}

/// Summary of a run.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Round trips completed.
    pub iterations: u32,
    /// Worst per-sample error seen.
    pub max_error: f64,
    /// Mean forward transform time.
    pub mean_forward: Duration,
    /// Mean backward transform time.
    pub mean_backward: Duration,
    /// Configuration loads.
    pub reloads: u64,
}

/// Execute the `run` command.
pub fn execute(
    size: usize,
    iterations: u32,
    backend: &str,
    image_root: Option<&str>,
    seed: u64,
) -> CliResult<RunSummary> {
    if iterations == 0 {
        return Err(CliError::InvalidArgument(
            "iterations must be at least 1".to_string(),
        ));
    }
    let backend: Backend = backend.parse()?;
    let shape = ProblemShape::cubic(size);

    println!(
        "{} Round trip {} x{} on {:?} ({} precision)",
        "→".bright_cyan(),
        shape.to_string().bright_white(),
        iterations,
        backend,
        Sample::PRECISION
    );

    let summary = match backend {
        Backend::Emulator => {
            // Without an image root, install a throwaway set.
            let scratch;
            let root = match image_root {
                Some(dir) => dir.to_string(),
                None => {
                    scratch = TempDir::new()?;
                    let base = scratch.path().join("bin").join("release");
                    if shape.is_supported() {
                        install_images(&base, Sample::PRECISION, &[size])?;
                    }
                    base.to_string_lossy().into_owned()
                }
            };
            let config = EngineConfig::builder().with_image_dir(root).build();
            let mut engine = emulated(config);
            round_trip(&mut engine, shape, iterations, seed)?
        }
        Backend::OpenCl => run_opencl(shape, iterations, image_root, seed)?,
    };

    let tol = tolerance(Sample::PRECISION);
    println!();
    println!("  {} round trips   {}", "•".dimmed(), summary.iterations);
    println!("  {} max error     {:.3e}", "•".dimmed(), summary.max_error);
    println!("  {} mean forward  {:?}", "•".dimmed(), summary.mean_forward);
    println!("  {} mean backward {:?}", "•".dimmed(), summary.mean_backward);
    println!("  {} reloads       {}", "•".dimmed(), summary.reloads);

    if summary.max_error > tol {
        return Err(CliError::Validation(format!(
            "max error {:.3e} exceeds {:.0e}",
            summary.max_error, tol
        )));
    }
    println!("\n{} round trip within {:.0e}", "Passed:".green().bold(), tol);
    Ok(summary)
}

#[cfg(feature = "opencl")]
fn run_opencl(
    shape: ProblemShape,
    iterations: u32,
    image_root: Option<&str>,
    seed: u64,
) -> CliResult<RunSummary> {
    let mut config = EngineConfig::from_env();
    if image_root.is_some() {
        config.image_base = image_base(image_root);
    }
    let mut engine = fftfpga::opencl(config)?;
    round_trip(&mut engine, shape, iterations, seed)
}

#[cfg(not(feature = "opencl"))]
fn run_opencl(
    _shape: ProblemShape,
    _iterations: u32,
    image_root: Option<&str>,
    _seed: u64,
) -> CliResult<RunSummary> {
    tracing::debug!(base = ?image_base(image_root), "OpenCL backend requested");
    Err(CliError::FeatureNotAvailable(
        "OpenCL backend".to_string(),
        "opencl".to_string(),
    ))
}

fn round_trip<D: Driver>(
    engine: &mut FftEngine<D, Sample>,
    shape: ProblemShape,
    iterations: u32,
    seed: u64,
) -> CliResult<RunSummary> {
    engine.initialize()?;
    println!(
        "  {} Device: {}",
        "•".dimmed(),
        engine
            .session()
            .map_or("unknown", |s| s.device_name())
            .bright_yellow()
    );

    if !engine.supports_shape(shape.nx, shape.ny, shape.nz) {
        return Err(FftFpgaError::UnsupportedShape(shape).into());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let scale = shape.volume() as Real;
    let mut max_error = 0.0f64;
    let mut forward = Duration::ZERO;
    let mut backward = Duration::ZERO;

    for i in 0..iterations {
        let original: Vec<Sample> = (0..shape.volume())
            .map(|_| Sample::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect();
        let mut data = original.clone();

        let report = engine.run_transform(Direction::Forward, shape, &mut data)?;
        forward += report.total();
        let report = engine.run_transform(Direction::Backward, shape, &mut data)?;
        backward += report.total();

        let err = data
            .iter()
            .zip(&original)
            .map(|(got, want)| (got / scale - want).norm() as f64)
            .fold(0.0, f64::max);
        tracing::debug!(iteration = i, error = err, "Round trip complete");
        max_error = max_error.max(err);
    }

    let summary = RunSummary {
        iterations,
        max_error,
        mean_forward: forward / iterations,
        mean_backward: backward / iterations,
        reloads: engine.stats().reloads,
    };
    engine.finalize();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!("emu".parse::<Backend>().unwrap(), Backend::Emulator);
        assert_eq!("OpenCL".parse::<Backend>().unwrap(), Backend::OpenCl);
        assert!("cuda".parse::<Backend>().is_err());
    }

    #[test]
    fn test_emulated_round_trip() {
        let summary = execute(16, 2, "emu", None, 7).unwrap();
        assert_eq!(summary.iterations, 2);
        assert_eq!(summary.reloads, 1);
        assert!(summary.max_error <= tolerance(Sample::PRECISION));
    }

    #[test]
    fn test_unsupported_size_rejected() {
        let err = execute(8, 1, "emu", None, 0).unwrap_err();
        assert!(matches!(
            err,
            CliError::Engine(FftFpgaError::UnsupportedShape(_))
        ));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        assert!(matches!(
            execute(16, 0, "emu", None, 0),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[cfg(not(feature = "opencl"))]
    #[test]
    fn test_opencl_needs_feature() {
        assert!(matches!(
            execute(16, 1, "opencl", None, 0),
            Err(CliError::FeatureNotAvailable(..))
        ));
    }
}
