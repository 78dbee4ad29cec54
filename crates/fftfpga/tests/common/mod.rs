//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use fftfpga::emu::{install_images, EmulatorConfig};
use fftfpga::num_complex::Complex;
use fftfpga::prelude::*;
use tempfile::TempDir;

/// Temporary install tree. Image templates climb two levels above the
/// base, so the base sits at `<root>/bin/release`.
pub struct ImageDir {
    _root: TempDir,
    base: PathBuf,
}

impl ImageDir {
    /// Empty install tree.
    pub fn new() -> Self {
        let root = TempDir::new().expect("temp dir");
        let base = root.path().join("bin").join("release");
        std::fs::create_dir_all(&base).expect("base dir");
        Self { _root: root, base }
    }

    /// Directory images are resolved against.
    pub fn path(&self) -> &Path {
        &self.base
    }
}

/// Install tree populated for `sizes` at the sample's precision.
pub fn image_dir<S: ComplexSample>(sizes: &[usize]) -> ImageDir {
    let dir = ImageDir::new();
    install_images(dir.path(), S::PRECISION, sizes).expect("install images");
    dir
}

/// Initialized engine over a fresh emulator with images for `sizes`.
pub fn engine<S: ComplexSample>(sizes: &[usize]) -> (ImageDir, FftEngine<EmulatorDriver, S>) {
    engine_with(EmulatorConfig::default(), sizes)
}

/// Like [`engine`] with a custom emulator configuration.
pub fn engine_with<S: ComplexSample>(
    emu: EmulatorConfig,
    sizes: &[usize],
) -> (ImageDir, FftEngine<EmulatorDriver, S>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let dir = image_dir::<S>(sizes);
    let config = EngineConfig::builder().with_image_dir(dir.path()).build();
    let mut engine = FftEngine::new(EmulatorDriver::with_config(emu), config);
    engine.initialize().expect("initialize");
    (dir, engine)
}

/// Single-sample impulse at the origin.
pub fn impulse(shape: ProblemShape) -> Vec<Sample> {
    let mut data = vec![Sample::default(); shape.volume()];
    data[0] = Sample::new(1.0, 0.0);
    data
}

/// `e^{2πi (kx·x + ky·y + kz·z) / n}` over an x-fastest cubic volume.
pub fn plane_wave(n: usize, k: [usize; 3]) -> Vec<Complex<f64>> {
    (0..n * n * n)
        .map(|i| {
            let (x, y, z) = (i % n, (i / n) % n, i / (n * n));
            let phase = 2.0 * std::f64::consts::PI * (k[0] * x + k[1] * y + k[2] * z) as f64
                / n as f64;
            Complex::new(phase.cos(), phase.sin())
        })
        .collect()
}

/// Index of `(x, y, z)` in an x-fastest cubic volume.
pub fn index(n: usize, x: usize, y: usize, z: usize) -> usize {
    x + n * y + n * n * z
}
