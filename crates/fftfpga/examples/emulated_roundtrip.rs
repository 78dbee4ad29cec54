//! Emulated Round Trip Example
//!
//! Installs emulator images into a temporary directory, then runs a forward
//! and a backward transform at each supported size and reports the error.

use fftfpga::emu::install_images;
use fftfpga::prelude::*;

fn main() -> Result<()> {
    // Initialize tracing for logs
    tracing_subscriber::fmt::init();

    println!("fftfpga emulated round trip ({} precision)\n", Sample::PRECISION);

    let root = std::env::temp_dir().join(format!("fftfpga-example-{}", std::process::id()));
    let base = root.join("bin").join("release");
    install_images(&base, Sample::PRECISION, &SUPPORTED_SIZES)?;

    let mut engine = emulated(EngineConfig::builder().with_image_dir(&base).build());
    engine.initialize()?;
    println!("✓ Session open on {}\n", engine.session().map_or("?", |s| s.device_name()));

    for n in SUPPORTED_SIZES {
        let shape = ProblemShape::cubic(n);
        if !engine.supports_shape(n, n, n) {
            println!("  {} not supported, skipping", shape);
            continue;
        }

        let original: Vec<Sample> = (0..shape.volume())
            .map(|i| Sample::new((i % 7) as Real - 3.0, (i % 5) as Real))
            .collect();
        let mut data = original.clone();

        let forward = engine.run_transform(Direction::Forward, shape, &mut data)?;
        let backward = engine.run_transform(Direction::Backward, shape, &mut data)?;

        let scale = shape.volume() as Real;
        let max_err = data
            .iter()
            .zip(&original)
            .map(|(got, want)| (got / scale - want).norm())
            .fold(0.0, Real::max);

        println!(
            "  {}: reload={} forward={:?} backward={:?} max error={:.2e}",
            shape,
            forward.reloaded,
            forward.total(),
            backward.total(),
            max_err
        );
    }

    let stats = engine.stats();
    engine.finalize();
    println!(
        "\n✓ {} transforms, {} reloads",
        stats.transforms, stats.reloads
    );

    let _ = std::fs::remove_dir_all(&root);
    Ok(())
}
