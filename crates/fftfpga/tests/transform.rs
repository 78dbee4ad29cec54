//! Transform results through the emulated pipeline.

mod common;

use approx::assert_abs_diff_eq;
use fftfpga::num_complex::{Complex32, Complex64};
use fftfpga::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn round_trip_tolerance(precision: Precision) -> f64 {
    match precision {
        Precision::Single => 1e-4,
        Precision::Double => 1e-10,
    }
}

fn random_volume(shape: ProblemShape, seed: u64) -> Vec<Sample> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..shape.volume())
        .map(|_| Sample::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
        .collect()
}

#[test]
fn test_impulse_gives_flat_spectrum() {
    let (_dir, mut engine) = common::engine::<Sample>(&[16]);
    let shape = ProblemShape::cubic(16);
    let mut data = common::impulse(shape);

    let report = engine
        .run_transform(Direction::Forward, shape, &mut data)
        .unwrap();

    assert!(report.reloaded);
    assert_eq!(report.shape, shape);
    assert_eq!(report.direction, Direction::Forward);
    for c in &data {
        assert_abs_diff_eq!(c.re, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(c.im, 0.0, epsilon = 1e-5);
    }
}

#[test]
fn test_round_trip_all_sizes() {
    let sizes = [16, 32, 64];
    let (_dir, mut engine) = common::engine::<Sample>(&sizes);

    for (seed, n) in sizes.into_iter().enumerate() {
        let shape = ProblemShape::cubic(n);
        assert!(engine.supports_shape(n, n, n));

        let original = random_volume(shape, seed as u64);
        let mut data = original.clone();

        engine
            .run_transform(Direction::Forward, shape, &mut data)
            .unwrap();
        engine
            .run_transform(Direction::Backward, shape, &mut data)
            .unwrap();

        let scale = shape.volume() as Real;
        let eps = round_trip_tolerance(Sample::PRECISION) as Real;
        for (got, want) in data.iter().zip(&original) {
            assert_abs_diff_eq!(got.re / scale, want.re, epsilon = eps);
            assert_abs_diff_eq!(got.im / scale, want.im, epsilon = eps);
        }
    }
    assert_eq!(engine.stats().reloads, 3);
    assert_eq!(engine.stats().transforms, 6);
}

#[test]
fn test_double_round_trip_all_sizes() {
    let sizes = [16, 32, 64];
    let (_dir, mut engine) = common::engine::<Complex64>(&sizes);
    let eps = round_trip_tolerance(Precision::Double);

    for (seed, n) in sizes.into_iter().enumerate() {
        let shape = ProblemShape::cubic(n);
        let mut rng = StdRng::seed_from_u64(100 + seed as u64);
        let original: Vec<Complex64> = (0..shape.volume())
            .map(|_| Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect();
        let mut data = original.clone();

        engine
            .run_transform(Direction::Forward, shape, &mut data)
            .unwrap();
        engine
            .run_transform(Direction::Backward, shape, &mut data)
            .unwrap();

        let scale = shape.volume() as f64;
        let worst = data
            .iter()
            .zip(&original)
            .map(|(got, want)| (got / scale - want).norm())
            .fold(0.0, f64::max);
        assert!(worst < eps, "{}: worst error {:e}", shape, worst);
    }
    assert_eq!(engine.stats().reloads, 3);
}

#[test]
fn test_plane_wave_lands_in_one_bin() {
    let n = 32;
    let k = [1, 2, 3];
    let (_dir, mut engine) = common::engine::<Complex64>(&[n]);
    let shape = ProblemShape::cubic(n);
    let mut data = common::plane_wave(n, k);

    // Forward uses e^{-2πi...}, so +k shows up at bin k.
    engine
        .run_transform(Direction::Forward, shape, &mut data)
        .unwrap();

    let peak = common::index(n, k[0], k[1], k[2]);
    let total = shape.volume() as f64;
    for (i, c) in data.iter().enumerate() {
        let expected = if i == peak { total } else { 0.0 };
        assert_abs_diff_eq!(c.re, expected, epsilon = 1e-8);
        assert_abs_diff_eq!(c.im, 0.0, epsilon = 1e-8);
    }
}

#[test]
fn test_backward_plane_wave_uses_positive_exponent() {
    let n = 16;
    let k = [2, 0, 5];
    let (_dir, mut engine) = common::engine::<Complex64>(&[n]);
    let shape = ProblemShape::cubic(n);
    let mut data = common::plane_wave(n, k);

    engine
        .run_transform(Direction::Backward, shape, &mut data)
        .unwrap();

    // e^{+2πi k x} against e^{+2πi m x} peaks at m = -k mod n.
    let peak = common::index(n, (n - k[0]) % n, (n - k[1]) % n, (n - k[2]) % n);
    let total = shape.volume() as f64;
    assert_abs_diff_eq!(data[peak].re, total, epsilon = 1e-8);
    let off_peak: f64 = data
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != peak)
        .map(|(_, c)| c.norm())
        .sum();
    assert!(off_peak < 1e-6, "leakage {}", off_peak);
}

#[test]
fn test_single_and_double_agree() {
    let n = 16;
    let shape = ProblemShape::cubic(n);
    let wave = common::plane_wave(n, [3, 1, 0]);

    let (_d1, mut double) = common::engine::<Complex64>(&[n]);
    let mut data64 = wave.clone();
    double
        .run_transform(Direction::Forward, shape, &mut data64)
        .unwrap();

    let (_d2, mut single) = common::engine::<Complex32>(&[n]);
    let mut data32: Vec<Complex32> = wave
        .iter()
        .map(|c| Complex32::new(c.re as f32, c.im as f32))
        .collect();
    single
        .run_transform(Direction::Forward, shape, &mut data32)
        .unwrap();

    for (a, b) in data32.iter().zip(&data64) {
        assert_abs_diff_eq!(a.re as f64, b.re, epsilon = 1e-2);
        assert_abs_diff_eq!(a.im as f64, b.im, epsilon = 1e-2);
    }
}

#[test]
fn test_signed_direction() {
    let (_dir, mut engine) = common::engine::<Sample>(&[16]);
    let shape = ProblemShape::cubic(16);
    let mut data = common::impulse(shape);

    let report = engine.run_transform_signed(1, shape, &mut data).unwrap();
    assert_eq!(report.direction, Direction::Forward);
    let report = engine.run_transform_signed(-1, shape, &mut data).unwrap();
    assert_eq!(report.direction, Direction::Backward);

    assert_abs_diff_eq!(data[0].re, shape.volume() as Real, epsilon = 1e-2);

    let err = engine.run_transform_signed(0, shape, &mut data).unwrap_err();
    assert!(matches!(err, FftFpgaError::InvalidDirection(0)));
    assert_eq!(engine.stats().transforms, 2);
}

#[test]
fn test_buffer_size_mismatch() {
    let (_dir, mut engine) = common::engine::<Sample>(&[16]);
    let shape = ProblemShape::cubic(16);
    let mut data = vec![Sample::default(); shape.volume() - 1];

    let err = engine
        .run_transform(Direction::Forward, shape, &mut data)
        .unwrap_err();

    assert!(matches!(
        err,
        FftFpgaError::BufferSizeMismatch { expected: 4096, actual: 4095, .. }
    ));
    // Rejected before any configuration work.
    assert_eq!(engine.loaded_shape(), None);
    assert_eq!(engine.driver().stats().programs_built, 0);
}

#[test]
fn test_report_timings() {
    let (_dir, mut engine) = common::engine::<Sample>(&[16]);
    let shape = ProblemShape::cubic(16);
    let mut data = common::impulse(shape);

    let report = engine
        .run_transform(Direction::Forward, shape, &mut data)
        .unwrap();
    assert!(report.total() >= report.pipeline);

    let stats = engine.driver().stats();
    assert_eq!(stats.tasks_completed, 5);
    assert_eq!(stats.bytes_written as usize, shape.byte_len(engine.precision()));
    assert_eq!(stats.bytes_read as usize, shape.byte_len(engine.precision()));
}
