//! Bodies of the five emulated kernel units.
//!
//! Volumes are x-fastest: sample `(x, y, z)` lives at `x + n*y + n*n*z`.
//! `fft3da` transforms each xy-plane along x then y, `transpose` reorders
//! the volume into z-lines through device memory, `fft3db` transforms each
//! z-line and `transpose3d` scatters the lines back into x-fastest order.

use std::sync::Arc;

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use fftfpga_core::driver::{status, DriverError, DriverResult};
use fftfpga_core::StageKind;

use crate::fabric::{decode, encode, BufferStore, ProgramShared};

/// Argument value captured at enqueue time.
#[derive(Debug, Clone)]
pub(crate) enum ArgValue {
    Buffer(BufferStore),
    Int(i32),
}

impl ArgValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Buffer(_) => "buffer",
            Self::Int(_) => "integer",
        }
    }
}

/// Run one stage to completion.
pub(crate) fn run_stage(
    stage: StageKind,
    shared: &ProgramShared,
    arg: Option<ArgValue>,
) -> DriverResult<()> {
    match (stage, arg) {
        (StageKind::Fetch, Some(ArgValue::Buffer(input))) => fetch(shared, &input),
        (StageKind::FftA, Some(ArgValue::Int(inverse))) => fft_planes(shared, inverse != 0),
        (StageKind::TransposeA, Some(ArgValue::Buffer(ddr))) => transpose(shared, ddr),
        (StageKind::FftB, Some(ArgValue::Int(inverse))) => fft_lines(shared, inverse != 0),
        (StageKind::TransposeB, _) => transpose3d(shared),
        (stage, arg) => Err(DriverError::new(
            "enqueue_task",
            status::INVALID_KERNEL_ARGS,
            format!(
                "stage {} launched with {} argument",
                stage,
                arg.as_ref().map_or("no", ArgValue::kind)
            ),
        )),
    }
}

fn plan(n: usize, inverse: bool) -> Arc<dyn Fft<f64>> {
    let mut planner = FftPlanner::new();
    if inverse {
        planner.plan_fft_inverse(n)
    } else {
        planner.plan_fft_forward(n)
    }
}

fn fetch(shared: &ProgramShared, input: &BufferStore) -> DriverResult<()> {
    let n = shared.manifest.size;
    let samples = {
        let bytes = input.lock();
        decode(&bytes, shared.manifest.precision)
    };
    for plane in samples.chunks_exact(n * n) {
        shared.fabric.fetch_to_fft_a.send(plane.to_vec())?;
    }
    Ok(())
}

fn fft_planes(shared: &ProgramShared, inverse: bool) -> DriverResult<()> {
    let n = shared.manifest.size;
    let fft = plan(n, inverse);
    let mut scratch = vec![Complex64::default(); fft.get_inplace_scratch_len()];
    let mut column = vec![Complex64::default(); n];

    for _ in 0..n {
        let mut plane = shared.fabric.fetch_to_fft_a.recv(shared.timeout)?;

        // Rows along x are contiguous.
        fft.process_with_scratch(&mut plane, &mut scratch);

        for x in 0..n {
            for (y, c) in column.iter_mut().enumerate() {
                *c = plane[x + n * y];
            }
            fft.process_with_scratch(&mut column, &mut scratch);
            for (y, c) in column.iter().enumerate() {
                plane[x + n * y] = *c;
            }
        }

        shared.fabric.fft_a_to_transpose.send(plane)?;
    }
    Ok(())
}

fn transpose(shared: &ProgramShared, ddr: BufferStore) -> DriverResult<()> {
    let n = shared.manifest.size;
    let mut volume = Vec::with_capacity(n * n * n);
    for _ in 0..n {
        volume.extend(shared.fabric.fft_a_to_transpose.recv(shared.timeout)?);
    }

    // Spill to device memory, then stream back out in z-line order.
    encode(&volume, shared.manifest.precision, &mut ddr.lock());
    let volume = decode(&ddr.lock(), shared.manifest.precision);

    for line in 0..n * n {
        let z_line = (0..n).map(|z| volume[line + n * n * z]).collect();
        shared.fabric.transpose_to_fft_b.send(z_line)?;
    }
    shared.fabric.ddr.send(ddr)
}

fn fft_lines(shared: &ProgramShared, inverse: bool) -> DriverResult<()> {
    let n = shared.manifest.size;
    let fft = plan(n, inverse);
    let mut scratch = vec![Complex64::default(); fft.get_inplace_scratch_len()];

    for _ in 0..n * n {
        let mut line = shared.fabric.transpose_to_fft_b.recv(shared.timeout)?;
        fft.process_with_scratch(&mut line, &mut scratch);
        shared.fabric.fft_b_to_transpose3d.send(line)?;
    }
    Ok(())
}

fn transpose3d(shared: &ProgramShared) -> DriverResult<()> {
    let n = shared.manifest.size;
    let ddr = shared.fabric.ddr.recv(shared.timeout)?;

    let mut volume = vec![Complex64::default(); n * n * n];
    for line in 0..n * n {
        let z_line = shared.fabric.fft_b_to_transpose3d.recv(shared.timeout)?;
        for (z, c) in z_line.into_iter().enumerate() {
            volume[line + n * n * z] = c;
        }
    }

    encode(&volume, shared.manifest.precision, &mut ddr.lock());
    Ok(())
}
