//! On-chip streaming wiring between the emulated kernel units.
//!
//! ```text
//! fetch ──planes──► fft3da ──planes──► transpose ──z-lines──► fft3db ──z-lines──► transpose3d
//!                                          │                                          ▲
//!                                          └──────────────── ddr handle ──────────────┘
//! ```
//!
//! Pipes are unbounded; a stage that waits longer than the configured
//! timeout on an empty pipe gives up instead of hanging its queue forever.

use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use num_complex::{Complex, Complex64};
use parking_lot::Mutex;

use fftfpga_core::driver::{status, DriverError, DriverResult};
use fftfpga_core::Precision;

use crate::image::ImageManifest;

/// Contents of one device buffer.
pub(crate) type BufferStore = Arc<Mutex<Vec<u8>>>;

/// A batch of samples moving between stages.
pub(crate) type Packet = Vec<Complex64>;

/// One point-to-point pipe.
#[derive(Debug)]
pub(crate) struct Pipe<T> {
    name: &'static str,
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> Pipe<T> {
    fn new(name: &'static str) -> Self {
        let (tx, rx) = unbounded();
        Self { name, tx, rx }
    }

    pub(crate) fn send(&self, value: T) -> DriverResult<()> {
        self.tx.send(value).map_err(|_| {
            DriverError::new("pipe_write", status::OUT_OF_RESOURCES, format!("pipe {} closed", self.name))
        })
    }

    pub(crate) fn recv(&self, timeout: Duration) -> DriverResult<T> {
        self.rx.recv_timeout(timeout).map_err(|e| {
            let reason = match e {
                RecvTimeoutError::Timeout => "stalled",
                RecvTimeoutError::Disconnected => "closed",
            };
            DriverError::new(
                "pipe_read",
                status::OUT_OF_RESOURCES,
                format!("pipe {} {}", self.name, reason),
            )
        })
    }

    /// Discard anything left over.
    pub(crate) fn drain(&self) -> usize {
        self.rx.try_iter().count()
    }
}

/// All pipes of one built program.
#[derive(Debug)]
pub(crate) struct Fabric {
    pub(crate) fetch_to_fft_a: Pipe<Packet>,
    pub(crate) fft_a_to_transpose: Pipe<Packet>,
    pub(crate) transpose_to_fft_b: Pipe<Packet>,
    pub(crate) fft_b_to_transpose3d: Pipe<Packet>,
    pub(crate) ddr: Pipe<BufferStore>,
}

impl Fabric {
    pub(crate) fn new() -> Self {
        Self {
            fetch_to_fft_a: Pipe::new("fetch->fft3da"),
            fft_a_to_transpose: Pipe::new("fft3da->transpose"),
            transpose_to_fft_b: Pipe::new("transpose->fft3db"),
            fft_b_to_transpose3d: Pipe::new("fft3db->transpose3d"),
            ddr: Pipe::new("transpose->transpose3d"),
        }
    }

    /// Drop stale packets left by an aborted run.
    pub(crate) fn flush(&self) -> usize {
        self.fetch_to_fft_a.drain()
            + self.fft_a_to_transpose.drain()
            + self.transpose_to_fft_b.drain()
            + self.fft_b_to_transpose3d.drain()
            + self.ddr.drain()
    }
}

/// State shared by a program and the kernel units created from it.
#[derive(Debug)]
pub(crate) struct ProgramShared {
    pub(crate) manifest: ImageManifest,
    pub(crate) fabric: Fabric,
    pub(crate) timeout: Duration,
}

/// Decode device bytes into samples.
pub(crate) fn decode(bytes: &[u8], precision: Precision) -> Vec<Complex64> {
    match precision {
        Precision::Single => bytes
            .chunks_exact(precision.sample_bytes())
            .map(|chunk| {
                let c: Complex<f32> = bytemuck::pod_read_unaligned(chunk);
                Complex64::new(f64::from(c.re), f64::from(c.im))
            })
            .collect(),
        Precision::Double => bytes
            .chunks_exact(precision.sample_bytes())
            .map(bytemuck::pod_read_unaligned::<Complex64>)
            .collect(),
    }
}

/// Encode samples into device bytes.
pub(crate) fn encode(samples: &[Complex64], precision: Precision, out: &mut [u8]) {
    let width = precision.sample_bytes();
    for (chunk, c) in out.chunks_exact_mut(width).zip(samples) {
        match precision {
            Precision::Single => {
                let narrow = Complex::<f32>::new(c.re as f32, c.im as f32);
                chunk.copy_from_slice(bytemuck::bytes_of(&narrow));
            }
            Precision::Double => chunk.copy_from_slice(bytemuck::bytes_of(c)),
        }
    }
}
