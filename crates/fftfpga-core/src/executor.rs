//! Drives one transform through the five-stage pipeline.

use std::time::{Duration, Instant};

use crate::driver::{Driver, KernelArg};
use crate::error::{FftFpgaError, Result};
use crate::loader::LoadedConfiguration;
use crate::pipeline::{StageBinding, StageKind, ARG_SLOT, RESULT_CHANNEL, TRANSFER_CHANNEL};
use crate::queue_set::QueueSet;
use crate::staging::StagingBuffer;
use crate::types::{ComplexSample, Direction, ProblemShape, TransferDirection};

/// Timing breakdown of one transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformReport {
    /// Transformed shape.
    pub shape: ProblemShape,
    /// Transform direction.
    pub direction: Direction,
    /// Whether the configuration was rebuilt for this call.
    pub reloaded: bool,
    /// Staging plus host-to-device copy.
    pub transfer_in: Duration,
    /// Binding, launch and drain of the five stages.
    pub pipeline: Duration,
    /// Device-to-host copy plus unstaging.
    pub transfer_out: Duration,
}

impl TransformReport {
    /// Wall time spent in the executor.
    pub fn total(&self) -> Duration {
        self.transfer_in + self.pipeline + self.transfer_out
    }
}

/// Runs transforms on a loaded configuration.
pub struct PipelineExecutor;

impl PipelineExecutor {
    /// Transform `data` in place.
    ///
    /// `data` must hold exactly `config.shape().volume()` samples. The host
    /// blocks on the input transfer, on each stage channel in pipeline order,
    /// and on the result read. The input staging buffer is reused for the
    /// readback. On error the device buffers are left as they
    /// are; the caller tears the configuration down before retrying.
    pub fn run<D: Driver, S: ComplexSample>(
        driver: &D,
        config: &mut LoadedConfiguration<D>,
        queues: &QueueSet<D>,
        direction: Direction,
        data: &mut [S],
    ) -> Result<TransformReport> {
        let shape = config.shape();
        if data.len() != shape.volume() {
            return Err(FftFpgaError::BufferSizeMismatch {
                shape,
                expected: shape.volume(),
                actual: data.len(),
            });
        }

        let span = tracing::debug_span!("transform", shape = %shape, direction = %direction);
        let _enter = span.enter();

        // Stage in and wait for the whole volume to land.
        let start = Instant::now();
        let mut staging = StagingBuffer::from_slice(data)?;
        let transfer = queues.queue(TRANSFER_CHANNEL)?;
        let to_device = |reason: String| FftFpgaError::Transfer {
            direction: TransferDirection::HostToDevice,
            reason,
        };
        driver
            .write_buffer(transfer, &mut config.input, staging.as_bytes())
            .map_err(|e| to_device(e.to_string()))?;
        driver
            .finish(transfer)
            .map_err(|e| to_device(e.to_string()))?;
        let transfer_in = start.elapsed();

        // Bind, launch, drain.
        let start = Instant::now();
        let LoadedConfiguration {
            kernels,
            input,
            output,
            ..
        } = config;

        for unit in kernels.iter_mut() {
            let arg = match unit.descriptor().binding {
                StageBinding::InputBuffer => KernelArg::Buffer(&*input),
                StageBinding::OutputBuffer => KernelArg::Buffer(&*output),
                StageBinding::InverseFlag => KernelArg::Int(direction.inverse_flag()),
                StageBinding::Unbound => continue,
            };
            driver
                .set_kernel_arg(&mut unit.kernel, ARG_SLOT, arg)
                .map_err(|e| stage_error(unit.stage, "bind", e))?;
        }

        for unit in kernels.iter() {
            let queue = queues.queue(unit.descriptor().channel)?;
            driver
                .enqueue_task(queue, &unit.kernel)
                .map_err(|e| stage_error(unit.stage, "enqueue", e))?;
            tracing::trace!(stage = %unit.stage, "Stage launched");
        }

        for unit in kernels.iter() {
            let queue = queues.queue(unit.descriptor().channel)?;
            driver
                .finish(queue)
                .map_err(|e| stage_error(unit.stage, "drain", e))?;
            tracing::trace!(stage = %unit.stage, "Stage drained");
        }
        let pipeline = start.elapsed();

        // Read back on the last stage's channel.
        let start = Instant::now();
        let result = queues.queue(RESULT_CHANNEL)?;
        driver
            .read_buffer(result, &*output, staging.as_bytes_mut())
            .map_err(|e| FftFpgaError::Transfer {
                direction: TransferDirection::DeviceToHost,
                reason: e.to_string(),
            })?;
        data.copy_from_slice(staging.as_slice());
        drop(staging);
        let transfer_out = start.elapsed();

        let report = TransformReport {
            shape,
            direction,
            reloaded: false,
            transfer_in,
            pipeline,
            transfer_out,
        };
        tracing::debug!(
            transfer_in_us = transfer_in.as_micros() as u64,
            pipeline_us = pipeline.as_micros() as u64,
            transfer_out_us = transfer_out.as_micros() as u64,
            "Transform complete"
        );
        Ok(report)
    }
}

fn stage_error(stage: StageKind, step: &str, err: impl std::fmt::Display) -> FftFpgaError {
    tracing::error!(stage = %stage, step, error = %err, "Pipeline stage failed");
    FftFpgaError::Execution {
        stage,
        reason: format!("{}: {}", step, err),
    }
}
