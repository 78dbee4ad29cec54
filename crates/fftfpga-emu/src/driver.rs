//! Emulated accelerator runtime.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace, warn};

use fftfpga_core::driver::{status, Driver, DriverError, DriverResult, KernelArg};
use fftfpga_core::{StageKind, PIPELINE};

use crate::config::{EmulatorConfig, FaultPlan, EMULATOR_DEVICE};
use crate::fabric::{BufferStore, Fabric, ProgramShared};
use crate::image::ImageManifest;
use crate::kernels::{run_stage, ArgValue};
use crate::stats::{Counters, EmulatorStats, Resource, ResourceGuard};

/// Emulated platform handle.
#[derive(Debug, Clone)]
pub struct EmuPlatform {
    name: String,
}

/// Emulated device handle.
#[derive(Debug, Clone)]
pub struct EmuDevice {
    index: usize,
    name: String,
}

/// Emulated execution context.
#[derive(Debug)]
pub struct EmuContext {
    device: usize,
    _guard: ResourceGuard,
}

/// Emulated program built from an image manifest.
#[derive(Debug)]
pub struct EmuProgram {
    shared: Arc<ProgramShared>,
    built: bool,
    _guard: ResourceGuard,
}

/// Emulated kernel unit.
#[derive(Debug)]
pub struct EmuKernel {
    stage: StageKind,
    name: &'static str,
    shared: Arc<ProgramShared>,
    arg: Option<ArgValue>,
    _guard: ResourceGuard,
}

/// Emulated device buffer.
#[derive(Debug)]
pub struct EmuBuffer {
    store: BufferStore,
    size: usize,
    _guard: ResourceGuard,
}

impl EmuBuffer {
    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

struct PendingTask {
    kernel: &'static str,
    handle: JoinHandle<DriverResult<()>>,
}

/// Emulated in-order queue.
///
/// Each enqueued task runs on its own thread; `finish` and the blocking
/// copies join everything enqueued before them.
pub struct EmuQueue {
    device: usize,
    profiling: bool,
    pending: Mutex<Vec<PendingTask>>,
    last_kernel: Mutex<Option<&'static str>>,
    _guard: ResourceGuard,
}

impl EmuQueue {
    fn join_pending(&self, counters: &Counters) -> DriverResult<()> {
        let tasks = std::mem::take(&mut *self.pending.lock());
        let mut first_error = None;
        for task in tasks {
            let result = task.handle.join().unwrap_or_else(|_| {
                Err(DriverError::new(
                    "finish",
                    status::OUT_OF_RESOURCES,
                    format!("kernel {} panicked", task.kernel),
                ))
            });
            match result {
                Ok(()) => counters.task_completed(),
                Err(e) => {
                    warn!(kernel = task.kernel, error = %e, "Emulated kernel failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for EmuQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmuQueue")
            .field("device", &self.device)
            .field("profiling", &self.profiling)
            .field("pending", &self.pending.lock().len())
            .finish()
    }
}

impl Drop for EmuQueue {
    fn drop(&mut self) {
        for task in std::mem::take(&mut *self.pending.lock()) {
            if task.handle.join().is_err() {
                warn!(kernel = task.kernel, "Emulated kernel panicked during release");
            }
        }
    }
}

/// Software model of an accelerator exposing the five-stage FFT pipeline.
pub struct EmulatorDriver {
    config: EmulatorConfig,
    faults: RwLock<FaultPlan>,
    counters: Arc<Counters>,
}

impl EmulatorDriver {
    /// Create an emulator with default configuration.
    pub fn new() -> Self {
        Self::with_config(EmulatorConfig::default())
    }

    /// Create an emulator with a specific configuration.
    pub fn with_config(config: EmulatorConfig) -> Self {
        info!(
            platform = %config.platform_name,
            devices = config.device_count,
            "Initializing FPGA emulator"
        );
        Self {
            faults: RwLock::new(config.faults.clone()),
            config,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Replace the fault plan.
    pub fn set_faults(&self, faults: FaultPlan) {
        debug!(?faults, "Emulator fault plan updated");
        *self.faults.write() = faults;
    }

    /// Disarm all faults.
    pub fn clear_faults(&self) {
        self.set_faults(FaultPlan::none());
    }

    /// Current fault plan.
    pub fn faults(&self) -> FaultPlan {
        self.faults.read().clone()
    }

    /// Resource usage snapshot.
    pub fn stats(&self) -> EmulatorStats {
        self.counters.snapshot()
    }

    /// Emulator configuration.
    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    fn injected(operation: &'static str, code: i32, what: &str) -> DriverError {
        DriverError::new(operation, code, format!("injected fault: {}", what))
    }
}

impl Default for EmulatorDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EmulatorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmulatorDriver")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Driver for EmulatorDriver {
    type Platform = EmuPlatform;
    type Device = EmuDevice;
    type Context = EmuContext;
    type Program = EmuProgram;
    type Kernel = EmuKernel;
    type Buffer = EmuBuffer;
    type Queue = EmuQueue;

    fn name(&self) -> &str {
        "emulator"
    }

    fn platforms(&self) -> DriverResult<Vec<EmuPlatform>> {
        let name = if self.faults.read().missing_platform {
            "Portable Computing Language".to_string()
        } else {
            self.config.platform_name.clone()
        };
        Ok(vec![EmuPlatform { name }])
    }

    fn platform_name(&self, platform: &EmuPlatform) -> DriverResult<String> {
        Ok(platform.name.clone())
    }

    fn devices(&self, _platform: &EmuPlatform) -> DriverResult<Vec<EmuDevice>> {
        if self.config.device_count == 0 {
            return Err(DriverError::new(
                "get_devices",
                status::DEVICE_NOT_FOUND,
                "no emulated devices",
            ));
        }
        Ok((0..self.config.device_count)
            .map(|index| EmuDevice {
                index,
                name: format!("{} {}", EMULATOR_DEVICE, index),
            })
            .collect())
    }

    fn device_name(&self, device: &EmuDevice) -> DriverResult<String> {
        Ok(device.name.clone())
    }

    fn create_context(&self, device: &EmuDevice) -> DriverResult<EmuContext> {
        if self.faults.read().fail_context {
            return Err(Self::injected("create_context", status::OUT_OF_RESOURCES, "context"));
        }
        debug!(device = device.index, "Created emulator context");
        Ok(EmuContext {
            device: device.index,
            _guard: ResourceGuard::new(&self.counters, Resource::Context),
        })
    }

    fn create_program(
        &self,
        context: &EmuContext,
        device: &EmuDevice,
        binary: &[u8],
    ) -> DriverResult<EmuProgram> {
        if context.device != device.index {
            return Err(DriverError::new(
                "create_program",
                status::INVALID_VALUE,
                "device does not belong to context",
            ));
        }
        let manifest = ImageManifest::parse(binary)?;
        Ok(EmuProgram {
            shared: Arc::new(ProgramShared {
                manifest,
                fabric: Fabric::new(),
                timeout: self.config.stage_timeout,
            }),
            built: false,
            _guard: ResourceGuard::new(&self.counters, Resource::Program),
        })
    }

    fn build_program(&self, program: &mut EmuProgram, _device: &EmuDevice) -> DriverResult<()> {
        if self.faults.read().fail_build {
            return Err(Self::injected("build_program", status::BUILD_PROGRAM_FAILURE, "build"));
        }
        program.built = true;
        self.counters.program_built();
        debug!(size = program.shared.manifest.size, "Built emulator program");
        Ok(())
    }

    fn create_kernel(&self, program: &EmuProgram, name: &str) -> DriverResult<EmuKernel> {
        if !program.built {
            return Err(DriverError::new(
                "create_kernel",
                status::INVALID_PROGRAM_EXECUTABLE,
                "program not built",
            ));
        }
        let desc = PIPELINE.iter().find(|d| d.kernel == name).ok_or_else(|| {
            DriverError::new(
                "create_kernel",
                status::INVALID_KERNEL_NAME,
                format!("no kernel named '{}'", name),
            )
        })?;
        Ok(EmuKernel {
            stage: desc.stage,
            name: desc.kernel,
            shared: Arc::clone(&program.shared),
            arg: None,
            _guard: ResourceGuard::new(&self.counters, Resource::Kernel),
        })
    }

    fn create_buffer(&self, _context: &EmuContext, size: usize) -> DriverResult<EmuBuffer> {
        if self.faults.read().fail_allocation || size == 0 {
            return Err(DriverError::new(
                "create_buffer",
                status::MEM_OBJECT_ALLOCATION_FAILURE,
                format!("cannot allocate {} bytes", size),
            ));
        }
        Ok(EmuBuffer {
            store: Arc::new(Mutex::new(vec![0; size])),
            size,
            _guard: ResourceGuard::with_bytes(&self.counters, Resource::Buffer, size),
        })
    }

    fn create_queue(
        &self,
        context: &EmuContext,
        _device: &EmuDevice,
        profiling: bool,
    ) -> DriverResult<EmuQueue> {
        if self.faults.read().fail_queue_creation {
            return Err(Self::injected("create_queue", status::OUT_OF_RESOURCES, "queue"));
        }
        Ok(EmuQueue {
            device: context.device,
            profiling,
            pending: Mutex::new(Vec::new()),
            last_kernel: Mutex::new(None),
            _guard: ResourceGuard::new(&self.counters, Resource::Queue),
        })
    }

    fn set_kernel_arg(
        &self,
        kernel: &mut EmuKernel,
        index: u32,
        arg: KernelArg<'_, EmuBuffer>,
    ) -> DriverResult<()> {
        if index != 0 {
            return Err(DriverError::new(
                "set_kernel_arg",
                status::INVALID_ARG_INDEX,
                format!("kernel {} has a single argument", kernel.name),
            ));
        }
        kernel.arg = Some(match arg {
            KernelArg::Buffer(buffer) => {
                let expected = kernel.shared.manifest.volume_bytes();
                if buffer.size != expected {
                    return Err(DriverError::new(
                        "set_kernel_arg",
                        status::INVALID_ARG_VALUE,
                        format!(
                            "kernel {} expects a {} byte buffer, got {}",
                            kernel.name, expected, buffer.size
                        ),
                    ));
                }
                ArgValue::Buffer(Arc::clone(&buffer.store))
            }
            KernelArg::Int(value) => ArgValue::Int(value),
        });
        Ok(())
    }

    fn enqueue_task(&self, queue: &EmuQueue, kernel: &EmuKernel) -> DriverResult<()> {
        if self.faults.read().fail_enqueue.as_deref() == Some(kernel.name) {
            return Err(Self::injected("enqueue_task", status::OUT_OF_RESOURCES, kernel.name));
        }

        let stage = kernel.stage;
        if stage == StageKind::Fetch {
            // A new run starts at fetch; anything still in the pipes is left
            // over from an aborted one.
            let stale = kernel.shared.fabric.flush();
            if stale > 0 {
                warn!(packets = stale, "Discarded stale pipe contents");
            }
        }
        let shared = Arc::clone(&kernel.shared);
        let arg = kernel.arg.clone();
        let profiling = queue.profiling;

        let handle = std::thread::Builder::new()
            .name(format!("emu-{}", kernel.name))
            .spawn(move || {
                let start = Instant::now();
                let result = run_stage(stage, &shared, arg);
                if profiling {
                    trace!(stage = %stage, elapsed_us = start.elapsed().as_micros() as u64, "Kernel finished");
                }
                result
            })
            .map_err(|e| DriverError::new("enqueue_task", status::OUT_OF_RESOURCES, e.to_string()))?;

        queue.pending.lock().push(PendingTask {
            kernel: kernel.name,
            handle,
        });
        *queue.last_kernel.lock() = Some(kernel.name);
        Ok(())
    }

    fn write_buffer(&self, queue: &EmuQueue, buffer: &mut EmuBuffer, data: &[u8]) -> DriverResult<()> {
        queue.join_pending(&self.counters)?;
        if self.faults.read().fail_write {
            return Err(Self::injected("write_buffer", status::OUT_OF_RESOURCES, "write"));
        }
        if data.len() > buffer.size {
            return Err(DriverError::new(
                "write_buffer",
                status::INVALID_VALUE,
                format!("{} bytes do not fit a {} byte buffer", data.len(), buffer.size),
            ));
        }
        buffer.store.lock()[..data.len()].copy_from_slice(data);
        self.counters.written(data.len());
        Ok(())
    }

    fn read_buffer(&self, queue: &EmuQueue, buffer: &EmuBuffer, data: &mut [u8]) -> DriverResult<()> {
        queue.join_pending(&self.counters)?;
        if self.faults.read().fail_read {
            return Err(Self::injected("read_buffer", status::OUT_OF_RESOURCES, "read"));
        }
        if data.len() > buffer.size {
            return Err(DriverError::new(
                "read_buffer",
                status::INVALID_VALUE,
                format!("{} bytes exceed a {} byte buffer", data.len(), buffer.size),
            ));
        }
        data.copy_from_slice(&buffer.store.lock()[..data.len()]);
        self.counters.read(data.len());
        Ok(())
    }

    fn finish(&self, queue: &EmuQueue) -> DriverResult<()> {
        let result = queue.join_pending(&self.counters);
        let last = *queue.last_kernel.lock();
        let faulted = self.faults.read().fail_finish.clone();
        if let (Some(kernel), Some(target)) = (last, faulted.as_deref()) {
            if kernel == target {
                return Err(Self::injected("finish", status::OUT_OF_RESOURCES, kernel));
            }
        }
        result
    }
}
