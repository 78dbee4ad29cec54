//! In-process driver for unit tests.
//!
//! Tracks live handles, records the order of operations and moves data
//! through the pipeline unchanged: `fetch` picks up its bound input buffer
//! and `transpose` copies it into its bound output buffer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::driver::{status, Driver, DriverError, DriverResult, KernelArg};

#[derive(Default)]
struct Counters {
    contexts: AtomicUsize,
    programs: AtomicUsize,
    kernels: AtomicUsize,
    buffers: AtomicUsize,
    queues: AtomicUsize,
}

/// Live handle counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Live {
    pub contexts: usize,
    pub programs: usize,
    pub kernels: usize,
    pub buffers: usize,
    pub queues: usize,
}

pub struct Guard(Arc<Counters>, fn(&Counters) -> &AtomicUsize);

impl Guard {
    fn new(counters: &Arc<Counters>, field: fn(&Counters) -> &AtomicUsize) -> Self {
        field(counters).fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counters), field)
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        (self.1)(&self.0).fetch_sub(1, Ordering::SeqCst);
    }
}

/// Injected failures.
#[derive(Debug, Clone, Default)]
pub struct MockFaults {
    pub no_platform: bool,
    pub fail_context: bool,
    pub fail_build: bool,
    pub fail_kernel: Option<&'static str>,
    /// Fail buffer creation once this many buffers have been created.
    pub fail_buffer_after: Option<usize>,
    /// Fail queue creation once this many queues have been created.
    pub fail_queue_after: Option<usize>,
    pub fail_enqueue: Option<&'static str>,
    pub fail_finish: Option<&'static str>,
    pub fail_write: bool,
    pub fail_read: bool,
}

type Bytes = Arc<Mutex<Vec<u8>>>;

pub struct MockProgram {
    built: bool,
    _guard: Guard,
}

pub struct MockKernel {
    name: String,
    buffer: Option<Bytes>,
    int: Option<i32>,
    _guard: Guard,
}

pub struct MockBuffer {
    data: Bytes,
    _guard: Guard,
}

pub struct MockQueue {
    label: Mutex<Option<String>>,
    _guard: Guard,
}

/// Test driver.
pub struct MockDriver {
    counters: Arc<Counters>,
    faults: MockFaults,
    buffers_created: AtomicUsize,
    queues_created: AtomicUsize,
    staged: Mutex<Option<Bytes>>,
    log: Mutex<Vec<String>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::with_faults(MockFaults::default())
    }

    pub fn with_faults(faults: MockFaults) -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            faults,
            buffers_created: AtomicUsize::new(0),
            queues_created: AtomicUsize::new(0),
            staged: Mutex::new(None),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn live(&self) -> Live {
        let c = &self.counters;
        Live {
            contexts: c.contexts.load(Ordering::SeqCst),
            programs: c.programs.load(Ordering::SeqCst),
            kernels: c.kernels.load(Ordering::SeqCst),
            buffers: c.buffers.load(Ordering::SeqCst),
            queues: c.queues.load(Ordering::SeqCst),
        }
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn clear_log(&self) {
        self.log.lock().clear();
    }

    fn record(&self, entry: String) {
        self.log.lock().push(entry);
    }
}

impl Driver for MockDriver {
    type Platform = String;
    type Device = usize;
    type Context = Guard;
    type Program = MockProgram;
    type Kernel = MockKernel;
    type Buffer = MockBuffer;
    type Queue = MockQueue;

    fn name(&self) -> &str {
        "mock"
    }

    fn platforms(&self) -> DriverResult<Vec<String>> {
        if self.faults.no_platform {
            return Ok(vec!["Other Vendor".to_string()]);
        }
        Ok(vec![
            "Other Vendor".to_string(),
            "Intel(R) FPGA SDK for OpenCL(TM)".to_string(),
        ])
    }

    fn platform_name(&self, platform: &String) -> DriverResult<String> {
        Ok(platform.clone())
    }

    fn devices(&self, _platform: &String) -> DriverResult<Vec<usize>> {
        Ok(vec![0, 1])
    }

    fn device_name(&self, device: &usize) -> DriverResult<String> {
        Ok(format!("mock device {}", device))
    }

    fn create_context(&self, _device: &usize) -> DriverResult<Guard> {
        if self.faults.fail_context {
            return Err(DriverError::new("create_context", status::OUT_OF_RESOURCES, "injected"));
        }
        Ok(Guard::new(&self.counters, |c| &c.contexts))
    }

    fn create_program(&self, _ctx: &Guard, _dev: &usize, binary: &[u8]) -> DriverResult<MockProgram> {
        if binary.is_empty() {
            return Err(DriverError::new("create_program", status::INVALID_BINARY, "empty"));
        }
        Ok(MockProgram {
            built: false,
            _guard: Guard::new(&self.counters, |c| &c.programs),
        })
    }

    fn build_program(&self, program: &mut MockProgram, _dev: &usize) -> DriverResult<()> {
        if self.faults.fail_build {
            return Err(DriverError::new(
                "build_program",
                status::BUILD_PROGRAM_FAILURE,
                "injected",
            ));
        }
        program.built = true;
        Ok(())
    }

    fn create_kernel(&self, program: &MockProgram, name: &str) -> DriverResult<MockKernel> {
        if !program.built {
            return Err(DriverError::new(
                "create_kernel",
                status::INVALID_PROGRAM_EXECUTABLE,
                "not built",
            ));
        }
        if self.faults.fail_kernel == Some(name) {
            return Err(DriverError::new("create_kernel", status::INVALID_KERNEL_NAME, name));
        }
        Ok(MockKernel {
            name: name.to_string(),
            buffer: None,
            int: None,
            _guard: Guard::new(&self.counters, |c| &c.kernels),
        })
    }

    fn create_buffer(&self, _ctx: &Guard, size: usize) -> DriverResult<MockBuffer> {
        let created = self.buffers_created.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_buffer_after.is_some_and(|n| created >= n) {
            return Err(DriverError::new(
                "create_buffer",
                status::MEM_OBJECT_ALLOCATION_FAILURE,
                "injected",
            ));
        }
        Ok(MockBuffer {
            data: Arc::new(Mutex::new(vec![0; size])),
            _guard: Guard::new(&self.counters, |c| &c.buffers),
        })
    }

    fn create_queue(&self, _ctx: &Guard, _dev: &usize, _profiling: bool) -> DriverResult<MockQueue> {
        let created = self.queues_created.fetch_add(1, Ordering::SeqCst);
        if self.faults.fail_queue_after.is_some_and(|n| created >= n) {
            return Err(DriverError::new("create_queue", status::OUT_OF_RESOURCES, "injected"));
        }
        Ok(MockQueue {
            label: Mutex::new(None),
            _guard: Guard::new(&self.counters, |c| &c.queues),
        })
    }

    fn set_kernel_arg(
        &self,
        kernel: &mut MockKernel,
        index: u32,
        arg: KernelArg<'_, MockBuffer>,
    ) -> DriverResult<()> {
        if index != 0 {
            return Err(DriverError::new("set_kernel_arg", status::INVALID_ARG_INDEX, "slot"));
        }
        match arg {
            KernelArg::Buffer(buf) => kernel.buffer = Some(Arc::clone(&buf.data)),
            KernelArg::Int(v) => kernel.int = Some(v),
        }
        self.record(format!("arg {}", kernel.name));
        Ok(())
    }

    fn enqueue_task(&self, queue: &MockQueue, kernel: &MockKernel) -> DriverResult<()> {
        if self.faults.fail_enqueue == Some(kernel.name.as_str()) {
            return Err(DriverError::new("enqueue_task", status::OUT_OF_RESOURCES, "injected"));
        }
        match kernel.name.as_str() {
            "fetch" => *self.staged.lock() = kernel.buffer.clone(),
            "transpose" => {
                let (src, dst) = match (self.staged.lock().clone(), kernel.buffer.as_ref()) {
                    (Some(src), Some(dst)) => (src, Arc::clone(dst)),
                    _ => {
                        return Err(DriverError::new(
                            "enqueue_task",
                            status::INVALID_KERNEL_ARGS,
                            "transpose",
                        ))
                    }
                };
                let data = src.lock().clone();
                dst.lock().copy_from_slice(&data);
            }
            "fft3da" | "fft3db" if kernel.int.is_none() => {
                return Err(DriverError::new(
                    "enqueue_task",
                    status::INVALID_KERNEL_ARGS,
                    kernel.name.clone(),
                ))
            }
            _ => {}
        }
        *queue.label.lock() = Some(kernel.name.clone());
        match kernel.int {
            Some(flag) => self.record(format!("enqueue {} {}", kernel.name, flag)),
            None => self.record(format!("enqueue {}", kernel.name)),
        }
        Ok(())
    }

    fn write_buffer(&self, queue: &MockQueue, buffer: &mut MockBuffer, data: &[u8]) -> DriverResult<()> {
        if self.faults.fail_write {
            return Err(DriverError::new("write_buffer", status::OUT_OF_RESOURCES, "injected"));
        }
        buffer.data.lock()[..data.len()].copy_from_slice(data);
        *queue.label.lock() = Some("transfer".to_string());
        self.record("write".to_string());
        Ok(())
    }

    fn read_buffer(&self, _queue: &MockQueue, buffer: &MockBuffer, data: &mut [u8]) -> DriverResult<()> {
        if self.faults.fail_read {
            return Err(DriverError::new("read_buffer", status::OUT_OF_RESOURCES, "injected"));
        }
        let len = data.len();
        data.copy_from_slice(&buffer.data.lock()[..len]);
        self.record("read".to_string());
        Ok(())
    }

    fn finish(&self, queue: &MockQueue) -> DriverResult<()> {
        let label = queue.label.lock().clone().unwrap_or_else(|| "idle".to_string());
        if self.faults.fail_finish == Some(label.as_str()) {
            return Err(DriverError::new("finish", status::OUT_OF_RESOURCES, "injected"));
        }
        self.record(format!("finish {}", label));
        Ok(())
    }
}
