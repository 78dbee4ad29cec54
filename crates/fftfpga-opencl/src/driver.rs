//! opencl3-backed implementation of the driver primitives.

use std::ptr;

use opencl3::command_queue::{CommandQueue, CL_BLOCKING, CL_QUEUE_PROFILING_ENABLE};
use opencl3::context::Context;
use opencl3::device::{Device, CL_DEVICE_TYPE_ALL};
use opencl3::error_codes::ClError;
use opencl3::kernel::Kernel;
use opencl3::memory::{Buffer, ClMem, CL_MEM_READ_WRITE};
use opencl3::platform::{get_platforms, Platform};
use opencl3::program::Program;
use opencl3::types::cl_int;

use fftfpga_core::driver::{Driver, DriverError, DriverResult, KernelArg};
use fftfpga_core::{FftFpgaError, Result};

fn cl_error(operation: &'static str) -> impl Fn(ClError) -> DriverError {
    move |e| DriverError::new(operation, e.0, e.to_string())
}

/// Driver for boards exposed through an OpenCL ICD.
#[derive(Debug)]
pub struct OpenClDriver {
    build_options: String,
}

impl OpenClDriver {
    /// Create a driver, failing if no OpenCL platform is installed.
    pub fn new() -> Result<Self> {
        let platforms = get_platforms()
            .map_err(|e| FftFpgaError::BackendUnavailable(format!("OpenCL ICD: {}", e)))?;
        if platforms.is_empty() {
            return Err(FftFpgaError::BackendUnavailable(
                "no OpenCL platform installed".to_string(),
            ));
        }
        tracing::info!(platforms = platforms.len(), "OpenCL runtime available");
        Ok(Self {
            build_options: String::new(),
        })
    }

    /// Options passed to `clBuildProgram`.
    #[must_use]
    pub fn with_build_options(mut self, options: impl Into<String>) -> Self {
        self.build_options = options.into();
        self
    }
}

impl Driver for OpenClDriver {
    type Platform = Platform;
    type Device = Device;
    type Context = Context;
    type Program = Program;
    type Kernel = Kernel;
    type Buffer = Buffer<u8>;
    type Queue = CommandQueue;

    fn name(&self) -> &str {
        "opencl"
    }

    fn platforms(&self) -> DriverResult<Vec<Platform>> {
        get_platforms().map_err(cl_error("clGetPlatformIDs"))
    }

    fn platform_name(&self, platform: &Platform) -> DriverResult<String> {
        platform.name().map_err(cl_error("clGetPlatformInfo"))
    }

    fn devices(&self, platform: &Platform) -> DriverResult<Vec<Device>> {
        let ids = platform
            .get_devices(CL_DEVICE_TYPE_ALL)
            .map_err(cl_error("clGetDeviceIDs"))?;
        Ok(ids.into_iter().map(Device::new).collect())
    }

    fn device_name(&self, device: &Device) -> DriverResult<String> {
        device.name().map_err(cl_error("clGetDeviceInfo"))
    }

    fn create_context(&self, device: &Device) -> DriverResult<Context> {
        Context::from_device(device).map_err(cl_error("clCreateContext"))
    }

    fn create_program(
        &self,
        context: &Context,
        device: &Device,
        binary: &[u8],
    ) -> DriverResult<Program> {
        // SAFETY: the binary slice outlives the call; the runtime copies it.
        #[allow(unused_unsafe)]
        let program = unsafe { Program::create_from_binary(context, &[device.id()], &[binary]) };
        program.map_err(cl_error("clCreateProgramWithBinary"))
    }

    fn build_program(&self, program: &mut Program, device: &Device) -> DriverResult<()> {
        program
            .build(&[device.id()], &self.build_options)
            .map_err(cl_error("clBuildProgram"))
    }

    fn create_kernel(&self, program: &Program, name: &str) -> DriverResult<Kernel> {
        Kernel::create(program, name).map_err(cl_error("clCreateKernel"))
    }

    fn create_buffer(&self, context: &Context, size: usize) -> DriverResult<Buffer<u8>> {
        // SAFETY: no host pointer is supplied, so the runtime owns the storage.
        unsafe { Buffer::<u8>::create(context, CL_MEM_READ_WRITE, size, ptr::null_mut()) }
            .map_err(cl_error("clCreateBuffer"))
    }

    fn create_queue(
        &self,
        context: &Context,
        device: &Device,
        profiling: bool,
    ) -> DriverResult<CommandQueue> {
        let properties = if profiling { CL_QUEUE_PROFILING_ENABLE } else { 0 };
        // SAFETY: device belongs to context; properties are valid queue flags.
        #[allow(deprecated)]
        let queue = unsafe { CommandQueue::create(context, device.id(), properties) };
        queue.map_err(cl_error("clCreateCommandQueue"))
    }

    fn set_kernel_arg(
        &self,
        kernel: &mut Kernel,
        index: u32,
        arg: KernelArg<'_, Buffer<u8>>,
    ) -> DriverResult<()> {
        // SAFETY: each argument matches the kernel signature: a global
        // pointer for buffers and an int for the inverse flag.
        let result = match arg {
            KernelArg::Buffer(buffer) => unsafe { kernel.set_arg(index, &buffer.get()) },
            KernelArg::Int(value) => unsafe { kernel.set_arg(index, &(value as cl_int)) },
        };
        result.map_err(cl_error("clSetKernelArg"))
    }

    fn enqueue_task(&self, queue: &CommandQueue, kernel: &Kernel) -> DriverResult<()> {
        let global = [1usize];
        // SAFETY: a single work-item launch with all arguments bound.
        unsafe {
            queue.enqueue_nd_range_kernel(
                kernel.get(),
                1,
                ptr::null(),
                global.as_ptr(),
                ptr::null(),
                &[],
            )
        }
        .map(|_event| ())
        .map_err(cl_error("clEnqueueTask"))
    }

    fn write_buffer(
        &self,
        queue: &CommandQueue,
        buffer: &mut Buffer<u8>,
        data: &[u8],
    ) -> DriverResult<()> {
        // SAFETY: blocking write, so `data` is not referenced after return.
        unsafe { queue.enqueue_write_buffer(buffer, CL_BLOCKING, 0, data, &[]) }
            .map(|_event| ())
            .map_err(cl_error("clEnqueueWriteBuffer"))
    }

    fn read_buffer(
        &self,
        queue: &CommandQueue,
        buffer: &Buffer<u8>,
        data: &mut [u8],
    ) -> DriverResult<()> {
        // SAFETY: blocking read, so `data` is fully written before return.
        unsafe { queue.enqueue_read_buffer(buffer, CL_BLOCKING, 0, data, &[]) }
            .map(|_event| ())
            .map_err(cl_error("clEnqueueReadBuffer"))
    }

    fn finish(&self, queue: &CommandQueue) -> DriverResult<()> {
        queue.finish().map_err(cl_error("clFinish"))
    }
}
