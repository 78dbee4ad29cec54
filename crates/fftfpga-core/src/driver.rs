//! Accelerator runtime capability surface.
//!
//! The engine never talks to a vendor runtime directly. It consumes the
//! fixed set of primitives below: discovery, context creation, program
//! build from a precompiled binary, buffer and queue creation, argument
//! binding, task enqueue, blocking copies and queue drain.
//!
//! Every handle is an owned value and is released by dropping it. Handles
//! must not outlive the context they were created from; the engine drops
//! them in dependency order (kernels, program, buffers, queues, context).

use thiserror::Error;

/// Status codes shared by the backends, numerically equal to their OpenCL
/// counterparts.
pub mod status {
    /// No device of the requested type.
    pub const DEVICE_NOT_FOUND: i32 = -1;
    /// Device memory could not be allocated.
    pub const MEM_OBJECT_ALLOCATION_FAILURE: i32 = -4;
    /// Device ran out of resources while executing.
    pub const OUT_OF_RESOURCES: i32 = -5;
    /// Program build failed.
    pub const BUILD_PROGRAM_FAILURE: i32 = -11;
    /// Invalid argument value.
    pub const INVALID_VALUE: i32 = -30;
    /// Binary rejected by the device.
    pub const INVALID_BINARY: i32 = -42;
    /// Program has not been built.
    pub const INVALID_PROGRAM_EXECUTABLE: i32 = -45;
    /// Kernel name not present in the program.
    pub const INVALID_KERNEL_NAME: i32 = -46;
    /// Argument index out of range.
    pub const INVALID_ARG_INDEX: i32 = -49;
    /// Argument value of the wrong kind.
    pub const INVALID_ARG_VALUE: i32 = -50;
    /// Kernel launched with unset arguments.
    pub const INVALID_KERNEL_ARGS: i32 = -52;
    /// Platform vendor not found.
    pub const PLATFORM_NOT_FOUND: i32 = -1001;
}

/// Error returned by a driver primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed with status {code}: {message}")]
pub struct DriverError {
    /// Primitive that failed.
    pub operation: &'static str,
    /// Runtime status code.
    pub code: i32,
    /// Human-readable detail.
    pub message: String,
}

impl DriverError {
    /// Create a driver error.
    pub fn new(operation: &'static str, code: i32, message: impl Into<String>) -> Self {
        Self {
            operation,
            code,
            message: message.into(),
        }
    }
}

/// Result type for driver primitives.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Value bound to a kernel argument slot.
#[derive(Debug)]
pub enum KernelArg<'a, B> {
    /// Device buffer.
    Buffer(&'a B),
    /// 32-bit integer scalar.
    Int(i32),
}

/// Accelerator runtime primitives consumed by the engine.
pub trait Driver {
    /// Platform handle.
    type Platform;
    /// Device handle.
    type Device;
    /// Execution context.
    type Context;
    /// Loaded configuration image.
    type Program;
    /// Kernel unit instantiated from a program.
    type Kernel;
    /// Device memory buffer.
    type Buffer;
    /// In-order execution channel.
    type Queue;

    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Enumerate installed platforms.
    fn platforms(&self) -> DriverResult<Vec<Self::Platform>>;

    /// Human-readable platform name.
    fn platform_name(&self, platform: &Self::Platform) -> DriverResult<String>;

    /// Enumerate every device of a platform.
    fn devices(&self, platform: &Self::Platform) -> DriverResult<Vec<Self::Device>>;

    /// Human-readable device name.
    fn device_name(&self, device: &Self::Device) -> DriverResult<String>;

    /// Create an execution context for one device.
    fn create_context(&self, device: &Self::Device) -> DriverResult<Self::Context>;

    /// Create a program from a precompiled device binary.
    fn create_program(
        &self,
        context: &Self::Context,
        device: &Self::Device,
        binary: &[u8],
    ) -> DriverResult<Self::Program>;

    /// Build a program for the device.
    fn build_program(&self, program: &mut Self::Program, device: &Self::Device)
        -> DriverResult<()>;

    /// Instantiate a named kernel from a built program.
    fn create_kernel(&self, program: &Self::Program, name: &str) -> DriverResult<Self::Kernel>;

    /// Allocate a read-write device buffer of `size` bytes.
    fn create_buffer(&self, context: &Self::Context, size: usize) -> DriverResult<Self::Buffer>;

    /// Create an in-order queue, optionally with per-operation profiling.
    fn create_queue(
        &self,
        context: &Self::Context,
        device: &Self::Device,
        profiling: bool,
    ) -> DriverResult<Self::Queue>;

    /// Bind a value to a kernel argument slot.
    fn set_kernel_arg(
        &self,
        kernel: &mut Self::Kernel,
        index: u32,
        arg: KernelArg<'_, Self::Buffer>,
    ) -> DriverResult<()>;

    /// Enqueue a kernel as a single work-item task.
    fn enqueue_task(&self, queue: &Self::Queue, kernel: &Self::Kernel) -> DriverResult<()>;

    /// Blocking copy of `data` into the start of `buffer`.
    fn write_buffer(
        &self,
        queue: &Self::Queue,
        buffer: &mut Self::Buffer,
        data: &[u8],
    ) -> DriverResult<()>;

    /// Blocking copy of the start of `buffer` into `data`.
    fn read_buffer(
        &self,
        queue: &Self::Queue,
        buffer: &Self::Buffer,
        data: &mut [u8],
    ) -> DriverResult<()>;

    /// Block until every operation enqueued on `queue` has completed.
    fn finish(&self, queue: &Self::Queue) -> DriverResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::new("clBuildProgram", status::BUILD_PROGRAM_FAILURE, "bad aocx");
        assert_eq!(
            err.to_string(),
            "clBuildProgram failed with status -11: bad aocx"
        );
    }
}
