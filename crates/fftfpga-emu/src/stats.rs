//! Resource accounting for the emulated device.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Kinds of driver handles the emulator tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resource {
    Context,
    Program,
    Kernel,
    Buffer,
    Queue,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    contexts: AtomicUsize,
    programs: AtomicUsize,
    kernels: AtomicUsize,
    buffers: AtomicUsize,
    buffer_bytes: AtomicUsize,
    queues: AtomicUsize,
    programs_built: AtomicU64,
    tasks_completed: AtomicU64,
    bytes_written: AtomicU64,
    bytes_read: AtomicU64,
}

impl Counters {
    fn live(&self, kind: Resource) -> &AtomicUsize {
        match kind {
            Resource::Context => &self.contexts,
            Resource::Program => &self.programs,
            Resource::Kernel => &self.kernels,
            Resource::Buffer => &self.buffers,
            Resource::Queue => &self.queues,
        }
    }

    pub(crate) fn program_built(&self) {
        self.programs_built.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn task_completed(&self) {
        self.tasks_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn written(&self, bytes: usize) {
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn read(&self, bytes: usize) {
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> EmulatorStats {
        EmulatorStats {
            live_contexts: self.contexts.load(Ordering::SeqCst),
            live_programs: self.programs.load(Ordering::SeqCst),
            live_kernels: self.kernels.load(Ordering::SeqCst),
            live_buffers: self.buffers.load(Ordering::SeqCst),
            live_buffer_bytes: self.buffer_bytes.load(Ordering::SeqCst),
            live_queues: self.queues.load(Ordering::SeqCst),
            programs_built: self.programs_built.load(Ordering::Relaxed),
            tasks_completed: self.tasks_completed.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
        }
    }
}

/// Keeps a handle counted as live until dropped.
#[derive(Debug)]
pub(crate) struct ResourceGuard {
    counters: Arc<Counters>,
    kind: Resource,
    bytes: usize,
}

impl ResourceGuard {
    pub(crate) fn new(counters: &Arc<Counters>, kind: Resource) -> Self {
        Self::with_bytes(counters, kind, 0)
    }

    pub(crate) fn with_bytes(counters: &Arc<Counters>, kind: Resource, bytes: usize) -> Self {
        counters.live(kind).fetch_add(1, Ordering::SeqCst);
        counters.buffer_bytes.fetch_add(bytes, Ordering::SeqCst);
        Self {
            counters: Arc::clone(counters),
            kind,
            bytes,
        }
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        self.counters.live(self.kind).fetch_sub(1, Ordering::SeqCst);
        self.counters
            .buffer_bytes
            .fetch_sub(self.bytes, Ordering::SeqCst);
        tracing::trace!(kind = ?self.kind, "Released emulator resource");
    }
}

/// Snapshot of emulator resource usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmulatorStats {
    /// Live execution contexts.
    pub live_contexts: usize,
    /// Live programs.
    pub live_programs: usize,
    /// Live kernel units.
    pub live_kernels: usize,
    /// Live device buffers.
    pub live_buffers: usize,
    /// Bytes held by live device buffers.
    pub live_buffer_bytes: usize,
    /// Live queues.
    pub live_queues: usize,
    /// Programs successfully built since creation.
    pub programs_built: u64,
    /// Kernel tasks that ran to completion.
    pub tasks_completed: u64,
    /// Bytes copied host to device.
    pub bytes_written: u64,
    /// Bytes copied device to host.
    pub bytes_read: u64,
}

impl EmulatorStats {
    /// Whether no handle of any kind is live.
    pub fn is_idle(&self) -> bool {
        self.live_contexts == 0
            && self.live_programs == 0
            && self.live_kernels == 0
            && self.live_buffers == 0
            && self.live_queues == 0
    }
}
