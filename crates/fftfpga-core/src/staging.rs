//! Aligned host staging buffers.
//!
//! Device copies go through a 64-byte aligned host region so that the
//! runtime can use its fast DMA path. Callers' slices have no alignment
//! guarantee, so the executor copies into and out of one of these.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::error::{FftFpgaError, Result};
use crate::types::ComplexSample;

/// Alignment of staging buffers in bytes.
pub const STAGING_ALIGN: usize = 64;

/// Zero-initialized, 64-byte aligned host buffer of complex samples.
pub struct StagingBuffer<S: ComplexSample> {
    ptr: NonNull<S>,
    len: usize,
    layout: Layout,
    _marker: PhantomData<S>,
}

impl<S: ComplexSample> StagingBuffer<S> {
    /// Allocate `count` zeroed samples.
    pub fn new(count: usize) -> Result<Self> {
        let size = count.saturating_mul(std::mem::size_of::<S>());
        if count == 0 {
            return Err(FftFpgaError::HostAllocation { size });
        }

        let layout = Layout::array::<S>(count)
            .and_then(|l| l.align_to(STAGING_ALIGN))
            .map_err(|_| FftFpgaError::HostAllocation { size })?;

        // SAFETY: layout has non-zero size since count > 0 and S is not a ZST.
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw as *mut S).ok_or(FftFpgaError::HostAllocation { size })?;

        Ok(Self {
            ptr,
            len: count,
            layout,
            _marker: PhantomData,
        })
    }

    /// Allocate a staging buffer holding a copy of `data`.
    pub fn from_slice(data: &[S]) -> Result<Self> {
        let mut buf = Self::new(data.len())?;
        buf.as_mut_slice().copy_from_slice(data);
        Ok(buf)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; empty buffers cannot be allocated.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Samples as a slice.
    pub fn as_slice(&self) -> &[S] {
        // SAFETY: ptr is valid for len initialized (zeroed) samples; all-zero is
        // a valid bit pattern for Pod types.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Samples as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [S] {
        // SAFETY: see as_slice; &mut self guarantees exclusivity.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Raw bytes for device writes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }

    /// Raw bytes for device reads.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(self.as_mut_slice())
    }
}

impl<S: ComplexSample> Drop for StagingBuffer<S> {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated with this exact layout in new().
        unsafe {
            dealloc(self.ptr.as_ptr() as *mut u8, self.layout);
        }
    }
}

// SAFETY: StagingBuffer owns its allocation exclusively.
unsafe impl<S: ComplexSample> Send for StagingBuffer<S> {}
unsafe impl<S: ComplexSample> Sync for StagingBuffer<S> {}

impl<S: ComplexSample> std::fmt::Debug for StagingBuffer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingBuffer")
            .field("len", &self.len)
            .field("bytes", &self.layout.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::{Complex32, Complex64};

    #[test]
    fn test_alignment_and_zeroing() {
        let buf = StagingBuffer::<Complex32>::new(100).unwrap();
        assert_eq!(buf.as_slice().as_ptr() as usize % STAGING_ALIGN, 0);
        assert_eq!(buf.len(), 100);
        assert!(buf.as_slice().iter().all(|c| *c == Complex32::new(0.0, 0.0)));
        assert_eq!(buf.as_bytes().len(), 800);
    }

    #[test]
    fn test_from_slice() {
        let data: Vec<Complex64> = (0..16).map(|i| Complex64::new(i as f64, -(i as f64))).collect();
        let mut buf = StagingBuffer::from_slice(&data).unwrap();
        assert_eq!(buf.as_slice(), data.as_slice());

        buf.as_bytes_mut()[..16].fill(0);
        assert_eq!(buf.as_slice()[0], Complex64::new(0.0, 0.0));
        assert_eq!(buf.as_slice()[1], data[1]);
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(matches!(
            StagingBuffer::<Complex32>::new(0),
            Err(FftFpgaError::HostAllocation { size: 0 })
        ));
    }
}
