use std::alloc::{Layout, alloc_zeroed, dealloc};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::error::{Result, TrackError};

/// Alignment satisfying O_DIRECT on every logical block size we meet.
pub const DEFAULT_ALIGNMENT: usize = 4096;

/// One zero-initialised, page-aligned sector buffer.
///
/// The block reader allocates exactly one of these per region and reuses it
/// for every read. Allocation failure is reported instead of aborting.
pub struct SectorBuffer {
    ptr: NonNull<u8>,
    len: usize,
    layout: Layout,
}

impl SectorBuffer {
    pub fn try_new(len: usize) -> Result<Self> {
        Self::with_alignment(len, DEFAULT_ALIGNMENT)
    }

    pub fn with_alignment(len: usize, alignment: usize) -> Result<Self> {
        if len == 0 || !alignment.is_power_of_two() {
            return Err(TrackError::Allocation { size: len });
        }

        let capacity = len
            .checked_add(alignment - 1)
            .map(|n| n & !(alignment - 1))
            .ok_or(TrackError::Allocation { size: len })?;
        let layout = Layout::from_size_align(capacity, alignment)
            .map_err(|_| TrackError::Allocation { size: len })?;

        // SAFETY: layout has a non-zero size.
        let ptr = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or(TrackError::Allocation { size: len })?;

        Ok(Self { ptr, len, layout })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for `layout.size() >= len` initialised bytes.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn is_aligned(&self) -> bool {
        (self.ptr.as_ptr() as usize) % self.layout.align() == 0
    }
}

impl Drop for SectorBuffer {
    fn drop(&mut self) {
        // SAFETY: ptr came from alloc_zeroed with this exact layout.
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

impl Deref for SectorBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl DerefMut for SectorBuffer {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl std::fmt::Debug for SectorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectorBuffer")
            .field("len", &self.len)
            .field("alignment", &self.alignment())
            .finish()
    }
}
