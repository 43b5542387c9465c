use crate::error::{Result, SweepError};
use std::alloc::{Layout, alloc, dealloc};
use std::ffi::CStr;
use std::ptr::NonNull;

/// `dirent64` records carry a `u64` inode first, so the kernel expects the
/// buffer it writes into to be 8-byte aligned.
const DENT_ALIGN: usize = 8;

/**
 A heap buffer for `getdents64` output.

 Capacity is chosen at runtime from the directory's size estimate, so this is
 not the const-generic stack buffer a recursive walker would use; a single
 over-full directory can want hundreds of megabytes here. Allocation goes
 through `std::alloc` with an explicit 8-aligned layout, and a null return is
 surfaced as an error rather than an abort because buffer exhaustion is part
 of the enumeration error taxonomy.

 The `filled` watermark tracks how many bytes the kernel actually wrote; only
 that prefix is ever exposed as initialised memory.
*/
#[derive(Debug)]
pub struct DentBuffer {
    ptr: NonNull<u8>,
    capacity: usize,
    filled: usize,
}

impl DentBuffer {
    pub(crate) fn allocate(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(SweepError::BufferAlloc(capacity));
        }
        let layout = Layout::from_size_align(capacity, DENT_ALIGN)
            .map_err(|_| SweepError::BufferAlloc(capacity))?;
        // SAFETY: layout has non-zero size, checked above
        let raw = unsafe { alloc(layout) };
        let ptr = NonNull::new(raw).ok_or(SweepError::BufferAlloc(capacity))?;
        Ok(Self {
            ptr,
            capacity,
            filled: 0,
        })
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns a mutable pointer to the buffer's data, for the syscall to write through
    #[inline]
    pub(crate) const fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Records how many bytes the kernel wrote into this buffer.
    #[inline]
    pub(crate) const fn set_filled(&mut self, filled: usize) {
        debug_assert!(filled <= self.capacity, "kernel wrote past the buffer?!");
        self.filled = filled;
    }

    /// The kernel-written prefix of the buffer.
    #[inline]
    pub fn filled(&self) -> &[u8] {
        // SAFETY: the first `filled` bytes were written by getdents64 before
        // the watermark was moved, so this prefix is initialised
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.filled) }
    }
}

impl Drop for DentBuffer {
    fn drop(&mut self) {
        // SAFETY: same size/align pair that `allocate` validated and used
        unsafe {
            dealloc(
                self.ptr.as_ptr(),
                Layout::from_size_align_unchecked(self.capacity, DENT_ALIGN),
            );
        }
    }
}

/**
 Stable handle to one filename parsed in place from pool memory.

 Names are never copied out of the record buffers: the index stores these
 handles and resolves them through [`BufferPool::name`] on every comparison.
 A handle stays valid for the lifetime of the pool, because the pool is
 append-only and buffers are never freed individually.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameId {
    pub(crate) buffer: u32,
    pub(crate) offset: u32,
    pub(crate) len: u16,
}

/**
 Owns the lifetime of every buffer ever handed to the directory reader.

 Append-only by design: parsed names are borrowed in place from buffer
 memory via [`NameId`] handles, so no buffer may be released before the
 index traversal (and hence all printing/unlinking) has finished. The whole
 pool drops together at the end of the run.
*/
#[derive(Debug, Default)]
pub struct BufferPool {
    buffers: Vec<DentBuffer>,
}

impl BufferPool {
    #[inline]
    pub const fn new() -> Self {
        Self {
            buffers: Vec::new(),
        }
    }

    /// Number of buffers allocated so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Appends a fresh buffer of `capacity` bytes and returns its handle index.
    pub(crate) fn grow(&mut self, capacity: usize) -> Result<u32> {
        self.buffers
            .try_reserve(1)
            .map_err(|_| SweepError::BufferAlloc(capacity))?;
        let buffer = DentBuffer::allocate(capacity)?;
        let index = self.buffers.len() as u32;
        self.buffers.push(buffer);
        Ok(index)
    }

    #[inline]
    pub(crate) fn buffer_mut(&mut self, index: u32) -> &mut DentBuffer {
        &mut self.buffers[index as usize]
    }

    /// The kernel-written bytes of the buffer at `index`.
    #[inline]
    pub fn filled(&self, index: u32) -> &[u8] {
        self.buffers[index as usize].filled()
    }

    /// Resolves a handle to the name bytes it references (NUL excluded).
    #[inline]
    pub fn name(&self, id: NameId) -> &[u8] {
        let start = id.offset as usize;
        &self.filled(id.buffer)[start..start + id.len as usize]
    }

    /// Resolves a handle to its name as a C string, NUL terminator included.
    ///
    /// Delete mode hands this straight to `unlinkat` - the whole reason names
    /// stay resident in buffer memory is that the kernel already gave us them
    /// NUL-terminated and contiguous.
    #[inline]
    pub fn name_cstr(&self, id: NameId) -> &CStr {
        let start = id.offset as usize;
        let with_nul = &self.filled(id.buffer)[start..=start + id.len as usize];
        debug_assert!(
            with_nul.last() == Some(&0),
            "NameId does not point at a NUL-terminated name"
        );
        // SAFETY: handles are only minted by the record cursor, which located
        // the NUL at offset + len and rejected interior NULs by construction
        unsafe { CStr::from_bytes_with_nul_unchecked(with_nul) }
    }
}

#[cfg(test)]
impl BufferPool {
    /// Packs `names` NUL-terminated into a single fresh buffer, the same
    /// in-place layout the kernel produces, and hands back their handles.
    pub(crate) fn from_names(names: &[&[u8]]) -> (Self, Vec<NameId>) {
        let total: usize = names.iter().map(|name| name.len() + 1).sum();
        let mut pool = Self::new();
        let index = pool.grow(total.max(64)).unwrap();
        let buffer = pool.buffer_mut(index);
        let mut ids = Vec::with_capacity(names.len());
        let mut offset = 0usize;
        for name in names {
            // SAFETY: `total` covers every name plus its NUL and was reserved above
            unsafe {
                core::ptr::copy_nonoverlapping(
                    name.as_ptr(),
                    buffer.as_mut_ptr().add(offset),
                    name.len(),
                );
                buffer.as_mut_ptr().add(offset + name.len()).write(0);
            }
            ids.push(NameId {
                buffer: index,
                offset: offset as u32,
                len: name.len() as u16,
            });
            offset += name.len() + 1;
        }
        buffer.set_filled(offset);
        (pool, ids)
    }
}
