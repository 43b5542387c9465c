mod buffer;
mod dir_handle;
mod dirent;
mod file_type;

pub use buffer::{BufferPool, DentBuffer, NameId};
pub use dir_handle::DirHandle;
pub(crate) use dirent::{RawRecord, RecordCursor};
pub use file_type::FileType;

/// Floor for the `getdents64` buffer capacity.
///
/// The sizing estimate is the directory's `st_size` doubled, but tmpfs and
/// friends report tiny (sometimes zero) sizes for directories, and the kernel
/// returns `EINVAL` when the buffer cannot hold even one record. 16KiB always
/// holds a useful batch.
pub const MIN_BUFFER_CAPACITY: usize = 1 << 14;

/// Ceiling for a single buffer. An under-sized buffer only means the reader
/// loops and the pool grows by another buffer, which the design supports;
/// the cap is what keeps in-buffer offsets representable as `u32` handles.
pub const MAX_BUFFER_CAPACITY: usize = 1 << 30;

const_assert!(MIN_BUFFER_CAPACITY >= 4096, "Buffer size too small!");
const_assert!(MAX_BUFFER_CAPACITY <= u32::MAX as usize);
const_assert!(MIN_BUFFER_CAPACITY <= MAX_BUFFER_CAPACITY);
