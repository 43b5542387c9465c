use crate::error::{Result, SweepError};
use crate::fs::{DentBuffer, MAX_BUFFER_CAPACITY, MIN_BUFFER_CAPACITY};
use core::mem::MaybeUninit;
use std::ffi::{CStr, CString, OsStr};
use std::io;
use std::os::unix::ffi::OsStrExt;

/**
  Wrapper for direct getdents64 syscalls

 # Safety
 - Requires a valid open directory descriptor
 - Buffer must be valid for writes of `capacity` bytes

 # Returns
 - Positive: Number of bytes read
 - 0: End of directory
 - Negative: Error code (check errno)
*/
#[inline]
#[allow(clippy::cast_possible_truncation)] //clong is isize on Unix
unsafe fn getdents64(fd: i32, buffer: *mut u8, capacity: usize) -> isize {
    // SAFETY: syscall has no implicit safety requirements beyond pointer
    // validity, which the caller guarantees
    unsafe { libc::syscall(libc::SYS_getdents64, fd, buffer, capacity) as isize }
}

/// A safe abstraction around file descriptors for internal IO
#[derive(Debug)]
#[repr(transparent)]
pub(crate) struct FileDes(pub(crate) i32);

impl FileDes {
    /// Checks if the file descriptor is currently open
    #[must_use]
    #[inline]
    pub(crate) fn is_open(&self) -> bool {
        // fcntl with F_GETFD returns -1 with errno EBADF if the fd is closed
        // SAFETY: always safe
        unsafe { libc::fcntl(self.0, libc::F_GETFD) != -1 }
    }
}

impl Drop for FileDes {
    #[inline]
    fn drop(&mut self) {
        debug_assert!(
            self.is_open(),
            "We expect the file descriptor to be open before closing"
        );
        // SAFETY: only closing HERE
        unsafe { libc::close(self.0) };
    }
}

/**
 The single directory handle a whole run revolves around.

 Opened once, then used for everything: the upfront metadata query that sizes
 the record buffers, every `getdents64` batch, the `fstatat` type fallback,
 and - in delete mode - every `unlinkat`. Resolving each per-name operation
 relative to this descriptor is what lets the traversal skip path
 re-resolution for millions of files.
*/
#[derive(Debug)]
pub struct DirHandle {
    fd: FileDes,
    size_hint: u64,
}

impl DirHandle {
    /**
     Opens `path` and validates it is a directory.

     The descriptor is opened with:
     - `O_CLOEXEC`: Close the file descriptor on exec
     - `O_DIRECTORY`: Fail if not a directory
     and the follow-up `fstat` both re-checks the mode and records `st_size`,
     the cheap estimate the buffer sizing policy is derived from.

     # Errors
     Any open/stat failure is fatal and mapped through the errno taxonomy
     (`EACCES`, `ENOTDIR`, `ENOENT`, ...).
    */
    pub fn open(path: &OsStr) -> Result<Self> {
        let c_path = CString::new(path.as_bytes()).map_err(|_| SweepError::InvalidPath)?;
        const FLAGS: i32 = libc::O_RDONLY | libc::O_DIRECTORY | libc::O_CLOEXEC;
        // SAFETY: the pointer is null terminated
        let raw_fd = unsafe { libc::open(c_path.as_ptr(), FLAGS) };
        if raw_fd < 0 {
            return_os_error!();
        }
        let fd = FileDes(raw_fd);

        let mut stat = MaybeUninit::<libc::stat>::uninit();
        // SAFETY: fd is open and stat points at writable storage for one struct stat
        if unsafe { libc::fstat(fd.0, stat.as_mut_ptr()) } < 0 {
            return_os_error!();
        }
        // SAFETY: fstat succeeded, so the struct is initialised
        let stat = unsafe { stat.assume_init() };
        if stat.st_mode & libc::S_IFMT != libc::S_IFDIR {
            return Err(SweepError::NotADirectory);
        }

        #[allow(clippy::cast_sign_loss)] //clamped below zero first
        let size_hint = stat.st_size.max(0) as u64;
        Ok(Self { fd, size_hint })
    }

    /**
     Capacity for each record buffer: the directory's on-disk footprint,
     doubled, clamped to sane bounds.

     The in-memory encoded size of the records is not linearly predictable
     from `st_size` (and on some filesystems `st_size` is near-useless), so
     the 2x factor plus the reader's keep-looping contract is what makes the
     estimate safe to be wrong.
    */
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] //clamped to MAX_BUFFER_CAPACITY
    pub fn buffer_capacity_hint(&self) -> usize {
        self.size_hint
            .saturating_mul(2)
            .clamp(MIN_BUFFER_CAPACITY as u64, MAX_BUFFER_CAPACITY as u64) as usize
    }

    /**
     Runs one `getdents64` batch into `buffer` and moves its filled watermark.

     Returns the number of bytes the kernel wrote; zero means the directory
     is exhausted. The caller must keep calling with fresh buffers until
     zero - a single call is not guaranteed to drain the directory even when
     the buffer is large.

     # Errors
     A negative return from the syscall is fatal ([`SweepError::Getdents`]):
     retrying could silently drop entries from the deletion set.
    */
    pub fn read_entries_into(&self, buffer: &mut DentBuffer) -> Result<usize> {
        debug_assert!(self.fd.is_open(), "We expect it to always be open");
        // SAFETY: fd is an open directory and the buffer is writable for its capacity
        let read = unsafe { getdents64(self.fd.0, buffer.as_mut_ptr(), buffer.capacity()) };
        if read < 0 {
            return Err(SweepError::Getdents(io::Error::last_os_error()));
        }
        #[allow(clippy::cast_sign_loss)] //checked non-negative above
        let read = read as usize;
        buffer.set_filled(read);
        Ok(read)
    }

    /// Unlinks `name` relative to this directory.
    #[inline]
    pub fn unlink_name(&self, name: &CStr) -> io::Result<()> {
        // SAFETY: fd is open and the name pointer is NUL terminated
        if unsafe { libc::unlinkat(self.fd.0, name.as_ptr(), 0) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Stats `name` relative to this directory and returns its raw mode.
    ///
    /// `AT_SYMLINK_NOFOLLOW` keeps the same semantics as the inline record
    /// tag: a symlink classifies as a symlink, not as its target. Failures
    /// collapse to `None`; the caller treats that as an unknown type.
    #[inline]
    pub fn mode_of(&self, name: &CStr) -> Option<libc::mode_t> {
        let mut stat = MaybeUninit::<libc::stat>::uninit();
        // SAFETY: fd is open, name is NUL terminated, stat is writable
        let rc = unsafe {
            libc::fstatat(
                self.fd.0,
                name.as_ptr(),
                stat.as_mut_ptr(),
                libc::AT_SYMLINK_NOFOLLOW,
            )
        };
        // SAFETY: fstatat succeeded, so the struct is initialised
        (rc == 0).then(|| unsafe { stat.assume_init() }.st_mode)
    }
}
