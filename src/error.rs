use libc::{EACCES, EINVAL, ELOOP, ENOENT, ENOTDIR};
use std::{fmt, io};

/// Generic result type for sweep operations
pub type Result<T> = core::result::Result<T, SweepError>;

/// An error type covering every way a sweep can die.
///
/// Every variant is fatal: the tool operates on potentially millions of
/// files, and a partially-enumerated or partially-ordered run would undermine
/// the whole point of building the sorted index. Nothing here is retried.
#[derive(Debug)]
pub enum SweepError {
    /// The supplied path was not fully qualified (must start with `/`).
    RelativePath,
    /// The delete toggle was set to something other than the exact opt-in value.
    DeleteToggle,
    /// A progress threshold variable held a non-numeric or zero value.
    Threshold(&'static str),
    /// Path contained an interior NUL or named nothing usable.
    InvalidPath,
    /// The supplied path exists but is not a directory.
    NotADirectory,
    AccessDenied(io::Error),
    TooManySymbolicLinks,
    /// Catch-all for OS failures with no more specific classification.
    OSerror(io::Error),
    /// A raw `getdents64` call failed mid-enumeration.
    Getdents(io::Error),
    /// The allocator refused a record buffer of the given capacity.
    BufferAlloc(usize),
    /// The ordered name index could not reserve room for another node.
    IndexCapacity,
    /// A record in a kernel-filled buffer did not parse, at the given offset.
    CorruptRecord(usize),
    /// A single unlink failed; carries the offending name and the cause.
    Unlink { name: Box<[u8]>, source: io::Error },
    /// Writing to the output sink failed.
    WriteError(io::Error),
}

impl From<io::Error> for SweepError {
    fn from(error: io::Error) -> Self {
        // map OS error codes to variants
        if let Some(code) = error.raw_os_error() {
            match code {
                EINVAL | ENOENT => Self::InvalidPath,
                ENOTDIR => Self::NotADirectory,
                ELOOP => Self::TooManySymbolicLinks,
                EACCES => Self::AccessDenied(error),
                _ => Self::OSerror(error),
            }
        } else {
            // handle non-OS errors
            Self::OSerror(error)
        }
    }
}

#[allow(clippy::pattern_type_mismatch)]
impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RelativePath => {
                write!(f, "directory must be fully-qualified (i.e., start with /)")
            }
            Self::DeleteToggle => write!(
                f,
                "if you'd like to delete files, set {} to 'delete', *EXACTLY*; \
                 if you did not intend to run deletes, unset the variable entirely",
                crate::config::DELETE_ENV
            ),
            Self::Threshold(var) => {
                write!(f, "{var} must be a positive integer")
            }
            Self::InvalidPath => write!(f, "invalid path, neither a file nor a directory"),
            Self::NotADirectory => write!(f, "the supplied path is not a directory"),
            Self::AccessDenied(e) => write!(f, "access denied: {e}"),
            Self::TooManySymbolicLinks => write!(f, "too many symbolic links"),
            Self::OSerror(e) => write!(f, "OS error: {e}"),
            Self::Getdents(e) => write!(f, "getdents64 failed: {e}"),
            Self::BufferAlloc(capacity) => {
                write!(f, "could not allocate a {capacity} byte record buffer")
            }
            Self::IndexCapacity => write!(f, "cannot acquire resources for the name index"),
            Self::CorruptRecord(offset) => {
                write!(f, "malformed directory record at buffer offset {offset}")
            }
            Self::Unlink { name, source } => {
                write!(
                    f,
                    "failed to delete {}: {source}",
                    String::from_utf8_lossy(name)
                )
            }
            Self::WriteError(e) => write!(f, "write error: {e}"),
        }
    }
}

#[allow(clippy::pattern_type_mismatch)]
impl std::error::Error for SweepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AccessDenied(e)
            | Self::OSerror(e)
            | Self::Getdents(e)
            | Self::WriteError(e) => Some(e),
            Self::Unlink { source, .. } => Some(source),
            _ => None,
        }
    }
}
