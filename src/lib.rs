//! Bulk directory sweeper.
//!
//! Most filesystems keep directory entries in a btree-like index, so removing
//! files in raw enumeration order forces the kernel into repeated rebalancing
//! of that index. `dsweep` reads the raw `getdents64` records of a single
//! directory, sorts the regular-file names into an in-memory ordered index,
//! and replays them against the filesystem in ascending order instead, which
//! is where the bulk-unlink throughput comes from.
//!
//! The library half exposes the pieces the binary is built from: the buffer
//! pool that owns every byte handed back by the kernel ([`BufferPool`]), the
//! directory handle all relative operations resolve against ([`DirHandle`]),
//! the sorted name index ([`NameIndex`]) and the traversal-driven action
//! engine ([`ActionEngine`]).

#![allow(clippy::multiple_unsafe_ops_per_block)] //annoying convention
#![allow(clippy::must_use_candidate)]

#[cfg(not(any(target_os = "linux", target_os = "android")))]
compile_error!("dsweep relies on the stable getdents64 ABI and only builds on Linux/Android");

#[macro_use]
mod macros;

mod config;
mod engine;
mod error;
pub mod fs;
mod index;
mod progress;
mod scan;

pub use config::RunConfig;
pub use engine::{ActionEngine, EngineState, Mode};
pub use error::{Result, SweepError};
pub use fs::{BufferPool, DentBuffer, DirHandle, FileType, NameId};
pub use index::{NameIndex, SortOrder};
pub use progress::ProgressReporter;
pub use scan::scan_directory;


//this allocator is more efficient than jemalloc through my testing
#[cfg(all(feature = "mimalloc", any(target_os = "linux", target_os = "android")))]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;
