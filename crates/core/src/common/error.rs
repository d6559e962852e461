//! Error types for the emulation harness.
//!
//! This module defines one error enum per concern. It provides:
//! 1. **Allocation:** Invalid sizes and address-space exhaustion.
//! 2. **Memory:** Any access outside the mapped regions, including unterminated string scans.
//! 3. **Core:** Failures reported by the CPU core (mapping, fetch, execution).
//! 4. **Snapshot and Loading:** Filesystem and image-format failures.
//! 5. **Session:** `EmulatorError`, which every session operation returns.
//!
//! Nothing here is retried. A stop request is an event, not an error, and has no variant.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to allocate a new region.
///
/// The region list and cursor are untouched when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// A zero-byte region was requested.
    #[error("allocation size must be non-zero")]
    ZeroSize,

    /// The region would extend past the 32-bit address space.
    #[error("allocating {size:#x} bytes at {cursor:#010x} exceeds the 32-bit address space")]
    Exhausted {
        /// Allocation cursor at the time of the request.
        cursor: u64,
        /// Requested size in bytes.
        size: u64,
    },
}

/// An access that is not fully contained in a single mapped region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("access of {len:#x} bytes at {address:#010x} is outside the mapped regions")]
pub struct OutOfBoundsError {
    /// First address of the rejected access.
    pub address: u64,
    /// Length of the rejected access in bytes.
    pub len: u64,
}

impl OutOfBoundsError {
    /// Creates a bounds error for `len` bytes at `address`.
    pub const fn new(address: u64, len: u64) -> Self {
        Self { address, len }
    }
}

/// Errors raised by a CPU core implementation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A read or write touched memory the core has not mapped.
    #[error("unmapped access of {len:#x} bytes at {address:#010x}")]
    Unmapped {
        /// First faulting address.
        address: u64,
        /// Access length in bytes.
        len: u64,
    },

    /// A mapping request overlaps memory that is already mapped.
    #[error("mapping [{start:#010x}, {end:#010x}) overlaps an existing mapping")]
    Overlap {
        /// Start of the rejected mapping.
        start: u64,
        /// End (exclusive) of the rejected mapping.
        end: u64,
    },

    /// Instruction fetch from unmapped or non-executable memory.
    #[error("instruction fetch fault at {0:#010x}")]
    FetchFault(u64),

    /// The instruction executor rejected an instruction.
    #[error("cannot execute {word:#010x} at {pc:#010x}: {reason}")]
    Execute {
        /// Address of the instruction.
        pc: u64,
        /// Raw instruction word.
        word: u32,
        /// Executor-supplied description.
        reason: String,
    },

    /// Host memory for a mapping could not be obtained.
    #[error("failed to allocate backing memory: {0}")]
    Backing(#[from] io::Error),
}

/// Failure of a bounds-checked memory access.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// The range is not fully inside one mapped region.
    #[error(transparent)]
    OutOfBounds(#[from] OutOfBoundsError),

    /// The core rejected the access.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl MemoryError {
    /// Returns the bounds error, if this is one.
    pub const fn out_of_bounds(&self) -> Option<&OutOfBoundsError> {
        match self {
            Self::OutOfBounds(err) => Some(err),
            Self::Core(_) => None,
        }
    }
}

/// Failure while writing a region dump.
///
/// Files written before the failure are left on disk.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// A filesystem operation failed.
    #[error("dump I/O failed for {}: {source}", path.display())]
    Io {
        /// Path being created or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A region could not be read back.
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Failure while loading a program image.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The image file could not be read.
    #[error("could not read image {}: {source}", path.display())]
    Io {
        /// Path of the image.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The image looks like ELF but could not be parsed.
    #[error("malformed ELF image: {0}")]
    Elf(#[from] object::read::Error),

    /// The ELF image is not a 32-bit little-endian ARM executable.
    #[error("unsupported ELF image: {0}")]
    Unsupported(&'static str),

    /// A segment or raw image does not fit in the mapped regions.
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Session-level error returned by [`Emulator`](crate::sim::Emulator) operations.
#[derive(Debug, Error)]
pub enum EmulatorError {
    /// Region allocation failed.
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// A memory access failed.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// The CPU core reported an error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Writing the region dump failed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Loading a program image failed.
    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// `start` was called while a run is already in progress.
    #[error("emulation is already running")]
    AlreadyRunning,
}
