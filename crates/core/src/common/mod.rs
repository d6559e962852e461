//! Common types and constants shared by the memory model, the CPU contract and the session.
//!
//! 1. **Constants:** Guest address width and the default session layout.
//! 2. **Error Handling:** One error enum per concern plus the session-level umbrella.

/// Guest address width and default session layout.
pub mod constants;

/// Error types for allocation, bounds, core, snapshot and loader failures.
pub mod error;

pub use constants::{ADDRESS_LIMIT, DEFAULT_BASE};
pub use error::{
    AllocationError, CoreError, EmulatorError, LoaderError, MemoryError, OutOfBoundsError,
    SnapshotError,
};
