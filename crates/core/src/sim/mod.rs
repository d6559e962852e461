//! Emulation sessions.
//!
//! Ties the memory model to a CPU core. It provides:
//! 1. **Emulator:** Session setup, the start/stop lifecycle and dumps on completion.
//! 2. **Hooks:** Per-instruction callbacks with an explicit session handle.
//! 3. **Stop:** A thread-safe handle for halting a run.
//! 4. **Snapshots:** One file per region under a timestamped directory.
//! 5. **Loader:** Raw and ELF image loading into the binary region.

/// Session type and run lifecycle.
pub mod emulator;

/// Code hooks and their context.
pub mod hooks;

/// Program image loading.
pub mod loader;

/// Region dump writer.
pub mod snapshot;

/// Stop requests and run state.
pub mod stop;

pub use emulator::{Emulator, RunOutcome};
pub use hooks::{Hook, HookAction, HookContext, Hooks};
pub use loader::LoadedImage;
pub use snapshot::SnapshotWriter;
pub use stop::{RunState, StopHandle};
