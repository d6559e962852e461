//! 32-bit ARM emulation harness.
//!
//! This crate provides the machinery that sits underneath an instruction-level
//! emulator:
//! 1. **Memory:** A bump-allocated address space of non-overlapping regions with
//!    bounds-checked byte, word and C-string access.
//! 2. **CPU Contract:** The `Machine`/`Core` traits an external core implements, plus
//!    a software reference core with pluggable instruction semantics.
//! 3. **Sessions:** Stack-pointer seeding, the start/stop lifecycle, code hooks and
//!    cross-thread stop requests.
//! 4. **Dumps:** Every region written to its own file when a run completes.
//!
//! ```no_run
//! use armemu_core::{Config, Emulator, SoftCore};
//!
//! let mut emu = Emulator::new(&Config::default(), SoftCore::nop())?;
//! let outcome = emu.start(0x40_0000, 0x40_0010)?;
//! println!("{outcome:?}");
//! # Ok::<(), armemu_core::common::EmulatorError>(())
//! ```

/// Shared constants and error types.
pub mod common;
/// Session configuration (defaults and JSON loading).
pub mod config;
/// CPU core contract, registers and the software core.
pub mod cpu;
/// Regions, address space, memory views and region buffers.
pub mod mem;
/// Emulation sessions, hooks, stop handles, dumps and image loading.
pub mod sim;

/// Root configuration type; use `Config::default()` or `Config::from_file`.
pub use crate::config::Config;
/// Software core; `SoftCore::nop()` executes every instruction as a no-op.
pub use crate::cpu::SoftCore;
/// One emulation session; construct with `Emulator::new`.
pub use crate::sim::Emulator;
