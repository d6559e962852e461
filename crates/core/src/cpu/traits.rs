//! The CPU core contract.
//!
//! The harness never decodes instructions itself. It drives an injected core through
//! two traits:
//! 1. **`Machine`:** Mapping, raw memory access and register access. Object safe, so
//!    hooks and memory views can hold a `&mut dyn Machine`.
//! 2. **`Core`:** A `Machine` that can also run from a start address until an end
//!    address or a stop request.

use crate::common::error::CoreError;
use crate::mem::Permissions;
use crate::sim::hooks::HookAction;
use crate::sim::stop::StopHandle;

use super::reg::Register;

/// Memory and register access offered by a CPU core.
pub trait Machine {
    /// Maps `size` zeroed bytes at `address`.
    ///
    /// # Errors
    ///
    /// [`CoreError::Overlap`] if the range is already mapped, or
    /// [`CoreError::Backing`] if host memory is unavailable.
    fn map(&mut self, address: u64, size: u64, perms: Permissions) -> Result<(), CoreError>;

    /// Fills `buf` from guest memory at `address`.
    ///
    /// # Errors
    ///
    /// [`CoreError::Unmapped`] if any byte of the range is unmapped.
    fn read(&self, address: u64, buf: &mut [u8]) -> Result<(), CoreError>;

    /// Writes `data` to guest memory at `address`.
    ///
    /// # Errors
    ///
    /// [`CoreError::Unmapped`] if any byte of the range is unmapped.
    fn write(&mut self, address: u64, data: &[u8]) -> Result<(), CoreError>;

    /// Reads a register.
    fn reg_read(&self, reg: Register) -> u32;

    /// Writes a register.
    fn reg_write(&mut self, reg: Register, value: u32);
}

/// Why a call to [`Core::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// Execution reached the end address.
    ReachedEnd,
    /// A stop was requested through the [`StopHandle`] or a hook.
    Stopped,
}

/// Callback invoked by the core before each instruction, with the instruction address.
pub type CodeCallback<'a> = dyn FnMut(&mut dyn Machine, u64) -> HookAction + 'a;

/// A CPU core that can execute guest code.
pub trait Core: Machine {
    /// Runs from `begin` until the program counter equals `until` or a stop is requested.
    ///
    /// Blocks the calling thread. The core must poll `stop` before every
    /// instruction and call `on_code` with the address of each instruction
    /// before executing it. A [`HookAction::Stop`] from the callback ends the
    /// run as if `stop` had been raised.
    ///
    /// # Errors
    ///
    /// Any [`CoreError`] raised while fetching or executing.
    fn run(
        &mut self,
        begin: u64,
        until: u64,
        stop: &StopHandle,
        on_code: &mut CodeCallback<'_>,
    ) -> Result<RunExit, CoreError>;
}
