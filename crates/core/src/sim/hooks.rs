//! Code hooks and the session handle they receive.
//!
//! Hooks are how syscall shims, monitors and tracers plug into a run. There is
//! no ambient emulator instance: every call receives a [`HookContext`] that
//! carries the memory, registers and stop control of the running session.

use std::fmt;

use tracing::info;

use crate::common::error::MemoryError;
use crate::cpu::{Machine, Register};
use crate::mem::{AddressSpace, MemoryView};

use super::stop::StopHandle;

/// What the core should do after a hook returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookAction {
    /// Execute the instruction (or resume at the new PC if the hook moved it).
    #[default]
    Continue,
    /// End the run before executing the instruction.
    Stop,
}

/// Session handle passed to hooks.
pub struct HookContext<'a> {
    machine: &'a mut dyn Machine,
    space: &'a AddressSpace,
    stop: &'a StopHandle,
}

impl<'a> HookContext<'a> {
    /// Bundles the pieces of a running session.
    pub fn new(machine: &'a mut dyn Machine, space: &'a AddressSpace, stop: &'a StopHandle) -> Self {
        Self {
            machine,
            space,
            stop,
        }
    }

    /// Bounds-checked view over the whole address space.
    pub fn memory(&mut self) -> MemoryView<'_> {
        MemoryView::new(self.space, &mut *self.machine)
    }

    /// Regions of the session, oldest first.
    pub fn space(&self) -> &AddressSpace {
        self.space
    }

    /// Reads a register.
    pub fn reg_read(&self, reg: Register) -> u32 {
        self.machine.reg_read(reg)
    }

    /// Writes a register. Writing PC redirects execution.
    pub fn reg_write(&mut self, reg: Register, value: u32) {
        self.machine.reg_write(reg, value);
    }

    /// Reads a NUL-terminated string.
    ///
    /// # Errors
    ///
    /// See [`MemoryView::read_cstring`].
    pub fn read_string(&mut self, address: u64) -> Result<String, MemoryError> {
        self.memory().read_cstring(address)
    }

    /// Requests that the run halt before the next instruction.
    ///
    /// Logs the current program counter. No dump is written for a stopped run.
    pub fn stop(&self) -> bool {
        info!(
            "Emulation stopping unexpectedly, PC at {:#010x}",
            self.machine.reg_read(Register::Pc)
        );
        self.stop.stop()
    }

    /// A handle that can stop this session later, possibly from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }
}

impl fmt::Debug for HookContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContext")
            .field("space", &self.space)
            .field("stop", &self.stop)
            .finish_non_exhaustive()
    }
}

/// A callback run before each instruction.
pub trait Hook {
    /// Called with the address of the instruction about to execute.
    fn on_code(&mut self, ctx: &mut HookContext<'_>, address: u64) -> HookAction;
}

impl<F> Hook for F
where
    F: FnMut(&mut HookContext<'_>, u64) -> HookAction,
{
    fn on_code(&mut self, ctx: &mut HookContext<'_>, address: u64) -> HookAction {
        self(ctx, address)
    }
}

/// Ordered collection of registered hooks.
#[derive(Default)]
pub struct Hooks {
    hooks: Vec<Box<dyn Hook + Send>>,
}

impl Hooks {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook; hooks fire in registration order.
    pub fn add(&mut self, hook: impl Hook + Send + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// Appends a closure hook.
    ///
    /// Same as [`add`](Self::add), but the `Fn` bound lets closure arguments be inferred.
    pub fn add_fn<F>(&mut self, hook: F)
    where
        F: FnMut(&mut HookContext<'_>, u64) -> HookAction + Send + 'static,
    {
        self.add(hook);
    }

    /// Number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns `true` if no hooks are registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs every hook for `address`.
    ///
    /// All hooks see the instruction even if an earlier one asked to stop.
    pub fn dispatch(&mut self, ctx: &mut HookContext<'_>, address: u64) -> HookAction {
        let mut action = HookAction::Continue;
        for hook in &mut self.hooks {
            if hook.on_code(ctx, address) == HookAction::Stop {
                action = HookAction::Stop;
            }
        }
        action
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").field("len", &self.hooks.len()).finish()
    }
}
