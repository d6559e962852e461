//! Emulation session: address space, core, hooks and run lifecycle.
//!
//! An `Emulator` owns everything one session needs. It performs:
//! 1. **Setup:** Maps the binary region and the stack region, then points SP at the
//!    middle of the stack so emulated code has headroom in both directions.
//! 2. **Run:** `start` writes PC, hands control to the core and waits for it to reach
//!    the end address or honour a stop request.
//! 3. **Dump:** A run that reaches its end address dumps every region to disk.
//!    A stopped run does not.
//!
//! State machine: `Idle -> Running -> {Completed, Stopped, Faulted}`. Any state but
//! `Running` may start a new run.

use std::path::PathBuf;

use tracing::{debug, info, info_span, warn};

use crate::common::error::{EmulatorError, MemoryError};
use crate::config::{Config, DumpConfig};
use crate::cpu::{Core, Machine, Register, RunExit};
use crate::mem::{AddressSpace, MemoryView, Permissions, Region};

use super::hooks::{Hook, HookAction, HookContext, Hooks};
use super::snapshot::SnapshotWriter;
use super::stop::{RunState, StopHandle};

/// How a call to [`Emulator::start`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Execution reached the end address.
    Completed {
        /// Dump directory, or `None` when dumps are disabled.
        dump: Option<PathBuf>,
    },
    /// Execution was halted by a stop request.
    Stopped {
        /// Program counter at the point the core halted.
        pc: u32,
    },
}

/// One emulation session.
#[derive(Debug)]
pub struct Emulator<C: Core> {
    core: C,
    space: AddressSpace,
    hooks: Hooks,
    stop: StopHandle,
    bin: Region,
    stack: Region,
    dump: DumpConfig,
    snapshots: SnapshotWriter,
}

impl<C: Core> Emulator<C> {
    /// Builds a session on `core`: maps the binary and stack regions and seeds SP.
    ///
    /// # Errors
    ///
    /// [`EmulatorError::Allocation`] if the layout does not fit in 32 bits, or
    /// [`EmulatorError::Core`] if the core cannot map a region.
    pub fn new(config: &Config, mut core: C) -> Result<Self, EmulatorError> {
        let mut space = AddressSpace::new(config.memory.base);
        let bin = map_region(&mut space, &mut core, config.memory.bin_size)?;
        let stack = map_region(&mut space, &mut core, config.memory.stack_size)?;

        // Regions end at or below 2^32, so the midpoint fits a register.
        let sp = stack.start() + stack.size() / 2;
        core.reg_write(Register::Sp, sp as u32);
        debug!("SP seeded to {sp:#010x}");

        Ok(Self {
            core,
            space,
            hooks: Hooks::new(),
            stop: StopHandle::new(),
            bin,
            stack,
            dump: config.dump.clone(),
            snapshots: SnapshotWriter::new(),
        })
    }

    /// Runs from `start_address` until the core reaches `end_address` or a stop is requested.
    ///
    /// Blocks until the run ends. On completion the regions are dumped (if enabled);
    /// a stopped run is reported but not dumped.
    ///
    /// # Errors
    ///
    /// [`EmulatorError::AlreadyRunning`] if a run is in progress,
    /// [`EmulatorError::Core`] if the core faults (the state becomes
    /// [`RunState::Faulted`]), or [`EmulatorError::Snapshot`] if the dump fails.
    pub fn start(&mut self, start_address: u32, end_address: u32) -> Result<RunOutcome, EmulatorError> {
        if self.stop.state() == RunState::Running {
            return Err(EmulatorError::AlreadyRunning);
        }

        info!(
            "Emulation starting at {start_address:#010x} with base {:#010x}",
            self.space.base()
        );
        let span = info_span!("emulation", end = %format!("{end_address:#010x}"));
        let _enter = span.enter();

        self.core.reg_write(Register::Pc, start_address);
        self.stop.begin_run();

        let exit = {
            let Self {
                core,
                space,
                hooks,
                stop,
                ..
            } = self;
            let space: &AddressSpace = space;
            let stop: &StopHandle = stop;
            core.run(
                u64::from(start_address),
                u64::from(end_address),
                stop,
                &mut |machine: &mut dyn Machine, address: u64| -> HookAction {
                    let mut ctx = HookContext::new(machine, space, stop);
                    hooks.dispatch(&mut ctx, address)
                },
            )
        };

        match exit {
            Ok(RunExit::ReachedEnd) => {
                self.stop.finish_run(RunState::Completed);
                info!("Emulation ended");
                let dump = if self.dump.enabled {
                    Some(self.debug_dump()?)
                } else {
                    None
                };
                Ok(RunOutcome::Completed { dump })
            }
            Ok(RunExit::Stopped) => {
                self.stop.finish_run(RunState::Stopped);
                let pc = self.core.reg_read(Register::Pc);
                info!("Emulation stopped, PC at {pc:#010x}");
                Ok(RunOutcome::Stopped { pc })
            }
            Err(err) => {
                self.stop.finish_run(RunState::Faulted);
                warn!("Emulation faulted: {err}");
                Err(err.into())
            }
        }
    }

    /// Dumps every region under the configured dump root and returns the dump directory.
    ///
    /// # Errors
    ///
    /// [`EmulatorError::Snapshot`] if the dump cannot be written.
    pub fn debug_dump(&mut self) -> Result<PathBuf, EmulatorError> {
        let view = MemoryView::new(&self.space, &mut self.core);
        Ok(self.snapshots.dump(&view, &self.dump.root)?)
    }

    /// Like [`debug_dump`](Self::debug_dump) with an explicit timestamp for the directory name.
    ///
    /// # Errors
    ///
    /// [`EmulatorError::Snapshot`] if the dump cannot be written.
    pub fn debug_dump_at(&mut self, seconds: u64) -> Result<PathBuf, EmulatorError> {
        let view = MemoryView::new(&self.space, &mut self.core);
        Ok(self.snapshots.dump_at(&view, &self.dump.root, seconds)?)
    }

    /// Maps `size` more bytes after the last region and returns their start address.
    ///
    /// # Errors
    ///
    /// [`EmulatorError::Allocation`] for a zero size or exhaustion,
    /// [`EmulatorError::Core`] if the core refuses the mapping.
    pub fn alloc(&mut self, size: u64) -> Result<u64, EmulatorError> {
        map_region(&mut self.space, &mut self.core, size).map(|region| region.start())
    }

    /// Live regions in allocation order.
    pub fn allocations(&self) -> &[Region] {
        self.space.regions()
    }

    /// The session's address space.
    pub const fn space(&self) -> &AddressSpace {
        &self.space
    }

    /// Base address of the session.
    pub const fn base(&self) -> u64 {
        self.space.base()
    }

    /// Region holding the program image.
    pub const fn bin_region(&self) -> Region {
        self.bin
    }

    /// Stack region.
    pub const fn stack_region(&self) -> Region {
        self.stack
    }

    /// Bounds-checked view over every region.
    pub fn memory(&mut self) -> MemoryView<'_> {
        MemoryView::new(&self.space, &mut self.core)
    }

    /// Reads a NUL-terminated string from guest memory.
    ///
    /// # Errors
    ///
    /// See [`MemoryView::read_cstring`].
    pub fn read_string(&mut self, address: u64) -> Result<String, MemoryError> {
        self.memory().read_cstring(address)
    }

    /// Reads a register.
    pub fn reg_read(&self, reg: Register) -> u32 {
        self.core.reg_read(reg)
    }

    /// Writes a register.
    pub fn reg_write(&mut self, reg: Register, value: u32) {
        self.core.reg_write(reg, value);
    }

    /// Registers a hook that runs before every instruction.
    pub fn add_hook(&mut self, hook: impl Hook + Send + 'static) {
        self.hooks.add(hook);
    }

    /// Registers a closure hook.
    pub fn on_code<F>(&mut self, hook: F)
    where
        F: FnMut(&mut HookContext<'_>, u64) -> HookAction + Send + 'static,
    {
        self.hooks.add_fn(hook);
    }

    /// A handle that can stop a run from any thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.stop.state()
    }

    /// Dump settings in effect.
    pub const fn dump_config(&self) -> &DumpConfig {
        &self.dump
    }

    /// Mutable dump settings, e.g. to redirect or disable the next dump.
    pub const fn dump_config_mut(&mut self) -> &mut DumpConfig {
        &mut self.dump
    }

    /// The CPU core.
    pub const fn core(&self) -> &C {
        &self.core
    }

    /// Consumes the session and returns the core.
    pub fn into_core(self) -> C {
        self.core
    }
}

/// Maps one region through the core, recording it only once the core accepted it.
fn map_region<C: Core>(
    space: &mut AddressSpace,
    core: &mut C,
    size: u64,
) -> Result<Region, EmulatorError> {
    let region = space.propose(size, Permissions::ALL)?;
    core.map(region.start(), region.size(), region.permissions())?;
    space.commit(region);
    debug!("Mapped {region}");
    Ok(region)
}
