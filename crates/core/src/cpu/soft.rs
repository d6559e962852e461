//! Software reference core.
//!
//! `SoftCore` implements the core contract entirely in Rust. It provides:
//! 1. **Memory:** Sorted, non-overlapping mappings backed by [`RegionBuffer`]s.
//! 2. **Registers:** An ARM [`RegisterFile`].
//! 3. **Run Loop:** ARM-mode fetch from executable memory, code callbacks, stop polling.
//!
//! Instruction semantics are not part of the harness. Each fetched word is handed
//! to an [`Executor`], which returns the next program counter. [`NopExecutor`]
//! treats every instruction as a no-op.

use tracing::trace;

use crate::common::constants::INSN_SIZE;
use crate::common::error::CoreError;
use crate::mem::{Permissions, RegionBuffer};
use crate::sim::hooks::HookAction;
use crate::sim::stop::StopHandle;

use super::reg::{Register, RegisterFile};
use super::traits::{CodeCallback, Core, Machine, RunExit};

/// Instruction semantics plugged into a [`SoftCore`].
pub trait Executor {
    /// Executes `word`, fetched from `pc`, and returns the next program counter.
    ///
    /// # Errors
    ///
    /// [`CoreError::Execute`] for instructions the executor cannot handle, or
    /// any memory error raised through `machine`.
    fn execute(&mut self, machine: &mut dyn Machine, pc: u64, word: u32) -> Result<u64, CoreError>;
}

/// Executor that treats every instruction as a no-op and falls through to the next word.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopExecutor;

impl Executor for NopExecutor {
    fn execute(&mut self, _machine: &mut dyn Machine, pc: u64, _word: u32) -> Result<u64, CoreError> {
        Ok(pc + INSN_SIZE)
    }
}

#[derive(Debug)]
struct Mapping {
    start: u64,
    perms: Permissions,
    buffer: RegionBuffer,
}

impl Mapping {
    const fn end(&self) -> u64 {
        self.start + self.buffer.len() as u64
    }
}

/// Registers and mapped memory of a [`SoftCore`].
///
/// Kept apart from the executor so the run loop can lend it to hooks and
/// executors as a `&mut dyn Machine`.
#[derive(Debug, Default)]
pub struct MachineState {
    regs: RegisterFile,
    mappings: Vec<Mapping>,
}

impl MachineState {
    /// Register file.
    pub const fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    fn locate(&self, address: u64) -> Option<&Mapping> {
        let idx = self.mappings.partition_point(|m| m.end() <= address);
        self.mappings.get(idx).filter(|m| m.start <= address)
    }

    fn locate_mut(&mut self, address: u64) -> Option<&mut Mapping> {
        let idx = self.mappings.partition_point(|m| m.end() <= address);
        self.mappings.get_mut(idx).filter(|m| m.start <= address)
    }

    /// Returns `true` if every byte of `[address, address + len)` is mapped.
    fn covered(&self, address: u64, len: u64) -> bool {
        let Some(end) = address.checked_add(len) else {
            return false;
        };
        let mut cursor = address;
        while cursor < end {
            match self.locate(cursor) {
                Some(m) => cursor = m.end(),
                None => return false,
            }
        }
        true
    }

    fn fetch(&self, pc: u64) -> Result<u32, CoreError> {
        if pc % INSN_SIZE != 0 {
            return Err(CoreError::FetchFault(pc));
        }
        let mapping = self
            .locate(pc)
            .filter(|m| m.perms.contains(Permissions::EXECUTE) && pc + INSN_SIZE <= m.end())
            .ok_or(CoreError::FetchFault(pc))?;
        let offset = (pc - mapping.start) as usize;
        let mut word = [0u8; INSN_SIZE as usize];
        word.copy_from_slice(&mapping.buffer.as_slice()[offset..offset + INSN_SIZE as usize]);
        Ok(u32::from_le_bytes(word))
    }
}

impl Machine for MachineState {
    fn map(&mut self, address: u64, size: u64, perms: Permissions) -> Result<(), CoreError> {
        let end = address.saturating_add(size);
        if self.mappings.iter().any(|m| m.start < end && address < m.end()) {
            return Err(CoreError::Overlap { start: address, end });
        }
        let buffer = RegionBuffer::new(size as usize)?;
        let idx = self.mappings.partition_point(|m| m.start < address);
        self.mappings.insert(
            idx,
            Mapping {
                start: address,
                perms,
                buffer,
            },
        );
        Ok(())
    }

    fn read(&self, address: u64, buf: &mut [u8]) -> Result<(), CoreError> {
        let len = buf.len() as u64;
        if !self.covered(address, len) {
            return Err(CoreError::Unmapped { address, len });
        }
        let mut done = 0;
        while done < buf.len() {
            let cursor = address + done as u64;
            let m = self
                .locate(cursor)
                .ok_or(CoreError::Unmapped { address, len })?;
            let offset = (cursor - m.start) as usize;
            let n = (buf.len() - done).min(m.buffer.len() - offset);
            buf[done..done + n].copy_from_slice(&m.buffer.as_slice()[offset..offset + n]);
            done += n;
        }
        Ok(())
    }

    fn write(&mut self, address: u64, data: &[u8]) -> Result<(), CoreError> {
        let len = data.len() as u64;
        if !self.covered(address, len) {
            return Err(CoreError::Unmapped { address, len });
        }
        let mut done = 0;
        while done < data.len() {
            let cursor = address + done as u64;
            let m = self
                .locate_mut(cursor)
                .ok_or(CoreError::Unmapped { address, len })?;
            let offset = (cursor - m.start) as usize;
            let n = (data.len() - done).min(m.buffer.len() - offset);
            m.buffer.as_mut_slice()[offset..offset + n].copy_from_slice(&data[done..done + n]);
            done += n;
        }
        Ok(())
    }

    fn reg_read(&self, reg: Register) -> u32 {
        self.regs.read(reg)
    }

    fn reg_write(&mut self, reg: Register, value: u32) {
        self.regs.write(reg, value);
    }
}

/// Software core: owned memory and registers plus a pluggable [`Executor`].
#[derive(Debug, Default)]
pub struct SoftCore<X = NopExecutor> {
    state: MachineState,
    executor: X,
    trace: bool,
    executed: u64,
}

impl SoftCore<NopExecutor> {
    /// Creates a core whose instructions are all no-ops.
    pub fn nop() -> Self {
        Self::new(NopExecutor)
    }
}

impl<X: Executor> SoftCore<X> {
    /// Creates a core with empty memory, reset registers and the given executor.
    pub fn new(executor: X) -> Self {
        Self {
            state: MachineState::default(),
            executor,
            trace: false,
            executed: 0,
        }
    }

    /// Enables per-instruction `trace!` output.
    #[must_use]
    pub const fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Registers and memory.
    pub const fn state(&self) -> &MachineState {
        &self.state
    }

    /// The instruction executor.
    pub const fn executor(&self) -> &X {
        &self.executor
    }

    /// Number of instructions executed since construction.
    pub const fn executed(&self) -> u64 {
        self.executed
    }
}

impl<X> Machine for SoftCore<X> {
    fn map(&mut self, address: u64, size: u64, perms: Permissions) -> Result<(), CoreError> {
        self.state.map(address, size, perms)
    }

    fn read(&self, address: u64, buf: &mut [u8]) -> Result<(), CoreError> {
        self.state.read(address, buf)
    }

    fn write(&mut self, address: u64, data: &[u8]) -> Result<(), CoreError> {
        self.state.write(address, data)
    }

    fn reg_read(&self, reg: Register) -> u32 {
        self.state.reg_read(reg)
    }

    fn reg_write(&mut self, reg: Register, value: u32) {
        self.state.reg_write(reg, value);
    }
}

impl<X: Executor> Core for SoftCore<X> {
    fn run(
        &mut self,
        begin: u64,
        until: u64,
        stop: &StopHandle,
        on_code: &mut CodeCallback<'_>,
    ) -> Result<RunExit, CoreError> {
        self.state.regs.write(Register::Pc, begin as u32);

        loop {
            if stop.is_stop_requested() {
                return Ok(RunExit::Stopped);
            }
            let pc = u64::from(self.state.regs.read(Register::Pc));
            if pc == until {
                return Ok(RunExit::ReachedEnd);
            }

            if on_code(&mut self.state, pc) == HookAction::Stop || stop.is_stop_requested() {
                return Ok(RunExit::Stopped);
            }
            // A hook that moved PC skips the instruction it was called for.
            if u64::from(self.state.regs.read(Register::Pc)) != pc {
                continue;
            }

            let word = self.state.fetch(pc)?;
            if self.trace {
                trace!("{pc:#010x}: {word:08x}");
            }
            let next = self.executor.execute(&mut self.state, pc, word)?;
            self.state.regs.write(Register::Pc, next as u32);
            self.executed += 1;
        }
    }
}
