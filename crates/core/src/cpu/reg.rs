//! ARM register names and the register file used by the software core.
//!
//! 1. **Names:** `Register` covers `r0`-`r12`, `sp`, `lr`, `pc` and `cpsr`.
//! 2. **Storage:** `RegisterFile` holds the 16 general-purpose registers and the status register.
//! 3. **Observability:** A debug dump of every register through `tracing`.

use std::fmt;

use tracing::debug;

/// Architectural registers of a 32-bit ARM core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// General-purpose register `r0`.
    R0,
    /// General-purpose register `r1`.
    R1,
    /// General-purpose register `r2`.
    R2,
    /// General-purpose register `r3`.
    R3,
    /// General-purpose register `r4`.
    R4,
    /// General-purpose register `r5`.
    R5,
    /// General-purpose register `r6`.
    R6,
    /// General-purpose register `r7`.
    R7,
    /// General-purpose register `r8`.
    R8,
    /// General-purpose register `r9`.
    R9,
    /// General-purpose register `r10`.
    R10,
    /// General-purpose register `r11` (frame pointer).
    R11,
    /// General-purpose register `r12` (intra-procedure scratch).
    R12,
    /// Stack pointer (`r13`).
    Sp,
    /// Link register (`r14`).
    Lr,
    /// Program counter (`r15`).
    Pc,
    /// Current program status register.
    Cpsr,
}

impl Register {
    /// General-purpose registers in index order.
    pub const GPRS: [Self; 16] = [
        Self::R0,
        Self::R1,
        Self::R2,
        Self::R3,
        Self::R4,
        Self::R5,
        Self::R6,
        Self::R7,
        Self::R8,
        Self::R9,
        Self::R10,
        Self::R11,
        Self::R12,
        Self::Sp,
        Self::Lr,
        Self::Pc,
    ];

    /// Returns the general-purpose register `r{idx}`, if `idx < 16`.
    pub fn gpr(idx: usize) -> Option<Self> {
        Self::GPRS.get(idx).copied()
    }

    /// Index in the general-purpose file, or `None` for `cpsr`.
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::Cpsr => None,
            gpr => Some(gpr as usize),
        }
    }

    /// Conventional lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::R0 => "r0",
            Self::R1 => "r1",
            Self::R2 => "r2",
            Self::R3 => "r3",
            Self::R4 => "r4",
            Self::R5 => "r5",
            Self::R6 => "r6",
            Self::R7 => "r7",
            Self::R8 => "r8",
            Self::R9 => "r9",
            Self::R10 => "r10",
            Self::R11 => "r11",
            Self::R12 => "r12",
            Self::Sp => "sp",
            Self::Lr => "lr",
            Self::Pc => "pc",
            Self::Cpsr => "cpsr",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// ARM register file: sixteen general-purpose registers plus CPSR.
///
/// All registers start at zero except CPSR, which starts in user mode (`0x10`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    gpr: [u32; 16],
    cpsr: u32,
}

/// CPSR value for ARM state, user mode, interrupts enabled.
pub const CPSR_USER: u32 = 0x10;

impl RegisterFile {
    /// Creates a register file in its reset state.
    pub const fn new() -> Self {
        Self {
            gpr: [0; 16],
            cpsr: CPSR_USER,
        }
    }

    /// Reads a register.
    pub const fn read(&self, reg: Register) -> u32 {
        match reg.index() {
            Some(idx) => self.gpr[idx],
            None => self.cpsr,
        }
    }

    /// Writes a register.
    pub const fn write(&mut self, reg: Register, val: u32) {
        match reg.index() {
            Some(idx) => self.gpr[idx] = val,
            None => self.cpsr = val,
        }
    }

    /// Logs every register at debug level.
    pub fn dump(&self) {
        for reg in Register::GPRS {
            debug!("{:>4} = {:#010x}", reg.name(), self.read(reg));
        }
        debug!("cpsr = {:#010x}", self.cpsr);
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
