//! Address width and default session layout.

/// One past the highest guest address (the target is 32-bit ARM).
///
/// Host-side bookkeeping uses `u64` so a region ending exactly here is representable.
pub const ADDRESS_LIMIT: u64 = 1 << 32;

/// Default base address of the first allocated region.
pub const DEFAULT_BASE: u64 = 0x40_0000;

/// Default size of the binary image region (128 MiB).
pub const BIN_SIZE: u64 = 128 * 1024 * 1024;

/// Default size of the stack region (64 MiB).
pub const STACK_SIZE: u64 = 64 * 1024 * 1024;

/// Default directory that receives region dumps.
pub const DUMP_DIR: &str = "dump";

/// Width of an ARM-mode instruction in bytes.
pub const INSN_SIZE: u64 = 4;
