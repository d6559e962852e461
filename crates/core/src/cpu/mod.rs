//! CPU core contract and the bundled software core.
//!
//! 1. **Contract:** `Machine` and `Core`, the narrow interface the session drives.
//! 2. **Registers:** ARM register names and a register file.
//! 3. **Reference Core:** `SoftCore`, with instruction semantics supplied by an `Executor`.

/// ARM registers and register file.
pub mod reg;

/// Software implementation of the core contract.
pub mod soft;

/// `Machine` and `Core` traits.
pub mod traits;

pub use reg::{Register, RegisterFile};
pub use soft::{Executor, MachineState, NopExecutor, SoftCore};
pub use traits::{CodeCallback, Core, Machine, RunExit};
