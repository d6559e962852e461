//! Guest memory model.
//!
//! This module implements the region-based memory manager of an emulated process. It provides:
//! 1. **Regions:** Immutable `[start, end)` blocks with read/write/execute permissions.
//! 2. **Address Space:** A bump allocator that appends regions in increasing address order.
//! 3. **Views:** Bounds-checked byte, word and C-string access through the CPU core.
//! 4. **Buffers:** Lazily allocated host storage backing a region.

/// Host storage (mmap or `Vec`) for region contents.
pub mod buffer;

/// Region type and permission flags.
pub mod region;

/// The bump-allocated address space.
pub mod space;

/// Bounds-checked memory accessor.
pub mod view;

pub use buffer::RegionBuffer;
pub use region::{Permissions, Region};
pub use space::AddressSpace;
pub use view::MemoryView;
