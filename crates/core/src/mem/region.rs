//! Mapped regions and their access permissions.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Access permissions of a mapped region.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u32 {
        /// Readable.
        const READ    = 1;
        /// Writable.
        const WRITE   = 2;
        /// Executable.
        const EXECUTE = 4;

        /// Readable and writable.
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
        /// Readable, writable and executable.
        const ALL = Self::READ.bits() | Self::WRITE.bits() | Self::EXECUTE.bits();
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = if self.contains(Self::READ) { 'r' } else { '-' };
        let w = if self.contains(Self::WRITE) { 'w' } else { '-' };
        let x = if self.contains(Self::EXECUTE) { 'x' } else { '-' };
        write!(f, "{r}{w}{x}")
    }
}

/// A contiguous block of the guest address space, mapped once with fixed permissions.
///
/// Regions are created by [`AddressSpace`](super::AddressSpace) and never resized or freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    start: u64,
    size: u64,
    perms: Permissions,
}

impl Region {
    pub(crate) const fn new(start: u64, size: u64, perms: Permissions) -> Self {
        Self { start, size, perms }
    }

    /// First address of the region.
    #[inline]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Size of the region in bytes.
    #[inline]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// One past the last address of the region.
    #[inline]
    pub const fn end(&self) -> u64 {
        self.start + self.size
    }

    /// Access permissions the region was mapped with.
    #[inline]
    pub const fn permissions(&self) -> Permissions {
        self.perms
    }

    /// Returns `true` if `address` lies in `[start, end)`.
    #[inline]
    pub const fn contains(&self, address: u64) -> bool {
        address >= self.start && address < self.end()
    }

    /// Returns `true` if `[address, address + len)` lies entirely inside the region.
    ///
    /// Zero-length ranges are contained when `address` itself is.
    pub const fn contains_range(&self, address: u64, len: u64) -> bool {
        if !self.contains(address) {
            return false;
        }
        match address.checked_add(len) {
            Some(end) => end <= self.end(),
            None => false,
        }
    }

    /// Returns the dump file name for this region: `0xSSSSSSSS-0xEEEEEEEE.bin`.
    pub fn file_name(&self) -> String {
        format!("{:#010x}-{:#010x}.bin", self.start, self.end())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#010x}, {:#010x}) {}", self.start, self.end(), self.perms)
    }
}
