//! Bump allocator for the emulated address space.
//!
//! The address space hands out regions from a cursor that only moves forward. It provides:
//! 1. **Allocation:** `alloc`, or `propose` + `commit` when a core must map the region in between.
//! 2. **Enumeration:** The live regions in allocation order.
//! 3. **Lookup:** Finding the single region that contains an address or a range.
//!
//! There is no free. The whole space is dropped at the end of a session.

use crate::common::constants::ADDRESS_LIMIT;
use crate::common::error::{AllocationError, OutOfBoundsError};

use super::region::{Permissions, Region};

/// Region bookkeeping for one emulation session.
///
/// Invariant: `cursor == base + sum(region.size)`, and regions are sorted,
/// contiguous and non-overlapping.
#[derive(Debug, Clone)]
pub struct AddressSpace {
    base: u64,
    cursor: u64,
    regions: Vec<Region>,
}

impl AddressSpace {
    /// Creates an empty address space whose first region will start at `base`.
    pub const fn new(base: u64) -> Self {
        Self {
            base,
            cursor: base,
            regions: Vec::new(),
        }
    }

    /// Base address supplied at construction.
    pub const fn base(&self) -> u64 {
        self.base
    }

    /// Address the next region will start at.
    pub const fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Computes the region the next allocation of `size` bytes would produce.
    ///
    /// Nothing is recorded; pass the result to [`commit`](Self::commit) once it is mapped.
    ///
    /// # Errors
    ///
    /// [`AllocationError::ZeroSize`] for `size == 0` and [`AllocationError::Exhausted`]
    /// when the region would extend past the 32-bit address limit.
    pub const fn propose(&self, size: u64, perms: Permissions) -> Result<Region, AllocationError> {
        if size == 0 {
            return Err(AllocationError::ZeroSize);
        }
        let exhausted = AllocationError::Exhausted {
            cursor: self.cursor,
            size,
        };
        match self.cursor.checked_add(size) {
            Some(end) if end <= ADDRESS_LIMIT => Ok(Region::new(self.cursor, size, perms)),
            _ => Err(exhausted),
        }
    }

    /// Records a region obtained from [`propose`](Self::propose) and advances the cursor.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `region` does not start at the cursor.
    pub fn commit(&mut self, region: Region) {
        debug_assert_eq!(region.start(), self.cursor, "region committed out of order");
        self.cursor = region.end();
        self.regions.push(region);
    }

    /// Allocates `size` bytes with full permissions and returns the new region.
    ///
    /// # Errors
    ///
    /// See [`propose`](Self::propose).
    pub fn alloc(&mut self, size: u64) -> Result<Region, AllocationError> {
        self.alloc_with(size, Permissions::ALL)
    }

    /// Allocates `size` bytes with the given permissions.
    ///
    /// # Errors
    ///
    /// See [`propose`](Self::propose).
    pub fn alloc_with(&mut self, size: u64, perms: Permissions) -> Result<Region, AllocationError> {
        let region = self.propose(size, perms)?;
        self.commit(region);
        Ok(region)
    }

    /// Live regions, oldest first.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Total number of mapped bytes.
    pub const fn mapped_bytes(&self) -> u64 {
        self.cursor - self.base
    }

    /// Returns the region holding `address`, if any.
    pub fn find(&self, address: u64) -> Option<&Region> {
        if address < self.base || address >= self.cursor {
            return None;
        }
        let idx = self.regions.partition_point(|r| r.end() <= address);
        self.regions.get(idx).filter(|r| r.contains(address))
    }

    /// Returns the single region that fully contains `[address, address + len)`.
    ///
    /// # Errors
    ///
    /// [`OutOfBoundsError`] if the range is unmapped or straddles two regions.
    pub fn region_containing(&self, address: u64, len: u64) -> Result<&Region, OutOfBoundsError> {
        self.find(address)
            .filter(|r| r.contains_range(address, len))
            .ok_or(OutOfBoundsError::new(address, len))
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new(crate::common::constants::DEFAULT_BASE)
    }
}
