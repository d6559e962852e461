//! Bounds-checked access to guest memory.
//!
//! A `MemoryView` pairs the address space (for validation) with the core (for
//! the bytes). Every access is checked against the region list before the core
//! is touched, so an out-of-bounds request never reaches the engine.

use std::fmt;

use crate::common::error::{MemoryError, OutOfBoundsError};
use crate::cpu::Machine;

use super::region::Region;
use super::space::AddressSpace;

/// Bytes fetched per core read while scanning for a string terminator.
const SCAN_CHUNK: u64 = 256;

/// Read/write accessor over the whole address space or a single region.
pub struct MemoryView<'a> {
    space: &'a AddressSpace,
    machine: &'a mut dyn Machine,
    scope: Option<Region>,
}

impl<'a> MemoryView<'a> {
    /// Creates a view over every mapped region.
    pub fn new(space: &'a AddressSpace, machine: &'a mut dyn Machine) -> Self {
        Self {
            space,
            machine,
            scope: None,
        }
    }

    /// Creates a view restricted to `region`.
    pub fn region(space: &'a AddressSpace, machine: &'a mut dyn Machine, region: Region) -> Self {
        Self {
            space,
            machine,
            scope: Some(region),
        }
    }

    /// The address space this view validates against.
    pub const fn space(&self) -> &AddressSpace {
        self.space
    }

    /// The region this view is bound to, if any.
    pub const fn scope(&self) -> Option<Region> {
        self.scope
    }

    /// Returns the region that fully contains `[address, address + len)` within this view.
    ///
    /// # Errors
    ///
    /// [`OutOfBoundsError`] if the range leaves the view.
    pub fn enclosing(&self, address: u64, len: u64) -> Result<Region, OutOfBoundsError> {
        match self.scope {
            Some(region) if region.contains_range(address, len) => Ok(region),
            Some(_) => Err(OutOfBoundsError::new(address, len)),
            None => self.space.region_containing(address, len).copied(),
        }
    }

    /// Fills `buf` with the bytes at `address`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::OutOfBounds`] if the range leaves the view, or the core's error.
    pub fn read_into(&self, address: u64, buf: &mut [u8]) -> Result<(), MemoryError> {
        let _ = self.enclosing(address, buf.len() as u64)?;
        self.machine.read(address, buf)?;
        Ok(())
    }

    /// Reads `len` bytes at `address`.
    ///
    /// # Errors
    ///
    /// See [`read_into`](Self::read_into).
    pub fn read_bytes(&self, address: u64, len: usize) -> Result<Vec<u8>, MemoryError> {
        let mut buf = vec![0u8; len];
        self.read_into(address, &mut buf)?;
        Ok(buf)
    }

    /// Writes `bytes` at `address`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::OutOfBounds`] if the range leaves the view, or the core's error.
    pub fn write_bytes(&mut self, address: u64, bytes: &[u8]) -> Result<(), MemoryError> {
        let _ = self.enclosing(address, bytes.len() as u64)?;
        self.machine.write(address, bytes)?;
        Ok(())
    }

    /// Reads a little-endian word.
    ///
    /// # Errors
    ///
    /// See [`read_into`](Self::read_into).
    pub fn read_u32(&self, address: u64) -> Result<u32, MemoryError> {
        let mut word = [0u8; 4];
        self.read_into(address, &mut word)?;
        Ok(u32::from_le_bytes(word))
    }

    /// Writes a little-endian word.
    ///
    /// # Errors
    ///
    /// See [`write_bytes`](Self::write_bytes).
    pub fn write_u32(&mut self, address: u64, value: u32) -> Result<(), MemoryError> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    /// Reads a NUL-terminated string starting at `address`.
    ///
    /// Each byte is decoded as one character (Latin-1); the terminator is not
    /// included. The scan never leaves the region holding `address`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::OutOfBounds`] if `address` is unmapped or the region
    /// ends before a terminator is found.
    pub fn read_cstring(&self, address: u64) -> Result<String, MemoryError> {
        let region = self.enclosing(address, 1)?;
        let mut text = String::new();
        let mut cursor = address;
        let mut chunk = [0u8; SCAN_CHUNK as usize];

        while cursor < region.end() {
            let len = SCAN_CHUNK.min(region.end() - cursor);
            let buf = &mut chunk[..len as usize];
            self.machine.read(cursor, buf)?;
            if let Some(nul) = buf.iter().position(|&b| b == 0) {
                text.extend(buf[..nul].iter().map(|&b| char::from(b)));
                return Ok(text);
            }
            text.extend(buf.iter().map(|&b| char::from(b)));
            cursor += len;
        }

        Err(OutOfBoundsError::new(address, region.end() - address + 1).into())
    }
}

impl fmt::Debug for MemoryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryView")
            .field("space", &self.space)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
