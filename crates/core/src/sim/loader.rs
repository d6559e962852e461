//! Program image loading.
//!
//! Puts a program into a session's memory before a run. It performs:
//! 1. **ELF images:** 32-bit little-endian ARM executables have each `PT_LOAD`
//!    segment copied to its virtual address; the entry point comes from the header.
//! 2. **Raw images:** Anything else is copied to the start of the binary region,
//!    which is also the entry point.
//!
//! Every byte goes through a bounds-checked [`MemoryView`](crate::mem::MemoryView),
//! so a segment outside the mapped regions fails instead of being dropped.

use std::fs;
use std::path::Path;

use object::read::elf::ElfFile32;
use object::{Architecture, Endianness, Object, ObjectSegment};
use tracing::{debug, info};

use crate::common::error::{LoaderError, MemoryError};
use crate::cpu::Core;

use super::emulator::Emulator;

const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

/// Where a loaded image lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadedImage {
    /// Address execution should start at.
    pub entry: u64,
    /// One past the highest loaded byte.
    pub end: u64,
    /// `true` if the image was parsed as ELF.
    pub elf: bool,
}

/// Reads an image from disk and loads it.
///
/// # Errors
///
/// [`LoaderError::Io`] if the file cannot be read, otherwise see [`load_image`].
pub fn load_file<C: Core>(emu: &mut Emulator<C>, path: &Path) -> Result<LoadedImage, LoaderError> {
    let data = fs::read(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Loading {} ({} bytes)", path.display(), data.len());
    load_image(emu, &data)
}

/// Loads an ELF or raw image into the session's memory.
///
/// # Errors
///
/// [`LoaderError::Elf`] / [`LoaderError::Unsupported`] for bad ELF images and
/// [`LoaderError::Memory`] when bytes land outside the mapped regions.
pub fn load_image<C: Core>(emu: &mut Emulator<C>, image: &[u8]) -> Result<LoadedImage, LoaderError> {
    if image.starts_with(ELF_MAGIC) {
        load_elf(emu, image)
    } else {
        load_raw(emu, image)
    }
}

fn load_raw<C: Core>(emu: &mut Emulator<C>, image: &[u8]) -> Result<LoadedImage, LoaderError> {
    let entry = emu.bin_region().start();
    emu.memory().write_bytes(entry, image)?;
    debug!("Raw image at {entry:#010x}");
    Ok(LoadedImage {
        entry,
        end: entry + image.len() as u64,
        elf: false,
    })
}

fn load_elf<C: Core>(emu: &mut Emulator<C>, image: &[u8]) -> Result<LoadedImage, LoaderError> {
    let elf = ElfFile32::<Endianness>::parse(image)?;
    if elf.architecture() != Architecture::Arm {
        return Err(LoaderError::Unsupported("not an ARM image"));
    }
    if !elf.is_little_endian() {
        return Err(LoaderError::Unsupported("big-endian images are not supported"));
    }

    let mut memory = emu.memory();
    let mut end = 0;
    for segment in elf.segments() {
        let data = segment.data()?;
        if segment.size() == 0 {
            continue;
        }
        let address = segment.address();
        // The tail past the file data (.bss) is already zero in freshly mapped
        // memory, but it must still be mapped.
        let _ = memory
            .enclosing(address, segment.size())
            .map_err(MemoryError::from)?;
        memory.write_bytes(address, data)?;
        debug!(
            "Segment {address:#010x}: {:#x} file bytes, {:#x} in memory",
            data.len(),
            segment.size()
        );
        end = end.max(address + segment.size());
    }

    Ok(LoadedImage {
        entry: elf.entry(),
        end,
        elf: true,
    })
}
