//! Region dumps for offline inspection.
//!
//! A dump is one directory per completed run, named by the Unix timestamp in
//! seconds, holding one file per region:
//!
//! ```text
//! <root>/<unix_seconds>/0x00400000-0x08400000.bin
//! <root>/<unix_seconds>/0x08400000-0x0c400000.bin
//! ```
//!
//! Each file is the raw contents of its region. Files are written in allocation
//! order and nothing is rolled back on failure, so a failed dump may be partial.
//! Two dumps in the same second collide; the second one fails because the
//! directory already exists.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::common::error::SnapshotError;
use crate::mem::{MemoryView, Region};

/// Bytes read from the core per write.
const CHUNK_SIZE: u64 = 1024 * 1024;

/// Serialises every region of an address space to its own file.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotWriter {
    chunk_size: u64,
}

impl SnapshotWriter {
    /// Creates a writer that streams regions in 1 MiB chunks.
    pub const fn new() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
        }
    }

    /// Dumps every region under `root/<current unix seconds>/`.
    ///
    /// # Errors
    ///
    /// See [`dump_at`](Self::dump_at).
    pub fn dump(&self, view: &MemoryView<'_>, root: &Path) -> Result<PathBuf, SnapshotError> {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        self.dump_at(view, root, seconds)
    }

    /// Dumps every region under `root/<seconds>/` and returns that directory.
    ///
    /// `root` is created if missing; the timestamp directory must not exist yet.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::Io`] if a directory or file cannot be created or written,
    /// [`SnapshotError::Memory`] if a region cannot be read back.
    pub fn dump_at(
        &self,
        view: &MemoryView<'_>,
        root: &Path,
        seconds: u64,
    ) -> Result<PathBuf, SnapshotError> {
        fs::create_dir_all(root).map_err(|source| SnapshotError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let dir = root.join(seconds.to_string());
        fs::create_dir(&dir).map_err(|source| SnapshotError::Io {
            path: dir.clone(),
            source,
        })?;

        for region in view.space().regions() {
            self.write_region(view, region, &dir)?;
        }

        info!(
            "Dumped {} regions to {}",
            view.space().regions().len(),
            dir.display()
        );
        Ok(dir)
    }

    fn write_region(
        &self,
        view: &MemoryView<'_>,
        region: &Region,
        dir: &Path,
    ) -> Result<(), SnapshotError> {
        let path = dir.join(region.file_name());
        let io_err = |source: io::Error| SnapshotError::Io {
            path: path.clone(),
            source,
        };

        let mut out = BufWriter::new(File::create(&path).map_err(io_err)?);
        let mut buf = vec![0u8; self.chunk_size.min(region.size()) as usize];
        let mut cursor = region.start();
        while cursor < region.end() {
            let len = self.chunk_size.min(region.end() - cursor) as usize;
            view.read_into(cursor, &mut buf[..len])?;
            out.write_all(&buf[..len]).map_err(io_err)?;
            cursor += len as u64;
        }
        out.flush().map_err(io_err)?;

        debug!("Wrote {} ({} bytes)", path.display(), region.size());
        Ok(())
    }
}

impl Default for SnapshotWriter {
    fn default() -> Self {
        Self::new()
    }
}
