//! Host backing storage for a mapped region.
//!
//! On Unix systems the buffer is an anonymous `mmap`, so pages are only
//! materialised by the OS when touched. The default session maps 192 MiB and
//! most of it is never written; lazy allocation keeps startup cheap.

use std::io;
use std::slice;

/// Zero-initialised byte storage for one region.
pub struct RegionBuffer {
    ptr: *mut u8,
    size: usize,
    is_mmap: bool,
}

// SAFETY: the buffer exclusively owns its allocation and hands out access only
// through `&self`/`&mut self` slices.
unsafe impl Send for RegionBuffer {}
// SAFETY: shared access is read-only.
unsafe impl Sync for RegionBuffer {}

impl RegionBuffer {
    /// Allocates a zeroed buffer of `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the mapping cannot be created, or
    /// `InvalidInput` for a zero-sized buffer.
    pub fn new(size: usize) -> io::Result<Self> {
        if size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "region buffer size must be non-zero",
            ));
        }

        #[cfg(unix)]
        {
            use std::ptr;
            // SAFETY: anonymous private mapping with no address hint; the
            // result is checked against MAP_FAILED before use.
            let ptr = unsafe {
                libc::mmap(
                    ptr::null_mut(),
                    size,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                    -1,
                    0,
                )
            };

            if ptr == libc::MAP_FAILED {
                return Err(io::Error::last_os_error());
            }

            Ok(Self {
                ptr: ptr.cast::<u8>(),
                size,
                is_mmap: true,
            })
        }

        #[cfg(not(unix))]
        {
            let mut vec = vec![0u8; size];
            let ptr = vec.as_mut_ptr();
            std::mem::forget(vec);
            Ok(Self {
                ptr,
                size,
                is_mmap: false,
            })
        }
    }

    /// Size of the buffer in bytes.
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Always `false`; zero-sized buffers cannot be created.
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The whole buffer as a byte slice.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `ptr` is valid for `size` initialised bytes for the lifetime of `self`.
        unsafe { slice::from_raw_parts(self.ptr, self.size) }
    }

    /// The whole buffer as a mutable byte slice.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        unsafe { slice::from_raw_parts_mut(self.ptr, self.size) }
    }

    /// Copies `buf.len()` bytes starting at `offset` into `buf`.
    ///
    /// Returns `false` without copying if the range is out of bounds.
    pub fn read_into(&self, offset: usize, buf: &mut [u8]) -> bool {
        match offset.checked_add(buf.len()) {
            Some(end) if end <= self.size => {
                buf.copy_from_slice(&self.as_slice()[offset..end]);
                true
            }
            _ => false,
        }
    }

    /// Copies `data` into the buffer at `offset`.
    ///
    /// Returns `false` without writing if the range is out of bounds.
    pub fn write_from(&mut self, offset: usize, data: &[u8]) -> bool {
        match offset.checked_add(data.len()) {
            Some(end) if end <= self.size => {
                self.as_mut_slice()[offset..end].copy_from_slice(data);
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for RegionBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionBuffer")
            .field("size", &self.size)
            .field("is_mmap", &self.is_mmap)
            .finish()
    }
}

impl Drop for RegionBuffer {
    /// Unmaps the mmap'd memory, or rebuilds the `Vec` so it is freed.
    fn drop(&mut self) {
        if self.is_mmap {
            #[cfg(unix)]
            // SAFETY: `ptr`/`size` are exactly what `mmap` returned.
            unsafe {
                let _ = libc::munmap(self.ptr.cast::<libc::c_void>(), self.size);
            }
        } else {
            #[cfg(not(unix))]
            // SAFETY: `ptr`/`size` came from a forgotten `Vec<u8>` with equal length and capacity.
            unsafe {
                drop(Vec::from_raw_parts(self.ptr, self.size, self.size));
            }
        }
    }
}
