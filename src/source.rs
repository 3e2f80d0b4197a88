//! Where block memory comes from.
//!
//! An [`Arena`](crate::Arena) never talks to the system allocator directly:
//! each new block is acquired from a [`BlockSource`] and handed back to the
//! same source when the arena is dropped.
//!
//! ```text
//!   Arena ── acquire(capacity) ──► BlockSource ──► global allocator / mmap
//!     │                                 ▲
//!     └──────── release(ptr) ───────────┘   (once per block, on drop)
//! ```

use std::{alloc, ptr::NonNull};

/// Provider of backing memory for arena blocks.
///
/// # Safety
///
/// `acquire` must return a region of at least `size` writable bytes, all
/// zero, that stays valid and unaliased until it is passed to `release`.
pub unsafe trait BlockSource {
  /// Returns a zeroed region of `size` bytes, or `None` when the memory is
  /// not available. `size` is never zero.
  fn acquire(
    &self,
    size: usize,
  ) -> Option<NonNull<u8>>;

  /// Gives a region back.
  ///
  /// # Safety
  ///
  /// `ptr` must have come from `acquire` on this source with the same `size`,
  /// and must not be used afterwards.
  unsafe fn release(
    &self,
    ptr: NonNull<u8>,
    size: usize,
  );
}

/// Blocks from the global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapSource;

unsafe impl BlockSource for HeapSource {
  fn acquire(
    &self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    let layout = alloc::Layout::array::<u8>(size).ok()?;

    // SAFETY: `size` is non-zero.
    NonNull::new(unsafe { alloc::alloc_zeroed(layout) })
  }

  unsafe fn release(
    &self,
    ptr: NonNull<u8>,
    size: usize,
  ) {
    // `acquire` succeeded with this size, so the layout is valid.
    if let Ok(layout) = alloc::Layout::array::<u8>(size) {
      unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }
  }
}

/// Blocks mapped straight from the kernel with anonymous `mmap(2)`.
///
/// Every block is rounded up to whole pages, so blocks far smaller than a
/// page waste the difference.
#[cfg(unix)]
#[derive(Debug, Clone, Copy)]
pub struct MmapSource {
  page_size: usize,
}

#[cfg(unix)]
impl MmapSource {
  pub fn new() -> Self {
    // SAFETY: sysconf has no preconditions.
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };

    Self {
      page_size: usize::try_from(page_size)
        .ok()
        .filter(|size| size.is_power_of_two())
        .unwrap_or(4096),
    }
  }

  pub fn page_size(&self) -> usize {
    self.page_size
  }

  /// The length actually mapped for a block of `size` bytes.
  pub fn mapped_len(
    &self,
    size: usize,
  ) -> Option<usize> {
    size.checked_add(self.page_size - 1)?;
    Some(crate::align_to!(size, self.page_size))
  }
}

#[cfg(unix)]
impl Default for MmapSource {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(unix)]
unsafe impl BlockSource for MmapSource {
  fn acquire(
    &self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    let len = self.mapped_len(size)?;

    // SAFETY: a private anonymous mapping touches no existing memory.
    let addr = unsafe {
      libc::mmap(
        std::ptr::null_mut(),
        len,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if addr == libc::MAP_FAILED {
      return None;
    }

    NonNull::new(addr.cast())
  }

  unsafe fn release(
    &self,
    ptr: NonNull<u8>,
    size: usize,
  ) {
    if let Some(len) = self.mapped_len(size) {
      unsafe {
        libc::munmap(ptr.as_ptr().cast(), len);
      }
    }
  }
}
