use std::{mem, ptr::NonNull, slice};

/// Bytes accounted to every block for its bookkeeping: the link to the next
/// block and the `used` counter.
pub const BLOCK_HEADER_SIZE: usize = mem::size_of::<*mut u8>() + mem::size_of::<usize>();

/// One link of the arena chain: a fixed region of `capacity` bytes of which
/// the first `used` have been handed out.
pub(crate) struct Block {
  data: NonNull<u8>,
  capacity: usize,
  used: usize,
}

impl Block {
  pub fn new(
    data: NonNull<u8>,
    capacity: usize,
  ) -> Self {
    Self {
      data,
      capacity,
      used: 0,
    }
  }

  pub fn start(&self) -> NonNull<u8> {
    self.data
  }

  pub fn remaining(&self) -> usize {
    self.capacity - self.used
  }

  pub fn fits(
    &self,
    size: usize,
  ) -> bool {
    size <= self.remaining()
  }

  /// Reserves `size` bytes at the end of the used region and returns a
  /// pointer to them. The caller has checked [`Block::fits`].
  pub fn bump(
    &mut self,
    size: usize,
  ) -> NonNull<u8> {
    debug_assert!(self.fits(size));

    // SAFETY: `used + size <= capacity`, so the result stays inside the
    // region or one past its end for a zero sized request.
    let ptr = unsafe { self.data.add(self.used) };
    self.used += size;
    ptr
  }

  /// The bytes handed out from this block so far.
  ///
  /// # Safety
  ///
  /// No mutable slice previously returned from [`Block::bump`] may still be
  /// alive.
  pub unsafe fn used_bytes(&self) -> &[u8] {
    unsafe { slice::from_raw_parts(self.data.as_ptr(), self.used) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_bump() {
    let mut storage = [0u8; 16];
    let base = storage.as_mut_ptr();
    let mut block = Block::new(NonNull::new(base).unwrap(), storage.len());

    let first = block.bump(10);
    assert_eq!(first.as_ptr(), base);
    assert_eq!(block.remaining(), 6);

    assert!(block.fits(6));
    assert!(!block.fits(7));

    let second = block.bump(6);
    assert_eq!(second.as_ptr() as usize - first.as_ptr() as usize, 10);
    assert_eq!(block.remaining(), 0);

    assert!(block.fits(0));
    let empty = block.bump(0);
    assert_eq!(empty.as_ptr() as usize - first.as_ptr() as usize, 16);
    assert_eq!(unsafe { block.used_bytes() }.len(), 16);
  }
}
