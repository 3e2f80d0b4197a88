use std::{
  cell::{Cell, RefCell},
  fmt,
  ptr::NonNull,
  slice, str,
};

use tracing::{debug, trace, warn};

use crate::{
  block::Block,
  config::{ArenaConfig, BlockLayout},
  error::{ArenaError, Result},
  source::{BlockSource, HeapSource},
};

/// A chain of fixed-size blocks serving bump allocations.
///
/// Allocation takes `&self`, so any number of returned slices can be alive
/// at once; they all borrow the arena and become invalid together when it
/// is dropped. Operations that read stored data back ([`Arena::flatten`],
/// [`Arena::blocks`]) take `&mut self`, which proves no slice is still
/// borrowed.
///
/// The arena is not `Sync`. Share it between threads behind a lock, or use
/// one arena per thread.
pub struct Arena<S: BlockSource = HeapSource> {
  blocks: RefCell<Vec<Block>>,
  data_bytes: Cell<usize>,
  layout: BlockLayout,
  source: S,
}

// SAFETY: blocks are owned exclusively by the arena, and moving it requires
// that no slice borrows it. The source releases them on the new thread.
unsafe impl<S: BlockSource + Send> Send for Arena<S> {}

impl Arena<HeapSource> {
  /// Creates an arena backed by the global allocator.
  pub fn new(config: ArenaConfig) -> Result<Self> {
    Self::with_source(config, HeapSource)
  }
}

impl<S: BlockSource> Arena<S> {
  /// Creates an arena drawing its blocks from `source`. No block is
  /// acquired until the first allocation.
  pub fn with_source(
    config: ArenaConfig,
    source: S,
  ) -> Result<Self> {
    let layout = config.validate()?;

    Ok(Self::from_layout(layout, source))
  }

  fn from_layout(
    layout: BlockLayout,
    source: S,
  ) -> Self {
    Self {
      blocks: RefCell::new(Vec::new()),
      data_bytes: Cell::new(0),
      layout,
      source,
    }
  }

  /// Hands out `size` zeroed bytes.
  ///
  /// A new block is appended when the current one has fewer than `size`
  /// bytes left. Requests larger than a whole block fail with
  /// [`ArenaError::Oversized`]. On any error the arena is left unchanged.
  #[allow(clippy::mut_from_ref)]
  pub fn allocate(
    &self,
    size: usize,
  ) -> Result<&mut [u8]> {
    if size > self.layout.capacity {
      warn!(
        requested = size,
        capacity = self.layout.capacity,
        "rejecting oversized allocation"
      );
      return Err(ArenaError::Oversized {
        requested: size,
        capacity: self.layout.capacity,
      });
    }

    let mut blocks = self.blocks.borrow_mut();

    if !blocks.last().is_some_and(|tail| tail.fits(size)) {
      blocks
        .try_reserve(1)
        .map_err(|_| ArenaError::AllocationFailed {
          size: self.layout.block_size,
        })?;
      let block = self.acquire_block(blocks.len())?;
      blocks.push(block);
    }

    let index = blocks.len() - 1;
    let ptr = blocks[index].bump(size);
    drop(blocks);

    self.data_bytes.set(self.data_bytes.get() + size);
    trace!(size, block = index, "allocated");

    // SAFETY: the range was just reserved in a block that lives as long as
    // the arena, is zero initialised, and is never handed out again.
    Ok(unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), size) })
  }

  /// Allocates room for `bytes` and copies them in.
  #[allow(clippy::mut_from_ref)]
  pub fn alloc_copy(
    &self,
    bytes: &[u8],
  ) -> Result<&mut [u8]> {
    let dst = self.allocate(bytes.len())?;
    dst.copy_from_slice(bytes);
    Ok(dst)
  }

  #[allow(clippy::mut_from_ref)]
  pub fn alloc_str(
    &self,
    s: &str,
  ) -> Result<&mut str> {
    let bytes = self.alloc_copy(s.as_bytes())?;

    // SAFETY: copied verbatim from a `str`.
    Ok(unsafe { str::from_utf8_unchecked_mut(bytes) })
  }

  fn acquire_block(
    &self,
    index: usize,
  ) -> Result<Block> {
    let capacity = self.layout.capacity;

    match self.source.acquire(capacity) {
      Some(data) => {
        debug!(block = index, capacity, "acquired block");
        Ok(Block::new(data, capacity))
      }
      None => {
        warn!(block = index, capacity, "block source exhausted");
        Err(ArenaError::AllocationFailed {
          size: self.layout.block_size,
        })
      }
    }
  }

  /// Start of the data region of the block currently receiving allocations.
  pub fn current_block_start(&self) -> Result<NonNull<u8>> {
    self
      .blocks
      .borrow()
      .last()
      .map(Block::start)
      .ok_or(ArenaError::NoCurrentBlock)
  }

  /// Total bytes handed out, across all blocks.
  pub fn used_bytes(&self) -> usize {
    self.data_bytes.get()
  }

  /// Backing memory accounted to the chain, headers and unused tails
  /// included.
  pub fn allocated_bytes(&self) -> usize {
    self.block_count() * self.layout.block_size
  }

  pub fn block_count(&self) -> usize {
    self.blocks.borrow().len()
  }

  /// Usable data bytes per block; the largest request that can succeed.
  pub fn capacity(&self) -> usize {
    self.layout.capacity
  }

  pub fn block_size(&self) -> usize {
    self.layout.block_size
  }

  /// Bytes still free in the current block. Zero before the first block.
  pub fn remaining(&self) -> usize {
    self.blocks.borrow().last().map_or(0, Block::remaining)
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  /// Copies every allocated byte, in allocation order, into one buffer of
  /// exactly [`Arena::used_bytes`] bytes.
  pub fn flatten(&mut self) -> Result<Vec<u8>> {
    let len = self.used_bytes();
    let mut buf = Vec::new();
    buf
      .try_reserve_exact(len)
      .map_err(|_| ArenaError::AllocationFailed { size: len })?;

    for bytes in self.blocks() {
      buf.extend_from_slice(bytes);
    }

    debug_assert_eq!(buf.len(), len);
    Ok(buf)
  }

  /// The used part of each block, head to tail.
  pub fn blocks(&mut self) -> impl Iterator<Item = &[u8]> + '_ {
    self
      .blocks
      .get_mut()
      .iter()
      // SAFETY: `&mut self` rules out live allocation slices.
      .map(|block| unsafe { block.used_bytes() })
  }
}

impl Default for Arena<HeapSource> {
  fn default() -> Self {
    Self::from_layout(BlockLayout::default(), HeapSource)
  }
}

impl<S: BlockSource> Drop for Arena<S> {
  fn drop(&mut self) {
    let blocks = self.blocks.get_mut();

    debug!(
      blocks = blocks.len(),
      bytes = self.data_bytes.get(),
      "releasing arena"
    );

    for block in blocks.drain(..) {
      // SAFETY: acquired from this source with this capacity, released once.
      unsafe { self.source.release(block.start(), self.layout.capacity) }
    }
  }
}

impl<S: BlockSource> fmt::Debug for Arena<S> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Arena")
      .field("block_size", &self.layout.block_size)
      .field("capacity", &self.layout.capacity)
      .field("blocks", &self.block_count())
      .field("used_bytes", &self.used_bytes())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use std::rc::Rc;

  use super::*;

  /// Counts calls into a heap source, optionally failing after `limit`
  /// acquisitions.
  #[derive(Default)]
  struct CountingSource {
    acquired: Rc<Cell<usize>>,
    released: Rc<Cell<usize>>,
    limit: Option<usize>,
  }

  unsafe impl BlockSource for CountingSource {
    fn acquire(
      &self,
      size: usize,
    ) -> Option<NonNull<u8>> {
      if self.limit.is_some_and(|limit| self.acquired.get() >= limit) {
        return None;
      }

      let ptr = HeapSource.acquire(size)?;
      self.acquired.set(self.acquired.get() + 1);
      Some(ptr)
    }

    unsafe fn release(
      &self,
      ptr: NonNull<u8>,
      size: usize,
    ) {
      self.released.set(self.released.get() + 1);
      unsafe { HeapSource.release(ptr, size) }
    }
  }

  fn small(capacity: usize) -> Arena {
    Arena::new(ArenaConfig::for_capacity(capacity)).unwrap()
  }

  #[test]
  fn test_three_blocks_of_fifty() {
    let mut arena = small(64);
    let mut expected = Vec::new();

    for fill in [1u8, 2, 3] {
      let bytes = arena.allocate(50).unwrap();
      bytes.fill(fill);
      expected.extend_from_slice(&[fill; 50]);
    }

    assert_eq!(arena.block_count(), 3);
    assert_eq!(arena.used_bytes(), 150);
    assert_eq!(arena.allocated_bytes(), 3 * arena.block_size());
    assert_eq!(arena.flatten().unwrap(), expected);
  }

  #[test]
  fn test_exact_fill_stays_in_block() {
    let arena = small(64);

    arena.allocate(40).unwrap();
    arena.allocate(24).unwrap();
    assert_eq!(arena.block_count(), 1);
    assert_eq!(arena.remaining(), 0);

    arena.allocate(1).unwrap();
    assert_eq!(arena.block_count(), 2);
    assert_eq!(arena.remaining(), 63);
  }

  #[test]
  fn test_oversized_leaves_arena_untouched() {
    let arena = small(64);

    assert_eq!(
      arena.allocate(65),
      Err(ArenaError::Oversized {
        requested: 65,
        capacity: 64,
      })
    );
    assert_eq!(arena.block_count(), 0);
    assert_eq!(arena.used_bytes(), 0);

    assert_eq!(arena.allocate(64).unwrap().len(), 64);
    assert_eq!(arena.block_count(), 1);
  }

  #[test]
  fn test_zero_sized_allocations() {
    let arena = small(64);

    for _ in 0..10 {
      assert!(arena.allocate(0).unwrap().is_empty());
      assert_eq!(arena.block_count(), 1);
    }
    assert_eq!(arena.used_bytes(), 0);

    arena.allocate(64).unwrap();
    arena.allocate(0).unwrap();
    assert_eq!(arena.block_count(), 1);
  }

  #[test]
  fn test_current_block_start() {
    let arena = small(64);
    assert_eq!(arena.current_block_start(), Err(ArenaError::NoCurrentBlock));

    let first = arena.allocate(10).unwrap().as_ptr();
    assert_eq!(arena.current_block_start().unwrap().as_ptr().cast_const(), first);

    let second = arena.allocate(60).unwrap().as_ptr();
    assert_eq!(arena.current_block_start().unwrap().as_ptr().cast_const(), second);
  }

  #[test]
  fn test_live_slices_coexist() {
    let mut arena = small(16);

    let a = arena.alloc_copy(b"hello").unwrap();
    let b = arena.alloc_str("world").unwrap();
    let c = arena.alloc_copy(&[7; 16]).unwrap();

    a[0] = b'j';
    b.make_ascii_uppercase();
    c[15] = 8;

    assert_eq!(a, b"jello");
    assert_eq!(b, "WORLD");

    let blocks: Vec<&[u8]> = arena.blocks().collect();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0], b"jelloWORLD");
    assert_eq!(blocks[1][15], 8);
  }

  #[test]
  fn test_drop_releases_every_block() {
    let source = CountingSource::default();
    let acquired = source.acquired.clone();
    let released = source.released.clone();

    let arena = Arena::with_source(ArenaConfig::for_capacity(32), source).unwrap();
    for _ in 0..10 {
      arena.allocate(20).unwrap();
    }
    let blocks = arena.block_count();
    assert_eq!(blocks, 10);
    assert_eq!(acquired.get(), blocks);
    assert_eq!(released.get(), 0);

    drop(arena);
    assert_eq!(released.get(), blocks);
  }

  #[test]
  fn test_source_failure_keeps_earlier_data() {
    let source = CountingSource {
      limit: Some(1),
      ..CountingSource::default()
    };
    let mut arena = Arena::with_source(ArenaConfig::for_capacity(8), source).unwrap();

    arena.alloc_copy(b"abcdef").unwrap();

    let block_size = arena.block_size();
    assert_eq!(
      arena.allocate(4),
      Err(ArenaError::AllocationFailed { size: block_size })
    );
    assert_eq!(arena.block_count(), 1);
    assert_eq!(arena.used_bytes(), 6);

    arena.allocate(2).unwrap();
    assert_eq!(arena.flatten().unwrap(), b"abcdef\0\0");
  }

  #[test]
  fn test_default_arena() {
    let mut arena = Arena::default();

    assert_eq!(arena.block_size(), 4 * 1024 * 1024);
    assert_eq!(arena.allocated_bytes(), 0);
    assert!(arena.flatten().unwrap().is_empty());
  }
}
