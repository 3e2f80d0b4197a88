use thiserror::Error;

/// Errors produced by an [`Arena`](crate::Arena) and its configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
  /// A single request is larger than a whole empty block.
  #[error("allocation of {requested} bytes exceeds block capacity of {capacity} bytes")]
  Oversized {
    /// Bytes requested.
    requested: usize,
    /// Usable bytes per block.
    capacity: usize,
  },

  /// The block size leaves no room for data once the header is subtracted.
  #[error("block size of {block_size} bytes leaves no data capacity after a {header} byte header")]
  InvalidConfig {
    /// Total block size, `unit * multiple`.
    block_size: usize,
    /// Per-block header overhead.
    header: usize,
  },

  /// `unit * multiple` does not fit in a `usize`.
  #[error("block size {unit} * {multiple} overflows usize")]
  BlockSizeOverflow {
    /// Size of one unit in bytes.
    unit: usize,
    /// Number of units per block.
    multiple: usize,
  },

  /// Backing memory for a new block (or a flatten buffer) was unavailable.
  #[error("failed to allocate {size} bytes of backing memory")]
  AllocationFailed {
    /// Bytes that were asked for.
    size: usize,
  },

  /// The current block was queried before anything was allocated.
  #[error("arena has no current block; nothing has been allocated yet")]
  NoCurrentBlock,
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ArenaError>;
