//! Block sizing for an [`Arena`](crate::Arena).
//!
//! A block's total size is `unit * multiple` bytes. Part of it is reserved for
//! the block header, the rest is the usable data capacity:
//!
//! ```text
//!   ┌──────────────┬──────────────────────────────────────────────┐
//!   │    header    │                 data capacity                │
//!   │ next + used  │                                              │
//!   └──────────────┴──────────────────────────────────────────────┘
//!   ◄───────────────────── unit * multiple ────────────────────────►
//! ```

use crate::block::BLOCK_HEADER_SIZE;
use crate::error::{ArenaError, Result};

/// Size of one block unit in bytes.
pub const DEFAULT_UNIT: usize = 4096;

/// Units per block; together with [`DEFAULT_UNIT`] this gives 4 MiB blocks.
pub const DEFAULT_MULTIPLE: usize = 1024;

/// Block size configuration, fixed for the lifetime of an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ArenaConfig {
  /// Bytes per unit.
  pub unit: usize,
  /// Units per block.
  pub multiple: usize,
}

/// The sizes derived from a valid [`ArenaConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
  /// Total bytes accounted per block, header included.
  pub block_size: usize,
  /// Usable data bytes per block.
  pub capacity: usize,
}

impl ArenaConfig {
  /// A config of `multiple` default-sized units.
  pub const fn new(multiple: usize) -> Self {
    Self {
      unit: DEFAULT_UNIT,
      multiple,
    }
  }

  /// A config whose blocks hold exactly `capacity` data bytes.
  pub const fn for_capacity(capacity: usize) -> Self {
    Self {
      unit: 1,
      multiple: capacity.saturating_add(BLOCK_HEADER_SIZE),
    }
  }

  pub const fn with_unit(
    self,
    unit: usize,
  ) -> Self {
    Self { unit, ..self }
  }

  pub const fn with_multiple(
    self,
    multiple: usize,
  ) -> Self {
    Self { multiple, ..self }
  }

  /// Checks the config and computes the block layout.
  ///
  /// Fails when `unit * multiple` overflows, or when it is not larger than
  /// the block header.
  pub fn validate(&self) -> Result<BlockLayout> {
    let block_size = self
      .unit
      .checked_mul(self.multiple)
      .ok_or(ArenaError::BlockSizeOverflow {
        unit: self.unit,
        multiple: self.multiple,
      })?;

    match block_size.checked_sub(BLOCK_HEADER_SIZE) {
      Some(capacity) if capacity > 0 => Ok(BlockLayout {
        block_size,
        capacity,
      }),
      _ => Err(ArenaError::InvalidConfig {
        block_size,
        header: BLOCK_HEADER_SIZE,
      }),
    }
  }
}

impl Default for ArenaConfig {
  fn default() -> Self {
    Self::new(DEFAULT_MULTIPLE)
  }
}

impl Default for BlockLayout {
  fn default() -> Self {
    let block_size = DEFAULT_UNIT * DEFAULT_MULTIPLE;

    Self {
      block_size,
      capacity: block_size - BLOCK_HEADER_SIZE,
    }
  }
}
