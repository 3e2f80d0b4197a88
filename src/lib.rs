//! # bumpchain - A Block-Chained Bump Arena
//!
//! This crate provides an **arena allocator** that carves variable-sized byte
//! ranges out of large fixed-size blocks, and gives all of them back at once
//! when the arena is dropped.
//!
//! ## Overview
//!
//! Allocating and freeing millions of small objects one by one is slow and
//! fragments the heap. An arena trades per-object freeing for speed: each
//! allocation only bumps an offset, and cleanup is one release per block.
//!
//! ```text
//!   Block Chain:
//!
//!     head                                             tail
//!   ┌──────────────────────┐   ┌──────────────────────┐   ┌──────────────────────┐
//!   │ A1 │ A2 │ A3 │ slack │──►│ A4      │ A5 │ slack │──►│ A6 │   free space    │
//!   └──────────────────────┘   └──────────────────────┘   └──────────────────────┘
//!                                                                ▲
//!                                                                │
//!                                                           Bump Offset
//!                                                           (next alloc)
//!
//!   A request that does not fit in the tail starts a new block.
//!   Earlier blocks keep their slack; it is never reused.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   bumpchain
//!   ├── align      - align_to! rounding macro
//!   ├── arena      - Arena implementation
//!   ├── block      - One block of the chain (internal)
//!   ├── config     - Block sizing (ArenaConfig)
//!   ├── error      - ArenaError
//!   └── source     - Backing memory (heap, mmap)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use bumpchain::{Arena, ArenaConfig};
//!
//! let mut arena = Arena::new(ArenaConfig::for_capacity(64))?;
//!
//! let greeting = arena.alloc_str("hello, ")?;
//! let name = arena.alloc_copy(b"world")?;
//! name[0] = b'W';
//! assert_eq!(greeting, "hello, ");
//!
//! assert_eq!(arena.used_bytes(), 12);
//! assert_eq!(arena.flatten()?, b"hello, World");
//! # Ok::<(), bumpchain::ArenaError>(())
//! ```
//!
//! ## Block Sizing
//!
//! A block is `unit * multiple` bytes, 4096 * 1024 (4 MiB) by default. A small
//! header is accounted to each block, the rest is data capacity:
//!
//! ```text
//!   ┌───────────────────────┬────────────────────────────────────────┐
//!   │    Block Header       │         Data Capacity                  │
//!   │  ┌─────────────────┐  │                                        │
//!   │  │ next: link      │  │  ┌──────────────────┬───────────────┐  │
//!   │  │ used: N         │  │  │   N bytes used   │     free      │  │
//!   │  └─────────────────┘  │  └──────────────────┴───────────────┘  │
//!   │  BLOCK_HEADER_SIZE    │                                        │
//!   └───────────────────────┴────────────────────────────────────────┘
//! ```
//!
//! No single allocation may exceed the data capacity; such requests fail with
//! [`ArenaError::Oversized`].
//!
//! ## Features
//!
//! - **O(1) allocation**: one comparison and one add in the common case
//! - **Bulk reclamation**: dropping the arena releases each block once
//! - **Flattening**: [`Arena::flatten`] copies all data into one buffer
//! - **Pluggable memory**: blocks come from a [`BlockSource`]
//!
//! ## Limitations
//!
//! - **Single-threaded only**: the arena is not `Sync`
//! - **No deallocation**: ranges live until the arena is dropped
//! - **No alignment**: ranges are packed byte after byte
//!
//! ## Cargo Features
//!
//! - `serde`: derives `Serialize`/`Deserialize` for [`ArenaConfig`]

pub mod align;
mod arena;
mod block;
pub mod config;
mod error;
pub mod source;

pub use arena::Arena;
pub use block::BLOCK_HEADER_SIZE;
pub use config::{ArenaConfig, BlockLayout};
pub use error::{ArenaError, Result};
#[cfg(unix)]
pub use source::MmapSource;
pub use source::{BlockSource, HeapSource};
