//! # fitalloc - A Free-List Heap Allocator
//!
//! This crate provides a **free-list heap**: a `malloc`/`free`/`calloc`/
//! `realloc` style allocator that manages one growable arena through an
//! explicit directory of blocks instead of delegating to another allocator.
//!
//! ## Overview
//!
//! Every byte of the arena belongs to exactly one block. Blocks are linked
//! in address order, used and free alike:
//!
//! ```text
//!   Arena:
//!
//!   offset 0                                                      arena end
//!   ┌────────┬─────────┬────────┬──────────────┬────────┬───────────┐
//!   │ header │ payload │ header │   payload    │ header │  payload  │
//!   │  used  │         │  free  │              │  used  │           │
//!   └────────┴─────────┴────────┴──────────────┴────────┴───────────┘
//!       │                  ▲ │                     ▲
//!       └── next ──────────┘ └─────── next ────────┘
//! ```
//!
//! An allocation asks the active [`FitPolicy`] for a free block. An
//! oversized block is split in two; when nothing fits the arena grows by one
//! block at its high end. Freeing a block merges every run of neighbouring
//! free blocks back into one.
//!
//! ## Crate Structure
//!
//! ```text
//!   fitalloc
//!   ├── align      - Alignment unit and align! macro
//!   ├── arena      - Arena trait, VecArena, SbrkArena
//!   ├── block      - Block header and its in-arena encoding
//!   ├── directory  - Address-ordered block directory and arena growth
//!   ├── fit        - First, best, worst and next fit
//!   ├── split      - Splitting an oversized free block
//!   ├── coalesce   - Merging adjacent free blocks
//!   ├── config     - HeapConfig and environment parsing
//!   ├── stats      - Counters and the statistics report
//!   ├── error      - Error types
//!   └── heap       - Heap: allocate, free, zero_allocate, reallocate
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use fitalloc::{FitPolicy, Heap};
//!
//! let mut heap = Heap::new(FitPolicy::BestFit);
//!
//! let ptr = heap.allocate(6).unwrap();
//! heap.payload_mut(ptr)[..6].copy_from_slice(b"fitted");
//!
//! let ptr = heap.reallocate(Some(ptr), 64).unwrap();
//! assert_eq!(&heap.payload(ptr)[..6], b"fitted");
//!
//! heap.free(Some(ptr));
//! assert_eq!(heap.stats().frees, 2);
//! ```
//!
//! ## Addresses
//!
//! A [`Ptr`] is an offset into the arena, not a machine pointer. The header
//! of a block sits [`HEADER_SIZE`] bytes before its payload:
//!
//! ```text
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │         Payload                │
//!   │  size:    u64         │                                │
//!   │  next:    u64         │   size bytes, multiple of 4    │
//!   │  is_free: u8 + pad    │                                │
//!   │      24 bytes         │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!                           ▲
//!                           └── Ptr returned to the caller
//! ```
//!
//! ## Arenas
//!
//! [`VecArena`] owns a plain buffer and can be capped. [`SbrkArena`] extends
//! the program break with `sbrk(2)` and refuses to grow when the break was
//! moved by someone else in between.
//!
//! ## Limitations
//!
//! - **Single-threaded**: a [`Heap`] has no internal locking
//! - **Grow only**: memory is never returned to the environment
//! - **Fixed alignment**: payload sizes are multiples of 4 bytes

pub mod align;
pub mod arena;
mod block;
mod coalesce;
pub mod config;
pub mod directory;
pub mod error;
pub mod fit;
mod heap;
mod split;
pub mod stats;

#[cfg(unix)]
pub use arena::SbrkArena;
pub use arena::{Arena, VecArena};
pub use block::{Block, HEADER_SIZE};
pub use config::HeapConfig;
pub use directory::Directory;
pub use error::{ConfigError, GrowError, HeapError};
pub use fit::{FitPolicy, Selection};
pub use heap::{Heap, Ptr};
pub use stats::HeapStats;
