//! # firstfit - A Fixed-Arena First-Fit Allocator
//!
//! This crate manages one fixed-capacity byte arena with a doubly linked
//! directory of block headers stored inside the arena itself. Allocation
//! is first-fit with splitting; freeing coalesces adjacent free blocks.
//!
//! ## Overview
//!
//! ```text
//!   Arena of capacity C (default 1000 bytes):
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │ ┌────────┬──────────┬────────┬──────────┬────────┬──────────────────┐│
//!   │ │ Header │  A (20)  │ Header │  B (8)   │ Header │   Free space     ││
//!   │ └────────┴──────────┴────────┴──────────┴────────┴──────────────────┘│
//!   │ ▲        ▲                                                           │
//!   │ │        └── pointer returned for A                                  │
//!   │ └── directory head, always offset 0                                  │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Σ (HEADER_WIDTH + block.size) == C at all times.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   firstfit
//!   ├── allocator  - FirstFitAllocator: init, allocate, teardown
//!   ├── dealloc    - free and coalescing
//!   ├── directory  - block chain: search, split, merge, invariant checks
//!   ├── arena      - raw buffer from libc, header encoding (internal)
//!   ├── block      - Block header record (internal)
//!   ├── config     - AllocatorConfig
//!   └── error      - AllocError
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use firstfit::FirstFitAllocator;
//!
//! let mut allocator = FirstFitAllocator::new();
//! allocator.init(1000).unwrap();
//!
//! let ptr = allocator.allocate(5).unwrap();
//! allocator.payload_mut(ptr).unwrap().copy_from_slice(b"Hello");
//!
//! allocator.free(ptr.as_ptr()).unwrap();
//! assert_eq!(allocator.stats().unwrap().blocks, 1);
//!
//! allocator.teardown();
//! ```
//!
//! ## How It Works
//!
//! Allocation walks the directory from the head and takes the first free
//! block large enough:
//!
//! ```text
//!   block.size == n            -> used as is
//!   block.size - n <= header   -> used whole, leftover wasted
//!   otherwise                  -> split:
//!
//!   ┌────────┬──────────────────────────────┐
//!   │ Header │          free (size)         │
//!   └────────┴──────────────────────────────┘
//!                     becomes
//!   ┌────────┬─────────┬────────┬───────────┐
//!   │ Header │ used(n) │ Header │ free rest │
//!   └────────┴─────────┴────────┴───────────┘
//! ```
//!
//! Freeing merges the block with a free successor, then lets a free
//! predecessor absorb the result, so no two neighbours are ever both free.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: the allocator is neither `Send` nor `Sync`
//! - **Fixed capacity**: the arena never grows
//! - **No alignment**: payloads start right after a header
//! - **Linear search**: every allocation scans from the head
//!
//! ## Safety
//!
//! Raw pointers returned by `allocate` stay valid until freed or until
//! `teardown`. Using one afterwards is undefined behaviour and the
//! allocator cannot detect it.

mod allocator;
mod arena;
mod block;
pub mod config;
mod dealloc;
mod directory;
pub mod error;

pub use allocator::FirstFitAllocator;
pub use block::HEADER_WIDTH;
pub use config::AllocatorConfig;
pub use directory::{ArenaStats, BlockInfo};
pub use error::{AllocError, Result};
