//! # rmpool - A Region Pool Allocator
//!
//! This crate provides a single-threaded **region (arena) allocator** built on
//! top of the C allocator (`posix_memalign`, `malloc`, `free` via `libc`).
//!
//! ## Overview
//!
//! Small requests are bump-allocated out of a chain of equally sized blocks
//! and are reclaimed all at once. Large requests are handed to the system
//! allocator and tracked individually so they can be released early:
//!
//! ```text
//!   Pool Layout:
//!
//!   ┌──────────────────────────┐
//!   │          Pool            │
//!   │  max:     min(cap, 4095) │
//!   │  current: ───────────────┼──────────────────────┐
//!   │  blocks:  ───┐           │                      │
//!   │  large:  ─┐  │           │                      │
//!   └───────────┼──┼───────────┘                      │
//!               │  │                                  ▼
//!               │  │   ┌────────────────┐    ┌────────────────┐    ┌────────────────┐
//!               │  └──►│ head           │───►│ block 1        │───►│ block 2        │
//!               │      │ ██████░░░░░░░░ │    │ ████████████░░ │    │ ███░░░░░░░░░░░ │
//!               │      └────────────────┘    └────────────────┘    └────────────────┘
//!               │              ▲ records live inside the blocks
//!               ▼              │
//!        ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//!        │ record      │───►│ record      │───►│ record      │
//!        │ alloc: ptr  │    │ alloc: None │    │ alloc: ptr  │
//!        └──────┬──────┘    └─────────────┘    └──────┬──────┘
//!               ▼                                     ▼
//!        ┌─────────────┐                       ┌─────────────┐
//!        │ malloc'd    │                       │ malloc'd    │
//!        │ large block │                       │ large block │
//!        └─────────────┘                       └─────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rmpool
//!   ├── align      - Alignment constants and helpers (align_to!, align_ptr)
//!   ├── block      - Bump-allocated data block (internal)
//!   ├── error      - PoolError and the crate Result alias
//!   ├── large      - Large allocation records (internal)
//!   └── pool       - Pool: lifecycle and allocation routing
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rmpool::Pool;
//!
//! let mut pool = Pool::create(4096)?;
//!
//! // Small requests are bumped out of a block, 32-byte aligned.
//! let small = pool.alloc(64)?;
//! assert_eq!(small.as_ptr() as usize % 32, 0);
//!
//! // Large requests bypass the blocks and can be released early.
//! let large = pool.alloc(16 * 1024)?;
//! assert!(!pool.contains(large.as_ptr()));
//! pool.free_large(large);
//!
//! // Reset keeps the block memory for the next round.
//! pool.reset();
//! let again = pool.alloc_zeroed(64)?;
//! assert_eq!(unsafe { *again.as_ptr() }, 0);
//!
//! pool.destroy();
//! # Ok::<(), rmpool::PoolError>(())
//! ```
//!
//! ## How It Works
//!
//! ```text
//!   Small request (size <= max):
//!
//!   current ──► ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!               │ full         │──►│ fits?        │──►│ ...          │──► new block
//!               └──────────────┘   └──────────────┘   └──────────────┘    (append)
//!
//!   Large request (size > max):
//!
//!   malloc(size) ──► first 4 records: free slot? ──► bind it
//!                                      │
//!                                      └─ no ──► new record from the blocks
//!                                                (prepended)
//! ```
//!
//! Blocks that keep failing scans are skipped by moving the `current` cursor
//! past them. The cursor never moves back, not even on reset.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: `Pool` is neither `Send` nor `Sync`
//! - **Bulk reclamation**: small allocations are only freed by reset or drop
//! - **Dirty memory**: reset does not clear blocks; use `alloc_zeroed`
//! - **Unix-only**: requires `libc` and `posix_memalign`
//!
//! ## Safety
//!
//! Allocation returns raw pointers. Reading or writing through them requires
//! `unsafe`, and they dangle after `reset`, `free_large` or drop.

pub mod align;
mod block;
mod error;
mod large;
mod pool;

pub use error::{PoolError, Result};
pub use pool::Pool;
