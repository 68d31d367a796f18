use thiserror::Error;

/// Errors returned by [`Pool`](crate::Pool) operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
  /// A pool needs at least one byte of block capacity.
  #[error("pool capacity must be greater than zero")]
  ZeroCapacity,

  /// The system allocator refused the request.
  #[error("system allocator could not provide {size} bytes aligned to {align}")]
  OutOfMemory { size: usize, align: usize },

  /// `alloc_aligned` was given an alignment that is not a power of two.
  #[error("alignment {0} is not a power of two")]
  InvalidAlignment(usize),

  /// An internal request does not fit even in a fresh block.
  #[error("request of {size} bytes cannot fit in a {capacity}-byte block")]
  BlockOverflow { size: usize, capacity: usize },
}

pub type Result<T> = std::result::Result<T, PoolError>;
