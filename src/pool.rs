use std::{
  fmt, mem,
  ptr::{self, NonNull},
};

use libc::{c_void, malloc, posix_memalign};
use tracing::{debug, trace};

use crate::{
  align::MAX_ALLOC_FROM_POOL,
  block::Block,
  error::{PoolError, Result},
  large::{self, LargeRecord, REUSE_SCAN_LIMIT},
};

/// A block that failed more scans than this is skipped by later scans.
const MAX_FAILED: usize = 4;

/// Alignment guaranteed by `malloc` on the supported targets.
const MALLOC_ALIGNMENT: usize = 2 * mem::size_of::<usize>();

/// A region allocator built from a chain of equally sized blocks.
///
/// Requests up to [`max`](Pool::max) bytes are bump-allocated from the
/// blocks and are only reclaimed in bulk by [`reset`](Pool::reset) or when
/// the pool is dropped. Larger requests go straight to the system allocator;
/// they are tracked by the pool and may be released early with
/// [`free_large`](Pool::free_large).
///
/// A pool is single-threaded: it is neither `Send` nor `Sync`.
pub struct Pool {
  max: usize,
  blocks: Vec<Block>,
  current: usize,
  large: Option<NonNull<LargeRecord>>,
}

impl Pool {
  /// Creates a pool whose blocks hold `capacity` bytes each.
  ///
  /// The small/large threshold is `min(capacity, MAX_ALLOC_FROM_POOL)`.
  pub fn create(
    capacity: usize,
  ) -> Result<Self> {
    if capacity == 0 {
      return Err(PoolError::ZeroCapacity);
    }

    let head = Block::new(capacity)?;

    let pool = Self {
      max: capacity.min(MAX_ALLOC_FROM_POOL),
      blocks: vec![head],
      current: 0,
      large: None,
    };

    debug!(capacity, max = pool.max, "created pool");

    Ok(pool)
  }

  /// Releases every large allocation and rewinds every block.
  ///
  /// Block memory is kept but not cleared, so stale bytes are visible to
  /// later allocations other than [`alloc_zeroed`](Pool::alloc_zeroed).
  /// The scan cursor and the per-block failure counters are left as they
  /// are: blocks the cursor already moved past stay unused.
  /// Large records are dropped too, so freed slots do not carry over.
  pub fn reset(&mut self) {
    let released = self.release_large();

    // The records themselves live in the blocks being rewound.
    self.large = None;

    for block in &mut self.blocks {
      block.rewind();
    }

    debug!(
      blocks = self.blocks.len(),
      released,
      current = self.current,
      "reset pool"
    );
  }

  /// Releases every large allocation and every block.
  pub fn destroy(self) {
    drop(self);
  }

  /// Allocates `size` bytes, aligned to [`ALIGNMENT`](crate::align::ALIGNMENT)
  /// when served from a block.
  pub fn alloc(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    if size > self.max {
      return self.alloc_large(size);
    }

    self.alloc_small(size, true)
  }

  /// Allocates `size` bytes with no alignment padding between small requests.
  pub fn alloc_unaligned(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    if size > self.max {
      return self.alloc_large(size);
    }

    self.alloc_small(size, false)
  }

  /// Like [`alloc`](Pool::alloc), with the returned bytes set to zero.
  pub fn alloc_zeroed(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    let ptr = self.alloc(size)?;

    // SAFETY: `ptr` is valid for `size` bytes.
    unsafe { ptr::write_bytes(ptr.as_ptr(), 0, size) };

    Ok(ptr)
  }

  /// Allocates `size` bytes aligned to `alignment` outside the block chain.
  ///
  /// The memory is always tracked as a new large record and can be released
  /// with [`free_large`](Pool::free_large).
  pub fn alloc_aligned(
    &mut self,
    size: usize,
    alignment: usize,
  ) -> Result<NonNull<u8>> {
    if !alignment.is_power_of_two() {
      return Err(PoolError::InvalidAlignment(alignment));
    }

    // posix_memalign rejects alignments below the pointer size.
    let align = alignment.max(mem::size_of::<*mut c_void>());
    let mut raw: *mut c_void = ptr::null_mut();

    // SAFETY: `raw` is a valid out pointer and `align` is a power of two
    // multiple of the pointer size.
    let ret = unsafe { posix_memalign(&mut raw, align, size.max(1)) };

    let ptr = match NonNull::new(raw as *mut u8) {
      Some(ptr) if ret == 0 => ptr,
      _ => return Err(PoolError::OutOfMemory { size, align }),
    };

    self.track(ptr)?;

    trace!(size, align, "allocated aligned block");

    Ok(ptr)
  }

  /// Releases a large or aligned allocation made by this pool.
  ///
  /// Pointers the pool does not track, including ones already freed, are
  /// ignored.
  pub fn free_large(
    &mut self,
    ptr: NonNull<u8>,
  ) {
    // SAFETY: records are live until the next reset.
    for mut record in unsafe { large::records(self.large) } {
      let record = unsafe { record.as_mut() };

      if record.alloc == Some(ptr) {
        record.alloc = None;

        // SAFETY: the record owned `ptr`, and it is now unlinked from it.
        unsafe { large::release(ptr) };

        trace!(?ptr, "freed large block");
        return;
      }
    }

    trace!(?ptr, "ignored free of untracked pointer");
  }

  /// Requests larger than this are served by the system allocator.
  pub fn max(&self) -> usize {
    self.max
  }

  /// Data capacity of every block in the chain.
  pub fn capacity(&self) -> usize {
    self.blocks[0].capacity()
  }

  pub fn block_count(&self) -> usize {
    self.blocks.len()
  }

  /// Index of the block where allocation scans start.
  pub fn current_block(&self) -> usize {
    self.current
  }

  /// Number of large records, including free slots.
  pub fn large_len(&self) -> usize {
    // SAFETY: records are live until the next reset.
    unsafe { large::records(self.large) }.count()
  }

  /// Number of large records currently holding memory.
  pub fn live_large_count(&self) -> usize {
    // SAFETY: records are live until the next reset.
    unsafe { large::records(self.large) }
      .filter(|record| unsafe { record.as_ref() }.alloc.is_some())
      .count()
  }

  /// Whether `ptr` points into the data region of one of the pool's blocks.
  pub fn contains(
    &self,
    ptr: *const u8,
  ) -> bool {
    self.blocks.iter().any(|block| block.contains(ptr))
  }

  fn alloc_small(
    &mut self,
    size: usize,
    aligned: bool,
  ) -> Result<NonNull<u8>> {
    for block in &mut self.blocks[self.current..] {
      if let Some(ptr) = block.bump(size, aligned) {
        return Ok(ptr);
      }
    }

    self.alloc_block(size)
  }

  /// Appends a block sized like the head and serves `size` bytes from it.
  fn alloc_block(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    let capacity = self.capacity();

    if size > capacity {
      return Err(PoolError::BlockOverflow { size, capacity });
    }

    self
      .blocks
      .try_reserve(1)
      .map_err(|_| PoolError::OutOfMemory {
        size: mem::size_of::<Block>(),
        align: mem::align_of::<Block>(),
      })?;

    let mut block = Block::new(capacity)?;
    let ptr = block
      .bump(size, true)
      .ok_or(PoolError::BlockOverflow { size, capacity })?;

    let tail = self.blocks.len() - 1;
    let mut current = self.current;

    for idx in self.current..tail {
      let scanned = &mut self.blocks[idx];

      if scanned.failed > MAX_FAILED {
        current = idx + 1;
      }

      scanned.failed += 1;
    }

    if current != self.current {
      trace!(from = self.current, to = current, "advanced scan cursor");
      self.current = current;
    }

    self.blocks.push(block);

    trace!(blocks = self.blocks.len(), capacity, "appended block");

    Ok(ptr)
  }

  fn alloc_large(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    // SAFETY: plain call into the C allocator.
    let ptr = NonNull::new(unsafe { malloc(size) } as *mut u8).ok_or(PoolError::OutOfMemory {
      size,
      align: MALLOC_ALIGNMENT,
    })?;

    // SAFETY: records are live until the next reset.
    for mut record in unsafe { large::records(self.large) }.take(REUSE_SCAN_LIMIT) {
      let record = unsafe { record.as_mut() };

      if record.alloc.is_none() {
        record.alloc = Some(ptr);

        trace!(size, "reused large slot");
        return Ok(ptr);
      }
    }

    self.track(ptr)?;

    trace!(size, "allocated large block");

    Ok(ptr)
  }

  /// Links `ptr` into a new record carved out of the block chain.
  ///
  /// `ptr` is released when no record can be allocated for it.
  fn track(
    &mut self,
    ptr: NonNull<u8>,
  ) -> Result<()> {
    let slot = match self.alloc_small(mem::size_of::<LargeRecord>(), true) {
      Ok(slot) => slot.cast::<LargeRecord>(),
      Err(err) => {
        // SAFETY: `ptr` was never handed out.
        unsafe { large::release(ptr) };
        return Err(err);
      }
    };

    // SAFETY: `slot` is ALIGNMENT-aligned and sized for a record.
    unsafe {
      slot.write(LargeRecord {
        next: self.large,
        alloc: Some(ptr),
      })
    };

    self.large = Some(slot);

    Ok(())
  }

  fn release_large(&mut self) -> usize {
    let mut released = 0;

    // SAFETY: records are live until the blocks holding them are rewound.
    for mut record in unsafe { large::records(self.large) } {
      let record = unsafe { record.as_mut() };

      if let Some(ptr) = record.alloc.take() {
        unsafe { large::release(ptr) };
        released += 1;
      }
    }

    released
  }
}

impl fmt::Debug for Pool {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Pool")
      .field("max", &self.max)
      .field("capacity", &self.capacity())
      .field("blocks", &self.blocks.len())
      .field("current", &self.current)
      .field("large", &self.large_len())
      .finish()
  }
}

impl Drop for Pool {
  fn drop(&mut self) {
    let released = self.release_large();

    debug!(blocks = self.blocks.len(), released, "destroyed pool");
  }
}
