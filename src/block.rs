use std::ptr::{self, NonNull};

use libc::{c_void, posix_memalign};

use crate::{
  align::ALIGNMENT,
  align_to,
  error::{PoolError, Result},
};

/// A contiguous data region served by bump allocation.
///
/// `last` and `end` are offsets from `data`, which is always
/// [`ALIGNMENT`]-aligned, so rounding an offset rounds the address too.
pub struct Block {
  data: NonNull<u8>,
  pub last: usize,
  pub end: usize,
  pub failed: usize,
}

impl Block {
  /// Obtains a fresh `capacity`-byte region from the system allocator.
  pub fn new(
    capacity: usize,
  ) -> Result<Self> {
    let mut raw: *mut c_void = ptr::null_mut();

    // SAFETY: `raw` is a valid out pointer and ALIGNMENT is a power of two
    // multiple of the pointer size.
    let ret = unsafe { posix_memalign(&mut raw, ALIGNMENT, capacity) };

    let data = match NonNull::new(raw as *mut u8) {
      Some(data) if ret == 0 => data,
      _ => {
        return Err(PoolError::OutOfMemory {
          size: capacity,
          align: ALIGNMENT,
        });
      }
    };

    Ok(Self {
      data,
      last: 0,
      end: capacity,
      failed: 0,
    })
  }

  /// Carves `size` bytes out of the free tail of this block.
  ///
  /// The start is rounded up to [`ALIGNMENT`] when `aligned` is set.
  pub fn bump(
    &mut self,
    size: usize,
    aligned: bool,
  ) -> Option<NonNull<u8>> {
    let start = if aligned {
      align_to!(self.last, ALIGNMENT)
    } else {
      self.last
    };

    if self.end.checked_sub(start)? < size {
      return None;
    }

    self.last = start + size;

    // SAFETY: `start <= end`, so the result stays inside the region.
    Some(unsafe { self.data.add(start) })
  }

  /// Makes the whole region available again without touching its bytes.
  pub fn rewind(&mut self) {
    self.last = 0;
  }

  pub fn capacity(&self) -> usize {
    self.end
  }

  /// Whether `ptr` falls inside `[start, end)` of this block's data region.
  pub fn contains(
    &self,
    ptr: *const u8,
  ) -> bool {
    let start = self.data.as_ptr() as usize;
    let addr = ptr as usize;

    addr >= start && addr < start + self.end
  }
}

impl Drop for Block {
  fn drop(&mut self) {
    // SAFETY: `data` came from `posix_memalign` and is freed exactly once.
    unsafe { libc::free(self.data.as_ptr() as *mut c_void) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::align::is_aligned;

  #[test]
  fn test_bump_aligned() {
    let mut block = Block::new(256).unwrap();

    let first = block.bump(3, true).unwrap();
    let second = block.bump(5, true).unwrap();

    assert!(is_aligned(first.as_ptr() as usize, ALIGNMENT));
    assert!(is_aligned(second.as_ptr() as usize, ALIGNMENT));
    assert_eq!(second.as_ptr() as usize - first.as_ptr() as usize, ALIGNMENT);
    assert_eq!(block.last, ALIGNMENT + 5);
  }

  #[test]
  fn test_bump_unaligned() {
    let mut block = Block::new(64).unwrap();

    let first = block.bump(3, false).unwrap();
    let second = block.bump(5, false).unwrap();

    assert_eq!(second.as_ptr() as usize - first.as_ptr() as usize, 3);
    assert_eq!(block.last, 8);
  }

  #[test]
  fn test_bump_exhaustion() {
    let mut block = Block::new(64).unwrap();

    assert!(block.bump(64, true).is_some());
    assert!(block.bump(1, false).is_none());
    assert_eq!(block.last, block.end);
  }

  #[test]
  fn test_aligned_start_past_end() {
    let mut block = Block::new(40).unwrap();

    assert!(block.bump(1, false).is_some());
    // 32 is the last aligned start; rounding 40 up overshoots the end.
    assert!(block.bump(8, true).is_some());
    assert!(block.bump(0, true).is_none());
    assert!(block.bump(0, false).is_some());
  }

  #[test]
  fn test_rewind_keeps_contents() {
    let mut block = Block::new(64).unwrap();

    let first = block.bump(16, true).unwrap();
    unsafe { ptr::write_bytes(first.as_ptr(), 0xAB, 16) };

    block.rewind();
    assert_eq!(block.last, 0);

    let again = block.bump(16, true).unwrap();
    assert_eq!(first, again);
    assert_eq!(unsafe { *again.as_ptr() }, 0xAB);
  }

  #[test]
  fn test_contains() {
    let mut block = Block::new(64).unwrap();
    let inside = block.bump(8, true).unwrap();

    assert!(block.contains(inside.as_ptr()));
    assert!(block.contains(inside.as_ptr().wrapping_add(63)));
    assert!(!block.contains(inside.as_ptr().wrapping_add(64)));
  }
}
