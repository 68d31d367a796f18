/// Alignment of every block data region and of every aligned small allocation.
pub const ALIGNMENT: usize = 32;

/// Page size the small/large threshold is derived from.
pub const PAGE_SIZE: usize = 4096;

/// Largest request a pool ever serves from its blocks.
pub const MAX_ALLOC_FROM_POOL: usize = PAGE_SIZE - 1;

/// Rounds `value` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two.
///
/// # Examples
///
/// ```rust
/// use rmpool::align_to;
///
/// assert_eq!(align_to!(24, 32), 32);
/// assert_eq!(align_to!(17, 32), 32);
/// assert_eq!(align_to!(64, 32), 64);
/// assert_eq!(align_to!(65, 8), 72);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $alignment:expr) => {
    ($value + ($alignment - 1)) & !($alignment - 1)
  };
}

/// Rounds a pointer up to the next address that is a multiple of `alignment`.
///
/// Only the address changes; the provenance of `ptr` is kept.
pub fn align_ptr(
  ptr: *mut u8,
  alignment: usize,
) -> *mut u8 {
  let addr = ptr as usize;
  ptr.wrapping_add(align_to!(addr, alignment) - addr)
}

/// Returns `true` when `addr` is a multiple of `alignment`.
#[inline]
pub fn is_aligned(
  addr: usize,
  alignment: usize,
) -> bool {
  addr & (alignment - 1) == 0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_align_to() {
    let mut alignments = Vec::new();

    for i in 0..10 {
      let values = (ALIGNMENT * i + 1)..=(ALIGNMENT * (i + 1));

      let expected = ALIGNMENT * (i + 1);

      alignments.push((values, expected));
    }

    for (values, expected) in alignments {
      for value in values {
        assert_eq!(expected, align_to!(value, ALIGNMENT));
      }
    }

    assert_eq!(0, align_to!(0usize, ALIGNMENT));
  }

  #[test]
  fn test_align_ptr() {
    let mut buffer = [0u8; 128];
    let base = buffer.as_mut_ptr();

    for offset in 0..64 {
      let aligned = align_ptr(base.wrapping_add(offset), ALIGNMENT);

      assert!(is_aligned(aligned as usize, ALIGNMENT));
      assert!(aligned as usize >= base as usize + offset);
      assert!((aligned as usize) - (base as usize + offset) < ALIGNMENT);
    }
  }

  #[test]
  fn test_threshold() {
    assert_eq!(MAX_ALLOC_FROM_POOL, 4095);
    assert!(is_aligned(PAGE_SIZE, ALIGNMENT));
    assert!(!is_aligned(MAX_ALLOC_FROM_POOL, 2));
  }
}
