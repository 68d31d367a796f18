use std::{iter, ptr::NonNull};

use libc::c_void;

/// Number of records inspected for a free slot before a new one is made.
pub const REUSE_SCAN_LIMIT: usize = 4;

/// Tracks one allocation that bypassed the block chain.
///
/// Records are stored inside the pool's own blocks and linked newest first.
/// `alloc == None` marks a slot whose memory was released and that may be
/// bound to the next large allocation.
pub struct LargeRecord {
  pub next: Option<NonNull<LargeRecord>>,
  pub alloc: Option<NonNull<u8>>,
}

/// Walks the record list starting at `head`.
///
/// # Safety
///
/// Every record reachable from `head` must be live for as long as the
/// iterator and the pointers it yields are used.
pub unsafe fn records(
  head: Option<NonNull<LargeRecord>>,
) -> impl Iterator<Item = NonNull<LargeRecord>> {
  iter::successors(head, |record| unsafe { record.as_ref().next })
}

/// Returns memory obtained from `malloc` or `posix_memalign`.
///
/// # Safety
///
/// `ptr` must come from the C allocator and must not be used afterwards.
pub unsafe fn release(
  ptr: NonNull<u8>,
) {
  unsafe { libc::free(ptr.as_ptr() as *mut c_void) }
}
