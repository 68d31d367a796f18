use std::{ptr::NonNull, slice};

use rmpool::{Pool, align::ALIGNMENT, align_to};
use tracing::Level;

/// Prints where an allocation landed relative to the pool's blocks.
fn print_alloc(
  pool: &Pool,
  size: usize,
  addr: NonNull<u8>,
) {
  println!(
    "Allocated {} bytes, address = {:?}, in blocks = {}, blocks = {}",
    size,
    addr,
    pool.contains(addr.as_ptr()),
    pool.block_count(),
  );
}

fn main() -> rmpool::Result<()> {
  // Lifecycle events at DEBUG, block growth and large tracking at TRACE.
  tracing_subscriber::fmt()
    .with_max_level(Level::TRACE)
    .init();

  let mut pool = Pool::create(4096)?;
  println!("[start] {:?}", pool);

  // --------------------------------------------------------------------
  // 1) Ten 512-byte allocations.
  //    Eight fill the head block, the ninth appends a second block.
  // --------------------------------------------------------------------
  println!("\n[1] Allocate 10 x 512 bytes");
  for _ in 0..10 {
    let addr = pool.alloc(512)?;
    print_alloc(&pool, 512, addr);
  }

  println!(
    "[1] align_to!(24, 32) = {}, align_to!(17, 32) = {}",
    align_to!(24usize, ALIGNMENT),
    align_to!(17usize, ALIGNMENT)
  );

  // --------------------------------------------------------------------
  // 2) Zeroed allocations, checked byte by byte.
  // --------------------------------------------------------------------
  println!("\n[2] Allocate 5 x 32 zeroed bytes");
  for _ in 0..5 {
    let addr = pool.alloc_zeroed(32)?;

    // SAFETY: the pool just handed out 32 bytes at `addr`.
    let bytes = unsafe { slice::from_raw_parts(addr.as_ptr(), 32) };

    if bytes.iter().all(|&byte| byte == 0) {
      println!("[2] zeroed allocation at {:?} ok", addr);
    } else {
      println!("[2] zeroed allocation at {:?} is dirty", addr);
    }
  }

  // --------------------------------------------------------------------
  // 3) Large allocations freed right away.
  //    The freed record slot is reused, so the record list stays at one.
  // --------------------------------------------------------------------
  println!("\n[3] Allocate and free 5 x 8 KiB");
  for _ in 0..5 {
    let addr = pool.alloc(8192)?;
    print_alloc(&pool, 8192, addr);
    pool.free_large(addr);
  }
  println!("[3] large records = {}", pool.large_len());

  // --------------------------------------------------------------------
  // 4) An over-aligned allocation, outside the blocks.
  // --------------------------------------------------------------------
  let addr = pool.alloc_aligned(100, 64)?;
  println!("\n[4] Allocate 100 bytes aligned to 64");
  print_alloc(&pool, 100, addr);
  println!(
    "[4] Address = {:#X}, addr % 64 = {}",
    addr.as_ptr() as usize,
    addr.as_ptr() as usize % 64
  );

  // --------------------------------------------------------------------
  // 5) Reset, then 58 x 256 bytes.
  //    The first 32 reuse the two existing blocks before any new one.
  // --------------------------------------------------------------------
  pool.reset();
  println!("\n[5] Reset: {:?}", pool);

  for _ in 0..58 {
    pool.alloc(256)?;
  }
  println!("[5] After 58 x 256 bytes: {:?}", pool);

  // --------------------------------------------------------------------
  // 6) End of demo. Everything the pool holds is released here.
  // --------------------------------------------------------------------
  pool.destroy();
  println!("\n[6] Pool destroyed.");

  Ok(())
}
