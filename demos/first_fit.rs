use firstfit::{AllocatorConfig, FirstFitAllocator, HEADER_WIDTH};
use tracing_subscriber::EnvFilter;

/// Prints every block of the directory, lowest address first.
fn print_directory(
  label: &str,
  allocator: &FirstFitAllocator,
) {
  println!("\n[{label}]");
  let Ok(blocks) = allocator.blocks() else {
    println!("  <no arena>");
    return;
  };
  for block in blocks {
    println!(
      "  offset {:>4} | payload {:>4} bytes | {}",
      block.offset,
      block.size,
      if block.is_free { "free" } else { "used" }
    );
  }
}

fn main() -> firstfit::Result<()> {
  // RUST_LOG=firstfit=debug shows splits and merges as they happen.
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let mut allocator = FirstFitAllocator::new();
  allocator.init_with(AllocatorConfig::default())?;

  println!("arena of {} bytes, header width {HEADER_WIDTH}", AllocatorConfig::DEFAULT_CAPACITY);
  print_directory("start", &allocator);

  // --------------------------------------------------------------------
  // 1) Two allocations split the bootstrap block twice.
  // --------------------------------------------------------------------
  let a = allocator.allocate(20)?;
  let b = allocator.allocate(8)?;
  allocator.payload_mut(a)?[..5].copy_from_slice(b"Hello");
  print_directory("1: allocate 20 and 8", &allocator);

  // --------------------------------------------------------------------
  // 2) Freeing `a` leaves a hole; a smaller request reuses it first.
  // --------------------------------------------------------------------
  allocator.free(a.as_ptr())?;
  let c = allocator.allocate(4)?;
  println!("\n[2] c == a? {}", c == a);
  print_directory("2: free a, allocate 4", &allocator);

  // --------------------------------------------------------------------
  // 3) Freeing everything collapses the arena back to one block.
  // --------------------------------------------------------------------
  allocator.free(c.as_ptr())?;
  allocator.free(b.as_ptr())?;
  print_directory("3: free all", &allocator);

  // --------------------------------------------------------------------
  // 4) Headers count against capacity.
  // --------------------------------------------------------------------
  let small = allocator.allocate(200)?;
  let large = allocator.allocate(700)?;
  print_directory("4: allocate 200 and 700", &allocator);
  match allocator.allocate(100) {
    Ok(_) => println!("[4] unexpected: 100 more bytes fit"),
    Err(err) => println!("[4] {err}"),
  }
  allocator.free(small.as_ptr())?;
  allocator.free(large.as_ptr())?;

  // --------------------------------------------------------------------
  // 5) Zero-size requests and null frees are harmless.
  // --------------------------------------------------------------------
  let empty = allocator.allocate(0)?;
  allocator.free(empty.as_ptr())?;
  allocator.free(std::ptr::null_mut())?;
  allocator.check_invariants()?;
  println!("\n[5] stats: {:?}", allocator.stats()?);

  allocator.teardown();
  print_directory("end", &allocator);

  Ok(())
}
