use std::ptr::{self, NonNull};

use firstfit::{AllocError, AllocatorConfig, FirstFitAllocator, HEADER_WIDTH};

fn allocator() -> FirstFitAllocator {
  let mut allocator = FirstFitAllocator::new();
  allocator.init_with(AllocatorConfig::default()).unwrap();
  allocator
}

/// No two neighbours free, blocks tile the arena.
fn assert_joined(allocator: &FirstFitAllocator) {
  allocator.check_invariants().unwrap();

  let blocks = allocator.blocks().unwrap();
  for pair in blocks.windows(2) {
    assert!(!(pair[0].is_free && pair[1].is_free), "{pair:?}");
  }

  let covered: usize = blocks.iter().map(|block| HEADER_WIDTH + block.size).sum();
  assert_eq!(covered, AllocatorConfig::DEFAULT_CAPACITY);
}

fn assert_single_free_block(allocator: &FirstFitAllocator) {
  let blocks = allocator.blocks().unwrap();
  assert_eq!(blocks.len(), 1);
  assert!(blocks[0].is_free);
  assert_eq!(blocks[0].size, AllocatorConfig::DEFAULT_CAPACITY - HEADER_WIDTH);
}

fn typed<T>(
  allocator: &mut FirstFitAllocator,
  count: usize,
) -> NonNull<T> {
  allocator.allocate(count * size_of::<T>()).unwrap().cast::<T>()
}

#[test]
fn test_single_alloc_and_free() {
  let mut allocator = allocator();

  unsafe {
    let arr = typed::<i32>(&mut allocator, 5).as_ptr();
    arr.add(2).write_unaligned(21);
    assert_eq!(arr.add(2).read_unaligned(), 21);

    allocator.free(arr.cast()).unwrap();
  }

  assert_joined(&allocator);
  assert_single_free_block(&allocator);
}

#[test]
fn test_two_allocations_collapse() {
  let mut allocator = allocator();

  let a = allocator.allocate(20).unwrap();
  let b = allocator.allocate(8).unwrap();
  assert_eq!(allocator.blocks().unwrap().len(), 3);

  allocator.free(a.as_ptr()).unwrap();
  allocator.free(b.as_ptr()).unwrap();

  assert_joined(&allocator);
  assert_single_free_block(&allocator);
}

#[test]
fn test_multiple_sizes_do_not_overlap() {
  let mut allocator = allocator();

  unsafe {
    let ints = typed::<i32>(&mut allocator, 3).as_ptr();
    let more = typed::<i32>(&mut allocator, 2).as_ptr();
    ints.add(2).write_unaligned(6);
    more.write_unaligned(10);

    assert_eq!(ints.add(2).read_unaligned() + more.read_unaligned(), 16);
    assert!(more as usize >= ints.add(3) as usize + HEADER_WIDTH);

    let doubles = typed::<f64>(&mut allocator, 2).as_ptr();
    let others = typed::<f64>(&mut allocator, 3).as_ptr();
    doubles.add(1).write_unaligned(3.1111111111);
    others.add(2).write_unaligned(4.2222222222);
    assert_eq!(doubles.add(1).read_unaligned(), 3.1111111111);
    assert_eq!(others.add(2).read_unaligned(), 4.2222222222);

    for ptr in [ints.cast(), more.cast(), doubles.cast(), others.cast::<u8>()] {
      allocator.free(ptr).unwrap();
      assert_joined(&allocator);
    }
  }

  assert_single_free_block(&allocator);
}

#[test]
fn test_reuse_after_free() {
  let mut allocator = allocator();

  let first = allocator.allocate(size_of::<i32>()).unwrap();
  allocator.payload_mut(first).unwrap()[..4].copy_from_slice(&90i32.to_ne_bytes());
  allocator.free(first.as_ptr()).unwrap();

  let second = allocator.allocate(size_of::<i32>()).unwrap();
  assert_eq!(first, second);

  allocator.payload_mut(second).unwrap()[..4].copy_from_slice(&80i32.to_ne_bytes());
  assert_joined(&allocator);
}

#[repr(C)]
struct Mixed {
  x: f64,
  y: i32,
  z: &'static str,
}

#[test]
fn test_struct_payload() {
  let mut allocator = allocator();

  unsafe {
    let mixed = typed::<Mixed>(&mut allocator, 1).as_ptr();
    mixed.write_unaligned(Mixed {
      x: 3.121216,
      y: 20,
      z: "Testing",
    });

    let read = mixed.read_unaligned();
    assert_eq!(read.x, 3.121216);
    assert_eq!(read.y, 20);
    assert_eq!(read.z, "Testing");

    allocator.free(mixed.cast()).unwrap();
  }

  assert_joined(&allocator);
}

#[test]
fn test_string_payloads() {
  let mut allocator = allocator();

  let table = allocator.allocate(3 * size_of::<usize>()).unwrap();
  let strings: Vec<_> = (1..=3)
    .map(|i| {
      let ptr = allocator.allocate(10).unwrap();
      let text = format!("String {i}");
      allocator.payload_mut(ptr).unwrap()[..text.len()].copy_from_slice(text.as_bytes());
      ptr
    })
    .collect();

  for (i, ptr) in strings.iter().enumerate() {
    let payload = allocator.payload_mut(*ptr).unwrap();
    assert_eq!(&payload[..8], format!("String {}", i + 1).as_bytes());
  }

  for ptr in strings {
    allocator.free(ptr.as_ptr()).unwrap();
    assert_joined(&allocator);
  }
  allocator.free(table.as_ptr()).unwrap();

  assert_single_free_block(&allocator);
}

#[test]
fn test_large_blocks_account_for_headers() {
  let mut allocator = allocator();

  // 200 + 700 bytes plus three headers still fit in 1000.
  let small = allocator.allocate(200).unwrap();
  let large = allocator.allocate(700).unwrap();

  let stats = allocator.stats().unwrap();
  assert_eq!(stats.used_bytes, 900);
  assert_eq!(stats.free_bytes, 1000 - 900 - 3 * HEADER_WIDTH);

  // A naive byte count would accept 96 more bytes; headers forbid it.
  assert!(matches!(
    allocator.allocate(1000 - 900 - HEADER_WIDTH),
    Err(AllocError::OutOfSpace { .. })
  ));

  allocator.free(small.as_ptr()).unwrap();
  allocator.free(large.as_ptr()).unwrap();
  assert_joined(&allocator);

  let whole = allocator.allocate(800).unwrap();
  allocator.free(whole.as_ptr()).unwrap();
  assert_joined(&allocator);

  let big = allocator.allocate(850).unwrap();
  allocator.payload_mut(big).unwrap()[..4].copy_from_slice(b"Test");
  allocator.free(big.as_ptr()).unwrap();
  assert_single_free_block(&allocator);
}

#[test]
fn test_fill_then_drain() {
  let mut allocator = allocator();
  let mut live = Vec::new();

  while let Ok(ptr) = allocator.allocate(40) {
    live.push(ptr);
  }
  assert_eq!(live.len(), (1000 - HEADER_WIDTH) / (40 + HEADER_WIDTH));
  assert_joined(&allocator);

  // Free every other block, then the rest.
  for ptr in live.iter().step_by(2) {
    allocator.free(ptr.as_ptr()).unwrap();
    assert_joined(&allocator);
  }
  for ptr in live.iter().skip(1).step_by(2) {
    allocator.free(ptr.as_ptr()).unwrap();
    assert_joined(&allocator);
  }

  assert_single_free_block(&allocator);
}

#[test]
fn test_zero_size_allocation() {
  let mut allocator = allocator();

  let empty = allocator.allocate(0).unwrap();
  assert!(allocator.payload_mut(empty).unwrap().is_empty());

  allocator.free(empty.as_ptr()).unwrap();
  assert_joined(&allocator);
  assert_single_free_block(&allocator);
}

#[test]
fn test_free_null() {
  let mut allocator = allocator();
  let before = allocator.blocks().unwrap();

  allocator.free(ptr::null_mut()).unwrap();

  assert_eq!(allocator.blocks().unwrap(), before);
}

#[test]
fn test_oversized_request_fails_cleanly() {
  let mut allocator = allocator();
  let before = allocator.blocks().unwrap();

  let err = allocator.allocate(1000).unwrap_err();

  assert_eq!(
    err,
    AllocError::OutOfSpace {
      requested: 1000,
      largest_free: 1000 - HEADER_WIDTH,
    }
  );
  assert_eq!(allocator.blocks().unwrap(), before);
}

#[test]
fn test_foreign_pointer_rejected() {
  let mut allocator = allocator();
  let kept = allocator.allocate(16).unwrap();
  let before = allocator.blocks().unwrap();

  let mut outside = Box::new([0u8; 8]);
  assert!(matches!(
    allocator.free(outside.as_mut_ptr()),
    Err(AllocError::InvalidPointer { .. })
  ));
  assert_eq!(allocator.blocks().unwrap(), before);

  allocator.free(kept.as_ptr()).unwrap();
}

#[test]
fn test_arena_end_pointer_rejected() {
  let mut allocator = allocator();
  let kept = allocator.allocate(16).unwrap();
  let before = allocator.blocks().unwrap();

  // The range check is closed at the top; the end address passes it but
  // starts no payload.
  let start = kept.as_ptr() as usize - HEADER_WIDTH;
  let end = (start + AllocatorConfig::DEFAULT_CAPACITY) as *mut u8;

  assert_eq!(
    allocator.free(end),
    Err(AllocError::InvalidPointer { addr: end as usize })
  );
  assert_eq!(allocator.blocks().unwrap(), before);

  allocator.free(kept.as_ptr()).unwrap();
}

#[test]
fn test_teardown() {
  let mut allocator = allocator();
  allocator.allocate(100).unwrap();

  allocator.teardown();

  assert_eq!(allocator.allocate(1), Err(AllocError::NotInitialized));
  assert_eq!(allocator.check_invariants(), Err(AllocError::NotInitialized));
}
