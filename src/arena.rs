//! The raw byte buffer backing every allocation.
//!
//! Headers are stored inside the buffer itself and addressed by byte
//! offset. All pointer arithmetic happens here, behind bounds checks.

use std::{alloc, ptr::NonNull, slice};

use crate::block::{Block, HEADER_WIDTH, NIL};

pub struct Arena {
  base: NonNull<u8>,
  capacity: usize,
}

impl Arena {
  /// Acquires `capacity` zeroed bytes from the C heap and installs one
  /// free block spanning the whole buffer.
  ///
  /// Payload bytes are always initialized: zero until written, or the
  /// bytes of a header that was merged away.
  ///
  /// The caller guarantees `capacity > HEADER_WIDTH`.
  ///
  /// Terminates the process if the buffer cannot be obtained.
  pub fn new(capacity: usize) -> Self {
    debug_assert!(capacity > HEADER_WIDTH);

    let raw = unsafe { libc::calloc(capacity, 1) } as *mut u8;

    let Some(base) = NonNull::new(raw) else {
      tracing::error!(capacity, "could not allocate main arena buffer");
      let layout = alloc::Layout::array::<u8>(capacity).unwrap_or(alloc::Layout::new::<u8>());
      alloc::handle_alloc_error(layout);
    };

    let mut arena = Self { base, capacity };
    arena.write_block(0, Block::new(capacity - HEADER_WIDTH, true, NIL, NIL));

    tracing::debug!(capacity, base = ?arena.base, "arena initialized");

    arena
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn start(&self) -> usize {
    self.base.as_ptr() as usize
  }

  /// Reads the header stored at `offset`.
  pub fn read_block(
    &self,
    offset: usize,
  ) -> Block {
    self.check_header(offset);
    unsafe { self.base.as_ptr().add(offset).cast::<Block>().read_unaligned() }
  }

  /// Writes a header at `offset`.
  pub fn write_block(
    &mut self,
    offset: usize,
    block: Block,
  ) {
    self.check_header(offset);
    unsafe { self.base.as_ptr().add(offset).cast::<Block>().write_unaligned(block) }
  }

  /// Address of the payload that follows the header at `offset`.
  pub fn payload_ptr(
    &self,
    offset: usize,
  ) -> NonNull<u8> {
    self.check_header(offset);
    unsafe { self.base.add(offset + HEADER_WIDTH) }
  }

  /// Payload bytes of the block at `offset`.
  pub fn payload_mut(
    &mut self,
    offset: usize,
    len: usize,
  ) -> &mut [u8] {
    let start = offset + HEADER_WIDTH;
    assert!(start + len <= self.capacity, "payload {start}+{len} exceeds arena");
    unsafe { slice::from_raw_parts_mut(self.base.as_ptr().add(start), len) }
  }

  /// Converts an address into an arena offset.
  ///
  /// Accepts the closed range `[start, start + capacity]`.
  pub fn offset_of(
    &self,
    addr: usize,
  ) -> Option<usize> {
    let start = self.start();
    (start..=start + self.capacity).contains(&addr).then(|| addr - start)
  }

  fn check_header(
    &self,
    offset: usize,
  ) {
    assert!(
      offset.checked_add(HEADER_WIDTH).is_some_and(|end| end <= self.capacity),
      "header offset {offset} outside arena of {} bytes",
      self.capacity
    );
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    tracing::debug!(capacity = self.capacity, base = ?self.base, "arena released");
    unsafe { libc::free(self.base.as_ptr().cast()) }
  }
}
