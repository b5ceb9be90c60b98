use std::mem;

/// Link value meaning "no neighbour".
pub const NIL: usize = usize::MAX;

/// Bytes occupied by every header inside the arena.
pub const HEADER_WIDTH: usize = mem::size_of::<Block>();

/// Explicit filler after the flag, so a written header has no padding.
const FLAG_PAD: usize = mem::size_of::<usize>() - mem::size_of::<bool>();

/// Header stored in the arena immediately before its payload.
///
/// `next` and `prev` are byte offsets of the neighbouring headers,
/// or [`NIL`]. Every byte is a field: once a merge turns a header into
/// payload, those bytes are still initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Block {
  pub size: usize,
  pub is_free: bool,
  pad: [u8; FLAG_PAD],
  pub next: usize,
  pub prev: usize,
}

impl Block {
  pub fn new(
    size: usize,
    is_free: bool,
    next: usize,
    prev: usize,
  ) -> Self {
    Self {
      size,
      is_free,
      pad: [0; FLAG_PAD],
      next,
      prev,
    }
  }

  pub fn next(&self) -> Option<usize> {
    (self.next != NIL).then_some(self.next)
  }

  pub fn prev(&self) -> Option<usize> {
    (self.prev != NIL).then_some(self.prev)
  }

  /// Offset one past this block's payload, given its own header offset.
  pub fn end(
    &self,
    offset: usize,
  ) -> usize {
    offset + HEADER_WIDTH + self.size
  }
}
