//! The block directory: a doubly linked chain of headers living inside the
//! arena, kept in ascending offset order.
//!
//! ```text
//!   offset 0
//!   ┌────────┬─────────┬────────┬─────────────┬────────┬──────────┐
//!   │ header │ payload │ header │   payload   │ header │ payload  │
//!   │ used   │  n = 20 │ used   │   n = 8     │ free   │  rest    │
//!   └────────┴─────────┴────────┴─────────────┴────────┴──────────┘
//!       │  ▲               │  ▲                   │
//!       └──┼──── next ─────┘  └──┼──── next ───────┘
//!          └──── prev ───────────┘ ...
//! ```
//!
//! Every block, free or not, is linked. There is no free list, so each
//! search walks from the head.

use crate::{
  arena::Arena,
  block::{Block, HEADER_WIDTH, NIL},
  error::{AllocError, Result},
};

/// Read-only view of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  /// Header offset from the arena start.
  pub offset: usize,
  /// Payload bytes, header excluded.
  pub size: usize,
  pub is_free: bool,
}

/// Occupancy summary of an arena.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
  pub capacity: usize,
  pub blocks: usize,
  pub free_blocks: usize,
  /// Payload bytes held by free blocks.
  pub free_bytes: usize,
  /// Payload bytes held by allocated blocks.
  pub used_bytes: usize,
  /// Largest single free payload, the biggest request that can succeed.
  pub largest_free: usize,
}

pub struct Directory {
  arena: Arena,
}

impl Directory {
  /// Creates the arena and its single bootstrap block.
  pub fn new(capacity: usize) -> Self {
    Self {
      arena: Arena::new(capacity),
    }
  }

  pub fn arena(&self) -> &Arena {
    &self.arena
  }

  pub fn arena_mut(&mut self) -> &mut Arena {
    &mut self.arena
  }

  /// The head always sits at the lowest address.
  pub fn head(&self) -> usize {
    0
  }

  pub fn block(
    &self,
    offset: usize,
  ) -> Block {
    self.arena.read_block(offset)
  }

  pub fn iter(&self) -> Blocks<'_> {
    Blocks {
      arena: &self.arena,
      cursor: Some(self.head()),
    }
  }

  /// First-fit: the first block from the head that is free and holds `size` bytes.
  pub fn find_free(
    &self,
    size: usize,
  ) -> Option<(usize, Block)> {
    self.iter().find(|(_, block)| block.is_free && block.size >= size)
  }

  pub fn set_free(
    &mut self,
    offset: usize,
    is_free: bool,
  ) {
    let mut block = self.block(offset);
    block.is_free = is_free;
    self.arena.write_block(offset, block);
  }

  /// Shrinks the block at `offset` to `size` payload bytes and links a new
  /// free block holding the rest right after it.
  ///
  /// Requires `size + HEADER_WIDTH < block.size`.
  pub fn split(
    &mut self,
    offset: usize,
    size: usize,
  ) -> usize {
    let mut block = self.block(offset);
    debug_assert!(size + HEADER_WIDTH < block.size);

    let remainder = offset + HEADER_WIDTH + size;
    let tail = Block::new(block.size - size - HEADER_WIDTH, true, block.next, offset);
    self.arena.write_block(remainder, tail);

    if let Some(next) = block.next() {
      let mut after = self.block(next);
      after.prev = remainder;
      self.arena.write_block(next, after);
    }

    block.size = size;
    block.next = remainder;
    self.arena.write_block(offset, block);

    tracing::trace!(offset, size, remainder, remainder_size = tail.size, "split block");

    remainder
  }

  /// Folds the block following `offset` into it, header included.
  ///
  /// Returns `false` when `offset` is the tail.
  pub fn absorb_next(
    &mut self,
    offset: usize,
  ) -> bool {
    let mut block = self.block(offset);
    let Some(next) = block.next() else {
      return false;
    };

    let absorbed = self.block(next);
    block.size += absorbed.size + HEADER_WIDTH;
    block.next = absorbed.next;
    self.arena.write_block(offset, block);

    if let Some(after) = absorbed.next() {
      let mut after_block = self.block(after);
      after_block.prev = offset;
      self.arena.write_block(after, after_block);
    }

    tracing::trace!(offset, absorbed = next, size = block.size, "merged blocks");

    true
  }

  /// Recovers the header owning the payload at `payload` (an arena offset).
  ///
  /// Only offsets that start a payload of a linked block resolve.
  pub fn locate(
    &self,
    payload: usize,
  ) -> Option<usize> {
    let header = payload.checked_sub(HEADER_WIDTH)?;
    self
      .iter()
      .map(|(offset, _)| offset)
      .take_while(|&offset| offset <= header)
      .find(|&offset| offset == header)
  }

  pub fn snapshot(&self) -> Vec<BlockInfo> {
    self
      .iter()
      .map(|(offset, block)| BlockInfo {
        offset,
        size: block.size,
        is_free: block.is_free,
      })
      .collect()
  }

  pub fn stats(&self) -> ArenaStats {
    self.iter().fold(
      ArenaStats {
        capacity: self.arena.capacity(),
        ..ArenaStats::default()
      },
      |mut stats, (_, block)| {
        stats.blocks += 1;
        if block.is_free {
          stats.free_blocks += 1;
          stats.free_bytes += block.size;
          stats.largest_free = stats.largest_free.max(block.size);
        } else {
          stats.used_bytes += block.size;
        }
        stats
      },
    )
  }

  pub fn largest_free(&self) -> usize {
    self
      .iter()
      .filter(|(_, block)| block.is_free)
      .map(|(_, block)| block.size)
      .max()
      .unwrap_or(0)
  }

  /// Walks the whole chain and reports the first broken invariant.
  ///
  /// Checked: blocks tile the arena with no gap or overlap, `prev` links
  /// mirror `next` links, and no two neighbours are both free.
  pub fn check_invariants(&self) -> Result<()> {
    let capacity = self.arena.capacity();
    let violation = |offset: usize, reason: String| AllocError::InvariantViolation { offset, reason };

    let mut offset = self.head();
    let mut prev = NIL;
    let mut prev_free = false;

    loop {
      if offset + HEADER_WIDTH > capacity {
        return Err(violation(offset, format!("header does not fit in {capacity} bytes")));
      }

      let block = self.block(offset);

      if block.prev != prev {
        return Err(violation(offset, format!("prev is {}, expected {prev}", block.prev)));
      }
      if prev_free && block.is_free {
        return Err(violation(offset, "two adjacent free blocks".to_string()));
      }

      let end = offset
        .checked_add(HEADER_WIDTH + block.size)
        .filter(|&end| end <= capacity)
        .ok_or_else(|| violation(offset, format!("size {} overruns the arena", block.size)))?;

      match block.next() {
        Some(next) if next != end => {
          return Err(violation(offset, format!("next is {next}, block ends at {end}")));
        }
        Some(next) => {
          prev = offset;
          prev_free = block.is_free;
          offset = next;
        }
        None if end != capacity => {
          return Err(violation(offset, format!("tail ends at {end}, arena holds {capacity}")));
        }
        None => return Ok(()),
      }
    }
  }
}

/// Iterator over `(offset, header)` pairs in address order.
pub struct Blocks<'a> {
  arena: &'a Arena,
  cursor: Option<usize>,
}

impl Iterator for Blocks<'_> {
  type Item = (usize, Block);

  fn next(&mut self) -> Option<Self::Item> {
    let offset = self.cursor?;
    let block = self.arena.read_block(offset);
    self.cursor = block.next();
    Some((offset, block))
  }
}
