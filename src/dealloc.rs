use crate::{
  allocator::FirstFitAllocator,
  directory::Directory,
  error::{AllocError, Result},
};

/// Maps a payload address back to the header offset that owns it.
///
/// The address must fall inside `[arena_start, arena_start + capacity]`
/// and start the payload of a block in the directory.
pub(crate) fn owning_block(
  directory: &Directory,
  addr: usize,
) -> Result<usize> {
  let Some(payload) = directory.arena().offset_of(addr) else {
    tracing::warn!(addr = format_args!("{addr:#x}"), "pointer outside the arena");
    return Err(AllocError::InvalidPointer { addr });
  };

  directory.locate(payload).ok_or_else(|| {
    tracing::warn!(
      addr = format_args!("{addr:#x}"),
      payload,
      "pointer does not start an allocation"
    );
    AllocError::InvalidPointer { addr }
  })
}

impl FirstFitAllocator {
  /// Returns the block behind `ptr` to the arena and merges it with free
  /// neighbours.
  ///
  /// A null `ptr` is ignored. Pointers that were not handed out by this
  /// arena are rejected with [`AllocError::InvalidPointer`] and nothing
  /// changes.
  pub fn free(
    &mut self,
    ptr: *mut u8,
  ) -> Result<()> {
    if ptr.is_null() {
      return Ok(());
    }

    let directory = self.directory_mut()?;
    let offset = owning_block(directory, ptr as usize)?;

    if directory.block(offset).is_free {
      tracing::warn!(offset, "block is already free");
      return Ok(());
    }

    directory.set_free(offset, true);
    tracing::debug!(offset, size = directory.block(offset).size, "freed");

    coalesce(directory, offset);

    Ok(())
  }
}

/// Merges the free block at `offset` with free neighbours.
///
/// The forward merge runs first so that a free predecessor then swallows
/// the already-combined block, collapsing three free blocks in one call.
fn coalesce(
  directory: &mut Directory,
  offset: usize,
) {
  let block = directory.block(offset);

  if let Some(next) = block.next()
    && directory.block(next).is_free
  {
    directory.absorb_next(offset);
  }

  if let Some(prev) = block.prev()
    && directory.block(prev).is_free
  {
    directory.absorb_next(prev);
  }
}
