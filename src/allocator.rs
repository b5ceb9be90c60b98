use std::ptr::NonNull;

use crate::{
  block::HEADER_WIDTH,
  config::AllocatorConfig,
  dealloc,
  directory::{ArenaStats, BlockInfo, Directory},
  error::{AllocError, Result},
};

/// First-fit allocator over one fixed-capacity arena.
///
/// Starts uninitialized; [`init`](Self::init) acquires the arena and
/// [`teardown`](Self::teardown) releases it. Each instance owns an
/// independent arena.
///
/// The type holds a raw buffer and is neither `Send` nor `Sync`.
pub struct FirstFitAllocator {
  pub(crate) directory: Option<Directory>,
}

impl FirstFitAllocator {
  pub fn new() -> Self {
    Self { directory: None }
  }

  /// Acquires an arena of `capacity` bytes holding one free block of
  /// `capacity - HEADER_WIDTH` bytes.
  ///
  /// The process is terminated if the memory system cannot provide the buffer.
  pub fn init(
    &mut self,
    capacity: usize,
  ) -> Result<()> {
    self.init_with(AllocatorConfig::new(capacity))
  }

  pub fn init_with(
    &mut self,
    config: AllocatorConfig,
  ) -> Result<()> {
    if let Some(directory) = &self.directory {
      let capacity = directory.arena().capacity();
      tracing::warn!(capacity, "init called on a live arena");
      return Err(AllocError::AlreadyInitialized { capacity });
    }

    config.validate()?;
    self.directory = Some(Directory::new(config.capacity));

    Ok(())
  }

  /// Releases the whole arena at once.
  ///
  /// Every pointer returned by [`allocate`](Self::allocate) dangles from
  /// here on; dereferencing one is undefined behaviour and is the caller's
  /// responsibility. The allocator itself goes back to the uninitialized
  /// state, so later calls report [`AllocError::NotInitialized`].
  pub fn teardown(&mut self) {
    match self.directory.take() {
      Some(directory) => drop(directory),
      None => tracing::warn!("teardown called without an arena"),
    }
  }

  pub fn is_initialized(&self) -> bool {
    self.directory.is_some()
  }

  pub fn capacity(&self) -> Option<usize> {
    self.directory.as_ref().map(|directory| directory.arena().capacity())
  }

  /// Allocates `size` payload bytes with a first-fit scan from the head.
  ///
  /// The chosen block is used whole when it matches `size` exactly or when
  /// the leftover could not hold a header of its own; otherwise it is split
  /// and the rest stays free. `size == 0` follows the same path.
  ///
  /// The returned pointer is valid for `size` bytes until it is freed or
  /// the arena is torn down. No alignment is guaranteed.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>> {
    let directory = self.directory_mut()?;

    let Some((offset, block)) = directory.find_free(size) else {
      let largest_free = directory.largest_free();
      tracing::warn!(requested = size, largest_free, "not enough space left");
      return Err(AllocError::OutOfSpace {
        requested: size,
        largest_free,
      });
    };

    if size + HEADER_WIDTH < block.size {
      directory.split(offset, size);
    } else if block.size != size {
      tracing::debug!(
        offset,
        requested = size,
        size = block.size,
        "remainder too small to split, using whole block"
      );
    }

    directory.set_free(offset, false);

    let ptr = directory.arena().payload_ptr(offset);
    tracing::debug!(offset, size, ?ptr, "allocated");

    Ok(ptr)
  }

  /// Payload of a live allocation as a byte slice.
  ///
  /// The slice covers the whole block, which is at least as long as the
  /// size requested for it.
  pub fn payload_mut(
    &mut self,
    ptr: NonNull<u8>,
  ) -> Result<&mut [u8]> {
    let directory = self.directory_mut()?;
    let offset = dealloc::owning_block(directory, ptr.as_ptr() as usize)?;

    let block = directory.block(offset);
    if block.is_free {
      return Err(AllocError::InvalidPointer {
        addr: ptr.as_ptr() as usize,
      });
    }

    Ok(directory.arena_mut().payload_mut(offset, block.size))
  }

  /// Every block in address order.
  pub fn blocks(&self) -> Result<Vec<BlockInfo>> {
    Ok(self.directory()?.snapshot())
  }

  pub fn stats(&self) -> Result<ArenaStats> {
    Ok(self.directory()?.stats())
  }

  pub fn check_invariants(&self) -> Result<()> {
    self.directory()?.check_invariants()
  }

  pub(crate) fn directory(&self) -> Result<&Directory> {
    self.directory.as_ref().ok_or(AllocError::NotInitialized)
  }

  pub(crate) fn directory_mut(&mut self) -> Result<&mut Directory> {
    self.directory.as_mut().ok_or_else(|| {
      tracing::warn!("allocator used before init");
      AllocError::NotInitialized
    })
  }
}

impl Default for FirstFitAllocator {
  fn default() -> Self {
    Self::new()
  }
}
