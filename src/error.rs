//! Error type shared by every allocator operation.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AllocError>;

/// Recoverable allocator failures.
///
/// Every operation that returns one of these leaves the block directory
/// exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
  /// `allocate`/`free` called without a live arena.
  #[error("allocator is not initialized, call init() first")]
  NotInitialized,

  /// No block is both free and large enough.
  #[error("not enough space left: requested {requested} bytes, largest free block is {largest_free} bytes")]
  OutOfSpace {
    /// Payload bytes requested.
    requested: usize,
    /// Largest free payload currently in the arena.
    largest_free: usize,
  },

  /// The address does not belong to a live allocation of this arena.
  #[error("pointer {addr:#x} was not returned by this allocator")]
  InvalidPointer {
    /// The rejected address.
    addr: usize,
  },

  /// The requested arena cannot hold even the bootstrap block.
  #[error("arena capacity {capacity} is too small, need at least {min} bytes")]
  CapacityTooSmall {
    /// Requested capacity.
    capacity: usize,
    /// Smallest usable capacity.
    min: usize,
  },

  /// `init` called while an arena is already live.
  #[error("allocator already owns an arena of {capacity} bytes")]
  AlreadyInitialized {
    /// Capacity of the live arena.
    capacity: usize,
  },

  /// The block directory is inconsistent.
  #[error("directory corrupted at offset {offset}: {reason}")]
  InvariantViolation {
    /// Header offset where the check failed.
    offset: usize,
    /// What was broken.
    reason: String,
  },
}
