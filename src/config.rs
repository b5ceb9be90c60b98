//! Arena configuration.

use crate::{
  block::HEADER_WIDTH,
  error::{AllocError, Result},
};

/// Parameters for [`FirstFitAllocator::init_with`](crate::FirstFitAllocator::init_with).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocatorConfig {
  /// Total arena size in bytes, headers included.
  ///
  /// Default: 1000. Must exceed one header width so the bootstrap block
  /// has a payload.
  pub capacity: usize,
}

impl AllocatorConfig {
  /// Default arena capacity in bytes.
  pub const DEFAULT_CAPACITY: usize = 1000;

  /// Smallest capacity that leaves one payload byte after the bootstrap header.
  pub const MIN_CAPACITY: usize = HEADER_WIDTH + 1;

  pub fn new(capacity: usize) -> Self {
    Self { capacity }
  }

  pub fn validate(&self) -> Result<()> {
    if self.capacity < Self::MIN_CAPACITY {
      return Err(AllocError::CapacityTooSmall {
        capacity: self.capacity,
        min: Self::MIN_CAPACITY,
      });
    }
    Ok(())
  }
}

impl Default for AllocatorConfig {
  fn default() -> Self {
    Self::new(Self::DEFAULT_CAPACITY)
  }
}
