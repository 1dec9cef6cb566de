//! # Subject configuration.
//!
//! [`SubjectConfig`] decides how every subscriber of a subject is served:
//! what happens when its delivery channel is full, how large that channel is,
//! whether delivery waits for an explicit connect, and where consumption
//! loops run.
//!
//! # Example
//! ```
//! use rxcast::config::{Backpressure, PublishMode, SubjectConfig};
//!
//! let cfg = SubjectConfig::default()
//!   .backpressure(Backpressure::Drop)
//!   .buffered(10);
//!
//! assert_eq!(cfg.backpressure, Backpressure::Drop);
//! assert_eq!(cfg.buffer_size, 10);
//! assert_eq!(cfg.publish, PublishMode::Immediate);
//! ```

use std::{fmt, sync::Arc};

use crate::{
  channel::Capacity,
  scheduler::{NewThread, Scheduler},
};

/// What a subject does when a subscriber's channel has no room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Backpressure {
  /// The producer waits until the subscriber makes room.
  ///
  /// A consumer that never drains stalls the producer feeding it forever.
  #[default]
  Block,
  /// The value is discarded for that subscriber only.
  Drop,
}

/// When subscribers start receiving values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PublishMode {
  /// As soon as they subscribe.
  #[default]
  Immediate,
  /// Only after their observer is connected. Values emitted earlier are lost.
  Gated,
}

/// Construction-time options shared by every subscriber of a subject.
#[derive(Clone)]
pub struct SubjectConfig {
  /// Overload policy of each subscriber channel.
  pub backpressure: Backpressure,
  /// Capacity of each subscriber channel (0 = strategy default).
  pub buffer_size: usize,
  /// Immediate or connect-gated delivery.
  pub publish: PublishMode,
  /// Where consumption loops are spawned.
  pub scheduler: Arc<dyn Scheduler>,
}

impl Default for SubjectConfig {
  /// Provides a default configuration:
  /// - `backpressure = Backpressure::Block`
  /// - `buffer_size = 0` (unbounded under `Block`)
  /// - `publish = PublishMode::Immediate`
  /// - `scheduler = NewThread`
  fn default() -> Self {
    Self {
      backpressure: Backpressure::default(),
      buffer_size: 0,
      publish: PublishMode::default(),
      scheduler: Arc::new(NewThread::default()),
    }
  }
}

impl SubjectConfig {
  #[inline]
  pub fn new() -> Self { Self::default() }

  pub fn backpressure(mut self, backpressure: Backpressure) -> Self {
    self.backpressure = backpressure;
    self
  }

  /// Allocate `size` slots per subscriber channel, whatever the policy.
  pub fn buffered(mut self, size: usize) -> Self {
    self.buffer_size = size;
    self
  }

  /// Withhold delivery until each observer is connected.
  pub fn gated(mut self) -> Self {
    self.publish = PublishMode::Gated;
    self
  }

  pub fn scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
    self.scheduler = Arc::new(scheduler);
    self
  }

  #[inline]
  pub fn is_gated(&self) -> bool { self.publish == PublishMode::Gated }

  /// Channel capacity implied by `buffer_size` and `backpressure`.
  ///
  /// An explicit size always wins. Otherwise `Block` gets an unbounded
  /// channel and `Drop` a rendezvous one, which only accepts a value while
  /// the consumer is waiting for it.
  pub fn capacity(&self) -> Capacity {
    match (self.buffer_size, self.backpressure) {
      (0, Backpressure::Block) => Capacity::Unbounded,
      (0, Backpressure::Drop) => Capacity::Rendezvous,
      (n, _) => Capacity::Bounded(n),
    }
  }
}

impl fmt::Debug for SubjectConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SubjectConfig")
      .field("backpressure", &self.backpressure)
      .field("buffer_size", &self.buffer_size)
      .field("publish", &self.publish)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_is_unbounded_block() {
    let cfg = SubjectConfig::default();
    assert_eq!(cfg.backpressure, Backpressure::Block);
    assert_eq!(cfg.capacity(), Capacity::Unbounded);
    assert!(!cfg.is_gated());
  }

  #[test]
  fn drop_without_buffer_is_rendezvous() {
    let cfg = SubjectConfig::new().backpressure(Backpressure::Drop);
    assert_eq!(cfg.capacity(), Capacity::Rendezvous);
  }

  #[test]
  fn explicit_buffer_wins_over_policy() {
    let block = SubjectConfig::new().buffered(4);
    let drop = SubjectConfig::new().buffered(4).backpressure(Backpressure::Drop);
    assert_eq!(block.capacity(), Capacity::Bounded(4));
    assert_eq!(drop.capacity(), Capacity::Bounded(4));
  }

  #[test]
  fn gated_setter() {
    let cfg = SubjectConfig::new().gated();
    assert_eq!(cfg.publish, PublishMode::Gated);
    assert!(cfg.is_gated());
    assert!(format!("{cfg:?}").contains("Gated"));
  }
}
