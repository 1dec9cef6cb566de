//! Errors raised by the crate itself.
//!
//! Errors pushed by a producer through [`Emitter::error`] are user data and
//! travel untouched to the subscribers; they never appear here.
//!
//! [`Emitter::error`]: crate::subject::Emitter::error

use thiserror::Error;

/// Failures of the subscription machinery.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
  /// The scheduler refused to start a consumption loop.
  #[error("failed to spawn consumption loop: {0}")]
  Spawn(String),

  /// The shared thread pool could not be created.
  #[error("failed to create thread pool: {0}")]
  ThreadPool(String),

  /// The observer's sequence is already being drained, by its sinks or by a
  /// stream taken earlier.
  #[error("observer sequence already consumed")]
  AlreadyConsumed,
}

impl Error {
  /// Returns a short stable label (snake_case) for use in logs.
  ///
  /// ```
  /// use rxcast::error::Error;
  ///
  /// assert_eq!(Error::AlreadyConsumed.as_label(), "observer_already_consumed");
  /// ```
  pub fn as_label(&self) -> &'static str {
    match self {
      Error::Spawn(_) => "scheduler_spawn_failed",
      Error::ThreadPool(_) => "scheduler_pool_failed",
      Error::AlreadyConsumed => "observer_already_consumed",
    }
  }
}
