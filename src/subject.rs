//! Subjects: hot sources that multicast to many subscribers.
//!
//! | Type | Behavior |
//! |------|----------|
//! | [`Subject`] | subscribers see values emitted after they subscribed |
//! | [`ReplaySubject`] | subscribers first see the last `n` values |
//!
//! Both honor [`SubjectConfig`](crate::config::SubjectConfig): overload
//! policy, channel size, connect-gated delivery and the scheduler that runs
//! consumption loops.

mod connect_gate;
mod replay_buffer;
mod replay_subject;
mod subject_core;
mod subject_subscription;
mod subscribers;

pub use connect_gate::ConnectGate;
pub use replay_buffer::ReplayBuffer;
pub use replay_subject::ReplaySubject;
pub use subject_core::Subject;
pub use subject_subscription::SubjectSubscription;

/// The producer side of a subject.
///
/// All methods take `&self` and may race freely: after the first terminal
/// call every further call is ignored.
pub trait Emitter<Item, Err> {
  /// Emit a value to every current subscriber. Ignored once closed.
  fn next(&self, value: Item);

  /// Close with an error. Every subscriber receives exactly this error.
  fn error(&self, err: Err);

  /// Close normally.
  fn complete(&self);

  /// Whether a terminal signal has been accepted.
  fn is_closed(&self) -> bool;
}
