use std::sync::Weak;

use log::trace;

use super::subject_core::SubjectInner;
use crate::{
  channel::Sender,
  subscription::{Subscription, SubscriptionGuard},
};

/// Subscription handle for a Subject.
///
/// Holds only a weak reference to the subject, so it never keeps a subject
/// alive. Unsubscribing removes the registry entry and disconnects the
/// channel: values already queued are discarded, a sink that is running
/// finishes its current call, and the consumption loop then ends.
pub struct SubjectSubscription<Item, Err> {
  subject: Weak<SubjectInner<Item, Err>>,
  id: Option<usize>,
  sender: Sender<Item, Err>,
}

impl<Item, Err> SubjectSubscription<Item, Err> {
  pub(crate) fn new(
    subject: Weak<SubjectInner<Item, Err>>,
    id: Option<usize>,
    sender: Sender<Item, Err>,
  ) -> Self {
    Self { subject, id, sender }
  }

  /// Registry ID, or `None` when the subject was already closed at
  /// subscription time or this handle has unsubscribed.
  #[inline]
  pub fn id(&self) -> Option<usize> { self.id }

  /// Values the `Drop` policy discarded for this subscriber.
  #[inline]
  pub fn dropped(&self) -> u64 { self.sender.dropped() }

  /// Tie the subscription to a scope.
  #[inline]
  pub fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self> { SubscriptionGuard::new(self) }
}

impl<Item, Err> Subscription for SubjectSubscription<Item, Err> {
  fn unsubscribe(&mut self) {
    if let Some(id) = self.id.take() {
      if let Some(subject) = self.subject.upgrade() {
        subject.state.lock().subscribers.remove(id);
      }
      trace!("subscriber {id} unsubscribed");
    }
    self.sender.disconnect();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.sender.is_closed() }
}
