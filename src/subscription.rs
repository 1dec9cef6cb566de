//! Subscription handles.

mod dynamic;
pub(crate) use dynamic::DynamicEntries;

/// Subscription returned from `subscribe` to allow unsubscribing.
pub trait Subscription {
  /// Stop delivery to this subscriber. Calling it again does nothing.
  fn unsubscribe(&mut self);

  /// Whether no further notification will reach this subscriber.
  fn is_closed(&self) -> bool;
}

/// Unsubscribes the wrapped subscription when dropped.
#[must_use = "dropping the guard unsubscribes immediately"]
pub struct SubscriptionGuard<S: Subscription>(pub(crate) S);

impl<S: Subscription> SubscriptionGuard<S> {
  #[inline]
  pub fn new(subscription: S) -> Self { Self(subscription) }
}

impl<S: Subscription> Drop for SubscriptionGuard<S> {
  #[inline]
  fn drop(&mut self) { self.0.unsubscribe() }
}

impl<S: Subscription> std::ops::Deref for SubscriptionGuard<S> {
  type Target = S;

  #[inline]
  fn deref(&self) -> &S { &self.0 }
}
