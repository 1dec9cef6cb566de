use super::{replay_buffer::ReplayBuffer, subject_core::Subject, Emitter, SubjectSubscription};
use crate::{config::SubjectConfig, observer::Observer};

/// A [`Subject`] that remembers its last `max_size` values.
///
/// Every new subscriber first receives the remembered values, oldest first,
/// then live values, with no gap and no duplicate between the two. After a
/// terminal signal, late subscribers still get the history followed by the
/// terminal marker.
///
/// ```rust
/// use futures::{executor::block_on, StreamExt};
/// use rxcast::prelude::*;
///
/// let subject = ReplaySubject::<i32, ()>::new(2);
/// for i in 0..4 {
///   subject.next(i);
/// }
///
/// let (_subscription, observer) = subject.subscribe();
/// subject.next(4);
/// subject.complete();
///
/// let values: Vec<_> = block_on(observer.into_stream().unwrap().collect());
/// let values: Vec<_> = values.into_iter().filter_map(Notification::into_next).collect();
/// assert_eq!(values, vec![2, 3, 4]);
/// ```
pub struct ReplaySubject<Item, Err> {
  subject: Subject<Item, Err>,
}

impl<Item, Err> Clone for ReplaySubject<Item, Err> {
  fn clone(&self) -> Self { Self { subject: self.subject.clone() } }
}

impl<Item, Err> ReplaySubject<Item, Err> {
  #[inline]
  pub fn new(max_size: usize) -> Self { Self::with_config(max_size, SubjectConfig::default()) }

  pub fn with_config(max_size: usize, config: SubjectConfig) -> Self {
    Self { subject: Subject::build(config, Some(ReplayBuffer::new(max_size))) }
  }

  #[inline]
  pub fn config(&self) -> &SubjectConfig { self.subject.config() }

  #[inline]
  pub fn subscriber_count(&self) -> usize { self.subject.subscriber_count() }

  /// Number of values a subscriber arriving now would be replayed.
  #[inline]
  pub fn buffered_len(&self) -> usize { self.subject.replay_len() }
}

impl<Item, Err> ReplaySubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  #[inline]
  pub fn subscribe(&self) -> (SubjectSubscription<Item, Err>, Observer<Item, Err>) {
    self.subject.subscribe()
  }
}

impl<Item, Err> Emitter<Item, Err> for ReplaySubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  #[inline]
  fn next(&self, value: Item) { self.subject.next(value) }

  #[inline]
  fn error(&self, err: Err) { self.subject.error(err) }

  #[inline]
  fn complete(&self) { self.subject.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.subject.is_closed() }
}
