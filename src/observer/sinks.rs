use smallvec::SmallVec;

use crate::notification::Notification;

pub(crate) type NextSink<Item> = Box<dyn FnMut(Item) + Send>;
pub(crate) type ErrorSink<Err> = Box<dyn FnMut(Err) + Send>;
pub(crate) type CompleteSink = Box<dyn FnMut() + Send>;

/// Handlers attached to one observer, per event kind, in attach order.
pub(crate) struct Sinks<Item, Err> {
  pub(crate) next: SmallVec<[NextSink<Item>; 1]>,
  pub(crate) error: SmallVec<[ErrorSink<Err>; 1]>,
  pub(crate) complete: SmallVec<[CompleteSink; 1]>,
}

impl<Item, Err> Default for Sinks<Item, Err> {
  fn default() -> Self {
    Self { next: SmallVec::new(), error: SmallVec::new(), complete: SmallVec::new() }
  }
}

impl<Item: Clone, Err: Clone> Sinks<Item, Err> {
  pub(crate) fn dispatch(&mut self, notification: Notification<Item, Err>) {
    match notification {
      Notification::Next(value) => broadcast(&mut self.next, value),
      Notification::Error(err) => broadcast(&mut self.error, err),
      Notification::Complete => self.complete.iter_mut().for_each(|sink| sink()),
    }
  }
}

/// Every sink but the last gets a clone; the last gets the moved value.
fn broadcast<T: Clone>(sinks: &mut [Box<dyn FnMut(T) + Send>], value: T) {
  let mut iter = sinks.iter_mut().peekable();
  while let Some(sink) = iter.next() {
    if iter.peek().is_some() {
      sink(value.clone());
    } else {
      sink(value);
      break;
    }
  }
}
