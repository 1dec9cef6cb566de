use log::trace;
use smallvec::SmallVec;

use super::connect_gate::ConnectGate;
use crate::{
  channel::{Offer, Reserved, Sender},
  notification::Notification,
  subscription::DynamicEntries,
};

/// One registered subscriber: the writing half of its channel and, in gated
/// mode, its gate.
pub(crate) struct Entry<Item, Err> {
  pub(crate) sender: Sender<Item, Err>,
  pub(crate) gate: Option<ConnectGate>,
}

impl<Item, Err> Entry<Item, Err> {
  #[inline]
  fn accepts_values(&self) -> bool { self.gate.as_ref().map_or(true, ConnectGate::is_open) }
}

/// Writes that could not complete under the registry lock.
pub(crate) type Waiting<Item, Err> = SmallVec<[Reserved<Item, Err>; 2]>;

/// The subject's registry of subscribers.
///
/// Only ever touched under the subject's lock.
pub(crate) struct Subscribers<Item, Err> {
  inner: DynamicEntries<Entry<Item, Err>>,
}

impl<Item, Err> Default for Subscribers<Item, Err> {
  fn default() -> Self { Self { inner: DynamicEntries::default() } }
}

impl<Item, Err> Subscribers<Item, Err> {
  #[inline]
  pub(crate) fn add(&mut self, entry: Entry<Item, Err>) -> usize { self.inner.add(entry) }

  #[inline]
  pub(crate) fn remove(&mut self, id: usize) -> Option<Entry<Item, Err>> { self.inner.remove(id) }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.inner.len() }

  /// Disconnect every subscriber and empty the registry.
  pub(crate) fn disconnect_all(&mut self) {
    for entry in self.inner.drain() {
      entry.sender.disconnect();
    }
  }

  /// Offer `value` to every subscriber whose gate is open.
  ///
  /// Subscribers whose reader is gone are pruned first. The value is cloned
  /// for all receivers but the last, which gets the moved value. Offers that
  /// have to wait for room come back as reserved writes; the caller pushes
  /// them once the lock is released.
  pub(crate) fn broadcast_value(&mut self, value: Item) -> Waiting<Item, Err>
  where
    Item: Clone,
  {
    self.inner.retain(|entry| !entry.sender.is_disconnected());

    let mut waiting = Waiting::new();
    let mut deliver = |entry: &Entry<Item, Err>, value: Item| match entry.sender.offer(value) {
      Offer::Wait(reserved) => waiting.push(reserved),
      Offer::Dropped => trace!("value dropped for a lagging subscriber"),
      Offer::Accepted | Offer::Closed => {}
    };

    let mut iter = self.inner.iter().filter(|entry| entry.accepts_values()).peekable();
    while let Some(entry) = iter.next() {
      if iter.peek().is_some() {
        deliver(entry, value.clone());
      } else {
        deliver(entry, value);
        break;
      }
    }
    waiting
  }

  /// Hand the terminal marker to every subscriber and empty the registry.
  ///
  /// Gates are ignored: a gated observer finds the marker once connected.
  pub(crate) fn broadcast_terminal(&mut self, marker: &Notification<Item, Err>)
  where
    Item: Clone,
    Err: Clone,
  {
    for entry in self.inner.drain() {
      entry.sender.terminate(marker.clone());
    }
  }
}
