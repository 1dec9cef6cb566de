use std::{sync::Arc, thread};

use log::{debug, trace, warn};
use parking_lot::Mutex;
use smallvec::SmallVec;

use super::{
  connect_gate::ConnectGate,
  replay_buffer::ReplayBuffer,
  subject_subscription::SubjectSubscription,
  subscribers::{Entry, Subscribers, Waiting},
  Emitter,
};
use crate::{
  channel::{channel, Reserved},
  config::SubjectConfig,
  notification::Notification,
  observer::Observer,
};

/// Subject: a hot source that multicasts values to many subscribers.
///
/// The producer side is the [`Emitter`] implementation. Each call to
/// [`subscribe`](Subject::subscribe) registers a new subscriber with its own
/// delivery channel and returns the handle pair that controls it.
///
/// Clones share one registry. Every operation may be called concurrently
/// from any thread; registry and replay history are guarded by one lock per
/// subject.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use futures::executor::block_on;
/// use rxcast::prelude::*;
///
/// let subject = Subject::<i32, String>::new();
/// let (_subscription, observer) = subject.subscribe();
///
/// let seen = Arc::new(Mutex::new(vec![]));
/// let c_seen = seen.clone();
/// observer.on_next(move |v| c_seen.lock().unwrap().push(v)).unwrap();
///
/// subject.next(1);
/// subject.next(2);
/// subject.complete();
///
/// block_on(observer.finished());
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// ```
///
/// # Blocking
///
/// Under [`Backpressure::Block`] with a bounded channel, `next` waits for a
/// full subscriber to make room. The registry lock is released before
/// waiting, and several full subscribers are waited on in parallel, so one
/// slow consumer never delays the others. A consumer that stops draining for
/// good stalls the producer forever.
///
/// [`Backpressure::Block`]: crate::config::Backpressure::Block
pub struct Subject<Item, Err> {
  pub(crate) inner: Arc<SubjectInner<Item, Err>>,
}

pub(crate) struct SubjectInner<Item, Err> {
  config: SubjectConfig,
  pub(crate) state: Mutex<SubjectState<Item, Err>>,
}

pub(crate) struct SubjectState<Item, Err> {
  pub(crate) subscribers: Subscribers<Item, Err>,
  // `Some` once closed: the marker late subscribers receive.
  terminal: Option<Notification<Item, Err>>,
  replay: Option<ReplayBuffer<Item>>,
}

impl<Item, Err> SubjectState<Item, Err> {
  #[inline]
  fn is_closed(&self) -> bool { self.terminal.is_some() }
}

impl<Item, Err> Drop for SubjectInner<Item, Err> {
  fn drop(&mut self) { self.state.get_mut().subscribers.disconnect_all() }
}

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self { Self::with_config(SubjectConfig::default()) }
}

impl<Item, Err> Subject<Item, Err> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  #[inline]
  pub fn with_config(config: SubjectConfig) -> Self { Self::build(config, None) }

  pub(crate) fn build(config: SubjectConfig, replay: Option<ReplayBuffer<Item>>) -> Self {
    let state = SubjectState { subscribers: Subscribers::default(), terminal: None, replay };
    Self { inner: Arc::new(SubjectInner { config, state: Mutex::new(state) }) }
  }

  #[inline]
  pub fn config(&self) -> &SubjectConfig { &self.inner.config }

  /// Number of registered subscribers.
  ///
  /// Subscribers whose observer was dropped are pruned lazily, on the next
  /// emission.
  pub fn subscriber_count(&self) -> usize { self.inner.state.lock().subscribers.len() }

  /// Number of values currently retained for replay.
  pub(crate) fn replay_len(&self) -> usize {
    self.inner.state.lock().replay.as_ref().map_or(0, ReplayBuffer::len)
  }
}

impl<Item, Err> Subject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  /// Register a new subscriber.
  ///
  /// Replay history, if any, is queued on the new channel before the
  /// subscriber becomes visible to `next`, so it always precedes live values.
  /// In gated mode nothing is replayed. Subscribing to a closed subject
  /// yields an observer that receives the history and then the recorded
  /// terminal marker; the subscription is never registered.
  pub fn subscribe(&self) -> (SubjectSubscription<Item, Err>, Observer<Item, Err>) {
    let config = &self.inner.config;
    let (sender, receiver) = channel(config.capacity(), config.backpressure);
    let gate = config.is_gated().then(ConnectGate::new);

    let id = {
      let mut state = self.inner.state.lock();
      if gate.is_none() {
        if let Some(replay) = &state.replay {
          for value in replay.iter() {
            sender.force(value.clone());
          }
        }
      }
      match &state.terminal {
        Some(marker) => {
          sender.terminate(marker.clone());
          None
        }
        None => Some(state.subscribers.add(Entry { sender: sender.clone(), gate: gate.clone() })),
      }
    };
    trace!("subscriber {id:?} registered");

    let subscription = SubjectSubscription::new(Arc::downgrade(&self.inner), id, sender);
    let observer = Observer::new(receiver, gate, config.scheduler.clone());
    (subscription, observer)
  }

  fn terminate(&self, marker: Notification<Item, Err>) {
    let mut state = self.inner.state.lock();
    if state.is_closed() {
      return;
    }
    debug!(
      "subject closing with {} to {} subscribers",
      if matches!(marker, Notification::Error(_)) { "error" } else { "completion" },
      state.subscribers.len()
    );
    state.subscribers.broadcast_terminal(&marker);
    state.terminal = Some(marker);
  }
}

type Slot<Item, Err> = Mutex<Option<Reserved<Item, Err>>>;

/// Push the writes that found their channel full.
///
/// Each write beyond the first gets a scoped helper thread so no subscriber
/// waits behind another; that is one short-lived thread per extra full
/// subscriber per emission. The calling thread then pushes, in registry
/// order, every write no helper picked up, which covers helpers that failed
/// to start.
fn push_waiting<Item: Send, Err: Send>(waiting: Waiting<Item, Err>) {
  if waiting.len() <= 1 {
    waiting.into_iter().for_each(Reserved::push);
    return;
  }
  let slots: SmallVec<[Slot<Item, Err>; 2]> =
    waiting.into_iter().map(|reserved| Mutex::new(Some(reserved))).collect();
  thread::scope(|scope| {
    for slot in &slots[1..] {
      if let Err(e) = thread::Builder::new().spawn_scoped(scope, move || push_slot(slot)) {
        warn!("pushing a blocked write inline: {e}");
      }
    }
    slots.iter().for_each(push_slot);
  });
}

fn push_slot<Item, Err>(slot: &Slot<Item, Err>) {
  let reserved = slot.lock().take();
  if let Some(reserved) = reserved {
    reserved.push();
  }
}

impl<Item, Err> Emitter<Item, Err> for Subject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  fn next(&self, value: Item) {
    let waiting = {
      let mut state = self.inner.state.lock();
      if state.is_closed() {
        return;
      }
      if let Some(replay) = state.replay.as_mut() {
        replay.push(value.clone());
      }
      state.subscribers.broadcast_value(value)
    };
    push_waiting(waiting);
  }

  #[inline]
  fn error(&self, err: Err) { self.terminate(Notification::Error(err)) }

  #[inline]
  fn complete(&self) { self.terminate(Notification::Complete) }

  fn is_closed(&self) -> bool { self.inner.state.lock().is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{
      atomic::{AtomicUsize, Ordering},
      Arc,
    },
    time::Duration,
  };

  use futures::{executor::block_on, StreamExt};

  use super::*;
  use crate::{channel::{Capacity, Offer}, config::Backpressure, subscription::Subscription};

  #[test]
  fn single_subscriber_sees_everything_in_order() {
    let subject = Subject::<i32, ()>::new();
    let (_sub, observer) = subject.subscribe();
    for i in 0..100 {
      subject.next(i);
    }
    subject.complete();

    let got: Vec<_> = block_on(observer.into_stream().unwrap().collect());
    let mut expected: Vec<_> = (0..100).map(Notification::Next).collect();
    expected.push(Notification::Complete);
    assert_eq!(got, expected);
  }

  #[test]
  fn first_terminal_wins() {
    let subject = Subject::<i32, &str>::new();
    let (_sub, observer) = subject.subscribe();
    subject.error("first");
    subject.complete();
    subject.error("second");
    subject.next(1);
    assert!(subject.is_closed());

    let got: Vec<_> = block_on(observer.into_stream().unwrap().collect());
    assert_eq!(got, vec![Notification::Error("first")]);
  }

  #[test]
  fn terminal_empties_registry() {
    let subject = Subject::<i32, ()>::new();
    let (sub, _observer) = subject.subscribe();
    assert_eq!(subject.subscriber_count(), 1);
    subject.complete();
    assert_eq!(subject.subscriber_count(), 0);
    assert!(sub.is_closed());
  }

  #[test]
  fn late_subscriber_gets_terminal_marker() {
    let subject = Subject::<i32, &str>::new();
    subject.next(1);
    subject.error("gone");

    let (sub, observer) = subject.subscribe();
    assert_eq!(sub.id(), None);
    assert_eq!(subject.subscriber_count(), 0);
    let got: Vec<_> = block_on(observer.into_stream().unwrap().collect());
    assert_eq!(got, vec![Notification::Error("gone")]);
  }

  #[test]
  fn dropped_observer_is_pruned() {
    let subject = Subject::<i32, ()>::new();
    let (_sub, observer) = subject.subscribe();
    drop(observer);
    assert_eq!(subject.subscriber_count(), 1);
    subject.next(1);
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[test]
  fn dropping_subject_ends_observers() {
    let subject = Subject::<i32, ()>::new();
    let (sub, observer) = subject.subscribe();
    subject.next(1);
    drop(subject);
    assert!(sub.is_closed());
    let got: Vec<_> = block_on(observer.into_stream().unwrap().collect());
    assert!(got.is_empty());
  }

  #[test]
  fn slow_blocking_subscriber_does_not_delay_others() {
    let subject = Subject::<i32, ()>::with_config(SubjectConfig::default().buffered(1));
    let (_slow_sub, slow) = subject.subscribe();
    let (_fast_sub, fast) = subject.subscribe();

    let fast_seen = Arc::new(AtomicUsize::new(0));
    let c_fast_seen = fast_seen.clone();
    fast
      .on_next(move |_| {
        c_fast_seen.fetch_add(1, Ordering::SeqCst);
      })
      .unwrap();

    // `slow` is never drained: its single slot fills with 0 and the producer
    // blocks on it from then on.
    let producer = {
      let subject = subject.clone();
      thread::spawn(move || {
        for i in 0..3 {
          subject.next(i);
        }
      })
    };

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while fast_seen.load(Ordering::SeqCst) < 2 && std::time::Instant::now() < deadline {
      thread::sleep(Duration::from_millis(1));
    }
    assert!(fast_seen.load(Ordering::SeqCst) >= 2);

    // Releasing the slow reader lets the producer finish.
    drop(slow);
    producer.join().unwrap();
  }

  #[test]
  fn drop_policy_counts_losses() {
    let subject = Subject::<i32, ()>::with_config(
      SubjectConfig::default().backpressure(Backpressure::Drop).buffered(2),
    );
    let (sub, _observer) = subject.subscribe();
    for i in 0..5 {
      subject.next(i);
    }
    assert_eq!(sub.dropped(), 3);
  }

  #[test]
  fn several_full_subscribers_each_get_everything() {
    let subject = Subject::<i32, ()>::with_config(SubjectConfig::default().buffered(1));
    let seen: Vec<_> = (0..3)
      .map(|_| {
        let (sub, observer) = subject.subscribe();
        let values = Arc::new(Mutex::new(vec![]));
        let c_values = values.clone();
        observer
          .on_next(move |v| {
            thread::sleep(Duration::from_millis(1));
            c_values.lock().push(v);
          })
          .unwrap();
        (sub, observer, values)
      })
      .collect();

    for i in 0..20 {
      subject.next(i);
    }
    subject.complete();
    for (_, observer, values) in &seen {
      block_on(observer.finished());
      assert_eq!(*values.lock(), (0..20).collect::<Vec<_>>());
    }
  }

  #[test]
  fn slot_is_pushed_once() {
    let (tx, rx) = channel::<i32, ()>(Capacity::Bounded(1), Backpressure::Block);
    assert!(matches!(tx.offer(1), Offer::Accepted));
    let Offer::Wait(reserved) = tx.offer(2) else { panic!("expected a reserved write") };
    let slot = Mutex::new(Some(reserved));
    drop(rx);

    push_slot(&slot);
    assert!(slot.lock().is_none());
    push_slot(&slot);
  }
}
