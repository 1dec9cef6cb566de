//! Per-subscriber delivery channel.
//!
//! A single-writer, single-reader FIFO of values closed by at most one
//! terminal marker. The subject is the writer; the subscriber's consumption
//! loop reads it as a [`Stream`].
//!
//! # Writers
//!
//! Writes happen in two phases so the subject can hold its registry lock only
//! for the non-blocking part:
//!
//! 1. [`Sender::offer`] runs under the registry lock. It either enqueues the
//!    value, discards it (`Drop` policy), or, under `Block` policy, takes a
//!    ticket and hands the value back as a [`Reserved`] write.
//! 2. [`Reserved::push`] runs after the lock is released and waits until the
//!    ticket is served and the channel has room.
//!
//! Tickets are handed out in lock order and served in ticket order, so the
//! values of concurrent producers land in the order they acquired the lock.
//! While any ticket is outstanding, new offers queue behind it.
//!
//! # Terminal markers
//!
//! [`Sender::terminate`] ignores capacity. The reader yields the marker only
//! once the queue is empty and every outstanding ticket has been served.

use std::{
  collections::VecDeque,
  pin::Pin,
  sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
  },
  task::{Context, Poll, Waker},
};

use futures::Stream;
use parking_lot::{Condvar, Mutex};

use crate::{config::Backpressure, notification::Notification};

/// How many values a channel holds before its policy engages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capacity {
  /// Never full.
  Unbounded,
  /// Holds nothing; a value is accepted only while the reader is waiting.
  Rendezvous,
  /// Holds up to `n` values.
  Bounded(usize),
}

struct State<Item, Err> {
  queue: VecDeque<Item>,
  terminal: Option<Notification<Item, Err>>,
  next_ticket: u64,
  serving: u64,
  // The reader is waiting for a value.
  parked: bool,
  waker: Option<Waker>,
  disconnected: bool,
}

impl<Item, Err> State<Item, Err> {
  fn has_room(&self, capacity: Capacity) -> bool {
    match capacity {
      Capacity::Unbounded => true,
      Capacity::Rendezvous => self.parked && self.queue.is_empty(),
      Capacity::Bounded(n) => self.queue.len() < n,
    }
  }

  #[inline]
  fn tickets_outstanding(&self) -> bool { self.serving != self.next_ticket }

  fn register(&mut self, waker: &Waker) {
    if self.waker.as_ref().map_or(true, |w| !w.will_wake(waker)) {
      self.waker = Some(waker.clone());
    }
  }

  fn enqueue(&mut self, item: Item) -> Option<Waker> {
    self.queue.push_back(item);
    self.parked = false;
    self.waker.take()
  }
}

struct Chan<Item, Err> {
  state: Mutex<State<Item, Err>>,
  writers: Condvar,
  capacity: Capacity,
  policy: Backpressure,
  dropped: AtomicU64,
}

impl<Item, Err> Chan<Item, Err> {
  fn disconnect(&self) {
    let waker = {
      let mut state = self.state.lock();
      state.disconnected = true;
      state.queue.clear();
      state.terminal = None;
      state.waker.take()
    };
    self.writers.notify_all();
    wake(waker);
  }
}

#[inline]
fn wake(waker: Option<Waker>) {
  if let Some(waker) = waker {
    waker.wake();
  }
}

/// Create a delivery channel.
///
/// `Bounded(0)` is treated as `Rendezvous`.
pub fn channel<Item, Err>(
  capacity: Capacity,
  policy: Backpressure,
) -> (Sender<Item, Err>, Receiver<Item, Err>) {
  let capacity = match capacity {
    Capacity::Bounded(0) => Capacity::Rendezvous,
    other => other,
  };
  let queue = match capacity {
    Capacity::Bounded(n) => VecDeque::with_capacity(n),
    _ => VecDeque::new(),
  };
  let chan = Arc::new(Chan {
    state: Mutex::new(State {
      queue,
      terminal: None,
      next_ticket: 0,
      serving: 0,
      parked: false,
      waker: None,
      disconnected: false,
    }),
    writers: Condvar::new(),
    capacity,
    policy,
    dropped: AtomicU64::new(0),
  });
  (Sender { chan: chan.clone() }, Receiver { chan })
}

/// Outcome of [`Sender::offer`].
#[must_use]
pub enum Offer<Item, Err> {
  /// The value is queued.
  Accepted,
  /// The channel was full and its policy discarded the value.
  Dropped,
  /// The reader is gone or the channel was terminated; the value is lost.
  Closed,
  /// The channel was full under `Block` policy. The value waits in the
  /// returned write, which must be pushed to keep the ticket order moving.
  Wait(Reserved<Item, Err>),
}

/// The writing half, held by the subject.
pub struct Sender<Item, Err> {
  chan: Arc<Chan<Item, Err>>,
}

impl<Item, Err> Clone for Sender<Item, Err> {
  fn clone(&self) -> Self { Self { chan: self.chan.clone() } }
}

impl<Item, Err> Sender<Item, Err> {
  /// Try to enqueue `item` without waiting.
  pub fn offer(&self, item: Item) -> Offer<Item, Err> {
    let mut state = self.chan.state.lock();
    if state.disconnected || state.terminal.is_some() {
      return Offer::Closed;
    }
    if !state.tickets_outstanding() && state.has_room(self.chan.capacity) {
      let waker = state.enqueue(item);
      drop(state);
      wake(waker);
      return Offer::Accepted;
    }
    match self.chan.policy {
      Backpressure::Drop => {
        self.chan.dropped.fetch_add(1, Ordering::Relaxed);
        Offer::Dropped
      }
      Backpressure::Block => {
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        Offer::Wait(Reserved { chan: self.chan.clone(), ticket, item })
      }
    }
  }

  /// Enqueue `item` ignoring capacity and policy.
  pub fn force(&self, item: Item) {
    let mut state = self.chan.state.lock();
    if state.disconnected || state.terminal.is_some() {
      return;
    }
    let waker = state.enqueue(item);
    drop(state);
    wake(waker);
  }

  /// Close the channel with a terminal marker. Only the first marker counts.
  pub fn terminate(&self, marker: Notification<Item, Err>) {
    debug_assert!(marker.is_terminal());
    let mut state = self.chan.state.lock();
    if state.disconnected || state.terminal.is_some() {
      return;
    }
    state.terminal = Some(marker);
    let waker = state.waker.take();
    drop(state);
    wake(waker);
  }

  /// Discard everything queued and stop the reader. Blocked writes return.
  #[inline]
  pub fn disconnect(&self) { self.chan.disconnect() }

  /// The reader is gone or was cut off.
  pub fn is_disconnected(&self) -> bool { self.chan.state.lock().disconnected }

  /// No more values will ever be read from this channel.
  pub fn is_closed(&self) -> bool {
    let state = self.chan.state.lock();
    state.disconnected || state.terminal.is_some()
  }

  /// Number of values discarded by the `Drop` policy so far.
  #[inline]
  pub fn dropped(&self) -> u64 { self.chan.dropped.load(Ordering::Relaxed) }
}

/// A value waiting for room under `Block` policy.
pub struct Reserved<Item, Err> {
  chan: Arc<Chan<Item, Err>>,
  ticket: u64,
  item: Item,
}

impl<Item, Err> Reserved<Item, Err> {
  /// Block the calling thread until the value is queued or the reader is gone.
  pub fn push(self) {
    let Self { chan, ticket, item } = self;
    let mut state = chan.state.lock();
    loop {
      if state.disconnected {
        return;
      }
      if state.serving == ticket && state.has_room(chan.capacity) {
        break;
      }
      chan.writers.wait(&mut state);
    }
    let waker = state.enqueue(item);
    state.serving += 1;
    drop(state);
    chan.writers.notify_all();
    wake(waker);
  }
}

/// The reading half, drained by a consumption loop.
///
/// Yields `Next` values in arrival order, then at most one terminal marker,
/// then ends. Dropping it disconnects the channel.
pub struct Receiver<Item, Err> {
  chan: Arc<Chan<Item, Err>>,
}

impl<Item, Err> Receiver<Item, Err> {
  /// Resolve once the channel is disconnected, without taking anything out
  /// of it and without counting as a waiting reader.
  pub(crate) fn poll_disconnected(&self, cx: &mut Context<'_>) -> Poll<()> {
    let mut state = self.chan.state.lock();
    if state.disconnected {
      return Poll::Ready(());
    }
    state.register(cx.waker());
    Poll::Pending
  }
}

impl<Item, Err> Stream for Receiver<Item, Err> {
  type Item = Notification<Item, Err>;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    let chan = &self.chan;
    let mut state = chan.state.lock();
    if state.disconnected {
      return Poll::Ready(None);
    }
    if let Some(item) = state.queue.pop_front() {
      let release = state.tickets_outstanding();
      drop(state);
      if release {
        chan.writers.notify_all();
      }
      return Poll::Ready(Some(Notification::Next(item)));
    }
    if !state.tickets_outstanding() {
      if let Some(marker) = state.terminal.take() {
        state.disconnected = true;
        return Poll::Ready(Some(marker));
      }
    }

    state.parked = true;
    state.register(cx.waker());
    let release = state.tickets_outstanding();
    drop(state);
    if release {
      chan.writers.notify_all();
    }
    Poll::Pending
  }
}

impl<Item, Err> Drop for Receiver<Item, Err> {
  fn drop(&mut self) { self.chan.disconnect() }
}
