//! Observer: the read side of one subscription.
//!
//! An [`Observer`] owns the subscriber's delivery channel until it is
//! consumed, either by sinks attached with [`on_next`](Observer::on_next),
//! [`on_error`](Observer::on_error) and [`on_complete`](Observer::on_complete),
//! or as a [`Stream`](futures::Stream) taken with
//! [`into_stream`](Observer::into_stream).
//!
//! The first sink attached starts the consumption loop on the subject's
//! scheduler. Sinks run on that loop, never on the producer's thread, in
//! arrival order. A sink attached later only sees what arrives after it.
//! Attaching a sink from inside a sink of the same observer deadlocks.

use std::{future::Future, sync::Arc};

use futures::{
  channel::oneshot,
  future::{FutureExt, Shared},
};
use log::{debug, error};
use parking_lot::Mutex;

use crate::{channel::Receiver, error::Error, scheduler::Scheduler, subject::ConnectGate};

mod drain;
mod sinks;

use drain::Drain;
pub use drain::ObserverStream;
use sinks::Sinks;

type Source<Item, Err> = (Receiver<Item, Err>, oneshot::Sender<()>);

/// The read side of a subscription.
pub struct Observer<Item, Err> {
  sinks: Arc<Mutex<Sinks<Item, Err>>>,
  // Taken when the loop starts or the stream is handed out.
  source: Mutex<Option<Source<Item, Err>>>,
  gate: Option<ConnectGate>,
  scheduler: Arc<dyn Scheduler>,
  done: Shared<oneshot::Receiver<()>>,
}

impl<Item, Err> Observer<Item, Err> {
  pub(crate) fn new(
    receiver: Receiver<Item, Err>,
    gate: Option<ConnectGate>,
    scheduler: Arc<dyn Scheduler>,
  ) -> Self {
    let (done_tx, done_rx) = oneshot::channel();
    Self {
      sinks: Arc::new(Mutex::new(Sinks::default())),
      source: Mutex::new(Some((receiver, done_tx))),
      gate,
      scheduler,
      done: done_rx.shared(),
    }
  }

  /// Open the gate of a gated observer. Values emitted before this call are
  /// lost; later ones are delivered. Does nothing for immediate observers or
  /// when already connected.
  pub fn connect(&self) {
    if let Some(gate) = &self.gate {
      if gate.connect() {
        debug!("observer connected");
      }
    }
  }

  /// Whether delivery is flowing: always for immediate observers.
  pub fn is_connected(&self) -> bool { self.gate.as_ref().map_or(true, ConnectGate::is_open) }

  /// Resolves once the consumption loop has ended: after the terminal
  /// marker's sinks ran, after unsubscribe, or when the subject went away.
  ///
  /// For an observer turned into a stream, it resolves when the stream hands
  /// out its terminal marker, ends, or is dropped. Never resolves while the
  /// sequence is unconsumed and the subject lives.
  pub fn finished(&self) -> impl Future<Output = ()> + Send + 'static {
    self.done.clone().map(|_| ())
  }

  /// Consume the sequence as a stream instead of through sinks.
  pub fn into_stream(self) -> Result<ObserverStream<Item, Err>, Error> {
    let (receiver, done) = self.source.lock().take().ok_or(Error::AlreadyConsumed)?;
    Ok(ObserverStream::new(receiver, self.gate.clone(), Some(done)))
  }
}

impl<Item, Err> Observer<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  /// Attach a handler for values.
  pub fn on_next(&self, sink: impl FnMut(Item) + Send + 'static) -> Result<&Self, Error> {
    self.sinks.lock().next.push(Box::new(sink));
    self.start()
  }

  /// Attach a handler for the terminal error.
  pub fn on_error(&self, sink: impl FnMut(Err) + Send + 'static) -> Result<&Self, Error> {
    self.sinks.lock().error.push(Box::new(sink));
    self.start()
  }

  /// Attach a handler for completion.
  pub fn on_complete(&self, sink: impl FnMut() + Send + 'static) -> Result<&Self, Error> {
    self.sinks.lock().complete.push(Box::new(sink));
    self.start()
  }

  fn start(&self) -> Result<&Self, Error> {
    let Some((receiver, done)) = self.source.lock().take() else {
      return Ok(self);
    };
    let stream = ObserverStream::new(receiver, self.gate.clone(), None);
    let task = Drain::new(stream, self.sinks.clone(), done);
    debug!("starting consumption loop");
    self.scheduler.spawn(Box::pin(task)).map_err(|e| {
      error!("{}: {e}", e.as_label());
      e
    })?;
    Ok(self)
  }
}

#[cfg(test)]
mod tests {
  use std::{
    sync::{
      atomic::{AtomicUsize, Ordering},
      Mutex as StdMutex,
    },
    time::{Duration, Instant},
  };

  use futures::{executor::block_on, future::BoxFuture, StreamExt};

  use super::*;
  use crate::{
    config::SubjectConfig,
    notification::Notification,
    subject::{Emitter, Subject},
    subscription::Subscription,
  };

  struct Refuse;

  impl Scheduler for Refuse {
    fn spawn(&self, _task: BoxFuture<'static, ()>) -> Result<(), Error> {
      Err(Error::Spawn("refused".into()))
    }
  }

  fn wait_for(cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
      if Instant::now() > deadline {
        return false;
      }
      std::thread::sleep(Duration::from_millis(1));
    }
    true
  }

  #[test]
  fn every_sink_of_a_kind_is_invoked() {
    let subject = Subject::<i32, ()>::new();
    let (_sub, observer) = subject.subscribe();
    let total = Arc::new(AtomicUsize::new(0));
    for _ in 0..3 {
      let total = total.clone();
      observer
        .on_next(move |v| {
          total.fetch_add(v as usize, Ordering::SeqCst);
        })
        .unwrap();
    }
    subject.next(2);
    subject.complete();
    block_on(observer.finished());
    assert_eq!(total.load(Ordering::SeqCst), 6);
  }

  #[test]
  fn attaches_chain() {
    let subject = Subject::<i32, String>::new();
    let (_sub, observer) = subject.subscribe();
    let log = Arc::new(StdMutex::new(vec![]));
    let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
    observer
      .on_next(move |v| l1.lock().unwrap().push(format!("next {v}")))
      .and_then(|o| o.on_error(move |e| l2.lock().unwrap().push(format!("error {e}"))))
      .and_then(|o| o.on_complete(move || l3.lock().unwrap().push("complete".to_owned())))
      .unwrap();

    subject.next(1);
    subject.error("bad".to_owned());
    block_on(observer.finished());
    assert_eq!(*log.lock().unwrap(), vec!["next 1", "error bad"]);
  }

  #[test]
  fn stream_after_sinks_is_refused() {
    let subject = Subject::<i32, ()>::new();
    let (_sub, observer) = subject.subscribe();
    observer.on_next(|_| {}).unwrap();
    assert!(matches!(observer.into_stream(), Err(Error::AlreadyConsumed)));
  }

  #[test]
  fn spawn_failure_is_reported() {
    let subject = Subject::<i32, ()>::with_config(SubjectConfig::default().scheduler(Refuse));
    let (sub, observer) = subject.subscribe();
    let err = observer.on_next(|_| {}).map(|_| ()).unwrap_err();
    assert_eq!(err, Error::Spawn("refused".into()));
    // The dropped loop took the channel with it.
    assert!(sub.is_closed());
    block_on(observer.finished());
  }

  #[test]
  fn unsubscribe_ends_the_loop() {
    let subject = Subject::<i32, ()>::new();
    let (mut sub, observer) = subject.subscribe();
    let seen = Arc::new(AtomicUsize::new(0));
    let c_seen = seen.clone();
    observer
      .on_next(move |_| {
        c_seen.fetch_add(1, Ordering::SeqCst);
      })
      .unwrap();

    subject.next(1);
    assert!(wait_for(|| seen.load(Ordering::SeqCst) == 1));
    sub.unsubscribe();
    sub.unsubscribe();
    block_on(observer.finished());

    subject.next(2);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[test]
  fn gated_observer_is_connected_once() {
    let subject = Subject::<i32, ()>::with_config(SubjectConfig::default().gated());
    let (_sub, observer) = subject.subscribe();
    assert!(!observer.is_connected());
    observer.connect();
    observer.connect();
    assert!(observer.is_connected());

    let (_sub, immediate) = Subject::<i32, ()>::new().subscribe();
    assert!(immediate.is_connected());
  }

  #[test]
  fn unsubscribe_ends_a_never_connected_loop() {
    let subject = Subject::<i32, ()>::with_config(SubjectConfig::default().gated());
    let (mut sub, observer) = subject.subscribe();
    observer.on_next(|_| {}).unwrap();
    subject.next(1);

    sub.unsubscribe();
    block_on(observer.finished());
    assert!(!observer.is_connected());
  }

  #[test]
  fn dropping_subject_ends_a_never_connected_loop() {
    let subject = Subject::<i32, ()>::with_config(SubjectConfig::default().gated());
    let (sub, observer) = subject.subscribe();
    let seen = Arc::new(AtomicUsize::new(0));
    let c_seen = seen.clone();
    observer
      .on_next(move |_| {
        c_seen.fetch_add(1, Ordering::SeqCst);
      })
      .unwrap();

    drop(subject);
    block_on(observer.finished());
    assert!(sub.is_closed());
    assert_eq!(seen.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn stream_holds_finished_until_drained() {
    let subject = Subject::<i32, ()>::new();
    let (_sub, observer) = subject.subscribe();
    let mut finished = Box::pin(observer.finished());
    let mut stream = observer.into_stream().unwrap();

    subject.next(1);
    assert!(finished.as_mut().now_or_never().is_none());
    assert_eq!(block_on(stream.next()), Some(Notification::Next(1)));
    assert!(finished.as_mut().now_or_never().is_none());

    subject.complete();
    assert_eq!(block_on(stream.next()), Some(Notification::Complete));
    block_on(finished);
  }

  #[test]
  fn dropping_the_stream_finishes() {
    let subject = Subject::<i32, ()>::new();
    let (_sub, observer) = subject.subscribe();
    let mut finished = Box::pin(observer.finished());
    let stream = observer.into_stream().unwrap();
    assert!(finished.as_mut().now_or_never().is_none());

    drop(stream);
    block_on(finished);
  }
}
