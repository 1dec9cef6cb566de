use std::{
  future::Future,
  pin::Pin,
  sync::Arc,
  task::{Context, Poll},
};

use futures::{channel::oneshot, ready, Stream};
use log::trace;
use parking_lot::Mutex;
use pin_project_lite::pin_project;

use super::sinks::Sinks;
use crate::{channel::Receiver, notification::Notification, subject::ConnectGate};

/// The observer's sequence: its delivery channel behind its connect gate.
///
/// Yields nothing until the gate opens, then `Next` values in arrival order,
/// at most one terminal marker, and ends. A channel that is cut off while the
/// gate is still closed ends the stream at once. Not restartable.
pub struct ObserverStream<Item, Err> {
  receiver: Receiver<Item, Err>,
  gate: Option<ConnectGate>,
  // Fired when the sequence is over; dropping it signals the same.
  done: Option<oneshot::Sender<()>>,
}

impl<Item, Err> ObserverStream<Item, Err> {
  pub(crate) fn new(
    receiver: Receiver<Item, Err>,
    gate: Option<ConnectGate>,
    done: Option<oneshot::Sender<()>>,
  ) -> Self {
    Self { receiver, gate, done }
  }

  fn poll_gated(&mut self, cx: &mut Context<'_>) -> Poll<Option<Notification<Item, Err>>> {
    if let Some(gate) = &self.gate {
      if gate.poll_open(cx).is_pending() {
        return self.receiver.poll_disconnected(cx).map(|()| None);
      }
    }
    Pin::new(&mut self.receiver).poll_next(cx)
  }
}

impl<Item, Err> Stream for ObserverStream<Item, Err> {
  type Item = Notification<Item, Err>;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    let this = self.get_mut();
    let polled = ready!(this.poll_gated(cx));
    if polled.as_ref().map_or(true, Notification::is_terminal) {
      if let Some(done) = this.done.take() {
        let _ = done.send(());
      }
    }
    Poll::Ready(polled)
  }
}

pin_project! {
    /// A consumption loop: drains a stream of notifications into sinks until
    /// a terminal marker or the end of the stream.
    pub(crate) struct Drain<S, Item, Err> {
        #[pin]
        source: S,
        sinks: Arc<Mutex<Sinks<Item, Err>>>,
        done: Option<oneshot::Sender<()>>,
    }
}

impl<S, Item, Err> Drain<S, Item, Err> {
  pub(crate) fn new(
    source: S,
    sinks: Arc<Mutex<Sinks<Item, Err>>>,
    done: oneshot::Sender<()>,
  ) -> Self {
    Self { source, sinks, done: Some(done) }
  }
}

impl<S, Item, Err> Future for Drain<S, Item, Err>
where
  S: Stream<Item = Notification<Item, Err>>,
  Item: Clone,
  Err: Clone,
{
  type Output = ();

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let mut this = self.project();
    loop {
      match ready!(this.source.as_mut().poll_next(cx)) {
        Some(notification) => {
          let terminal = notification.is_terminal();
          this.sinks.lock().dispatch(notification);
          if terminal {
            break;
          }
        }
        None => break,
      }
    }
    trace!("consumption loop finished");
    if let Some(done) = this.done.take() {
      let _ = done.send(());
    }
    Poll::Ready(())
  }
}
