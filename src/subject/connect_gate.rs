use std::{
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
  task::{Context, Poll},
};

use futures::task::AtomicWaker;

/// A one-way latch that withholds delivery to one observer until connected.
///
/// While closed, the subject discards values for the gated subscriber instead
/// of queueing them, and the observer's consumption loop does not read its
/// channel. A gate that is never opened means the observer sees nothing,
/// which is a valid outcome.
#[derive(Clone, Debug, Default)]
pub struct ConnectGate {
  inner: Arc<GateInner>,
}

#[derive(Debug, Default)]
struct GateInner {
  open: AtomicBool,
  waker: AtomicWaker,
}

impl ConnectGate {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Open the gate. Returns `true` only for the call that actually opened it.
  pub fn connect(&self) -> bool {
    let first = !self.inner.open.swap(true, Ordering::AcqRel);
    if first {
      self.inner.waker.wake();
    }
    first
  }

  #[inline]
  pub fn is_open(&self) -> bool { self.inner.open.load(Ordering::Acquire) }

  /// Resolve once the gate is open.
  pub fn poll_open(&self, cx: &mut Context<'_>) -> Poll<()> {
    if self.is_open() {
      return Poll::Ready(());
    }
    self.inner.waker.register(cx.waker());
    // `connect` may have run between the check and the registration.
    if self.is_open() {
      Poll::Ready(())
    } else {
      Poll::Pending
    }
  }
}
