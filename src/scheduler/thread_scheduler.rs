use std::{
  sync::atomic::{AtomicUsize, Ordering},
  thread,
};

use futures::{executor::block_on, future::BoxFuture};

use super::Scheduler;
use crate::error::Error;

static THREAD_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Spawns a new thread for each consumption loop.
#[derive(Clone, Debug, Default)]
pub struct NewThread {
  stack_size: Option<usize>,
}

impl NewThread {
  /// Use `bytes` of stack for every spawned thread.
  pub fn stack_size(bytes: usize) -> Self { Self { stack_size: Some(bytes) } }
}

impl Scheduler for NewThread {
  fn spawn(&self, task: BoxFuture<'static, ()>) -> Result<(), Error> {
    let seq = THREAD_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut builder = thread::Builder::new().name(format!("rxcast-observer-{seq}"));
    if let Some(bytes) = self.stack_size {
      builder = builder.stack_size(bytes);
    }
    builder
      .spawn(move || block_on(task))
      .map(|_detached| ())
      .map_err(|e| Error::Spawn(e.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::mpsc;

  use super::*;

  #[test]
  fn runs_task_on_named_thread() {
    let (tx, rx) = mpsc::channel();
    NewThread::default()
      .spawn(Box::pin(async move {
        let name = thread::current().name().map(str::to_owned);
        tx.send(name).unwrap();
      }))
      .unwrap();

    let name = rx.recv().unwrap().unwrap();
    assert!(name.starts_with("rxcast-observer-"));
  }
}
