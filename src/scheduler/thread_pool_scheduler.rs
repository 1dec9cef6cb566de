use futures::{executor::ThreadPool, future::BoxFuture};
use once_cell::sync::Lazy;

use super::Scheduler;
use crate::error::Error;

static DEFAULT_POOL: Lazy<Result<ThreadPool, Error>> = Lazy::new(|| {
  ThreadPool::builder()
    .name_prefix("rxcast-pool-")
    .create()
    .map_err(|e| Error::ThreadPool(e.to_string()))
});

/// The process-wide pool, created on first use.
///
/// `ThreadPool` is a cheap handle; every clone feeds the same workers.
pub fn shared_pool() -> Result<ThreadPool, Error> { DEFAULT_POOL.clone() }

impl Scheduler for ThreadPool {
  #[inline]
  fn spawn(&self, task: BoxFuture<'static, ()>) -> Result<(), Error> {
    self.spawn_ok(task);
    Ok(())
  }
}
