//! Where consumption loops run.
//!
//! Every subscriber drains its delivery channel on its own loop. The loop is a
//! plain future; a [`Scheduler`] decides which thread polls it.
//!
//! | Scheduler | Feature | Execution |
//! |-----------|---------|-----------|
//! | [`NewThread`] | always | one named OS thread per subscriber (default) |
//! | `futures::executor::ThreadPool` | `futures-scheduler` | shared worker pool |
//! | `tokio::runtime::Handle` | `tokio-scheduler` | tokio runtime |
//!
//! A sink that blocks occupies whatever thread polls its loop. With a pool,
//! that starves the other loops sharing it.

use futures::future::BoxFuture;

use crate::error::Error;

mod thread_scheduler;
pub use thread_scheduler::NewThread;

#[cfg(feature = "futures-scheduler")]
mod thread_pool_scheduler;
#[cfg(feature = "futures-scheduler")]
pub use thread_pool_scheduler::shared_pool;

#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;

/// A Scheduler takes a consumption loop and arranges for it to be polled to
/// completion.
pub trait Scheduler: Send + Sync {
  fn spawn(&self, task: BoxFuture<'static, ()>) -> Result<(), Error>;
}

impl<S: Scheduler + ?Sized> Scheduler for std::sync::Arc<S> {
  #[inline]
  fn spawn(&self, task: BoxFuture<'static, ()>) -> Result<(), Error> { (**self).spawn(task) }
}
