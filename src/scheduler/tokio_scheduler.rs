use futures::future::BoxFuture;
use tokio::runtime::Handle;

use super::Scheduler;
use crate::error::Error;

impl Scheduler for Handle {
  #[inline]
  fn spawn(&self, task: BoxFuture<'static, ()>) -> Result<(), Error> {
    let _detached = Handle::spawn(self, task);
    Ok(())
  }
}
