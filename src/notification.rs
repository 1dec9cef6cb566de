//! The unit carried by a delivery channel.

/// One event of a subject's sequence, as seen by a single subscriber.
///
/// `Error` and `Complete` are terminal markers: nothing follows them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

impl<Item, Err> Notification<Item, Err> {
  /// Whether this notification ends the sequence.
  #[inline]
  pub fn is_terminal(&self) -> bool { !matches!(self, Notification::Next(_)) }

  /// The carried value, if this is a `Next`.
  #[inline]
  pub fn into_next(self) -> Option<Item> {
    match self {
      Notification::Next(v) => Some(v),
      _ => None,
    }
  }
}
