use smallvec::SmallVec;

/// Entries keyed by an ever-growing ID, kept in insertion order.
///
/// Backs the subject registry. An ID is never handed out twice, so removing
/// by a stale ID can't hit a subscriber registered later.
pub(crate) struct DynamicEntries<U> {
  next_id: usize,
  entries: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for DynamicEntries<U> {
  fn default() -> Self { Self { next_id: 0, entries: SmallVec::new() } }
}

impl<U> DynamicEntries<U> {
  pub(crate) fn add(&mut self, entry: U) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.entries.push((id, entry));
    id
  }

  pub(crate) fn remove(&mut self, id: usize) -> Option<U> {
    let pos = self.entries.iter().position(|(key, _)| *key == id)?;
    Some(self.entries.remove(pos).1)
  }

  #[inline]
  pub(crate) fn retain(&mut self, mut keep: impl FnMut(&U) -> bool) {
    self.entries.retain(|(_, entry)| keep(entry));
  }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.entries.len() }

  /// Empty the container, yielding entries oldest first.
  #[inline]
  pub(crate) fn drain(&mut self) -> impl Iterator<Item = U> + '_ {
    self.entries.drain(..).map(|(_, entry)| entry)
  }

  #[inline]
  pub(crate) fn iter(&self) -> impl Iterator<Item = &U> {
    self.entries.iter().map(|(_, entry)| entry)
  }
}
