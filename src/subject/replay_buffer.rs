use std::collections::VecDeque;

/// The last `max_size` values a subject emitted, oldest first.
///
/// Pushing into a full buffer evicts the oldest entry.
#[derive(Clone, Debug)]
pub struct ReplayBuffer<Item> {
  max_size: usize,
  items: VecDeque<Item>,
}

impl<Item> ReplayBuffer<Item> {
  pub fn new(max_size: usize) -> Self {
    Self { max_size, items: VecDeque::with_capacity(max_size) }
  }

  pub fn push(&mut self, item: Item) {
    if self.max_size == 0 {
      return;
    }
    if self.items.len() == self.max_size {
      self.items.pop_front();
    }
    self.items.push_back(item);
  }

  #[inline]
  pub fn max_size(&self) -> usize { self.max_size }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = &Item> { self.items.iter() }
}
