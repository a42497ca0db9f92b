use std::collections::VecDeque;

/// Fixed-capacity, insertion-ordered queue with "enqueue unique" semantics.
///
/// Re-inserting a value that is already present changes nothing: it is not
/// moved to the back and the ring does not grow. A new value beyond capacity
/// evicts the oldest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRing<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T: PartialEq> HistoryRing<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.items.iter().any(|i| i == item)
    }

    /// Appends `item` unless an equal value is already present.
    ///
    /// Returns `true` if the ring changed.
    pub fn enqueue_unique(&mut self, item: T) -> bool {
        if self.capacity == 0 || self.contains(&item) {
            return false;
        }
        self.items.push_back(item);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
        true
    }

    /// Current items, oldest first.
    pub fn items(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
