//! Fixed-capacity FIFO ring that evicts its oldest item on overflow.

use std::collections::VecDeque;

/// Bounded FIFO container. Capacity is fixed at construction.
#[derive(Debug, Clone)]
pub struct BoundedRing<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedRing<T> {
    /// Create an empty ring. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `item`. When the ring is full the oldest item leaves to make
    /// room and is handed back.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.is_full() {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Remove and return the oldest item.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.items.iter_mut()
    }

    /// Remove every item failing `keep`, preserving order of the rest.
    /// Removed items are returned oldest first.
    pub fn retain_or_take<F>(&mut self, mut keep: F) -> Vec<T>
    where
        F: FnMut(&T) -> bool,
    {
        let mut kept = VecDeque::with_capacity(self.capacity);
        let mut removed = Vec::new();
        for item in self.items.drain(..) {
            if keep(&item) {
                kept.push_back(item);
            } else {
                removed.push(item);
            }
        }
        self.items = kept;
        removed
    }

    /// Empty the ring, returning items oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_evicts_oldest_when_full() {
        let mut ring = BoundedRing::new(3);
        for i in 0..3 {
            assert_eq!(ring.push(i), None);
        }
        assert!(ring.is_full());
        assert_eq!(ring.push(3), Some(0));
        assert_eq!(ring.push(4), Some(1));

        let order: Vec<i32> = ring.iter().copied().collect();
        assert_eq!(order, vec![2, 3, 4]);
    }

    #[test]
    fn test_pop_frees_a_slot() {
        let mut ring = BoundedRing::new(2);
        ring.push('a');
        ring.push('b');

        assert_eq!(ring.pop(), Some('a'));
        assert!(!ring.is_full());
        assert_eq!(ring.push('c'), None);
        assert_eq!(ring.drain(), vec!['b', 'c']);
        assert_eq!(ring.pop(), None);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut ring = BoundedRing::new(0);
        assert_eq!(ring.capacity(), 1);
        assert_eq!(ring.push('a'), None);
        assert_eq!(ring.push('b'), Some('a'));
    }

    #[test]
    fn test_retain_or_take_preserves_order() {
        let mut ring = BoundedRing::new(5);
        for i in 0..5 {
            ring.push(i);
        }
        let removed = ring.retain_or_take(|v| v % 2 == 0);

        assert_eq!(removed, vec![1, 3]);
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![0, 2, 4]);
        assert_eq!(ring.len(), 3);
    }
}
