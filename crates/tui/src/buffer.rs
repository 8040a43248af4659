//! Fixed-capacity rolling window of recent entries.

use std::collections::VecDeque;

/// A FIFO window that always holds exactly `capacity` slots.
///
/// Slots start out empty (`None`) so that a freshly created buffer already
/// occupies its final height on screen. Each push appends at the newest end
/// and evicts the oldest slot.
#[derive(Debug, Clone)]
pub struct RollingBuffer<T> {
    slots: VecDeque<Option<T>>,
    capacity: usize,
}

impl<T> RollingBuffer<T> {
    /// Create a buffer pre-filled with placeholders. A zero capacity is
    /// raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = VecDeque::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self { slots, capacity }
    }

    /// Append `entry` as the newest slot, returning the evicted oldest entry
    /// if that slot was filled.
    pub fn push(&mut self, entry: T) -> Option<T> {
        let evicted = self.slots.pop_front().flatten();
        self.slots.push_back(Some(entry));
        evicted
    }

    /// Slots from oldest to newest; `None` marks a placeholder.
    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> {
        self.slots.iter().map(Option::as_ref)
    }

    /// Filled entries from oldest to newest.
    pub fn entries(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().flatten()
    }

    /// Always equal to [`capacity`](Self::capacity).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filled() == 0
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_placeholders_at_full_length() {
        let buffer: RollingBuffer<&str> = RollingBuffer::new(5);
        assert_eq!(buffer.len(), 5);
        assert!(buffer.is_empty());
        assert!(buffer.iter().all(|slot| slot.is_none()));
        assert_eq!(buffer.entries().last(), None);
    }

    #[test]
    fn pushes_fill_from_the_newest_end() {
        let mut buffer = RollingBuffer::new(5);
        buffer.push("a1");
        buffer.push("a2");

        let slots: Vec<Option<&&str>> = buffer.iter().collect();
        assert_eq!(slots, vec![None, None, None, Some(&"a1"), Some(&"a2")]);
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.filled(), 2);
        assert_eq!(buffer.entries().last(), Some(&"a2"));
    }

    #[test]
    fn evicts_oldest_once_full() {
        let mut buffer = RollingBuffer::new(5);
        let mut evicted = Vec::new();
        for line in ["l1", "l2", "l3", "l4", "l5", "l6"] {
            if let Some(old) = buffer.push(line) {
                evicted.push(old);
            }
        }

        assert_eq!(buffer.entries().copied().collect::<Vec<_>>(), vec!["l2", "l3", "l4", "l5", "l6"]);
        assert_eq!(evicted, vec!["l1"]);
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut buffer = RollingBuffer::new(3);
        for i in 0..100 {
            buffer.push(i);
            assert_eq!(buffer.len(), 3);
        }
        assert_eq!(buffer.entries().copied().collect::<Vec<_>>(), vec![97, 98, 99]);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut buffer = RollingBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
        buffer.push("only");
        buffer.push("newer");
        assert_eq!(buffer.entries().copied().collect::<Vec<_>>(), vec!["newer"]);
    }
}
