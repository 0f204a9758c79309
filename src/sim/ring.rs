//! Fixed-capacity ring buffer with overwrite-oldest semantics

#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: Vec<T>,
    /// Slot handed out most recently
    write: usize,
}

impl<T: Clone> RingBuffer<T> {
    pub fn new(capacity: usize, fill: T) -> Self {
        assert!(capacity > 0, "ring buffer needs at least one slot");
        Self {
            items: vec![fill; capacity],
            write: capacity - 1,
        }
    }
}

impl<T> RingBuffer<T> {
    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    /// Advance the write cursor and hand out that slot for overwriting
    pub fn next_slot(&mut self) -> &mut T {
        self.write = (self.write + 1) % self.items.len();
        &mut self.items[self.write]
    }

    /// Slot the next `next_slot` call will return
    pub fn peek_next(&self) -> &T {
        &self.items[(self.write + 1) % self.items.len()]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }
}
