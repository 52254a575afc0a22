use std::collections::VecDeque;

/// Bounded FIFO with an explicit "reject when full" contract.
#[derive(Debug)]
pub struct PendingQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> PendingQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `item`, or hands it back when the queue is full.
    pub fn try_enqueue(&mut self, item: T) -> Result<(), T> {
        if self.items.len() >= self.capacity {
            return Err(item);
        }
        self.items.push_back(item);
        Ok(())
    }

    pub fn try_dequeue(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Removes every queued item, oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
