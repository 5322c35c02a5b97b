//! Bounded FIFO Queue
//!
//! This module implements the in-memory queue used by the ingress buffer and
//! every partition. It is a plain single-producer/single-consumer FIFO over
//! opaque items; callers provide their own locking (the buffers wrap it in a
//! mutex together with their offset cursors).
//!
//! ## Operations
//! - `enqueue` / `dequeue` / `peek`
//! - `peek_batch(n)`: next up to `n` items in order, **without** removal.
//!   Idempotent with respect to queue state - this is what gives consumers
//!   at-least-once semantics (extract peeks, commit dequeues).
//! - `dequeue_batch(n)`: removes and returns up to `n` items in order.
//! - `len` / `is_empty` / `clear`
//!
//! ## Memory behaviour
//! Queues live for the whole process, so they must not retain the peak
//! backlog capacity forever. Whenever the queue drains to empty (or is
//! cleared) any excess capacity above a small floor is released.

use std::collections::VecDeque;

/// Capacity retained after a drain; anything above this is released.
const SHRINK_CAPACITY: usize = 1024;

/// Generic in-memory FIFO queue
#[derive(Debug)]
pub struct FifoQueue<T> {
    items: VecDeque<T>,
}

impl<T> FifoQueue<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Append an item at the tail
    pub fn enqueue(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Remove and return the head item, if any
    pub fn dequeue(&mut self) -> Option<T> {
        let item = self.items.pop_front();
        if self.items.is_empty() {
            self.release_excess();
        }
        item
    }

    /// Return a reference to the head item without removing it
    pub fn peek(&self) -> Option<&T> {
        self.items.front()
    }

    /// Remove and return up to `n` items in FIFO order
    pub fn dequeue_batch(&mut self, n: usize) -> Vec<T> {
        let take = n.min(self.items.len());
        let batch: Vec<T> = self.items.drain(..take).collect();
        if self.items.is_empty() {
            self.release_excess();
        }
        batch
    }

    /// Number of items currently queued
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop all items and release excess capacity
    pub fn clear(&mut self) {
        self.items.clear();
        self.release_excess();
    }

    fn release_excess(&mut self) {
        if self.items.capacity() > SHRINK_CAPACITY {
            self.items.shrink_to(SHRINK_CAPACITY);
        }
    }
}

impl<T: Clone> FifoQueue<T> {
    /// Return clones of the next up to `n` items in FIFO order, without
    /// removing them. Calling this repeatedly returns the same items.
    pub fn peek_batch(&self, n: usize) -> Vec<T> {
        self.items.iter().take(n).cloned().collect()
    }
}

impl<T> Default for FifoQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
