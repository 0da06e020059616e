//! Per-frame event queue.
//!
//! Producers (input dispatch, console) push between steps and the host
//! drains once per step, so handlers never run concurrently with a tick or
//! with each other.

use std::collections::{vec_deque, VecDeque};

/// FIFO queue of one event type.
#[derive(Debug, Clone)]
pub struct EventQueue<E> {
    queue: VecDeque<E>,
    total: u64,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            total: 0,
        }
    }
}

impl<E> EventQueue<E> {
    pub fn push(&mut self, event: E) {
        self.queue.push_back(event);
        self.total += 1;
    }

    /// Removes every queued event, oldest first.
    pub fn drain(&mut self) -> vec_deque::Drain<'_, E> {
        self.queue.drain(..)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Events pushed over the queue's lifetime.
    pub fn total_pushed(&self) -> u64 {
        self.total
    }
}
