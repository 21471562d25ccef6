//! Bounded task queue shared by session coordinators and the worker pool
//!
//! One mutex guards the FIFO; two condition variables carry the not-full and
//! not-empty signals. Producers are throttled once the queue is over
//! capacity, which bounds memory when a coordinator scans faster than the
//! workers drain.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use crate::session::SessionConn;

/// One file transmission, consumed exactly once by exactly one worker.
pub struct Task {
    pub conn: Arc<SessionConn>,
    /// Absolute path to open on the server.
    pub path: PathBuf,
    /// Root-relative name sent in the file header.
    pub name: String,
}

pub type TaskQueue = BoundedQueue<Task>;

pub struct BoundedQueue<T> {
    capacity: usize,
    items: Mutex<VecDeque<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        BoundedQueue {
            capacity,
            items: Mutex::new(VecDeque::new()),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Blocks while the queue is over capacity. The admission check is
    /// `>`, not `>=`: the queue transiently holds up to capacity + 1
    /// items, and existing deployments depend on that exact bound.
    pub fn push(&self, item: T) {
        let mut items = self.items.lock();
        while items.len() > self.capacity {
            self.not_full.wait(&mut items);
        }
        items.push_back(item);
        self.not_empty.notify_all();
    }

    /// Blocks until an item is available, then dequeues the head (FIFO).
    pub fn pop(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                self.not_full.notify_all();
                return item;
            }
            self.not_empty.wait(&mut items);
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}
