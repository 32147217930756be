//! Nullable transport: hold bridge frames and hand them out in any order.

use std::collections::VecDeque;
use std::sync::Mutex;

/// A message queue between domains that never delivers on its own.
///
/// Tests decide when and in which order frames arrive.
pub struct NullTransport {
    queue: Mutex<VecDeque<Vec<u8>>>,
    sent: Mutex<usize>,
}

impl NullTransport {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            sent: Mutex::new(0),
        }
    }

    /// Queue a frame for later delivery.
    pub fn send(&self, frame: Vec<u8>) {
        self.queue.lock().unwrap().push_back(frame);
        *self.sent.lock().unwrap() += 1;
    }

    /// Oldest undelivered frame.
    pub fn take_next(&self) -> Option<Vec<u8>> {
        self.queue.lock().unwrap().pop_front()
    }

    /// Newest undelivered frame.
    pub fn take_last(&self) -> Option<Vec<u8>> {
        self.queue.lock().unwrap().pop_back()
    }

    /// Copy of the oldest frame without removing it, for replay tests.
    pub fn peek_next(&self) -> Option<Vec<u8>> {
        self.queue.lock().unwrap().front().cloned()
    }

    /// Reverse the pending queue.
    pub fn reverse(&self) {
        self.queue.lock().unwrap().make_contiguous().reverse();
    }

    /// Take every pending frame in queue order.
    pub fn drain(&self) -> Vec<Vec<u8>> {
        self.queue.lock().unwrap().drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Frames ever sent, delivered or not.
    pub fn sent_count(&self) -> usize {
        *self.sent.lock().unwrap()
    }
}

impl Default for NullTransport {
    fn default() -> Self {
        Self::new()
    }
}
