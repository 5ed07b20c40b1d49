//! Buffer Queue
//!
//! Monitor shared between the capture producer and the streaming task. The
//! queue, the running flag and the pending-renegotiation flag live behind a
//! single lock, and the condition variable is always signalled under it.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::buffer::FrameBuffer;

#[derive(Debug, Default)]
struct QueueState {
    buffers: VecDeque<FrameBuffer>,
    running: bool,
    renegotiate: bool,
}

/// FIFO of captured frames awaiting push
#[derive(Debug, Default)]
pub struct BufferQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl BufferQueue {
    /// Create an empty, stopped queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a buffer and wake the task
    pub fn push(&self, buffer: FrameBuffer) {
        let mut state = self.state.lock();
        state.buffers.push_back(buffer);
        trace!("Queued buffer, {} pending", state.buffers.len());
        self.available.notify_one();
    }

    /// Take the head buffer, blocking while the queue is empty
    ///
    /// Returns `None` once the queue is stopped. A wake-up without a buffer
    /// re-checks both conditions before returning.
    pub fn pop_blocking(&self) -> Option<FrameBuffer> {
        let mut state = self.state.lock();

        if std::mem::take(&mut state.renegotiate) {
            debug!("Renegotiation requested while streaming, format kept until reactivation");
        }

        loop {
            if !state.running {
                return None;
            }
            if let Some(buffer) = state.buffers.pop_front() {
                return Some(buffer);
            }
            self.available.wait(&mut state);
        }
    }

    /// Mark the queue running
    pub fn start(&self) {
        self.state.lock().running = true;
    }

    /// Mark the queue stopped and wake a blocked waiter
    pub fn stop(&self) {
        let mut state = self.state.lock();
        state.running = false;
        self.available.notify_all();
    }

    /// Whether the task may keep dequeuing
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Number of queued buffers
    pub fn len(&self) -> usize {
        self.state.lock().buffers.len()
    }

    /// Whether no buffers are queued
    pub fn is_empty(&self) -> bool {
        self.state.lock().buffers.is_empty()
    }

    /// Drop every queued buffer, returning how many were dropped
    pub fn flush(&self) -> usize {
        let mut state = self.state.lock();
        let dropped = state.buffers.len();
        state.buffers.clear();
        dropped
    }

    /// Flag a renegotiation for the task to observe on its next dequeue
    pub fn request_renegotiation(&self) {
        self.state.lock().renegotiate = true;
    }

    #[cfg(test)]
    pub(crate) fn renegotiation_pending(&self) -> bool {
        self.state.lock().renegotiate
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    fn frame(tag: u8) -> FrameBuffer {
        FrameBuffer::new(vec![tag])
    }

    #[test]
    fn test_fifo_order() {
        let queue = BufferQueue::new();
        queue.start();
        for i in 0..5 {
            queue.push(frame(i));
        }
        assert_eq!(queue.len(), 5);

        let popped: Vec<u8> = (0..5)
            .filter_map(|_| queue.pop_blocking())
            .map(|buffer| buffer.data()[0])
            .collect();
        assert_eq!(popped, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_stopped_queue_returns_none() {
        let queue = BufferQueue::new();
        queue.push(frame(1));
        assert!(queue.pop_blocking().is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_stop_wakes_waiter() {
        let queue = Arc::new(BufferQueue::new());
        queue.start();

        let waiter = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop_blocking())
        };

        thread::sleep(Duration::from_millis(50));
        queue.stop();

        let popped = waiter.join().expect("waiter thread panicked");
        assert!(popped.is_none());
    }

    #[test]
    fn test_push_wakes_waiter() {
        let queue = Arc::new(BufferQueue::new());
        queue.start();

        let waiter = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop_blocking())
        };

        thread::sleep(Duration::from_millis(20));
        queue.push(frame(9));

        let popped = waiter.join().expect("waiter thread panicked");
        assert_eq!(popped.map(|buffer| buffer.data()[0]), Some(9));
    }

    #[test]
    fn test_flush() {
        let queue = BufferQueue::new();
        queue.push(frame(1));
        queue.push(frame(2));
        assert_eq!(queue.flush(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.flush(), 0);
    }

    #[test]
    fn test_renegotiation_flag_consumed() {
        let queue = BufferQueue::new();
        queue.start();
        queue.push(frame(1));
        queue.request_renegotiation();
        assert!(queue.renegotiation_pending());

        assert!(queue.pop_blocking().is_some());
        assert!(!queue.renegotiation_pending());
    }
}
