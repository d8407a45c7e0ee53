#![forbid(unsafe_code)]

//! FIFO wait-list of admitted requests.
//!
//! Only requests that passed content validation, the host gates and the
//! duplicate filter are queued. They are re-checked against the host when
//! dequeued, because the screen may have changed while they waited.

use std::collections::VecDeque;

use veil_core::{Instant, ValidatedRequest};

/// A request waiting for the manager to become free.
#[derive(Debug)]
pub struct QueuedRequest {
    pub request: ValidatedRequest,
    pub enqueued_at: Instant,
}

/// Pending requests in arrival order.
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: VecDeque<QueuedRequest>,
}

impl PendingQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request. Returns its 1-based position.
    pub fn push(&mut self, request: ValidatedRequest, now: Instant) -> usize {
        self.entries.push_back(QueuedRequest {
            request,
            enqueued_at: now,
        });
        self.entries.len()
    }

    /// Remove the oldest request.
    pub fn pop_front(&mut self) -> Option<QueuedRequest> {
        self.entries.pop_front()
    }

    /// Drop every pending request without invoking any callback.
    ///
    /// Returns the number dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Titles of the pending requests, oldest first.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.request.title.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_core::ModalRequest;

    fn validated(title: &str) -> ValidatedRequest {
        ModalRequest::choice(title, ["a"], |_| {})
            .validate("d")
            .unwrap()
    }

    #[test]
    fn fifo_order() {
        let now = Instant::now();
        let mut queue = PendingQueue::new();
        assert_eq!(queue.push(validated("r1"), now), 1);
        assert_eq!(queue.push(validated("r2"), now), 2);
        assert_eq!(queue.push(validated("r3"), now), 3);
        assert_eq!(queue.titles().collect::<Vec<_>>(), vec!["r1", "r2", "r3"]);

        assert_eq!(queue.pop_front().unwrap().request.title, "r1");
        assert_eq!(queue.pop_front().unwrap().request.title, "r2");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn clear_drops_without_calling() {
        use std::cell::Cell;
        use std::rc::Rc;

        let called = Rc::new(Cell::new(false));
        let flag = Rc::clone(&called);
        let mut queue = PendingQueue::new();
        let request = ModalRequest::choice("r", ["a"], move |_| flag.set(true))
            .validate("d")
            .unwrap();
        queue.push(request, Instant::now());
        assert_eq!(queue.clear(), 1);
        assert!(queue.is_empty());
        assert!(!called.get());
        assert!(queue.pop_front().is_none());
    }
}
