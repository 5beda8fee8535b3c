//! Bounded FIFO buffer of enriched events awaiting delivery.
//!
//! The buffer is only touched through [`EventQueue::append`],
//! [`EventQueue::drain_for_flush`] and [`EventQueue::requeue_front`]. A flush takes the
//! whole buffer by swapping in an empty one, so events tracked while a request is in
//! flight land in the new buffer and are neither lost nor sent twice.

use crate::event::Event;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Result of [`EventQueue::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Queued; `len` is the queue length including the new event.
    Queued { len: usize },
    /// The queue was at capacity and the event was discarded.
    Dropped,
}

#[derive(Debug)]
pub struct EventQueue {
    events: Mutex<Vec<Event>>,
    max_retained: usize,
    dropped: AtomicU64,
}

impl EventQueue {
    pub fn new(max_retained: usize) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            max_retained: max_retained.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    /// Push to the tail unless the queue already holds `max_retained` events.
    pub fn append(&self, event: Event) -> AppendOutcome {
        let mut events = self.events();
        if events.len() >= self.max_retained {
            drop(events);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(cap = self.max_retained, "queue full; dropping newest event");
            return AppendOutcome::Dropped;
        }
        events.push(event);
        AppendOutcome::Queued { len: events.len() }
    }

    /// Take everything queued, leaving an empty buffer behind.
    pub fn drain_for_flush(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events())
    }

    /// Put a failed batch back ahead of anything queued since, then trim the tail to the
    /// cap. Returns how many events were discarded.
    pub fn requeue_front(&self, batch: Vec<Event>) -> usize {
        let mut events = self.events();
        let mut merged = batch;
        merged.append(&mut *events);
        let discarded = merged.len().saturating_sub(self.max_retained);
        merged.truncate(self.max_retained);
        *events = merged;
        drop(events);

        if discarded > 0 {
            self.dropped.fetch_add(discarded as u64, Ordering::Relaxed);
            tracing::debug!(discarded, cap = self.max_retained, "requeue exceeded cap");
        }
        discarded
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }

    pub fn max_retained(&self) -> usize {
        self.max_retained
    }

    /// Total events discarded by the cap since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Copy of the queued events, oldest first.
    pub fn snapshot(&self) -> Vec<Event> {
        self.events().clone()
    }

    fn events(&self) -> MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn event(label: &str) -> Event {
        Event {
            event_type: "click".into(),
            category: String::new(),
            action: String::new(),
            label: label.into(),
            value: None,
            session_id: "session_0_test".into(),
            user_id: None,
            timestamp: "2026-01-01T00:00:00.000Z".into(),
            metadata: Map::new(),
        }
    }

    fn labels(events: &[Event]) -> Vec<String> {
        events.iter().map(|e| e.label.clone()).collect()
    }

    #[test]
    fn append_reports_length() {
        let queue = EventQueue::new(50);
        assert_eq!(queue.append(event("a")), AppendOutcome::Queued { len: 1 });
        assert_eq!(queue.append(event("b")), AppendOutcome::Queued { len: 2 });
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn append_drops_newest_at_cap() {
        let queue = EventQueue::new(3);
        for label in ["a", "b", "c"] {
            queue.append(event(label));
        }
        assert_eq!(queue.append(event("d")), AppendOutcome::Dropped);
        assert_eq!(labels(&queue.snapshot()), ["a", "b", "c"]);
        assert_eq!(queue.dropped(), 1);
    }

    #[test]
    fn drain_swaps_in_empty_buffer() {
        let queue = EventQueue::new(50);
        queue.append(event("a"));
        queue.append(event("b"));

        let batch = queue.drain_for_flush();
        assert_eq!(labels(&batch), ["a", "b"]);
        assert!(queue.is_empty());

        queue.append(event("c"));
        assert_eq!(labels(&queue.snapshot()), ["c"]);
        assert_eq!(labels(&batch), ["a", "b"]);
    }

    #[test]
    fn requeue_puts_failed_batch_first() {
        let queue = EventQueue::new(50);
        queue.append(event("b1"));
        queue.append(event("b2"));
        let batch = queue.drain_for_flush();
        queue.append(event("e"));

        assert_eq!(queue.requeue_front(batch), 0);
        assert_eq!(labels(&queue.snapshot()), ["b1", "b2", "e"]);
    }

    #[test]
    fn requeue_trims_newest_beyond_cap() {
        let queue = EventQueue::new(4);
        let batch: Vec<Event> = ["b1", "b2", "b3"].into_iter().map(event).collect();
        queue.append(event("n1"));
        queue.append(event("n2"));

        assert_eq!(queue.requeue_front(batch), 1);
        assert_eq!(labels(&queue.snapshot()), ["b1", "b2", "b3", "n1"]);
        assert_eq!(queue.dropped(), 1);
    }

    #[test]
    fn zero_cap_is_clamped() {
        let queue = EventQueue::new(0);
        assert_eq!(queue.max_retained(), 1);
        assert_eq!(queue.append(event("a")), AppendOutcome::Queued { len: 1 });
    }
}
