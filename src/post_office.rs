/// The post office: a deterministic, time-ordered letter queue.
///
/// Uses a `BinaryHeap` with reversed `Ord` on [`Event`] as a min-heap
/// keyed by `(scheduled_at, id)`. Every posted letter is handed out
/// exactly once, in non-decreasing time order, and letters due at the
/// same instant come out in the order they were posted.

use std::collections::BinaryHeap;

use crate::event::{Event, EventId, EventIdGen};
use crate::message::Message;
use crate::process::ProcessId;
use crate::time::VirtualTime;

#[derive(Debug, Clone, Default)]
pub struct PostOffice {
    queue: BinaryHeap<Event>,
    ids: EventIdGen,
}

impl PostOffice {
    pub fn new() -> Self {
        PostOffice {
            queue: BinaryHeap::new(),
            ids: EventIdGen::new(),
        }
    }

    /// Post `message` from `from` to `to`, due at `at`.
    pub fn post(
        &mut self,
        at: VirtualTime,
        from: ProcessId,
        to: ProcessId,
        message: Message,
    ) -> EventId {
        let id = self.ids.next_id();
        self.queue.push(Event::new(id, at, from, to, message));
        id
    }

    /// Take the next letter (earliest time, lowest id).
    pub fn collect(&mut self) -> Option<Event> {
        self.queue.pop()
    }

    pub fn peek(&self) -> Option<&Event> {
        self.queue.peek()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Number of letters waiting for `process`.
    pub fn pending_for(&self, process: ProcessId) -> usize {
        self.queue.iter().filter(|e| e.to == process).count()
    }

    /// Id the next posted letter will receive.
    pub fn next_event_id(&self) -> EventId {
        self.ids.peek()
    }

    /// Empty the queue in delivery order. Useful for tests and snapshots.
    pub fn drain_ordered(&mut self) -> Vec<Event> {
        let mut events = Vec::with_capacity(self.queue.len());
        while let Some(e) = self.queue.pop() {
            events.push(e);
        }
        events
    }
}
