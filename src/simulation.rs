/// Simulation execution loop.
///
/// Drives the post office: collects the next letter, advances virtual
/// time and hands the letter to an [`EventHandler`]. The loop is
/// synchronous and single-threaded; each reaction runs to completion
/// before the next letter is collected, so anything a handler posts is
/// only seen on a later turn.

use tracing::trace;

use crate::event::{Event, EventId};
use crate::message::Message;
use crate::post_office::PostOffice;
use crate::process::ProcessId;
use crate::time::VirtualTime;

// ── Handler trait ─────────────────────────────────────────────────────

/// Receives every collected letter.
pub trait EventHandler {
    fn handle(&mut self, ctx: &mut SimulationContext, event: &Event);
}

/// A handler backed by a closure, for tests and one-off runs.
impl<F> EventHandler for F
where
    F: FnMut(&mut SimulationContext, &Event),
{
    fn handle(&mut self, ctx: &mut SimulationContext, event: &Event) {
        (self)(ctx, event);
    }
}

// ── Simulation Context ───────────────────────────────────────────────

/// Mutable access to the post office during one dispatch.
///
/// Borrowing the post office mutably means a handler can only post new
/// letters; it cannot reorder or remove pending ones.
pub struct SimulationContext<'a> {
    pub(crate) post: &'a mut PostOffice,
    pub(crate) now: VirtualTime,
}

impl<'a> SimulationContext<'a> {
    pub fn new(post: &'a mut PostOffice, now: VirtualTime) -> Self {
        SimulationContext { post, now }
    }

    #[inline]
    pub fn now(&self) -> VirtualTime {
        self.now
    }

    /// Post a letter due at an absolute time.
    ///
    /// # Panics
    /// Panics if `at` is before the current time.
    pub fn send_at(
        &mut self,
        at: VirtualTime,
        from: ProcessId,
        to: ProcessId,
        message: Message,
    ) -> EventId {
        assert!(
            at >= self.now,
            "Cannot send into the past: now={}, at={}",
            self.now,
            at
        );
        self.post.post(at, from, to, message)
    }

    /// Post a letter due `delay` ticks from now.
    ///
    /// # Panics
    /// Panics on virtual-time overflow.
    pub fn send_after(
        &mut self,
        delay: u64,
        from: ProcessId,
        to: ProcessId,
        message: Message,
    ) -> EventId {
        let at = self
            .now
            .plus(delay)
            .expect("VirtualTime overflow when sending");
        self.post.post(at, from, to, message)
    }

    /// Letters waiting in the post office.
    pub fn pending_count(&self) -> usize {
        self.post.len()
    }
}

// ── Simulation ────────────────────────────────────────────────────────

/// Top-level driver. Owns the post office and the current virtual time.
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    post: PostOffice,
    current_time: VirtualTime,
    events_processed: u64,
}

impl Simulation {
    pub fn new() -> Self {
        Simulation {
            post: PostOffice::new(),
            current_time: VirtualTime::ZERO,
            events_processed: 0,
        }
    }

    pub fn post_office(&self) -> &PostOffice {
        &self.post
    }

    pub fn post_office_mut(&mut self) -> &mut PostOffice {
        &mut self.post
    }

    pub fn current_time(&self) -> VirtualTime {
        self.current_time
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Seed a letter before (or between) runs.
    pub fn send(
        &mut self,
        at: VirtualTime,
        from: ProcessId,
        to: ProcessId,
        message: Message,
    ) -> EventId {
        self.post.post(at, from, to, message)
    }

    /// Collect one letter, advance time, dispatch it.
    ///
    /// Returns the dispatched letter, or `None` when nothing is pending.
    pub fn step(&mut self, handler: &mut dyn EventHandler) -> Option<Event> {
        let event = self.post.collect()?;

        assert!(
            event.scheduled_at >= self.current_time,
            "Time went backward! current={}, event={}",
            self.current_time,
            event.scheduled_at
        );
        self.current_time = event.scheduled_at;
        self.events_processed += 1;
        trace!(event = %event, "collected");

        let mut ctx = SimulationContext {
            post: &mut self.post,
            now: self.current_time,
        };
        handler.handle(&mut ctx, &event);

        Some(event)
    }

    /// Run until nothing is pending. Returns letters dispatched.
    ///
    /// Periodic processes never stop posting; use [`run_until`](Self::run_until)
    /// for those.
    pub fn run(&mut self, handler: &mut dyn EventHandler) -> u64 {
        let start = self.events_processed;
        while self.step(handler).is_some() {}
        self.events_processed - start
    }

    /// Run at most `max_steps` letters.
    pub fn run_for(&mut self, max_steps: u64, handler: &mut dyn EventHandler) -> u64 {
        let start = self.events_processed;
        for _ in 0..max_steps {
            if self.step(handler).is_none() {
                break;
            }
        }
        self.events_processed - start
    }

    /// Dispatch every letter due at or before `horizon`, then set the
    /// clock to `horizon`. Later letters stay queued.
    pub fn run_until(&mut self, horizon: VirtualTime, handler: &mut dyn EventHandler) -> u64 {
        let start = self.events_processed;
        while self
            .post
            .peek()
            .is_some_and(|next| next.scheduled_at <= horizon)
        {
            self.step(handler);
        }
        if horizon > self.current_time {
            self.current_time = horizon;
        }
        self.events_processed - start
    }

    pub fn is_finished(&self) -> bool {
        self.post.is_empty()
    }
}
