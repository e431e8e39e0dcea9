//! The action context handed to every process reaction.
//!
//! Bundles the current virtual time, who is reacting to what, and the
//! shared-state handles (scoreboard, output rules, post office). It lives
//! only for the duration of one dispatch.

use crate::descriptor::Descriptor;
use crate::event::EventId;
use crate::message::{Message, MessageKind, Payload, ReceivalKind};
use crate::output::OutputRules;
use crate::process::ProcessId;
use crate::scoreboard::Scoreboard;
use crate::simulation::SimulationContext;
use crate::time::VirtualTime;

pub struct ActionContext<'a, 'sim> {
    sim: &'a mut SimulationContext<'sim>,
    scoreboard: &'a mut dyn Scoreboard,
    outputs: &'a mut OutputRules,
    recipient: ProcessId,
    sender: ProcessId,
    kind: MessageKind,
}

impl<'a, 'sim> ActionContext<'a, 'sim> {
    pub fn new(
        sim: &'a mut SimulationContext<'sim>,
        scoreboard: &'a mut dyn Scoreboard,
        outputs: &'a mut OutputRules,
        recipient: ProcessId,
        sender: ProcessId,
        kind: MessageKind,
    ) -> Self {
        ActionContext {
            sim,
            scoreboard,
            outputs,
            recipient,
            sender,
            kind,
        }
    }

    #[inline]
    pub fn now(&self) -> VirtualTime {
        self.sim.now()
    }

    /// The process this reaction runs on.
    #[inline]
    pub fn recipient(&self) -> ProcessId {
        self.recipient
    }

    /// Who posted the message being handled.
    #[inline]
    pub fn sender(&self) -> ProcessId {
        self.sender
    }

    /// Kind of the message being handled.
    #[inline]
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn scoreboard(&self) -> &dyn Scoreboard {
        &*self.scoreboard
    }

    pub fn scoreboard_mut(&mut self) -> &mut dyn Scoreboard {
        &mut *self.scoreboard
    }

    // ── Sending ───────────────────────────────────────────────

    /// Send from the recipient to `to`, due now.
    pub fn send(&mut self, to: ProcessId, message: Message) -> EventId {
        let from = self.recipient;
        self.sim.send_after(0, from, to, message)
    }

    /// Send from the recipient to `to`, due at `at`.
    ///
    /// # Panics
    /// Panics if `at` is in the past.
    pub fn send_at(&mut self, at: VirtualTime, to: ProcessId, message: Message) -> EventId {
        let from = self.recipient;
        self.sim.send_at(at, from, to, message)
    }

    pub fn send_after(&mut self, delay: u64, to: ProcessId, message: Message) -> EventId {
        let from = self.recipient;
        self.sim.send_after(delay, from, to, message)
    }

    /// Send to the recipient itself, due `delay` ticks from now.
    pub fn send_self(&mut self, delay: u64, message: Message) -> EventId {
        let me = self.recipient;
        self.sim.send_after(delay, me, me, message)
    }

    /// Ask `descriptor`'s supplier to register it as a standing request.
    pub fn register_request(&mut self, descriptor: Descriptor) -> EventId {
        let supplier = descriptor.supplier();
        self.send(supplier, Message::RegisterRequest(descriptor))
    }

    /// Ask `supplier` to cough up right away on the recipient's behalf.
    pub fn request_immediate(&mut self, supplier: ProcessId) -> EventId {
        let requester = self.recipient;
        self.send(supplier, Message::ImmediateCoughUp { requester })
    }

    /// Notify `descriptor`'s consumer of an unsolicited delivery already
    /// staged in its buffer. It settles once `descriptor.timestamp()` arrives.
    pub fn deliver_unsolicited(&mut self, descriptor: Descriptor) -> EventId {
        let consumer = descriptor.consumer();
        self.send(
            consumer,
            Message::Receival {
                kind: ReceivalKind::Unsolicited,
                descriptor,
            },
        )
    }

    /// Hand `payload` to every output rule. Returns how many fired.
    pub fn emit_output(&mut self, payload: &Payload) -> usize {
        let now = self.now();
        self.outputs.fire(now, self.recipient, payload)
    }

    /// Letters waiting in the post office.
    pub fn pending_count(&self) -> usize {
        self.sim.pending_count()
    }
}
