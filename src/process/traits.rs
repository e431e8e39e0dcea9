//! `Process` trait: the hooks a concrete process may override.

use std::fmt;

use crate::context::ActionContext;
use crate::descriptor::Descriptor;
use crate::message::{GpSlot, MessageKind, Payload, ReceivalKind};

use super::core::ProcessCore;
use super::fulfillment::{self, Delivery};
use super::reaction::Reaction;

/// Trait implemented by every simulated process.
///
/// The kernel owns the protocol: registration, fulfillment, delivery and
/// settlement all run in [`dispatch`](super::dispatch::dispatch) on the
/// [`ProcessCore`] a process exposes. A concrete process only supplies the
/// core and overrides the hooks it cares about; every hook has a base
/// behaviour.
///
/// # Contract
///
/// Implementations **must**:
/// - Keep protocol state in the core, never in globals.
/// - Route all side effects through `ctx`.
/// - Be deterministic for equal inputs.
///
/// # Example
///
/// ```rust
/// use humus::process::{Process, ProcessCore};
///
/// struct Inert { core: ProcessCore }
///
/// impl Process for Inert {
///     fn core(&self) -> &ProcessCore { &self.core }
///     fn core_mut(&mut self) -> &mut ProcessCore { &mut self.core }
///     fn as_any(&self) -> &dyn std::any::Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn std::any::Any { self }
/// }
/// ```
pub trait Process {
    fn core(&self) -> &ProcessCore;
    fn core_mut(&mut self) -> &mut ProcessCore;

    /// Downcast support, needed by `ProcessRuntime::process::<T>()`.
    fn as_any(&self) -> &dyn std::any::Any;
    /// Mutable downcast support.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;

    /// Periodic self-wake. Base behaviour services standing requests.
    fn on_normal_wake(&mut self, ctx: &mut ActionContext) -> Reaction {
        fulfillment::cough_up(self.core_mut(), ctx, Delivery::Registered)
    }

    /// Base behaviour acknowledges the wake and does nothing else.
    fn on_external_wake(&mut self, _ctx: &mut ActionContext) -> Reaction {
        Reaction::Done
    }

    /// Observe a delivery before the kernel queues it for settlement.
    fn on_receival(&mut self, _ctx: &mut ActionContext, _kind: ReceivalKind, _descriptor: &Descriptor) {}

    fn on_special_input(&mut self, _ctx: &mut ActionContext, _payload: Payload) -> Reaction {
        Reaction::Ignored
    }

    /// Base behaviour hands the payload to the output rules.
    fn on_special_output(&mut self, ctx: &mut ActionContext, payload: Payload) -> Reaction {
        ctx.emit_output(&payload);
        Reaction::Done
    }

    /// No slot has a base handler.
    fn on_general_purpose(
        &mut self,
        _ctx: &mut ActionContext,
        slot: GpSlot,
        _payload: Payload,
    ) -> Reaction {
        Reaction::Unexpected(MessageKind::GeneralPurpose(slot))
    }

    /// Standing requests this process will file once running. Setup checks
    /// them against the scoreboard before the first letter is dispatched.
    fn planned_requests(&self) -> Vec<Descriptor> {
        Vec::new()
    }

    /// Whether this process renders itself.
    fn draws(&self) -> bool {
        false
    }

    /// Render a textual picture of this process.
    ///
    /// # Panics
    /// The base implementation panics: a process that reports
    /// [`draws`](Self::draws) must override this.
    fn draw(&self, _out: &mut dyn fmt::Write) -> fmt::Result {
        panic!(
            "process {} claims to draw but does not implement draw()",
            self.core().id()
        )
    }
}
