//! Message dispatch: route one letter to its handler, then run the
//! post-dispatch bookkeeping shared by every kind.

use tracing::{debug, warn};

use crate::context::ActionContext;
use crate::descriptor::Descriptor;
use crate::message::{Message, MessageKind};
use crate::registry::Insertion;

use super::core::ProcessCore;
use super::fulfillment::{self, Delivery};
use super::reaction::Reaction;
use super::settlement;
use super::traits::Process;

/// Deliver `message` to `process`.
///
/// After the handler returns, a message whose kind has a periodic delay is
/// re-sent to the process itself that many ticks later, and the process's
/// previous timestamp becomes now.
pub fn dispatch(process: &mut dyn Process, ctx: &mut ActionContext, message: Message) -> Reaction {
    let now = ctx.now();
    let kind = message.kind();
    let echo = message.clone();

    let reaction = match message {
        Message::NormalWake => process.on_normal_wake(ctx),
        Message::ExternalWake => process.on_external_wake(ctx),
        Message::RegisterRequest(descriptor) => register_request(process.core_mut(), ctx, descriptor),
        Message::NormalCoughUp => {
            fulfillment::cough_up(process.core_mut(), ctx, Delivery::Registered)
        }
        Message::ImmediateCoughUp { requester } => {
            fulfillment::cough_up(process.core_mut(), ctx, Delivery::Immediate { requester })
        }
        Message::Receival {
            kind: receival,
            descriptor,
        } => {
            process.on_receival(ctx, receival, &descriptor);
            queue_receival(process.core_mut(), ctx, descriptor)
        }
        Message::DelayedReaction => {
            Reaction::Settled(settlement::settle_receivals(process.core_mut(), ctx))
        }
        Message::SpecialInput(payload) => process.on_special_input(ctx, payload),
        Message::SpecialOutput(payload) => process.on_special_output(ctx, payload),
        Message::GeneralPurpose { slot, payload } => process.on_general_purpose(ctx, slot, payload),
    };

    if let Reaction::Unexpected(unhandled) = &reaction {
        warn!(
            process = %process.core().id(),
            from = %ctx.sender(),
            kind = %unhandled,
            "no handler for message"
        );
    }

    let core = process.core_mut();
    if let Some(delay) = core.periodic_delay(kind) {
        ctx.send_self(delay, echo);
    }
    core.previous_timestamp = Some(now);

    reaction
}

/// Add a standing request. The first one also starts the periodic
/// Normal cough-up.
///
/// A request whose consumer-side stores do not match the supply store box
/// for box is refused and never serviced.
fn register_request(core: &mut ProcessCore, ctx: &mut ActionContext, descriptor: Descriptor) -> Reaction {
    assert_eq!(
        descriptor.supplier(),
        core.id(),
        "register-request delivered to a process that is not the supplier"
    );
    if let Some((location, boxes)) = fulfillment::box_mismatch(ctx.scoreboard(), &descriptor) {
        let expected = ctx.scoreboard().box_count(descriptor.supplier_quantity().store);
        warn!(
            supplier = %core.id(),
            consumer = %descriptor.consumer(),
            %location,
            boxes,
            expected,
            "request refused, stores differ in box count"
        );
        return Reaction::Misaligned {
            location,
            boxes,
            expected,
        };
    }
    let inserted = match core.requests.insert_request(descriptor) {
        Insertion::Inserted => true,
        Insertion::Duplicate(d) => {
            debug!(supplier = %core.id(), consumer = %d.consumer(), "duplicate request rejected");
            false
        }
    };

    if core.periodic_delay(MessageKind::NormalCoughUp).is_none() {
        let interval = core.cough_up_interval();
        core.set_periodic_delay(MessageKind::NormalCoughUp, interval);
        ctx.send_self(interval, Message::NormalCoughUp);
    }

    Reaction::Registered { inserted }
}

/// Queue a delivery for settlement and make sure a Delayed-reaction is
/// due no later than the delivery's arrival time.
fn queue_receival(core: &mut ProcessCore, ctx: &mut ActionContext, descriptor: Descriptor) -> Reaction {
    assert_eq!(
        descriptor.consumer(),
        core.id(),
        "receival delivered to a process that is not the consumer"
    );
    let due = descriptor.timestamp().max(ctx.now());
    if let Insertion::Duplicate(d) = core.receivals.insert_receival(descriptor) {
        debug!(consumer = %core.id(), supplier = %d.supplier(), "receival already queued");
    }

    if core.delayed_reaction_due.is_some_and(|armed| armed <= due) {
        return Reaction::Queued { scheduled: false };
    }
    ctx.send_at(due, core.id(), Message::DelayedReaction);
    core.delayed_reaction_due = Some(due);
    Reaction::Queued { scheduled: true }
}
