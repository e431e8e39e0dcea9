//! Receival settlement: commit staged buffers into their destinations.

use tracing::debug;

use crate::context::ActionContext;
use crate::descriptor::Descriptor;
use crate::message::Message;
use crate::scoreboard::Scoreboard;

use super::core::ProcessCore;
use super::reaction::Settlement;

/// Move every buffered amount of `descriptor` into its destination and
/// zero the buffer, box by box.
pub fn commit(board: &mut dyn Scoreboard, descriptor: &Descriptor) {
    let buffer = descriptor.consumer_buffer();
    let destination = descriptor.consumer_quantity();
    for cell in board.boxes(buffer.store) {
        let staged = board.read(buffer, cell);
        if staged != 0.0 {
            board.add(destination, staged, cell);
            board.set(buffer, 0.0, cell);
        }
    }
}

/// Settle every queued receival whose arrival time has come.
///
/// Entries stamped in the future stay queued and a Delayed-reaction is
/// armed for the earliest of them, unless one is already due by then.
/// Settling twice at the same time is harmless: the second pass finds
/// nothing ready.
pub fn settle_receivals(core: &mut ProcessCore, ctx: &mut ActionContext) -> Settlement {
    let now = ctx.now();
    if core.delayed_reaction_due.is_some_and(|due| due <= now) {
        core.delayed_reaction_due = None;
    }

    let mut settled = 0;
    while let Some(d) = core.receivals.remove_first_ready(now) {
        commit(ctx.scoreboard_mut(), &d);
        settled += 1;
    }

    let deferred = core.receivals.len();
    if let Some(next) = core.receivals.earliest_timestamp() {
        if core.delayed_reaction_due.map_or(true, |due| next < due) {
            ctx.send_at(next, core.id(), Message::DelayedReaction);
            core.delayed_reaction_due = Some(next);
        }
    }

    if settled > 0 || deferred > 0 {
        debug!(process = %core.id(), settled, deferred, "settlement");
    }
    Settlement { settled, deferred }
}
