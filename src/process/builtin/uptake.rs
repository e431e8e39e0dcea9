//! `Uptake`: a consumer that draws a quantity from one supplier at a
//! configured daily rate.

use std::fmt;

use crate::context::ActionContext;
use crate::descriptor::{Descriptor, Location};
use crate::error::KernelResult;
use crate::message::{GpSlot, MessageKind, Payload, ReceivalKind};
use crate::time::VirtualTime;

use crate::process::core::ProcessCore;
use crate::process::id::ProcessId;
use crate::process::reaction::Reaction;
use crate::process::traits::Process;

/// General-purpose slot that makes an `Uptake` ask its supplier for an
/// immediate cough-up.
pub const TOP_UP_SLOT: u8 = 0;

/// Where an `Uptake` draws from and where the drawn amount goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UptakeLinks {
    pub supplier: ProcessId,
    /// Supplier-side quantity being drawn.
    pub supply: Location,
    /// Consumer-side quantity the amount ends up in.
    pub destination: Location,
    /// Consumer-side quantity holding the per-day rate.
    pub rate: Location,
    /// Consumer-side staging quantity.
    pub buffer: Location,
}

/// A consumer with one standing request.
///
/// On its first Normal-wake it writes its rate into every box and
/// registers the request with its supplier. Every delivery it sees is
/// recorded in `received` as `(time, kind, supplier)`.
#[derive(Debug, Clone)]
pub struct Uptake {
    core: ProcessCore,
    links: UptakeLinks,
    rate_per_day: f64,
    registered: bool,
    pub received: Vec<(VirtualTime, ReceivalKind, ProcessId)>,
}

impl Uptake {
    pub fn new(core: ProcessCore, links: UptakeLinks, rate_per_day: f64) -> Self {
        Uptake {
            core,
            links,
            rate_per_day,
            registered: false,
            received: Vec::new(),
        }
    }

    /// Build from configuration.
    ///
    /// Needs the quantity roles `supply`, `destination`, `rate` and
    /// `buffer`, and the parameters `supplier` (a process id) and
    /// `rate_per_day`.
    pub fn from_core(core: ProcessCore) -> KernelResult<Self> {
        let links = UptakeLinks {
            supplier: ProcessId::new(core.require_parameter("supplier")? as u64),
            supply: core.require_quantity("supply")?,
            destination: core.require_quantity("destination")?,
            rate: core.require_quantity("rate")?,
            buffer: core.require_quantity("buffer")?,
        };
        let rate_per_day = core.require_parameter("rate_per_day")?;
        Ok(Uptake::new(core, links, rate_per_day))
    }

    pub fn links(&self) -> &UptakeLinks {
        &self.links
    }

    pub fn rate_per_day(&self) -> f64 {
        self.rate_per_day
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// The standing request this process files, stamped `at`.
    pub fn request(&self, at: VirtualTime) -> Descriptor {
        Descriptor::standing_request(
            self.links.supplier,
            self.links.supply,
            self.core.id(),
            self.links.destination,
            self.links.rate,
            self.links.buffer,
            at,
        )
    }

    fn write_rate(&self, ctx: &mut ActionContext) {
        let rate = self.links.rate;
        let board = ctx.scoreboard_mut();
        for cell in board.boxes(rate.store) {
            board.set(rate, self.rate_per_day, cell);
        }
    }
}

impl Process for Uptake {
    fn core(&self) -> &ProcessCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ProcessCore {
        &mut self.core
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    /// Registers on the first wake. An uptake supplies nobody, so later
    /// wakes have nothing to cough up.
    fn on_normal_wake(&mut self, ctx: &mut ActionContext) -> Reaction {
        if self.registered {
            return Reaction::Done;
        }
        self.write_rate(ctx);
        let request = self.request(ctx.now());
        ctx.register_request(request);
        self.registered = true;
        Reaction::Done
    }

    fn on_receival(&mut self, ctx: &mut ActionContext, kind: ReceivalKind, descriptor: &Descriptor) {
        self.received.push((ctx.now(), kind, descriptor.supplier()));
    }

    /// A `Value` payload replaces the daily rate.
    fn on_special_input(&mut self, ctx: &mut ActionContext, payload: Payload) -> Reaction {
        match payload {
            Payload::Value(rate) => {
                self.rate_per_day = rate;
                self.write_rate(ctx);
                Reaction::Done
            }
            _ => Reaction::Ignored,
        }
    }

    fn on_general_purpose(&mut self, ctx: &mut ActionContext, slot: GpSlot, _payload: Payload) -> Reaction {
        if slot.index() != TOP_UP_SLOT {
            return Reaction::Unexpected(MessageKind::GeneralPurpose(slot));
        }
        ctx.request_immediate(self.links.supplier);
        Reaction::Done
    }

    fn planned_requests(&self) -> Vec<Descriptor> {
        vec![self.request(VirtualTime::ZERO)]
    }

    fn draws(&self) -> bool {
        true
    }

    fn draw(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(
            out,
            "{} <- {} @ {}/day, {} receival(s)",
            self.core.identity(),
            self.links.supplier,
            self.rate_per_day,
            self.received.len()
        )
    }
}
