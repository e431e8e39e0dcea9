//! `SupplyPool`: a supplier that may replenish its pool on every wake.

use crate::context::ActionContext;
use crate::descriptor::Location;
use crate::error::KernelResult;
use crate::time::VirtualTime;

use crate::process::core::ProcessCore;
use crate::process::fulfillment::{self, Delivery};
use crate::process::reaction::Reaction;
use crate::process::traits::Process;

/// A plain supplier.
///
/// With no replenishment it is exactly the kernel's base behaviour: it
/// services standing requests on every Normal-wake and cough-up. With a
/// `pool` quantity and a `replenish_per_day` parameter it first tops the
/// pool up in every box, pro rata for the time since its last wake.
#[derive(Debug, Clone)]
pub struct SupplyPool {
    core: ProcessCore,
    replenish: Option<(Location, f64)>,
    replenished_at: Option<VirtualTime>,
}

impl SupplyPool {
    pub fn new(core: ProcessCore) -> Self {
        SupplyPool {
            core,
            replenish: None,
            replenished_at: None,
        }
    }

    /// Build from configuration. Replenishment is enabled when the core
    /// carries a `replenish_per_day` parameter, which then requires a
    /// `pool` quantity.
    pub fn from_core(core: ProcessCore) -> KernelResult<Self> {
        let replenish = match core.parameter("replenish_per_day") {
            Some(per_day) => Some((core.require_quantity("pool")?, per_day)),
            None => None,
        };
        Ok(SupplyPool {
            replenish,
            ..SupplyPool::new(core)
        })
    }

    pub fn with_replenishment(mut self, pool: Location, per_day: f64) -> Self {
        self.replenish = Some((pool, per_day));
        self
    }

    fn replenish(&mut self, ctx: &mut ActionContext) {
        let now = ctx.now();
        let Some((pool, per_day)) = self.replenish else {
            return;
        };
        if let Some(since) = self.replenished_at {
            let amount = per_day * now.days_since(since);
            if amount > 0.0 {
                let board = ctx.scoreboard_mut();
                for cell in board.boxes(pool.store) {
                    board.add(pool, amount, cell);
                }
            }
        }
        self.replenished_at = Some(now);
    }
}

impl Process for SupplyPool {
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

    fn on_normal_wake(&mut self, ctx: &mut ActionContext) -> Reaction {
        self.replenish(ctx);
        fulfillment::cough_up(&mut self.core, ctx, Delivery::Registered)
    }
}
