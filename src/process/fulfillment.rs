//! Standing-request fulfillment ("cough-up") and delivery dispatch.
//!
//! A supplier services all of its standing requests at once. Requests for
//! the same supplied quantity form a contiguous group in the request
//! registry; within a group every box of the supplier's store is shared
//! among the consumers in proportion to what each asked for:
//!
//! ```text
//! amount_i = rate_i(box) × elapsed_days_i
//! total    = Σ amount_i
//! r        = min(1, available / total)        (0 if either side ≤ 0)
//! buffer_i += amount_i × r
//! supplier -= total, or is zeroed when r < 1
//! ```
//!
//! Buffers only stage the transfer. Consumers are told with a Receival
//! and commit it themselves during settlement.

use tracing::{debug, trace};

use crate::context::ActionContext;
use crate::descriptor::{Descriptor, Location};
use crate::message::{Message, ReceivalKind};
use crate::process::ProcessId;
use crate::scoreboard::Scoreboard;
use crate::time::VirtualTime;

use super::core::ProcessCore;
use super::reaction::{Fulfillment, FulfillmentReport, Reaction};

/// Which receival kind the delivery step sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Periodic or wake-driven cough-up: every consumer gets a registered receival.
    Registered,
    /// Cough-up asked for by `requester`; its own receivals are marked immediate.
    Immediate { requester: ProcessId },
}

impl Delivery {
    fn kind_for(self, consumer: ProcessId) -> ReceivalKind {
        match self {
            Delivery::Immediate { requester } if requester == consumer => ReceivalKind::Immediate,
            _ => ReceivalKind::Registered,
        }
    }
}

/// Share of the full request that can be honoured.
///
/// Zero when nothing is available or nothing was asked for, never above one.
pub fn fulfillment_ratio(available: f64, total: f64) -> f64 {
    if available <= 0.0 || total <= 0.0 {
        0.0
    } else {
        (available / total).min(1.0)
    }
}

/// The first consumer-side location of `descriptor` whose store does not
/// have as many boxes as the supplied quantity's store, with its box count.
///
/// Fulfillment pairs box `i` of the supply with box `i` of the rate and
/// buffer, and settlement pairs the buffer with the destination, so a
/// request is only serviceable when every store involved agrees.
pub fn box_mismatch(board: &dyn Scoreboard, descriptor: &Descriptor) -> Option<(Location, usize)> {
    let expected = board.box_count(descriptor.supplier_quantity().store);
    descriptor
        .consumer_rate()
        .into_iter()
        .chain([descriptor.consumer_buffer(), descriptor.consumer_quantity()])
        .map(|at| (at, board.box_count(at.store)))
        .find(|&(_, boxes)| boxes != expected)
}

/// Run the fulfillment protocol at `now`.
///
/// Idempotent within one virtual time: a second call at the same `now`
/// changes nothing and reports [`Fulfillment::AlreadyServiced`].
pub fn fulfill(core: &mut ProcessCore, board: &mut dyn Scoreboard, now: VirtualTime) -> Fulfillment {
    if core.last_fulfillment_time == Some(now) {
        return Fulfillment::AlreadyServiced;
    }
    if core.requests.is_empty() {
        return Fulfillment::NothingRequested;
    }

    let last = core.last_fulfillment_time;
    let mut report = FulfillmentReport::default();

    for (quantity, group) in core.requests.groups() {
        let supply = group[0].supplier_quantity();
        // Elapsed days per request: since the last cough-up, or since the
        // request was made if that is more recent.
        let elapsed: Vec<f64> = group
            .iter()
            .map(|d| {
                let since = last.map_or(d.timestamp(), |t| t.max(d.timestamp()));
                now.days_since(since)
            })
            .collect();
        let mut amounts = vec![0.0; group.len()];

        for cell in board.boxes(supply.store) {
            let mut total = 0.0;
            for (i, d) in group.iter().enumerate() {
                let rate = d.consumer_rate().map_or(0.0, |r| board.read(r, cell));
                amounts[i] = (rate * elapsed[i]).max(0.0);
                total += amounts[i];
            }
            report.requested += total;

            let available = board.read(supply, cell);
            let ratio = fulfillment_ratio(available, total);
            if ratio == 0.0 {
                continue;
            }

            for (d, amount) in group.iter().zip(&amounts) {
                let credit = amount * ratio;
                if credit > 0.0 {
                    board.add(d.consumer_buffer(), credit, cell);
                    report.delivered += credit;
                }
            }
            if ratio < 1.0 {
                board.set(supply, 0.0, cell);
            } else {
                board.add(supply, -total, cell);
            }
        }

        trace!(supplier = %core.id(), %quantity, requests = group.len(), "group serviced");
        report.groups += 1;
        report.requests += group.len();
    }

    core.last_fulfillment_time = Some(now);
    debug!(
        supplier = %core.id(),
        requested = report.requested,
        delivered = report.delivered,
        "cough-up"
    );
    Fulfillment::Serviced(report)
}

/// Tell every consumer with a standing request that its buffer was filled.
///
/// Each consumer gets a fresh copy of its descriptor stamped now; the
/// registered original stays with the supplier. Returns receivals sent.
pub fn dispatch_deliveries(core: &ProcessCore, ctx: &mut ActionContext, delivery: Delivery) -> usize {
    let now = ctx.now();
    let mut sent = 0;
    for d in core.requests.iter() {
        let kind = delivery.kind_for(d.consumer());
        ctx.send(
            d.consumer(),
            Message::Receival {
                kind,
                descriptor: d.refresh(now),
            },
        );
        sent += 1;
    }
    sent
}

/// Fulfill, then dispatch deliveries if anything was serviced.
pub fn cough_up(core: &mut ProcessCore, ctx: &mut ActionContext, delivery: Delivery) -> Reaction {
    let now = ctx.now();
    let fulfillment = fulfill(core, ctx.scoreboard_mut(), now);
    let deliveries = if fulfillment.is_serviced() {
        dispatch_deliveries(core, ctx, delivery)
    } else {
        0
    };
    Reaction::CoughUp {
        fulfillment,
        deliveries,
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::descriptor::{Descriptor, Location, QuantityId, StoreIndex};
    use crate::process::{Activity, ProcessIdentity, Stratum};
    use crate::scoreboard::{BoxIndex, MemoryScoreboard};
    use crate::time::VirtualTime;

    const SOIL: StoreIndex = StoreIndex::new(0);
    const PLANT: StoreIndex = StoreIndex::new(1);

    fn loc(q: u32, store: StoreIndex) -> Location {
        Location::new(QuantityId::new(q), store)
    }

    fn supplier() -> ProcessCore {
        ProcessCore::new(ProcessIdentity::new(
            ProcessId::new(1),
            "Mineralisation",
            Stratum::Soil,
            Activity::Biological,
        ))
    }

    /// Consumer `c` asks for Q1 at the rate stored in Q(10+c), buffered in Q(20+c).
    fn request(c: u64, created: VirtualTime) -> Descriptor {
        let c32 = c as u32;
        Descriptor::standing_request(
            ProcessId::new(1),
            loc(1, SOIL),
            ProcessId::new(c),
            loc(30 + c32, PLANT),
            loc(10 + c32, PLANT),
            loc(20 + c32, PLANT),
            created,
        )
    }

    fn board(stock: f64, rates: &[(u64, f64)]) -> MemoryScoreboard {
        let mut b = MemoryScoreboard::new();
        b.add_store(1);
        b.add_store(1);
        b.declare(loc(1, SOIL), stock);
        for &(c, rate) in rates {
            b.declare(loc(10 + c as u32, PLANT), rate);
        }
        b
    }

    fn read(b: &MemoryScoreboard, at: Location) -> f64 {
        b.read(at, BoxIndex::new(0))
    }

    #[test_case(15.0, 20.0 => 0.75 ; "scarce")]
    #[test_case(30.0, 20.0 => 1.0 ; "plenty")]
    #[test_case(0.0, 20.0 => 0.0 ; "empty supply")]
    #[test_case(-3.0, 20.0 => 0.0 ; "negative supply")]
    #[test_case(10.0, 0.0 => 0.0 ; "nothing requested")]
    fn test_fulfillment_ratio(available: f64, total: f64) -> f64 {
        fulfillment_ratio(available, total)
    }

    #[test]
    fn test_scarce_supply_is_drained() {
        let mut core = supplier();
        let _ = core.requests.insert_request(request(2, VirtualTime::ZERO));
        let mut b = board(15.0, &[(2, 10.0)]);

        let out = fulfill(&mut core, &mut b, VirtualTime::from_days(2));
        let Fulfillment::Serviced(report) = out else {
            panic!("expected service, got {out:?}");
        };
        assert_eq!(report.requested, 20.0);
        assert_eq!(report.delivered, 15.0);
        assert_eq!(read(&b, loc(22, PLANT)), 15.0);
        assert_eq!(read(&b, loc(1, SOIL)), 0.0);
    }

    #[test]
    fn test_proportional_sharing() {
        let mut core = supplier();
        let _ = core.requests.insert_request(request(2, VirtualTime::ZERO));
        let _ = core.requests.insert_request(request(3, VirtualTime::ZERO));
        let mut b = board(100.0, &[(2, 10.0), (3, 30.0)]);

        assert!(fulfill(&mut core, &mut b, VirtualTime::from_days(1)).is_serviced());
        assert_eq!(read(&b, loc(22, PLANT)), 10.0);
        assert_eq!(read(&b, loc(23, PLANT)), 30.0);
        assert_eq!(read(&b, loc(1, SOIL)), 60.0);
    }

    #[test]
    fn test_idempotent_at_same_time() {
        let mut core = supplier();
        let _ = core.requests.insert_request(request(2, VirtualTime::ZERO));
        let mut b = board(100.0, &[(2, 10.0)]);
        let t = VirtualTime::from_days(1);

        assert!(fulfill(&mut core, &mut b, t).is_serviced());
        assert_eq!(fulfill(&mut core, &mut b, t), Fulfillment::AlreadyServiced);
        assert_eq!(read(&b, loc(22, PLANT)), 10.0);
        assert_eq!(read(&b, loc(1, SOIL)), 90.0);
    }

    #[test]
    fn test_no_requests() {
        let mut core = supplier();
        let mut b = board(100.0, &[]);
        assert_eq!(
            fulfill(&mut core, &mut b, VirtualTime::from_days(1)),
            Fulfillment::NothingRequested
        );
        assert_eq!(core.last_fulfillment_time(), None);
    }

    #[test]
    fn test_elapsed_counts_from_later_of_last_service_and_creation() {
        let mut core = supplier();
        let _ = core.requests.insert_request(request(2, VirtualTime::ZERO));
        let mut b = board(1000.0, &[(2, 10.0), (3, 10.0)]);

        assert!(fulfill(&mut core, &mut b, VirtualTime::from_days(1)).is_serviced());
        // Consumer 3 joins half a day later.
        let _ = core
            .requests
            .insert_request(request(3, VirtualTime::from_hours(36)));
        assert!(fulfill(&mut core, &mut b, VirtualTime::from_days(2)).is_serviced());

        assert_eq!(read(&b, loc(22, PLANT)), 20.0);
        assert_eq!(read(&b, loc(23, PLANT)), 5.0);
    }

    #[test]
    fn test_empty_supply_moves_nothing() {
        let mut core = supplier();
        let _ = core.requests.insert_request(request(2, VirtualTime::ZERO));
        let mut b = board(0.0, &[(2, 10.0)]);

        let out = fulfill(&mut core, &mut b, VirtualTime::from_days(1));
        assert!(out.is_serviced());
        assert_eq!(read(&b, loc(22, PLANT)), 0.0);
        assert_eq!(read(&b, loc(1, SOIL)), 0.0);
        assert_eq!(core.last_fulfillment_time(), Some(VirtualTime::from_days(1)));
    }

    #[test]
    fn test_box_mismatch_names_the_odd_store() {
        let mut board = MemoryScoreboard::new();
        let soil = board.add_store(3);
        let plant = board.add_store(1);
        let wide = board.add_store(3);
        let at = |q: u32, store: StoreIndex| Location::new(QuantityId::new(q), store);

        let aligned = Descriptor::standing_request(
            ProcessId::new(1),
            at(1, soil),
            ProcessId::new(2),
            at(2, wide),
            at(3, wide),
            at(4, wide),
            VirtualTime::ZERO,
        );
        assert_eq!(box_mismatch(&board, &aligned), None);

        let narrow_buffer = Descriptor::standing_request(
            ProcessId::new(1),
            at(1, soil),
            ProcessId::new(2),
            at(2, wide),
            at(3, wide),
            at(4, plant),
            VirtualTime::ZERO,
        );
        assert_eq!(box_mismatch(&board, &narrow_buffer), Some((at(4, plant), 1)));
    }

    #[test]
    fn test_delivery_kind_marks_only_requester() {
        let d = Delivery::Immediate {
            requester: ProcessId::new(2),
        };
        assert_eq!(d.kind_for(ProcessId::new(2)), ReceivalKind::Immediate);
        assert_eq!(d.kind_for(ProcessId::new(3)), ReceivalKind::Registered);
        assert_eq!(
            Delivery::Registered.kind_for(ProcessId::new(2)),
            ReceivalKind::Registered
        );
    }
}
