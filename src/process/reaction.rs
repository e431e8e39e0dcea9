//! Reaction outcome codes.
//!
//! Protocol no-ops are normal control flow: they are returned up to the
//! runtime, recorded in the trace and swallowed there. Callers that chain
//! behaviour on a cough-up can tell "did work" from "nothing to do".

use crate::descriptor::Location;
use crate::message::MessageKind;

/// Result of the fulfillment (cough-up) protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Fulfillment {
    /// Every standing request was serviced.
    Serviced(FulfillmentReport),
    /// Already ran at this virtual time; nothing changed.
    AlreadyServiced,
    /// No standing requests are registered.
    NothingRequested,
}

impl Fulfillment {
    pub fn is_serviced(&self) -> bool {
        matches!(self, Fulfillment::Serviced(_))
    }
}

/// What one cough-up moved.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct FulfillmentReport {
    /// Distinct requested quantities.
    pub groups: usize,
    /// Standing requests serviced.
    pub requests: usize,
    /// Sum of full-satisfaction amounts over every box.
    pub requested: f64,
    /// Sum actually credited to buffers over every box.
    pub delivered: f64,
}

/// Result of receival settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Settlement {
    /// Receivals committed and destroyed.
    pub settled: usize,
    /// Receivals left because their arrival time is still ahead.
    pub deferred: usize,
}

/// Outcome of one process reaction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Reaction {
    /// Handled, nothing further to report.
    Done,
    /// Handled by doing nothing (base behaviour of a hook).
    Ignored,
    /// A standing request was registered; `false` if it was a duplicate.
    Registered { inserted: bool },
    /// A standing request was refused: `location` does not have the
    /// `expected` box count of the supplied quantity's store.
    Misaligned {
        location: Location,
        boxes: usize,
        expected: usize,
    },
    /// A cough-up ran (or declined); `deliveries` is how many receivals were sent.
    CoughUp {
        fulfillment: Fulfillment,
        deliveries: usize,
    },
    /// A receival was queued; `scheduled` if this armed a Delayed-reaction.
    Queued { scheduled: bool },
    Settled(Settlement),
    /// No handler exists for this kind (e.g. an unused general-purpose slot).
    Unexpected(MessageKind),
}

impl From<Fulfillment> for Reaction {
    fn from(fulfillment: Fulfillment) -> Self {
        Reaction::CoughUp {
            fulfillment,
            deliveries: 0,
        }
    }
}

impl std::fmt::Display for Reaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reaction::Done => write!(f, "done"),
            Reaction::Ignored => write!(f, "ignored"),
            Reaction::Registered { inserted: true } => write!(f, "registered"),
            Reaction::Registered { inserted: false } => write!(f, "already registered"),
            Reaction::Misaligned {
                location,
                boxes,
                expected,
            } => write!(f, "refused: {location} has {boxes} box(es), supply has {expected}"),
            Reaction::CoughUp {
                fulfillment: Fulfillment::Serviced(r),
                deliveries,
            } => write!(
                f,
                "serviced {} request(s), delivered {:.4}/{:.4}, {} receival(s) sent",
                r.requests, r.delivered, r.requested, deliveries
            ),
            Reaction::CoughUp {
                fulfillment: Fulfillment::AlreadyServiced,
                ..
            } => write!(f, "already serviced this step"),
            Reaction::CoughUp {
                fulfillment: Fulfillment::NothingRequested,
                ..
            } => write!(f, "nothing requested"),
            Reaction::Queued { scheduled } => {
                write!(f, "queued{}", if *scheduled { ", settlement armed" } else { "" })
            }
            Reaction::Settled(s) => write!(f, "settled {} (deferred {})", s.settled, s.deferred),
            Reaction::Unexpected(kind) => write!(f, "unexpected {kind}"),
        }
    }
}
