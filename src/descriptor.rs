//! Exchange descriptors.
//!
//! A [`Descriptor`] records one cross-process exchange of a simulated
//! quantity: who supplies it, who consumes it, and the scoreboard
//! locations holding the desired rate, the staging buffer and the final
//! destination. Descriptors are immutable once built; a delivery carries
//! a *refresh* of the standing request instead of the request itself.

use crate::process::ProcessId;
use crate::time::VirtualTime;

/// A characteristic number: which simulated quantity a location holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantityId(u32);

impl QuantityId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        QuantityId(raw)
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for QuantityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

/// Which scoreboard store (spatial domain) a quantity lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct StoreIndex(u16);

impl StoreIndex {
    #[inline]
    pub const fn new(raw: u16) -> Self {
        StoreIndex(raw)
    }

    #[inline]
    pub fn raw(self) -> u16 {
        self.0
    }
}

/// A quantity id paired with the store that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub quantity: QuantityId,
    pub store: StoreIndex,
}

impl Location {
    #[inline]
    pub const fn new(quantity: QuantityId, store: StoreIndex) -> Self {
        Location { quantity, store }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@S{}", self.quantity, self.store.0)
    }
}

/// One active request or in-flight delivery.
///
/// The forward link of the registry chain is not stored here: a
/// descriptor that is not inside a [`DescriptorRegistry`] has no
/// successor by construction, and once inserted the registry arena owns
/// both the descriptor and its link.
///
/// [`DescriptorRegistry`]: crate::registry::DescriptorRegistry
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Descriptor {
    supplier: ProcessId,
    supplier_quantity: Location,
    consumer: ProcessId,
    consumer_quantity: Location,
    consumer_rate: Option<Location>,
    consumer_buffer: Location,
    timestamp: VirtualTime,
    in_use: bool,
}

impl Descriptor {
    /// A standing request: `consumer` wants `supplier_quantity` from
    /// `supplier` at the per-day rate stored in `rate`, staged through
    /// `buffer` and finally committed to `destination`.
    pub fn standing_request(
        supplier: ProcessId,
        supplier_quantity: Location,
        consumer: ProcessId,
        destination: Location,
        rate: Location,
        buffer: Location,
        created: VirtualTime,
    ) -> Self {
        Descriptor {
            supplier,
            supplier_quantity,
            consumer,
            consumer_quantity: destination,
            consumer_rate: Some(rate),
            consumer_buffer: buffer,
            timestamp: created,
            in_use: false,
        }
    }

    /// An unsolicited delivery. There is no rate: the supplier has already
    /// staged the amount in `buffer` when the descriptor is sent.
    pub fn unsolicited_delivery(
        supplier: ProcessId,
        supplier_quantity: Location,
        consumer: ProcessId,
        destination: Location,
        buffer: Location,
        sent: VirtualTime,
    ) -> Self {
        Descriptor {
            supplier,
            supplier_quantity,
            consumer,
            consumer_quantity: destination,
            consumer_rate: None,
            consumer_buffer: buffer,
            timestamp: sent,
            in_use: false,
        }
    }

    /// Copy of `self` stamped at `at`, detached from any registry.
    pub fn refresh(&self, at: VirtualTime) -> Self {
        Descriptor {
            timestamp: at,
            in_use: false,
            ..self.clone()
        }
    }

    #[inline]
    pub fn supplier(&self) -> ProcessId {
        self.supplier
    }

    #[inline]
    pub fn supplier_quantity(&self) -> Location {
        self.supplier_quantity
    }

    #[inline]
    pub fn supplier_quantity_id(&self) -> QuantityId {
        self.supplier_quantity.quantity
    }

    #[inline]
    pub fn consumer(&self) -> ProcessId {
        self.consumer
    }

    /// Where delivered amounts end up once settled.
    #[inline]
    pub fn consumer_quantity(&self) -> Location {
        self.consumer_quantity
    }

    #[inline]
    pub fn consumer_quantity_id(&self) -> QuantityId {
        self.consumer_quantity.quantity
    }

    /// Location of the desired per-day rate; `None` for unsolicited deliveries.
    #[inline]
    pub fn consumer_rate(&self) -> Option<Location> {
        self.consumer_rate
    }

    #[inline]
    pub fn consumer_buffer(&self) -> Location {
        self.consumer_buffer
    }

    #[inline]
    pub fn timestamp(&self) -> VirtualTime {
        self.timestamp
    }

    /// Whether this descriptor is a live registry entry.
    #[inline]
    pub fn in_use(&self) -> bool {
        self.in_use
    }

    pub(crate) fn set_in_use(&mut self, in_use: bool) {
        self.in_use = in_use;
    }

    /// True for standing requests, false for unsolicited deliveries.
    pub fn is_standing(&self) -> bool {
        self.consumer_rate.is_some()
    }
}

impl std::fmt::Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{} via {} @{}",
            self.supplier,
            self.supplier_quantity,
            self.consumer,
            self.consumer_quantity,
            self.consumer_buffer,
            self.timestamp
        )
    }
}
