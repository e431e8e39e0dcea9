//! Virtual time for the simulation kernel.
//!
//! A logical timestamp counted in simulated seconds. Time advances only
//! when the post office hands out the next letter, never from wall-clock
//! observation.

/// Simulated seconds in one hour.
pub const TICKS_PER_HOUR: u64 = 3_600;

/// Simulated seconds in one day.
pub const TICKS_PER_DAY: u64 = 24 * TICKS_PER_HOUR;

/// A point on the single simulated timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct VirtualTime(u64);

impl VirtualTime {
    /// The start of simulated time.
    pub const ZERO: VirtualTime = VirtualTime(0);

    /// Create a time from raw seconds.
    #[inline]
    pub fn new(ticks: u64) -> Self {
        VirtualTime(ticks)
    }

    #[inline]
    pub fn from_hours(hours: u64) -> Self {
        VirtualTime(hours * TICKS_PER_HOUR)
    }

    #[inline]
    pub fn from_days(days: u64) -> Self {
        VirtualTime(days * TICKS_PER_DAY)
    }

    /// Return the raw tick value.
    #[inline]
    pub fn ticks(self) -> u64 {
        self.0
    }

    /// `self + delta`, or `None` on overflow.
    #[inline]
    pub fn plus(self, delta: u64) -> Option<VirtualTime> {
        self.0.checked_add(delta).map(VirtualTime)
    }

    /// Ticks elapsed since `earlier`; `None` if `earlier` is after `self`.
    #[inline]
    pub fn duration_since(self, earlier: VirtualTime) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }

    /// Fractional days elapsed since `earlier`, saturating at zero.
    ///
    /// Rates in the kernel are expressed per day, so this is the factor
    /// the fulfillment protocol multiplies them by.
    pub fn days_since(self, earlier: VirtualTime) -> f64 {
        self.duration_since(earlier).unwrap_or(0) as f64 / TICKS_PER_DAY as f64
    }
}

impl std::fmt::Display for VirtualTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let days = self.0 / TICKS_PER_DAY;
        let rem = self.0 % TICKS_PER_DAY;
        write!(
            f,
            "d{}+{:02}:{:02}:{:02}",
            days,
            rem / TICKS_PER_HOUR,
            (rem % TICKS_PER_HOUR) / 60,
            rem % 60
        )
    }
}
