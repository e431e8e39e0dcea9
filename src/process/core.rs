//! `ProcessCore`: the kernel-owned state every process carries.

use std::collections::BTreeMap;

use crate::config::{KernelSettings, ProcessConfig, QuantityCatalog};
use crate::descriptor::Location;
use crate::error::{KernelError, KernelResult};
use crate::message::MessageKind;
use crate::registry::DescriptorRegistry;
use crate::time::VirtualTime;

use super::id::ProcessId;
use super::identity::{Activity, ProcessIdentity, Stratum};

/// Identity, scheduling state and descriptor registries of one process.
///
/// The process's protocol "state" is entirely what is stored here: the
/// two registries, the periodic-delay table and a few timestamps.
#[derive(Debug, Clone)]
pub struct ProcessCore {
    identity: ProcessIdentity,
    /// Quantities resolved from configuration, by role.
    quantities: BTreeMap<String, Location>,
    parameters: BTreeMap<String, f64>,
    /// Virtual time of the last reaction.
    pub(crate) previous_timestamp: Option<VirtualTime>,
    /// Virtual time the fulfillment protocol last ran.
    pub(crate) last_fulfillment_time: Option<VirtualTime>,
    /// Re-fire intervals, in ticks, keyed by message kind.
    periodic_delays: BTreeMap<MessageKind, u64>,
    /// Interval installed for Normal cough-up on Register-request.
    cough_up_interval: u64,
    pub(crate) requests: DescriptorRegistry,
    pub(crate) receivals: DescriptorRegistry,
    /// When the one armed Delayed-reaction is due, if any.
    pub(crate) delayed_reaction_due: Option<VirtualTime>,
}

impl ProcessCore {
    pub fn new(identity: ProcessIdentity) -> Self {
        ProcessCore {
            identity,
            quantities: BTreeMap::new(),
            parameters: BTreeMap::new(),
            previous_timestamp: None,
            last_fulfillment_time: None,
            periodic_delays: BTreeMap::new(),
            cough_up_interval: KernelSettings::default().cough_up_interval(),
            requests: DescriptorRegistry::requests(),
            receivals: DescriptorRegistry::receivals(),
            delayed_reaction_due: None,
        }
    }

    /// Build from configuration, resolving every declared quantity.
    ///
    /// An unknown quantity name aborts construction.
    pub fn from_config(
        config: &ProcessConfig,
        catalog: &QuantityCatalog,
        settings: &KernelSettings,
    ) -> KernelResult<Self> {
        let identity = ProcessIdentity::new(
            ProcessId::new(config.id),
            config.name.clone(),
            config.stratum,
            config.activity,
        );
        settings.validate()?;
        let wake_interval = config.wake_interval()?;
        let mut core = ProcessCore::new(identity);
        core.cough_up_interval = settings.cough_up_interval();
        for (role, name) in &config.quantities {
            let location = catalog.resolve(&config.name, name)?;
            core.quantities.insert(role.clone(), location);
        }
        core.parameters = config.parameters.clone();
        if let Some(ticks) = wake_interval {
            core.set_periodic_delay(MessageKind::NormalWake, ticks);
        }
        Ok(core)
    }

    // ── Identity ──────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> ProcessId {
        self.identity.id
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn stratum(&self) -> Stratum {
        self.identity.stratum
    }

    pub fn activity(&self) -> Activity {
        self.identity.activity
    }

    pub fn identity(&self) -> &ProcessIdentity {
        &self.identity
    }

    /// The quantity bound to `role` in configuration.
    pub fn quantity(&self, role: &str) -> Option<Location> {
        self.quantities.get(role).copied()
    }

    /// Bind a role directly (processes built without configuration).
    pub fn with_quantity(mut self, role: impl Into<String>, location: Location) -> Self {
        self.quantities.insert(role.into(), location);
        self
    }

    /// Like [`quantity`](Self::quantity), but a missing role is an error.
    pub fn require_quantity(&self, role: &str) -> KernelResult<Location> {
        self.quantity(role).ok_or_else(|| self.missing(role))
    }

    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).copied()
    }

    pub fn require_parameter(&self, name: &str) -> KernelResult<f64> {
        self.parameter(name).ok_or_else(|| self.missing(name))
    }

    fn missing(&self, setting: &str) -> KernelError {
        KernelError::MissingSetting {
            process: self.identity.name.clone(),
            setting: setting.to_string(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    // ── Timestamps ────────────────────────────────────────────

    pub fn previous_timestamp(&self) -> Option<VirtualTime> {
        self.previous_timestamp
    }

    pub fn last_fulfillment_time(&self) -> Option<VirtualTime> {
        self.last_fulfillment_time
    }

    // ── Periodic delays ───────────────────────────────────────

    /// After handling a `kind` message, re-send it to self `ticks` later.
    ///
    /// # Panics
    /// Panics if `ticks` is zero, which would re-fire forever at one instant.
    pub fn set_periodic_delay(&mut self, kind: MessageKind, ticks: u64) {
        assert!(ticks > 0, "periodic delay for {kind} must be positive");
        self.periodic_delays.insert(kind, ticks);
    }

    /// Stop re-firing `kind`. Returns the interval that was set.
    pub fn clear_periodic_delay(&mut self, kind: MessageKind) -> Option<u64> {
        self.periodic_delays.remove(&kind)
    }

    pub fn periodic_delay(&self, kind: MessageKind) -> Option<u64> {
        self.periodic_delays.get(&kind).copied()
    }

    pub fn cough_up_interval(&self) -> u64 {
        self.cough_up_interval
    }

    /// # Panics
    /// Panics if `ticks` is zero.
    pub fn set_cough_up_interval(&mut self, ticks: u64) {
        assert!(ticks > 0, "cough-up interval must be positive");
        self.cough_up_interval = ticks;
    }

    // ── Registries ────────────────────────────────────────────

    /// Standing requests this process services.
    pub fn requests(&self) -> &DescriptorRegistry {
        &self.requests
    }

    /// Deliveries awaiting settlement.
    pub fn receivals(&self) -> &DescriptorRegistry {
        &self.receivals
    }

    /// Whether a Delayed-reaction is already scheduled.
    pub fn delayed_reaction_pending(&self) -> bool {
        self.delayed_reaction_due.is_some()
    }

    pub fn delayed_reaction_due(&self) -> Option<VirtualTime> {
        self.delayed_reaction_due
    }

    /// Drop every descriptor this process owns. Returns how many.
    pub fn release_descriptors(&mut self) -> usize {
        self.delayed_reaction_due = None;
        self.requests.clear() + self.receivals.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::time::TICKS_PER_HOUR;

    fn config() -> SimulationConfig {
        SimulationConfig::from_toml_str(
            r#"
            [kernel]
            cough_up_interval_hours = 3

            [[stores]]
            name = "soil"
            boxes = 1

            [[quantities]]
            name = "Water"
            store = "soil"

            [[processes]]
            id = 7
            name = "Drainage"
            stratum = "soil"
            activity = "physical"
            quantities = { drained = "Water" }
            parameters = { depth = 0.3 }
            wake_interval_hours = 2

            [[processes]]
            id = 8
            name = "Broken"
            stratum = "soil"
            activity = "physical"
            quantities = { water = "Water", solute = "Nitrate" }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_from_config_resolves_quantities() {
        let cfg = config();
        let cat = QuantityCatalog::from_config(&cfg).unwrap();
        let core = ProcessCore::from_config(cfg.process(7).unwrap(), &cat, &cfg.kernel).unwrap();
        assert_eq!(core.id(), ProcessId::new(7));
        assert_eq!(core.name(), "Drainage");
        assert_eq!(core.quantity("drained"), cat.location("Water"));
        assert_eq!(core.parameter("depth"), Some(0.3));
        assert!(matches!(
            core.require_parameter("width"),
            Err(KernelError::MissingSetting { .. })
        ));
        assert_eq!(core.cough_up_interval(), 3 * TICKS_PER_HOUR);
        assert_eq!(
            core.periodic_delay(MessageKind::NormalWake),
            Some(2 * TICKS_PER_HOUR)
        );
    }

    #[test]
    fn test_from_config_unknown_quantity_aborts() {
        let cfg = config();
        let cat = QuantityCatalog::from_config(&cfg).unwrap();
        let err = ProcessCore::from_config(cfg.process(8).unwrap(), &cat, &cfg.kernel).unwrap_err();
        match err {
            KernelError::UnknownQuantity { process, name } => {
                assert_eq!(process, "Broken");
                assert_eq!(name, "Nitrate");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_from_config_rejects_zero_intervals() {
        let mut cfg = config();
        let cat = QuantityCatalog::from_config(&cfg).unwrap();
        cfg.processes[0].wake_interval_hours = Some(0);
        let err = ProcessCore::from_config(&cfg.processes[0], &cat, &cfg.kernel).unwrap_err();
        assert!(matches!(
            err,
            KernelError::InvalidSetting { ref setting, .. } if setting == "wake_interval_hours"
        ));

        cfg.processes[0].wake_interval_hours = Some(2);
        cfg.kernel.cough_up_interval_hours = 0;
        let err = ProcessCore::from_config(&cfg.processes[0], &cat, &cfg.kernel).unwrap_err();
        assert!(matches!(
            err,
            KernelError::InvalidSetting { ref owner, .. } if owner == "kernel"
        ));
    }

    #[test]
    fn test_periodic_delay_set_and_clear() {
        let mut core = ProcessCore::new(ProcessIdentity::new(
            ProcessId::new(1),
            "P",
            Stratum::Soil,
            Activity::Chemical,
        ));
        assert!(core.periodic_delay(MessageKind::NormalCoughUp).is_none());
        core.set_periodic_delay(MessageKind::NormalCoughUp, 60);
        assert_eq!(core.periodic_delay(MessageKind::NormalCoughUp), Some(60));
        assert_eq!(core.clear_periodic_delay(MessageKind::NormalCoughUp), Some(60));
        assert_eq!(core.clear_periodic_delay(MessageKind::NormalCoughUp), None);
    }
}
