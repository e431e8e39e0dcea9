/// Fluent builder for assembling a simulation from configuration.
///
/// Hides the boilerplate of resolving names, building the scoreboard,
/// constructing and registering processes and seeding the first letters.
/// Any unresolvable name aborts [`SimulationBuilder::build`] before a
/// single letter is dispatched.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::config::{QuantityCatalog, SimulationConfig};
use crate::error::{KernelError, KernelResult};
use crate::message::{Message, MessageKind};
use crate::output::OutputRule;
use crate::process::fulfillment::box_mismatch;
use crate::process::{Process, ProcessCore, ProcessId, ProcessRuntime, SupplyPool, Uptake};
use crate::simulation::Simulation;
use crate::time::VirtualTime;

type Factory = Box<dyn FnOnce(ProcessCore) -> KernelResult<Box<dyn Process>>>;

/// A built simulation, ready to run.
pub struct Scenario {
    pub simulation: Simulation,
    pub runtime: ProcessRuntime,
    pub catalog: QuantityCatalog,
}

impl Scenario {
    /// Dispatch everything due up to `horizon`. Returns letters dispatched.
    pub fn run_until(&mut self, horizon: VirtualTime) -> u64 {
        self.simulation.run_until(horizon, &mut self.runtime)
    }

    /// Total of a named quantity over its store, if the name is known.
    pub fn total(&self, quantity: &str) -> Option<f64> {
        let at = self.catalog.location(quantity)?;
        Some(self.runtime.scoreboard().total(at))
    }
}

/// Fluent builder for a [`Scenario`].
///
/// Every process in the configuration is constructed from its resolved
/// [`ProcessCore`]; processes without an explicit factory become a
/// [`SupplyPool`]. Processes with a `wake_interval_hours` get their
/// first Normal-wake at time zero.
///
/// # Example
/// ```rust
/// use humus::builder::SimulationBuilder;
/// use humus::time::VirtualTime;
///
/// let toml = r#"
///     [[stores]]
///     name = "soil"
///     boxes = 1
///
///     [[quantities]]
///     name = "Nitrate"
///     store = "soil"
///     initial = 5.0
///
///     [[processes]]
///     id = 1
///     name = "Mineralisation"
///     stratum = "soil"
///     activity = "biological"
/// "#;
/// let mut scenario = SimulationBuilder::from_toml_str(toml)
///     .unwrap()
///     .build()
///     .unwrap();
/// scenario.run_until(VirtualTime::from_days(1));
/// assert_eq!(scenario.total("Nitrate"), Some(5.0));
/// ```
pub struct SimulationBuilder {
    config: SimulationConfig,
    factories: BTreeMap<u64, Factory>,
    letters: Vec<(VirtualTime, ProcessId, ProcessId, Message)>,
    outputs: Vec<Box<dyn OutputRule>>,
}

impl SimulationBuilder {
    pub fn new(config: SimulationConfig) -> Self {
        SimulationBuilder {
            config,
            factories: BTreeMap::new(),
            letters: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn from_toml_str(text: &str) -> KernelResult<Self> {
        Ok(Self::new(SimulationConfig::from_toml_str(text)?))
    }

    pub fn load(path: impl AsRef<Path>) -> KernelResult<Self> {
        Ok(Self::new(SimulationConfig::load(path)?))
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    // ── Processes ─────────────────────────────────────────────

    /// Construct process `id` with `factory` instead of the default.
    pub fn process_with<F, P>(mut self, id: u64, factory: F) -> Self
    where
        F: FnOnce(ProcessCore) -> KernelResult<P> + 'static,
        P: Process + 'static,
    {
        let boxed: Factory = Box::new(move |core: ProcessCore| -> KernelResult<Box<dyn Process>> {
            Ok(Box::new(factory(core)?))
        });
        self.factories.insert(id, boxed);
        self
    }

    /// Construct process `id` as an [`Uptake`].
    pub fn uptake(self, id: u64) -> Self {
        self.process_with(id, Uptake::from_core)
    }

    /// Construct process `id` as a [`SupplyPool`] (the default).
    pub fn pool(self, id: u64) -> Self {
        self.process_with(id, SupplyPool::from_core)
    }

    // ── Letters and outputs ───────────────────────────────────

    /// Seed a letter.
    pub fn send(mut self, at: VirtualTime, from: u64, to: u64, message: Message) -> Self {
        self.letters
            .push((at, ProcessId::new(from), ProcessId::new(to), message));
        self
    }

    /// Seed a Normal-wake of `id` by itself.
    pub fn wake(self, id: u64, at: VirtualTime) -> Self {
        self.send(at, id, id, Message::NormalWake)
    }

    pub fn output_rule(mut self, rule: Box<dyn OutputRule>) -> Self {
        self.outputs.push(rule);
        self
    }

    // ── Build ─────────────────────────────────────────────────

    pub fn build(mut self) -> KernelResult<Scenario> {
        self.config.validate()?;
        let catalog = QuantityCatalog::from_config(&self.config)?;
        let mut runtime = ProcessRuntime::new(Box::new(catalog.scoreboard()));
        let mut simulation = Simulation::new();

        for config in &self.config.processes {
            let core = ProcessCore::from_config(config, &catalog, &self.config.kernel)?;
            let process = match self.factories.remove(&config.id) {
                Some(factory) => factory(core)?,
                None => Box::new(SupplyPool::from_core(core)?),
            };
            for request in process.planned_requests() {
                if let Some((at, boxes)) = box_mismatch(runtime.scoreboard(), &request) {
                    let supply = request.supplier_quantity();
                    return Err(KernelError::MisalignedStores {
                        process: config.name.clone(),
                        quantity: catalog.name_of(at).map_or_else(|| at.to_string(), str::to_string),
                        boxes,
                        expected: runtime.scoreboard().box_count(supply.store),
                    });
                }
            }
            let id = runtime.register(process)?;
            if runtime.core(id)?.periodic_delay(MessageKind::NormalWake).is_some() {
                simulation.send(VirtualTime::ZERO, id, id, Message::NormalWake);
            }
        }
        if let Some(&id) = self.factories.keys().next() {
            return Err(KernelError::UnknownProcess(ProcessId::new(id)));
        }

        for (at, from, to, message) in self.letters {
            simulation.send(at, from, to, message);
        }
        for rule in self.outputs {
            runtime.add_output_rule(rule);
        }

        info!(
            processes = runtime.process_count(),
            quantities = catalog.quantity_count(),
            letters = simulation.post_office().len(),
            "simulation assembled"
        );
        Ok(Scenario {
            simulation,
            runtime,
            catalog,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Payload;
    use crate::output::OutputRecorder;

    const NITROGEN: &str = r#"
        [kernel]
        cough_up_interval_hours = 24

        [[stores]]
        name = "soil"
        boxes = 1

        [[stores]]
        name = "plant"
        boxes = 1

        [[quantities]]
        name = "Nitrate"
        store = "soil"
        initial = 100.0

        [[quantities]]
        name = "RootRate"
        store = "plant"

        [[quantities]]
        name = "RootBuffer"
        store = "plant"

        [[quantities]]
        name = "RootN"
        store = "plant"

        [[quantities]]
        name = "MicrobeRate"
        store = "plant"

        [[quantities]]
        name = "MicrobeBuffer"
        store = "plant"

        [[quantities]]
        name = "MicrobeN"
        store = "plant"

        [[processes]]
        id = 1
        name = "Mineralisation"
        stratum = "soil"
        activity = "biological"
        quantities = { pool = "Nitrate" }

        [[processes]]
        id = 2
        name = "RootUptake"
        stratum = "plant"
        activity = "plant"
        quantities = { supply = "Nitrate", destination = "RootN", rate = "RootRate", buffer = "RootBuffer" }
        parameters = { supplier = 1, rate_per_day = 10.0 }
        wake_interval_hours = 24

        [[processes]]
        id = 3
        name = "MicrobialUptake"
        stratum = "soil"
        activity = "biological"
        quantities = { supply = "Nitrate", destination = "MicrobeN", rate = "MicrobeRate", buffer = "MicrobeBuffer" }
        parameters = { supplier = 1, rate_per_day = 30.0 }
        wake_interval_hours = 24
    "#;

    fn nitrogen() -> SimulationBuilder {
        nitrogen_from(NITROGEN)
    }

    fn nitrogen_from(text: &str) -> SimulationBuilder {
        SimulationBuilder::from_toml_str(text)
            .unwrap()
            .uptake(2)
            .uptake(3)
    }

    #[test]
    fn test_build_from_config_runs_protocol() {
        let mut scenario = nitrogen().build().unwrap();
        assert_eq!(scenario.runtime.process_count(), 3);

        scenario.run_until(VirtualTime::from_days(1));
        assert_eq!(scenario.total("RootN"), Some(10.0));
        assert_eq!(scenario.total("MicrobeN"), Some(30.0));
        assert_eq!(scenario.total("Nitrate"), Some(60.0));

        scenario.run_until(VirtualTime::from_days(2));
        assert_eq!(scenario.total("Nitrate"), Some(20.0));
        assert_eq!(scenario.total("Unknown"), None);
    }

    #[test]
    fn test_periodic_processes_get_first_wake() {
        let scenario = nitrogen().build().unwrap();
        let post = scenario.simulation.post_office();
        assert_eq!(post.len(), 2);
        assert_eq!(post.pending_for(ProcessId::new(2)), 1);
        assert_eq!(post.pending_for(ProcessId::new(1)), 0);
    }

    #[test]
    fn test_seeded_letters_and_outputs() {
        let recorder = OutputRecorder::new();
        let mut scenario = nitrogen()
            .output_rule(Box::new(recorder.clone()))
            .send(
                VirtualTime::from_hours(2),
                1,
                1,
                Message::SpecialOutput(Payload::Text("census".into())),
            )
            .build()
            .unwrap();
        scenario.run_until(VirtualTime::from_hours(2));
        assert_eq!(recorder.len(), 1);
    }

    #[test]
    fn test_factory_for_unconfigured_process_fails() {
        let result = nitrogen().pool(42).build();
        assert!(matches!(result, Err(KernelError::UnknownProcess(id)) if id == ProcessId::new(42)));
    }

    #[test]
    fn test_missing_uptake_setting_fails() {
        let text = NITROGEN.replace(", buffer = \"RootBuffer\"", "");
        let result = SimulationBuilder::from_toml_str(&text)
            .unwrap()
            .uptake(2)
            .build();
        assert!(matches!(
            result,
            Err(KernelError::MissingSetting { ref setting, .. }) if setting == "buffer"
        ));
    }

    #[test]
    fn test_uptake_across_unequal_stores_fails() {
        let text = NITROGEN.replacen("boxes = 1", "boxes = 3", 1);
        let result = nitrogen_from(&text).build();
        match result {
            Err(KernelError::MisalignedStores {
                process,
                boxes,
                expected,
                ..
            }) => {
                assert_eq!(process, "RootUptake");
                assert_eq!(boxes, 1);
                assert_eq!(expected, 3);
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("unequal stores accepted"),
        }
    }

    #[test]
    fn test_zero_intervals_abort_build() {
        let text = NITROGEN.replace("cough_up_interval_hours = 24", "cough_up_interval_hours = 0");
        let mut config = SimulationConfig::from_toml_str(NITROGEN).unwrap();
        config.kernel.cough_up_interval_hours = 0;
        let result = SimulationBuilder::new(config).build();
        assert!(matches!(
            result,
            Err(KernelError::InvalidSetting { ref setting, .. }) if setting == "cough_up_interval_hours"
        ));
        assert!(SimulationBuilder::from_toml_str(&text).is_err());

        let mut config = SimulationConfig::from_toml_str(NITROGEN).unwrap();
        config.processes[1].wake_interval_hours = Some(0);
        let result = SimulationBuilder::new(config).uptake(2).uptake(3).build();
        assert!(matches!(
            result,
            Err(KernelError::InvalidSetting { ref owner, ref setting, .. })
                if owner == "RootUptake" && setting == "wake_interval_hours"
        ));
    }

    #[test]
    fn test_unknown_quantity_aborts_build() {
        let text = NITROGEN.replace("destination = \"RootN\"", "destination = \"RootNitrogen\"");
        let result = SimulationBuilder::from_toml_str(&text).unwrap().build();
        assert!(matches!(result, Err(KernelError::UnknownQuantity { .. })));
    }
}
