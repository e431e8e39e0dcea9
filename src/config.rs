//! Configuration collaborator.
//!
//! A simulation is described in TOML: the stores (spatial domains and
//! their box counts), the named quantities living in them, the processes
//! with their identity and declared quantities, and a few kernel
//! settings. Name resolution happens once, at setup; an unknown name is
//! fatal and surfaces as a [`KernelError`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::{Location, QuantityId, StoreIndex};
use crate::error::{KernelError, KernelResult};
use crate::process::{Activity, Stratum};
use crate::scoreboard::MemoryScoreboard;
use crate::time::TICKS_PER_HOUR;

/// Default periodic delay installed by a Register-request.
pub const DEFAULT_COUGH_UP_INTERVAL_HOURS: u64 = 12;

fn default_cough_up_interval_hours() -> u64 {
    DEFAULT_COUGH_UP_INTERVAL_HOURS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KernelSettings {
    #[serde(default = "default_cough_up_interval_hours")]
    pub cough_up_interval_hours: u64,
}

impl KernelSettings {
    /// Cough-up interval in ticks.
    pub fn cough_up_interval(&self) -> u64 {
        self.cough_up_interval_hours * TICKS_PER_HOUR
    }

    pub fn validate(&self) -> KernelResult<()> {
        if self.cough_up_interval_hours == 0 {
            return Err(not_positive("kernel", "cough_up_interval_hours"));
        }
        Ok(())
    }
}

fn not_positive(owner: &str, setting: &str) -> KernelError {
    KernelError::InvalidSetting {
        owner: owner.to_string(),
        setting: setting.to_string(),
        reason: "must be positive".to_string(),
    }
}

impl Default for KernelSettings {
    fn default() -> Self {
        KernelSettings {
            cough_up_interval_hours: DEFAULT_COUGH_UP_INTERVAL_HOURS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub name: String,
    pub boxes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuantityConfig {
    pub name: String,
    pub store: String,
    #[serde(default)]
    pub initial: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessConfig {
    pub id: u64,
    pub name: String,
    pub stratum: Stratum,
    pub activity: Activity,
    /// Quantities this process uses, as `role = "catalog name"`.
    #[serde(default)]
    pub quantities: BTreeMap<String, String>,
    /// Free numeric parameters interpreted by the concrete process.
    #[serde(default)]
    pub parameters: BTreeMap<String, f64>,
    /// Periodic Normal-wake interval; absent means the process only reacts.
    #[serde(default)]
    pub wake_interval_hours: Option<u64>,
}

impl ProcessConfig {
    /// Periodic Normal-wake interval in ticks, if any. Zero is rejected.
    pub fn wake_interval(&self) -> KernelResult<Option<u64>> {
        match self.wake_interval_hours {
            Some(0) => Err(not_positive(&self.name, "wake_interval_hours")),
            hours => Ok(hours.map(|h| h * TICKS_PER_HOUR)),
        }
    }
}

/// Whole-simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    #[serde(default)]
    pub kernel: KernelSettings,
    #[serde(default)]
    pub stores: Vec<StoreConfig>,
    #[serde(default)]
    pub quantities: Vec<QuantityConfig>,
    #[serde(default)]
    pub processes: Vec<ProcessConfig>,
}

impl SimulationConfig {
    /// Parse and validate.
    pub fn from_toml_str(text: &str) -> KernelResult<Self> {
        let config: SimulationConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that parse but cannot drive a run.
    pub fn validate(&self) -> KernelResult<()> {
        self.kernel.validate()?;
        for process in &self.processes {
            process.wake_interval()?;
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> KernelResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| KernelError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn process(&self, id: u64) -> Option<&ProcessConfig> {
        self.processes.iter().find(|p| p.id == id)
    }
}

// ── Quantity catalog ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct QuantityEntry {
    location: Location,
    initial: f64,
}

/// Resolved names: stores to [`StoreIndex`], quantities to [`Location`].
///
/// Store indices follow declaration order; quantity ids are assigned in
/// declaration order starting at 1.
#[derive(Debug, Clone, Default)]
pub struct QuantityCatalog {
    stores: Vec<(String, usize)>,
    quantities: BTreeMap<String, QuantityEntry>,
}

impl QuantityCatalog {
    pub fn from_config(config: &SimulationConfig) -> KernelResult<Self> {
        let mut catalog = QuantityCatalog::default();

        for store in &config.stores {
            if catalog.store_index(&store.name).is_some() {
                return Err(KernelError::DuplicateName(store.name.clone()));
            }
            catalog.stores.push((store.name.clone(), store.boxes));
        }

        for (n, q) in config.quantities.iter().enumerate() {
            let store = catalog
                .store_index(&q.store)
                .ok_or_else(|| KernelError::UnknownStore {
                    quantity: q.name.clone(),
                    store: q.store.clone(),
                })?;
            if catalog.quantities.contains_key(&q.name) {
                return Err(KernelError::DuplicateName(q.name.clone()));
            }
            let location = Location::new(QuantityId::new(n as u32 + 1), store);
            catalog.quantities.insert(
                q.name.clone(),
                QuantityEntry {
                    location,
                    initial: q.initial,
                },
            );
        }

        Ok(catalog)
    }

    pub fn store_index(&self, name: &str) -> Option<StoreIndex> {
        self.stores
            .iter()
            .position(|(n, _)| n == name)
            .map(|i| StoreIndex::new(i as u16))
    }

    pub fn location(&self, name: &str) -> Option<Location> {
        self.quantities.get(name).map(|e| e.location)
    }

    /// Resolve a quantity declared by `process`; unknown names are fatal.
    pub fn resolve(&self, process: &str, name: &str) -> KernelResult<Location> {
        self.location(name).ok_or_else(|| KernelError::UnknownQuantity {
            process: process.to_string(),
            name: name.to_string(),
        })
    }

    pub fn name_of(&self, location: Location) -> Option<&str> {
        self.quantities
            .iter()
            .find(|(_, e)| e.location == location)
            .map(|(name, _)| name.as_str())
    }

    pub fn quantity_count(&self) -> usize {
        self.quantities.len()
    }

    /// A scoreboard with every store added and every quantity declared
    /// at its initial value.
    pub fn scoreboard(&self) -> MemoryScoreboard {
        let mut board = MemoryScoreboard::new();
        for (_, boxes) in &self.stores {
            board.add_store(*boxes);
        }
        for entry in self.quantities.values() {
            board.declare(entry.location, entry.initial);
        }
        board
    }
}
