//! Who a process is: id, name, stratum and activity classification.

use serde::{Deserialize, Serialize};

use super::id::ProcessId;

/// The spatial domain a process belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stratum {
    Soil,
    Litter,
    Plant,
    Atmosphere,
}

/// Broad classification of what a process simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Physical,
    Chemical,
    Biological,
    Plant,
    Environmental,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessIdentity {
    pub id: ProcessId,
    pub name: String,
    pub stratum: Stratum,
    pub activity: Activity,
}

impl ProcessIdentity {
    pub fn new(id: ProcessId, name: impl Into<String>, stratum: Stratum, activity: Activity) -> Self {
        ProcessIdentity {
            id,
            name: name.into(),
            stratum,
            activity,
        }
    }
}

impl std::fmt::Display for ProcessIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}", self.id, self.name)
    }
}
