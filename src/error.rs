//! Structured error types for the kernel.
//!
//! Only setup can fail: unresolvable configuration aborts construction
//! and halts the simulation before it starts. Protocol no-ops at run time
//! ("nothing requested", "already serviced") are ordinary outcomes and
//! live in [`crate::process::Reaction`], not here.

use std::path::PathBuf;

use crate::process::ProcessId;

#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    // ── Configuration ─────────────────────────────────────

    /// A process declared a quantity name the catalog does not know.
    #[error("process {process} declares unknown quantity {name:?}")]
    UnknownQuantity { process: String, name: String },

    /// A quantity named a store that was never declared.
    #[error("quantity {quantity:?} refers to unknown store {store:?}")]
    UnknownStore { quantity: String, store: String },

    /// Two quantities (or two stores) share a name.
    #[error("{0:?} is declared more than once")]
    DuplicateName(String),

    /// A concrete process needs a quantity role or parameter that its
    /// configuration does not provide.
    #[error("process {process} is missing setting {setting:?}")]
    MissingSetting { process: String, setting: String },

    /// A setting is present but its value cannot be used.
    #[error("{owner}: setting {setting:?} {reason}")]
    InvalidSetting {
        owner: String,
        setting: String,
        reason: String,
    },

    /// A standing request would pair boxes of stores with different box
    /// counts.
    #[error("process {process}: {quantity} spans {boxes} box(es) but its supply spans {expected}")]
    MisalignedStores {
        process: String,
        quantity: String,
        boxes: usize,
        expected: usize,
    },

    #[error("could not parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("could not read configuration {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Process table ─────────────────────────────────────

    /// Attempted to register a process with an id already in use.
    #[error("process {0} is already registered")]
    DuplicateProcess(ProcessId),

    /// A process id was referenced but is not registered.
    #[error("process {0} not found")]
    UnknownProcess(ProcessId),
}

/// Convenience alias for `Result<T, KernelError>`.
pub type KernelResult<T> = Result<T, KernelError>;
