//! # Humus: virtual-time kernel for soil-process simulation
//!
//! Simulated processes (mineralisation, uptake, leaching, ...) exchange
//! letters through a post office ordered by virtual time, and move
//! quantities through a shared scoreboard with a supply/demand protocol:
//! consumers register standing requests, suppliers periodically "cough
//! up" and share what they have in proportion to what was asked, and
//! consumers settle the delivered amounts. No threads, no wall-clock
//! time; the same inputs always give the same run.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │        ProcessRuntime        │ ← owns processes, scoreboard, outputs
//! │  ┌────────────────────────┐  │
//! │  │  dispatch / protocol   │  │ ← register, cough-up, settle
//! │  └────────────────────────┘  │
//! │  ┌────────────────────────┐  │
//! │  │       Simulation       │  │ ← execution loop
//! │  │  ┌──────────────────┐  │  │
//! │  │  │   PostOffice     │  │  │ ← (time, id) min-heap of letters
//! │  │  └──────────────────┘  │  │
//! │  │  ┌──────────────────┐  │  │
//! │  │  │   VirtualTime    │  │  │ ← simulated seconds
//! │  │  └──────────────────┘  │  │
//! │  └────────────────────────┘  │
//! └──────────────────────────────┘
//! ```

pub mod builder;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod message;
pub mod output;
pub mod post_office;
pub mod process;
pub mod registry;
pub mod scoreboard;
pub mod simulation;
pub mod time;

// Re-exports for convenience.
pub use builder::{Scenario, SimulationBuilder};
pub use config::{QuantityCatalog, SimulationConfig};
pub use context::ActionContext;
pub use descriptor::{Descriptor, Location, QuantityId, StoreIndex};
pub use error::{KernelError, KernelResult};
pub use event::{Event, EventId};
pub use message::{GpSlot, Message, MessageKind, Payload, ReceivalKind};
pub use post_office::PostOffice;
pub use process::{
    Process, ProcessCore, ProcessId, ProcessRuntime, Reaction, SupplyPool, Uptake,
};
pub use registry::DescriptorRegistry;
pub use scoreboard::{MemoryScoreboard, Scoreboard};
pub use simulation::{EventHandler, Simulation, SimulationContext};
pub use time::VirtualTime;
