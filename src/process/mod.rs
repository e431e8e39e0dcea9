//! Processes and the supply/demand protocol they speak.
//!
//! A process is a simulated physical, chemical or biological activity.
//! Processes never touch each other directly: they exchange letters
//! through the post office and move quantities through the shared
//! scoreboard.
//!
//! # Module structure
//!
//! | Sub-module | Contents |
//! |---|---|
//! | [`id`] | [`ProcessId`] newtype |
//! | [`identity`] | [`ProcessIdentity`], [`Stratum`], [`Activity`] |
//! | [`core`] | [`ProcessCore`], the kernel-owned per-process state |
//! | [`traits`] | [`Process`] trait and its hooks |
//! | [`reaction`] | [`Reaction`], [`Fulfillment`], [`Settlement`] |
//! | [`dispatch`] | message routing and post-dispatch bookkeeping |
//! | [`fulfillment`] | cough-up and delivery dispatch |
//! | [`settlement`] | receival settlement |
//! | [`trace`] | [`TraceEntry`], [`DispatchStats`] |
//! | [`runtime`] | [`ProcessRuntime`] |
//! | [`builtin`] | [`SupplyPool`], [`Uptake`] |

pub mod builtin;
pub mod core;
pub mod dispatch;
pub mod fulfillment;
pub mod id;
pub mod identity;
pub mod reaction;
pub mod runtime;
pub mod settlement;
pub mod trace;
pub mod traits;

pub use builtin::{SupplyPool, Uptake, UptakeLinks};
pub use self::core::ProcessCore;
pub use dispatch::dispatch;
pub use fulfillment::Delivery;
pub use id::ProcessId;
pub use identity::{Activity, ProcessIdentity, Stratum};
pub use reaction::{Fulfillment, FulfillmentReport, Reaction, Settlement};
pub use runtime::ProcessRuntime;
pub use trace::{DispatchStats, TraceEntry};
pub use traits::Process;
