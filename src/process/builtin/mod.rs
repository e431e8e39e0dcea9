//! Built-in process implementations: SupplyPool and Uptake.
//!
//! Small reference processes used for testing and the demo binary. Real
//! models implement [`Process`](crate::process::Process) themselves.

pub mod pool;
pub mod uptake;

pub use pool::SupplyPool;
pub use uptake::{Uptake, UptakeLinks, TOP_UP_SLOT};
