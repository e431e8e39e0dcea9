//! TraceEntry: records every letter dispatched to a process.

use crate::event::EventId;
use crate::message::MessageKind;
use crate::time::VirtualTime;

use super::id::ProcessId;
use super::reaction::Reaction;

/// A record of a single dispatch.
///
/// Appended by `ProcessRuntime` on every delivered letter; useful for test
/// assertions and post-mortem debugging. Protocol no-ops show up here as
/// their [`Reaction`] rather than as errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TraceEntry {
    /// Virtual time of the dispatch.
    pub time: VirtualTime,
    /// The post office's id for the letter.
    pub event_id: EventId,
    pub from: ProcessId,
    /// The process that reacted.
    pub process: ProcessId,
    pub kind: MessageKind,
    pub reaction: Reaction,
}

impl std::fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} E#{} {}→{}] {}: {}",
            self.time,
            self.event_id.raw(),
            self.from,
            self.process,
            self.kind,
            self.reaction,
        )
    }
}

/// Dispatch counters kept by the runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Letters handed to a registered process.
    pub dispatched: u64,
    /// Letters whose kind had no handler.
    pub unexpected: u64,
    /// Letters addressed to no registered process.
    pub undeliverable: u64,
}
