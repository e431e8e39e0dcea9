//! `ProcessRuntime`: owns every process and the shared state, and
//! dispatches letters to them.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::context::ActionContext;
use crate::error::{KernelError, KernelResult};
use crate::event::Event;
use crate::output::{OutputRule, OutputRules};
use crate::scoreboard::Scoreboard;
use crate::simulation::{EventHandler, SimulationContext};

use super::core::ProcessCore;
use super::dispatch::dispatch;
use super::id::ProcessId;
use super::reaction::Reaction;
use super::trace::{DispatchStats, TraceEntry};
use super::traits::Process;

/// Manages the simulated processes and dispatches letters to them.
///
/// Implements [`EventHandler`] so it can be passed directly to
/// [`Simulation::run`](crate::simulation::Simulation::run). Letters
/// addressed to an unregistered process are logged and dropped.
pub struct ProcessRuntime {
    pub(crate) processes: BTreeMap<ProcessId, Box<dyn Process>>,
    scoreboard: Box<dyn Scoreboard>,
    outputs: OutputRules,
    /// Append-only trace of every dispatch.
    pub trace: Vec<TraceEntry>,
    stats: DispatchStats,
}

impl ProcessRuntime {
    pub fn new(scoreboard: Box<dyn Scoreboard>) -> Self {
        ProcessRuntime {
            processes: BTreeMap::new(),
            scoreboard,
            outputs: OutputRules::new(),
            trace: Vec::new(),
            stats: DispatchStats::default(),
        }
    }

    /// Register a process under the id its core carries.
    pub fn register(&mut self, process: Box<dyn Process>) -> KernelResult<ProcessId> {
        let id = process.core().id();
        if self.processes.contains_key(&id) {
            return Err(KernelError::DuplicateProcess(id));
        }
        debug!(process = %process.core().identity(), "registered");
        self.processes.insert(id, process);
        Ok(id)
    }

    pub fn add_output_rule(&mut self, rule: Box<dyn OutputRule>) {
        self.outputs.push(rule);
    }

    /// Number of registered processes.
    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    /// All registered ids in sorted order.
    pub fn process_ids(&self) -> Vec<ProcessId> {
        self.processes.keys().copied().collect()
    }

    /// Downcast a process reference for inspection.
    ///
    /// Returns `None` if the process is not registered or has a wrong type.
    pub fn process<T: Process + 'static>(&self, id: ProcessId) -> Option<&T> {
        self.processes.get(&id)?.as_any().downcast_ref::<T>()
    }

    pub fn process_mut<T: Process + 'static>(&mut self, id: ProcessId) -> Option<&mut T> {
        self.processes.get_mut(&id)?.as_any_mut().downcast_mut::<T>()
    }

    pub fn core(&self, id: ProcessId) -> KernelResult<&ProcessCore> {
        self.processes
            .get(&id)
            .map(|p| p.core())
            .ok_or(KernelError::UnknownProcess(id))
    }

    pub fn scoreboard(&self) -> &dyn Scoreboard {
        self.scoreboard.as_ref()
    }

    pub fn scoreboard_mut(&mut self) -> &mut dyn Scoreboard {
        self.scoreboard.as_mut()
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Let every drawing process render itself into `out`, one per line.
    pub fn draw_all(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        for process in self.processes.values().filter(|p| p.draws()) {
            process.draw(out)?;
            writeln!(out)?;
        }
        Ok(())
    }

    /// Release every descriptor held by every process and drop the
    /// processes. Returns how many descriptors were released.
    pub fn teardown(&mut self) -> usize {
        let released: usize = self
            .processes
            .values_mut()
            .map(|p| p.core_mut().release_descriptors())
            .sum();
        let count = self.processes.len();
        self.processes.clear();
        info!(processes = count, descriptors = released, "runtime torn down");
        released
    }
}

impl EventHandler for ProcessRuntime {
    fn handle(&mut self, ctx: &mut SimulationContext, event: &Event) {
        let Some(process) = self.processes.get_mut(&event.to) else {
            warn!(to = %event.to, kind = %event.message.kind(), "letter for unknown process dropped");
            self.stats.undeliverable += 1;
            return;
        };

        let kind = event.message.kind();
        let mut actx = ActionContext::new(
            ctx,
            self.scoreboard.as_mut(),
            &mut self.outputs,
            event.to,
            event.from,
            kind,
        );
        let reaction = dispatch(process.as_mut(), &mut actx, event.message.clone());
        debug!(process = %event.to, %kind, %reaction, "reacted");

        self.stats.dispatched += 1;
        if matches!(reaction, Reaction::Unexpected(_)) {
            self.stats.unexpected += 1;
        }
        self.trace.push(TraceEntry {
            time: event.scheduled_at,
            event_id: event.id,
            from: event.from,
            process: event.to,
            kind,
            reaction,
        });
    }
}
