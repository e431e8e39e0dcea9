//! Special-output collaborator.
//!
//! A Special-output message asks the kernel to hand its payload to
//! whatever output rules the runtime was set up with (file writers,
//! probes, recorders). The kernel only fans the payload out.

use crate::message::Payload;
use crate::process::ProcessId;
use crate::time::VirtualTime;

/// Receives special-output payloads.
pub trait OutputRule {
    fn fire(&mut self, at: VirtualTime, process: ProcessId, payload: &Payload);
}

impl<F> OutputRule for F
where
    F: FnMut(VirtualTime, ProcessId, &Payload),
{
    fn fire(&mut self, at: VirtualTime, process: ProcessId, payload: &Payload) {
        (self)(at, process, payload);
    }
}

/// The runtime's ordered list of output rules.
#[derive(Default)]
pub struct OutputRules {
    rules: Vec<Box<dyn OutputRule>>,
}

impl OutputRules {
    pub fn new() -> Self {
        OutputRules { rules: Vec::new() }
    }

    pub fn push(&mut self, rule: Box<dyn OutputRule>) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Fire every rule in registration order. Returns how many fired.
    pub fn fire(&mut self, at: VirtualTime, process: ProcessId, payload: &Payload) -> usize {
        for rule in &mut self.rules {
            rule.fire(at, process, payload);
        }
        self.rules.len()
    }
}

/// Output rule that keeps everything it is given.
#[derive(Debug, Clone, Default)]
pub struct OutputRecorder {
    pub records: std::rc::Rc<std::cell::RefCell<Vec<(VirtualTime, ProcessId, Payload)>>>,
}

impl OutputRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl OutputRule for OutputRecorder {
    fn fire(&mut self, at: VirtualTime, process: ProcessId, payload: &Payload) {
        self.records.borrow_mut().push((at, process, payload.clone()));
    }
}
