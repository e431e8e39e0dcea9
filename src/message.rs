//! Message vocabulary exchanged between processes.
//!
//! [`Message`] is a closed enum: every variant carries exactly the data
//! its reaction needs, so a descriptor-carrying message without a
//! descriptor cannot be expressed. [`MessageKind`] is the payload-free
//! tag used as the key of a process's periodic-delay table.

use crate::descriptor::Descriptor;
use crate::process::ProcessId;

/// Number of general-purpose message slots.
pub const GP_SLOT_COUNT: u8 = 10;

/// One of the ten numbered general-purpose slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct GpSlot(u8);

impl GpSlot {
    /// Returns `None` for slots outside `0..GP_SLOT_COUNT`.
    pub fn new(slot: u8) -> Option<Self> {
        (slot < GP_SLOT_COUNT).then_some(GpSlot(slot))
    }

    #[inline]
    pub fn index(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = GpSlot> {
        (0..GP_SLOT_COUNT).map(GpSlot)
    }
}

/// How a delivery reached its consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum ReceivalKind {
    /// Routine delivery against a standing request.
    Registered,
    /// Pushed by a supplier without a standing request.
    Unsolicited,
    /// Delivery to the consumer whose immediate request triggered the cough-up.
    Immediate,
}

/// Free-form data carried by special and general-purpose messages.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Payload {
    #[default]
    Empty,
    Value(f64),
    Text(String),
    Data(Vec<u8>),
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Empty => write!(f, "Empty"),
            Payload::Value(v) => write!(f, "Value({v})"),
            Payload::Text(s) if s.chars().count() > 32 => {
                let head: String = s.chars().take(32).collect();
                write!(f, "Text(\"{head}…\")")
            }
            Payload::Text(s) => write!(f, "Text({s:?})"),
            Payload::Data(d) => write!(f, "Data({} bytes)", d.len()),
        }
    }
}

/// A message delivered to a process.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Message {
    /// Self-scheduled wake-up.
    NormalWake,
    /// Another process's activity concerns the recipient.
    ExternalWake,
    /// Register the carried standing request with the supplier.
    RegisterRequest(Descriptor),
    /// Scheduled servicing of every standing request.
    NormalCoughUp,
    /// Servicing triggered on demand by `requester`.
    ImmediateCoughUp { requester: ProcessId },
    /// A delivery is staged in the consumer's buffer.
    Receival {
        kind: ReceivalKind,
        descriptor: Descriptor,
    },
    /// Settle every arrived receival.
    DelayedReaction,
    SpecialInput(Payload),
    SpecialOutput(Payload),
    GeneralPurpose { slot: GpSlot, payload: Payload },
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::NormalWake => MessageKind::NormalWake,
            Message::ExternalWake => MessageKind::ExternalWake,
            Message::RegisterRequest(_) => MessageKind::RegisterRequest,
            Message::NormalCoughUp => MessageKind::NormalCoughUp,
            Message::ImmediateCoughUp { .. } => MessageKind::ImmediateCoughUp,
            Message::Receival { kind, .. } => MessageKind::Receival(*kind),
            Message::DelayedReaction => MessageKind::DelayedReaction,
            Message::SpecialInput(_) => MessageKind::SpecialInput,
            Message::SpecialOutput(_) => MessageKind::SpecialOutput,
            Message::GeneralPurpose { slot, .. } => MessageKind::GeneralPurpose(*slot),
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::RegisterRequest(d) => write!(f, "RegisterRequest({d})"),
            Message::ImmediateCoughUp { requester } => {
                write!(f, "ImmediateCoughUp(for {requester})")
            }
            Message::Receival { kind, descriptor } => {
                write!(f, "Receival({kind:?}, {descriptor})")
            }
            Message::SpecialInput(p) => write!(f, "SpecialInput({p})"),
            Message::SpecialOutput(p) => write!(f, "SpecialOutput({p})"),
            Message::GeneralPurpose { slot, payload } => {
                write!(f, "GeneralPurpose(#{}, {payload})", slot.index())
            }
            other => write!(f, "{}", other.kind()),
        }
    }
}

/// Payload-free message tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageKind {
    NormalWake,
    ExternalWake,
    RegisterRequest,
    NormalCoughUp,
    ImmediateCoughUp,
    Receival(ReceivalKind),
    DelayedReaction,
    SpecialInput,
    SpecialOutput,
    GeneralPurpose(GpSlot),
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Receival(kind) => write!(f, "Receival({kind:?})"),
            MessageKind::GeneralPurpose(slot) => write!(f, "GeneralPurpose(#{})", slot.index()),
            other => write!(f, "{other:?}"),
        }
    }
}
