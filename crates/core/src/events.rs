//! Event counter definitions.
//!
//! Every executed instruction can contribute to up to [`MAX_EVENTS`]
//! monotonically increasing 64-bit counters. The first eight indices have
//! canonical meanings; the remaining two are reserved for simulator-specific
//! counters delivered through the batch interface.

/// Maximum number of event counters tracked per PC.
pub const MAX_EVENTS: usize = 10;

/// Fixed-width vector of event counters.
pub type EventVec = [u64; MAX_EVENTS];

/// Canonical event names, in counter-index order.
pub const EVENT_NAMES: [&str; 8] = [
    "Ir", "Cycle", "Bc", "Bcm", "Bi", "Bim", "CacheMiss", "TlbMiss",
];

/// A named event counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Instructions retired
    Ir,
    /// Clock cycles
    Cycle,
    /// Conditional branches executed
    Bc,
    /// Conditional branch mispredictions
    Bcm,
    /// Indirect branches executed
    Bi,
    /// Indirect branch mispredictions
    Bim,
    /// Cache misses (opaque, simulator-provided)
    CacheMiss,
    /// TLB misses (opaque, simulator-provided)
    TlbMiss,
}

impl EventKind {
    /// Counter index of this event.
    pub const fn index(self) -> usize {
        match self {
            EventKind::Ir => 0,
            EventKind::Cycle => 1,
            EventKind::Bc => 2,
            EventKind::Bcm => 3,
            EventKind::Bi => 4,
            EventKind::Bim => 5,
            EventKind::CacheMiss => 6,
            EventKind::TlbMiss => 7,
        }
    }

    /// Reverse lookup from a counter index.
    pub const fn from_index(index: usize) -> Option<EventKind> {
        match index {
            0 => Some(EventKind::Ir),
            1 => Some(EventKind::Cycle),
            2 => Some(EventKind::Bc),
            3 => Some(EventKind::Bcm),
            4 => Some(EventKind::Bi),
            5 => Some(EventKind::Bim),
            6 => Some(EventKind::CacheMiss),
            7 => Some(EventKind::TlbMiss),
            _ => None,
        }
    }

    /// Canonical name of this event.
    pub const fn name(self) -> &'static str {
        EVENT_NAMES[self.index()]
    }
}

/// A zeroed event vector.
pub const fn zeroed() -> EventVec {
    [0; MAX_EVENTS]
}
