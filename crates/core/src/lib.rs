//! # simgrind-core
//!
//! Offline callgrind-format profile generation for instruction-set
//! simulators (v0.3.0).
//!
//! The engine consumes two inputs — a static disassembly (PC → function /
//! file / line / mnemonic) and the simulator's ordered stream of
//! per-instruction execution events — and reconstructs the program's control
//! flow without decoding a single instruction: calls, returns, tail calls,
//! conditional branch outcomes, unconditional and indirect jumps, and
//! cross-function fall-through. The result is written as a callgrind report
//! attributing self and inclusive costs to instructions, functions, calls,
//! and branches.
//!
//! ## Architecture
//!
//! - [`FlowTracker`] — single-pass state machine driven once per executed
//!   instruction; owns all mutable profiling state
//! - [`PCTable`] — immutable-after-load static metadata, with synthetic
//!   records for PCs missing from the disassembly
//! - [`classify`] — pure transition classifier ([`BranchKind`]) inferring
//!   control-flow kind from execution shape
//! - [`EdgeMaps`] — call, conditional-branch, and jump aggregations keyed by
//!   source PC
//! - [`report`] — deterministic callgrind text emission
//! - [`objdump`] — `objdump -d -l` listing loader
//! - [`trace`] — line-oriented event trace replay
//! - [`checkpoint`] — compressed state snapshots for multi-part runs
//!
//! ## Frame helpers
//!
//! Compiler-emitted `__riscv_save_*` / `__riscv_restore_*` thunks are
//! accounted for self cost but elided from the call graph; the call a save
//! helper forwards to is re-attributed to the real caller.

pub mod checkpoint;
pub mod classify;
pub mod edges;
pub mod error;
pub mod events;
pub mod objdump;
pub mod pctable;
pub mod report;
pub mod trace;
pub mod tracker;

pub use classify::{classify, BranchKind, LinkHint};
pub use edges::EdgeMaps;
pub use error::{ProfileError, Result};
pub use events::{EventKind, EventVec, EVENT_NAMES, MAX_EVENTS};
pub use pctable::{FunctionKind, PCRecord, PCTable};
pub use tracker::{CallFrame, FlowTracker, ShadowCaller};

/// Report generation options.
///
/// The three booleans mirror the callgrind collection switches; the event
/// list controls the `events:` declaration and how many counters each cost
/// line carries.
#[derive(Debug, Clone)]
pub struct Options {
    /// Include `0x<pc>` instruction positions (and mnemonic comments) in
    /// the report
    pub dump_instr: bool,
    /// Populate the branch-prediction counters (`Bc`/`Bcm`/`Bi`/`Bim`)
    pub branch_sim: bool,
    /// Record conditional-branch and jump edges at all
    pub collect_jumps: bool,
    /// Event names, in counter-index order
    pub event_names: Vec<String>,
    /// Number of leading events emitted in the report
    pub num_events: usize,
    /// Creator identifier written to the report header
    pub creator: String,
    /// Command placeholder written to the report header
    pub command: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            dump_instr: true,
            branch_sim: true,
            collect_jumps: true,
            event_names: EVENT_NAMES.iter().map(|s| s.to_string()).collect(),
            num_events: 2,
            creator: "simgrind".into(),
            command: "simulated_program".into(),
        }
    }
}
