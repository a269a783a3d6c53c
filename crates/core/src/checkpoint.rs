//! Profiling state checkpoints.
//!
//! Captures the complete tracker state to a file using bincode serialization
//! with deflate compression, so a long simulation can be cut into parts and
//! resumed later; each restore advances the `part:` number written to the
//! report header.
//!
//! ## File format
//!
//! ```text
//! +------------------+
//! | Magic "SGPF"     |  4 bytes
//! +------------------+
//! | Format version   |  u32 little-endian (currently 1)
//! +------------------+
//! | Compressed data  |  deflate-compressed bincode payload
//! +------------------+
//! ```
//!
//! The payload embeds a fingerprint of the loaded PC table; restoring a
//! checkpoint into a tracker loaded from a different disassembly is
//! rejected.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::LinkHint;
use crate::edges::{CallEdge, CallSite, JumpEdge, JumpSite};
use crate::error::{ProfileError, Result};
use crate::events::EventVec;
use crate::tracker::{CallFrame, FlowTracker, LastInstr, ShadowCaller};

/// Magic bytes identifying a simgrind checkpoint file.
const MAGIC: &[u8; 4] = b"SGPF";
/// Current checkpoint format version.
const FORMAT_VERSION: u32 = 1;

// ─── Per-component state structs ────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct PcCounterState {
    pub pc: u64,
    pub events: EventVec,
}

#[derive(Serialize, Deserialize)]
pub struct CallEdgeState {
    pub target_pc: u64,
    pub count: u64,
    pub incl: EventVec,
    pub is_fall_through: bool,
}

#[derive(Serialize, Deserialize)]
pub struct CallSiteState {
    pub from_pc: u64,
    pub targets: Vec<CallEdgeState>,
}

#[derive(Serialize, Deserialize)]
pub struct BranchState {
    pub from_pc: u64,
    pub total_executed: u64,
    pub taken_target: u64,
    pub taken_count: u64,
    pub fallthrough_target: u64,
    pub fallthrough_count: u64,
}

#[derive(Serialize, Deserialize)]
pub struct JumpSiteState {
    pub from_pc: u64,
    pub last_target: u64,
    pub targets: Vec<(u64, u64)>,
}

#[derive(Serialize, Deserialize)]
pub struct FrameState {
    pub caller_pc: u64,
    pub callee_pc: u64,
    pub caller_func: String,
    pub callee_func: String,
    pub entry_events: EventVec,
    pub is_tail_call: bool,
    pub is_fall_through: bool,
}

#[derive(Serialize, Deserialize)]
pub struct LastState {
    pub pc: u64,
    /// Link-register hint: -1 unknown, 0 zero register, 1 written
    pub hint: i8,
    pub is_branch: bool,
    pub width: u8,
}

// ─── Top-level checkpoint state ─────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct CheckpointState {
    /// Fingerprint of the PC table the state was captured against
    pub table_digest: u64,
    /// Part number of the run that produced this checkpoint
    pub part: u32,
    pub totals: EventVec,
    pub counters: Vec<PcCounterState>,
    pub calls: Vec<CallSiteState>,
    pub branches: Vec<BranchState>,
    pub jumps: Vec<JumpSiteState>,
    pub stack: Vec<FrameState>,
    pub shadow: Option<(u64, String)>,
    pub last: Option<LastState>,
}

impl FlowTracker {
    /// Capture the full profiling state.
    pub fn capture_state(&self) -> CheckpointState {
        let mut counters: Vec<PcCounterState> = self
            .table
            .iter()
            .filter(|(_, rec)| rec.has_events())
            .map(|(&pc, rec)| PcCounterState {
                pc,
                events: rec.events,
            })
            .collect();
        counters.sort_unstable_by_key(|c| c.pc);

        let mut calls: Vec<CallSiteState> = self
            .edges
            .calls
            .iter()
            .map(|(&from_pc, site)| CallSiteState {
                from_pc,
                targets: site
                    .targets
                    .iter()
                    .map(|e| CallEdgeState {
                        target_pc: e.target_pc,
                        count: e.count,
                        incl: e.incl,
                        is_fall_through: e.is_fall_through,
                    })
                    .collect(),
            })
            .collect();
        calls.sort_unstable_by_key(|s| s.from_pc);

        let mut branches: Vec<BranchState> = self
            .edges
            .branches
            .iter()
            .map(|(&from_pc, e)| BranchState {
                from_pc,
                total_executed: e.total_executed,
                taken_target: e.taken_target,
                taken_count: e.taken_count,
                fallthrough_target: e.fallthrough_target,
                fallthrough_count: e.fallthrough_count,
            })
            .collect();
        branches.sort_unstable_by_key(|b| b.from_pc);

        let mut jumps: Vec<JumpSiteState> = self
            .edges
            .jumps
            .iter()
            .map(|(&from_pc, site)| JumpSiteState {
                from_pc,
                last_target: site.last_target,
                targets: site.targets.iter().map(|t| (t.target_pc, t.count)).collect(),
            })
            .collect();
        jumps.sort_unstable_by_key(|j| j.from_pc);

        CheckpointState {
            table_digest: self.table.digest(),
            part: self.part,
            totals: self.totals,
            counters,
            calls,
            branches,
            jumps,
            stack: self
                .stack
                .iter()
                .map(|f| FrameState {
                    caller_pc: f.caller_pc,
                    callee_pc: f.callee_pc,
                    caller_func: f.caller_func.clone(),
                    callee_func: f.callee_func.clone(),
                    entry_events: f.entry_events,
                    is_tail_call: f.is_tail_call,
                    is_fall_through: f.is_fall_through,
                })
                .collect(),
            shadow: self.shadow.as_ref().map(|s| (s.pc, s.func.clone())),
            last: self.last.map(|l| LastState {
                pc: l.pc,
                hint: match l.hint {
                    LinkHint::Unknown => -1,
                    LinkHint::Zero => 0,
                    LinkHint::Written => 1,
                },
                is_branch: l.is_branch,
                width: l.width,
            }),
        }
    }

    /// Restore a captured state into this tracker, advancing the part
    /// number.
    ///
    /// The tracker must have been loaded from the same disassembly the
    /// checkpoint was captured against; counters and edges are replaced,
    /// not merged.
    pub fn restore_state(&mut self, state: CheckpointState) -> Result<()> {
        if state.table_digest != self.table.digest() {
            return Err(ProfileError::Checkpoint(
                "PC table does not match the checkpointed run".into(),
            ));
        }

        for counter in &state.counters {
            self.table.ensure(counter.pc).events = counter.events;
        }
        self.totals = state.totals;

        self.edges.calls.clear();
        for site in state.calls {
            self.edges.calls.insert(
                site.from_pc,
                CallSite {
                    targets: site
                        .targets
                        .into_iter()
                        .map(|e| CallEdge {
                            target_pc: e.target_pc,
                            count: e.count,
                            incl: e.incl,
                            is_fall_through: e.is_fall_through,
                        })
                        .collect(),
                },
            );
        }

        self.edges.branches.clear();
        for b in state.branches {
            self.edges.branches.insert(
                b.from_pc,
                crate::edges::BranchEdge {
                    total_executed: b.total_executed,
                    taken_target: b.taken_target,
                    taken_count: b.taken_count,
                    fallthrough_target: b.fallthrough_target,
                    fallthrough_count: b.fallthrough_count,
                },
            );
        }

        self.edges.jumps.clear();
        for j in state.jumps {
            self.edges.jumps.insert(
                j.from_pc,
                JumpSite {
                    targets: j
                        .targets
                        .into_iter()
                        .map(|(target_pc, count)| JumpEdge { target_pc, count })
                        .collect(),
                    last_target: j.last_target,
                },
            );
        }

        self.stack = state
            .stack
            .into_iter()
            .map(|f| CallFrame {
                caller_pc: f.caller_pc,
                callee_pc: f.callee_pc,
                caller_func: f.caller_func,
                callee_func: f.callee_func,
                entry_events: f.entry_events,
                is_tail_call: f.is_tail_call,
                is_fall_through: f.is_fall_through,
            })
            .collect();
        self.shadow = state.shadow.map(|(pc, func)| ShadowCaller { pc, func });
        self.last = state.last.map(|l| LastInstr {
            pc: l.pc,
            hint: match l.hint {
                h if h < 0 => LinkHint::Unknown,
                0 => LinkHint::Zero,
                _ => LinkHint::Written,
            },
            is_branch: l.is_branch,
            width: l.width,
        });
        self.part = state.part + 1;
        debug!(part = self.part, "checkpoint restored");
        Ok(())
    }
}

// ─── File I/O ───────────────────────────────────────────────────────────────

/// Save a tracker's state to `path` with header and deflate compression.
pub fn save_to_file(tracker: &FlowTracker, path: &Path) -> Result<()> {
    let state = tracker.capture_state();
    let payload = bincode::serialize(&state)
        .map_err(|e| ProfileError::Checkpoint(format!("serialize error: {}", e)))?;

    let compressed = miniz_oxide::deflate::compress_to_vec(&payload, 6);

    let mut out = Vec::with_capacity(8 + compressed.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&compressed);

    std::fs::write(path, &out)?;
    Ok(())
}

/// Load a checkpoint from `path`, verifying magic and version.
pub fn load_from_file(path: &Path) -> Result<CheckpointState> {
    let data = std::fs::read(path)?;

    if data.len() < 8 {
        return Err(ProfileError::Checkpoint("file too small".into()));
    }
    if &data[0..4] != MAGIC {
        return Err(ProfileError::Checkpoint("bad magic".into()));
    }
    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != FORMAT_VERSION {
        return Err(ProfileError::Checkpoint(format!(
            "unsupported version {} (expected {})",
            version, FORMAT_VERSION
        )));
    }

    let decompressed = miniz_oxide::inflate::decompress_to_vec(&data[8..])
        .map_err(|e| ProfileError::Checkpoint(format!("decompress error: {:?}", e)))?;

    bincode::deserialize(&decompressed)
        .map_err(|e| ProfileError::Checkpoint(format!("deserialize error: {}", e)))
}
