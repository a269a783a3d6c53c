//! Call, branch, and jump edge aggregation.
//!
//! Three keyed maps, each keyed by the source PC of the transition:
//!
//! - `calls` — call edges with invocation counts and inclusive event costs,
//!   one inner list per call site in first-observation order
//! - `branches` — two-target conditional branch records (taken target and
//!   fall-through target with per-direction counts)
//! - `jumps` — unconditional jump targets with counts, one inner list per
//!   jump site in first-observation order
//!
//! The inner lists stay tiny in practice (a call site overwhelmingly has a
//! single target), so linear search beats a nested map while preserving the
//! insertion order the report emitter depends on.

use std::collections::HashMap;

use crate::events::{zeroed, EventVec, MAX_EVENTS};

/// One observed call target of a call site.
#[derive(Debug, Clone)]
pub struct CallEdge {
    pub target_pc: u64,
    /// Number of observed calls along this edge
    pub count: u64,
    /// Inclusive event cost accumulated on matching returns
    pub incl: EventVec,
    /// Edge created by sequential execution crossing a function boundary
    pub is_fall_through: bool,
}

/// All call targets observed from one call site.
#[derive(Debug, Clone, Default)]
pub struct CallSite {
    pub targets: Vec<CallEdge>,
}

/// Conditional branch record for one branch PC.
///
/// A conditional branch has at most one taken target and one fall-through
/// target; a target field is only meaningful while its count is non-zero.
#[derive(Debug, Clone, Default)]
pub struct BranchEdge {
    pub total_executed: u64,
    pub taken_target: u64,
    pub taken_count: u64,
    pub fallthrough_target: u64,
    pub fallthrough_count: u64,
}

/// One observed target of an unconditional jump site.
#[derive(Debug, Clone)]
pub struct JumpEdge {
    pub target_pc: u64,
    pub count: u64,
}

/// All jump targets observed from one jump site.
#[derive(Debug, Clone, Default)]
pub struct JumpSite {
    pub targets: Vec<JumpEdge>,
    /// Target taken by the most recent instance at this site
    pub last_target: u64,
}

/// Outcome of recording one jump instance, used for indirect-branch
/// accounting.
#[derive(Debug, Clone, Copy)]
pub struct JumpOutcome {
    /// Number of distinct targets observed at the site so far
    pub distinct_targets: usize,
    /// The instance landed on a different target than the previous one
    pub switched_target: bool,
}

/// Aggregated control-flow edges, keyed by source PC.
#[derive(Debug, Default)]
pub struct EdgeMaps {
    pub calls: HashMap<u64, CallSite>,
    pub branches: HashMap<u64, BranchEdge>,
    pub jumps: HashMap<u64, JumpSite>,
}

impl EdgeMaps {
    pub fn new() -> Self {
        EdgeMaps::default()
    }

    /// Record one call (or tail call) along `from → to`.
    pub fn record_call(&mut self, from: u64, to: u64) {
        Self::bump_call(self.calls.entry(from).or_default(), to, false);
    }

    /// Record one fall-through crossing along `from → to`.
    pub fn record_fall_through(&mut self, from: u64, to: u64) {
        Self::bump_call(self.calls.entry(from).or_default(), to, true);
    }

    fn bump_call(site: &mut CallSite, to: u64, fall_through: bool) {
        match site.targets.iter_mut().find(|t| t.target_pc == to) {
            Some(edge) => {
                edge.count += 1;
                if fall_through {
                    edge.is_fall_through = true;
                }
            }
            None => site.targets.push(CallEdge {
                target_pc: to,
                count: 1,
                incl: zeroed(),
                is_fall_through: fall_through,
            }),
        }
    }

    /// Add an inclusive cost delta to an existing call edge.
    ///
    /// Returns `false` when no such edge exists; the delta is then dropped
    /// rather than invent an edge that was never called.
    pub fn credit_call(&mut self, from: u64, to: u64, delta: &EventVec) -> bool {
        let Some(edge) = self
            .calls
            .get_mut(&from)
            .and_then(|site| site.targets.iter_mut().find(|t| t.target_pc == to))
        else {
            return false;
        };
        for i in 0..MAX_EVENTS {
            edge.incl[i] += delta[i];
        }
        true
    }

    /// Record one conditional-branch instance at `from`, landing on `to`.
    ///
    /// `sequential` selects the fall-through direction. Returns the updated
    /// record so the caller can apply its misprediction model.
    pub fn record_branch(&mut self, from: u64, to: u64, sequential: bool) -> &BranchEdge {
        let edge = self.branches.entry(from).or_default();
        edge.total_executed += 1;
        if sequential {
            edge.fallthrough_target = to;
            edge.fallthrough_count += 1;
        } else {
            edge.taken_target = to;
            edge.taken_count += 1;
        }
        edge
    }

    /// Record one unconditional jump instance along `from → to`.
    pub fn record_jump(&mut self, from: u64, to: u64) -> JumpOutcome {
        let site = self.jumps.entry(from).or_default();
        let switched = !site.targets.is_empty() && site.last_target != to;
        match site.targets.iter_mut().find(|t| t.target_pc == to) {
            Some(edge) => edge.count += 1,
            None => site.targets.push(JumpEdge {
                target_pc: to,
                count: 1,
            }),
        }
        site.last_target = to;
        JumpOutcome {
            distinct_targets: site.targets.len(),
            switched_target: switched,
        }
    }

    /// True when the jump site at `from` has already landed somewhere other
    /// than `to`.
    pub fn jump_site_diverges(&self, from: u64, to: u64) -> bool {
        self.jumps
            .get(&from)
            .map(|site| site.targets.iter().any(|t| t.target_pc != to))
            .unwrap_or(false)
    }
}
