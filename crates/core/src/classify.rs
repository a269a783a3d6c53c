//! Runtime control-flow classification.
//!
//! Given the previously executed instruction and the one executing now, infer
//! what kind of transition connected them — without ever decoding the
//! instruction encoding. The only inputs are the static metadata of the two
//! PCs, the link-register hint reported by the simulator for the previous
//! instruction, whether the step was sequential, and the function the
//! innermost call frame would return to.
//!
//! The rules are ordered; the first match wins. Structural evidence (helper
//! kinds, function boundaries, the return-address stack) takes precedence
//! over the link-register hint, so a contradictory hint can never wedge the
//! state machine.

use crate::pctable::{FunctionKind, PCRecord};

/// Maximum forward distance, in bytes, for a taken transition to still be
/// labelled a conditional branch rather than a jump.
const SHORT_FORWARD_BRANCH: u64 = 32;

/// Kind of control-flow transition between two executed instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    /// No transition worth recording (e.g. internal helper flow)
    None,
    /// Conditional branch, taken or fallen through
    Branch,
    /// Unconditional jump with a single observed target
    DirectJump,
    /// Unconditional jump through a register (multiple observed targets)
    IndirectJump,
    /// Function call that pushes a frame
    Call,
    /// Return to the calling function
    Return,
    /// Call that abandons the current frame
    TailCall,
    /// Sequential execution crossing a function boundary
    FallThrough,
}

/// Link-register hint reported by the simulator for a branch instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkHint {
    /// No hint available
    Unknown,
    /// The link register was the zero register (discarded return address)
    Zero,
    /// The link register was written (live return address)
    Written,
}

impl LinkHint {
    /// Decode the integer hint convention used on the recording interface:
    /// negative = unknown, `0` = zero register, positive = link register.
    pub fn from_reg(dest_reg: i32) -> LinkHint {
        match dest_reg {
            r if r < 0 => LinkHint::Unknown,
            0 => LinkHint::Zero,
            _ => LinkHint::Written,
        }
    }
}

/// Classify the transition from `prev` to `curr`.
///
/// `sequential` must hold exactly when `curr.pc == prev.pc + prev.width`.
/// `return_to` is the function name the innermost call frame was entered
/// from, when a frame exists.
///
/// The result is a pure function of its arguments: identical inputs always
/// produce identical outputs.
pub fn classify(
    prev: &PCRecord,
    curr: &PCRecord,
    hint: LinkHint,
    sequential: bool,
    return_to: Option<&str>,
) -> BranchKind {
    let same_func = prev.func == curr.func;

    // Restore helpers hand control back to the caller's function; their
    // internal sequential flow is invisible to the call graph.
    if prev.kind == FunctionKind::FrameRestoreHelper {
        if curr.kind == FunctionKind::Normal && !sequential {
            return BranchKind::Return;
        }
        if curr.kind == FunctionKind::FrameRestoreHelper && sequential {
            return BranchKind::None;
        }
    }

    if sequential && !same_func && prev.kind == FunctionKind::Normal {
        return BranchKind::FallThrough;
    }

    if !sequential {
        if curr.kind == FunctionKind::FrameSaveHelper {
            return BranchKind::Call;
        }
        if curr.kind == FunctionKind::FrameRestoreHelper {
            return BranchKind::TailCall;
        }
        if return_to == Some(curr.func.as_str()) {
            return BranchKind::Return;
        }
        if !same_func {
            return if hint == LinkHint::Zero {
                BranchKind::TailCall
            } else {
                BranchKind::Call
            };
        }
    }

    // From here on the transition stays within one function.
    if sequential {
        return BranchKind::Branch; // conditional branch, not taken
    }
    if curr.pc < prev.pc {
        return BranchKind::Branch; // backward taken branch (loop)
    }
    if curr.pc - prev.pc <= SHORT_FORWARD_BRANCH {
        return BranchKind::Branch; // short forward taken branch
    }
    BranchKind::DirectJump
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::zeroed;

    fn rec(pc: u64, func: &str, width: u8) -> PCRecord {
        PCRecord {
            pc,
            func: func.into(),
            file: "test.c".into(),
            line: 1,
            asm: String::new(),
            kind: FunctionKind::classify(func),
            width,
            events: zeroed(),
        }
    }

    fn seq(prev: &PCRecord, curr: &PCRecord) -> bool {
        curr.pc == prev.pc + prev.width as u64
    }

    #[test]
    fn test_not_taken_branch_is_branch() {
        let a = rec(0x1000, "main", 4);
        let b = rec(0x1004, "main", 4);
        let k = classify(&a, &b, LinkHint::Unknown, seq(&a, &b), None);
        assert_eq!(k, BranchKind::Branch);
    }

    #[test]
    fn test_backward_taken_is_branch() {
        let a = rec(0x1010, "main", 4);
        let b = rec(0x1000, "main", 4);
        assert_eq!(
            classify(&a, &b, LinkHint::Unknown, false, None),
            BranchKind::Branch
        );
    }

    #[test]
    fn test_short_forward_taken_is_branch() {
        let a = rec(0x1000, "main", 4);
        let b = rec(0x1020, "main", 4);
        assert_eq!(
            classify(&a, &b, LinkHint::Unknown, false, None),
            BranchKind::Branch
        );
    }

    #[test]
    fn test_long_forward_is_direct_jump() {
        let a = rec(0x1000, "main", 4);
        let b = rec(0x1100, "main", 4);
        assert_eq!(
            classify(&a, &b, LinkHint::Unknown, false, None),
            BranchKind::DirectJump
        );
    }

    #[test]
    fn test_cross_function_call_and_tail_call() {
        let a = rec(0x1004, "main", 4);
        let b = rec(0x2000, "f", 4);
        assert_eq!(
            classify(&a, &b, LinkHint::Written, false, None),
            BranchKind::Call
        );
        assert_eq!(
            classify(&a, &b, LinkHint::Zero, false, None),
            BranchKind::TailCall
        );
        // An unknown hint is treated as a call
        assert_eq!(
            classify(&a, &b, LinkHint::Unknown, false, None),
            BranchKind::Call
        );
    }

    #[test]
    fn test_return_to_stack_top_caller() {
        let a = rec(0x2004, "f", 4);
        let b = rec(0x1008, "main", 4);
        assert_eq!(
            classify(&a, &b, LinkHint::Unknown, false, Some("main")),
            BranchKind::Return
        );
        // Without a matching frame the transition reads as a call
        assert_eq!(
            classify(&a, &b, LinkHint::Unknown, false, Some("other")),
            BranchKind::Call
        );
    }

    #[test]
    fn test_fall_through_crosses_function_boundary() {
        let a = rec(0x1ffc, "a", 4);
        let b = rec(0x2000, "b", 4);
        assert_eq!(
            classify(&a, &b, LinkHint::Unknown, seq(&a, &b), None),
            BranchKind::FallThrough
        );
    }

    #[test]
    fn test_save_helper_entry_is_call() {
        let a = rec(0x1004, "main", 4);
        let b = rec(0x5000, "__riscv_save_4", 4);
        assert_eq!(
            classify(&a, &b, LinkHint::Written, false, None),
            BranchKind::Call
        );
    }

    #[test]
    fn test_restore_helper_entry_is_tail_call() {
        let a = rec(0x2008, "f", 4);
        let b = rec(0x5100, "__riscv_restore_4", 4);
        assert_eq!(
            classify(&a, &b, LinkHint::Zero, false, None),
            BranchKind::TailCall
        );
    }

    #[test]
    fn test_restore_helper_exit_is_return() {
        let a = rec(0x5104, "__riscv_restore_4", 4);
        let b = rec(0x1008, "main", 4);
        assert_eq!(
            classify(&a, &b, LinkHint::Unknown, false, None),
            BranchKind::Return
        );
    }

    #[test]
    fn test_restore_helper_internal_flow_is_none() {
        let a = rec(0x5100, "__riscv_restore_4", 4);
        let b = rec(0x5104, "__riscv_restore_4", 4);
        assert_eq!(
            classify(&a, &b, LinkHint::Unknown, seq(&a, &b), None),
            BranchKind::None
        );
    }

    #[test]
    fn test_compressed_width_sequentiality() {
        let a = rec(0x1000, "main", 2);
        let b = rec(0x1002, "main", 2);
        assert!(seq(&a, &b));
        assert_eq!(
            classify(&a, &b, LinkHint::Unknown, seq(&a, &b), None),
            BranchKind::Branch
        );
    }

    #[test]
    fn test_classifier_is_deterministic() {
        let a = rec(0x1004, "main", 4);
        let b = rec(0x2000, "f", 4);
        let first = classify(&a, &b, LinkHint::Written, false, Some("g"));
        for _ in 0..8 {
            assert_eq!(classify(&a, &b, LinkHint::Written, false, Some("g")), first);
        }
    }
}
