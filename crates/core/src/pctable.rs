//! Static per-PC metadata table.
//!
//! Maps each program counter to the function, source location, and mnemonic
//! text delivered by the disassembly load phase. Two properties are derived
//! once at load time and cached on the record:
//!
//! - [`FunctionKind`] — whether the function is a compiler frame-save /
//!   frame-restore helper (matched by name prefix)
//! - instruction width — 2 bytes for compressed (`c.*`) mnemonics, else 4
//!
//! The table is immutable after the load phase except for the per-PC event
//! counters, which only ever increase. PCs seen during the event phase that
//! were never loaded get a synthetic `unknown` record so that a sparse or
//! stale disassembly can never fail a run.

use std::collections::HashMap;

use crate::events::{zeroed, EventVec};

/// Name prefix of compiler-emitted register-save thunks.
const FRAME_SAVE_PREFIX: &str = "__riscv_save";
/// Name prefix of compiler-emitted register-restore thunks.
const FRAME_RESTORE_PREFIX: &str = "__riscv_restore";

/// Classification of a function by its role in the call graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Ordinary function
    Normal,
    /// Callee-saved-register save thunk (`__riscv_save_*`)
    FrameSaveHelper,
    /// Callee-saved-register restore thunk (`__riscv_restore_*`)
    FrameRestoreHelper,
}

impl FunctionKind {
    /// Classify a function by name.
    pub fn classify(func: &str) -> FunctionKind {
        if func.starts_with(FRAME_SAVE_PREFIX) {
            FunctionKind::FrameSaveHelper
        } else if func.starts_with(FRAME_RESTORE_PREFIX) {
            FunctionKind::FrameRestoreHelper
        } else {
            FunctionKind::Normal
        }
    }

    /// True for either helper kind.
    pub fn is_helper(self) -> bool {
        !matches!(self, FunctionKind::Normal)
    }
}

/// Instruction width in bytes derived from the mnemonic text.
///
/// Compressed RISC-V mnemonics carry a `c.` prefix (`c.addi`, `c.jr`, ...);
/// everything else is a standard 4-byte encoding.
pub fn classify_width(asm: &str) -> u8 {
    if asm.split_whitespace().any(|tok| tok.starts_with("c.")) {
        2
    } else {
        4
    }
}

/// Static metadata plus accumulated event counters for one PC.
#[derive(Debug, Clone)]
pub struct PCRecord {
    pub pc: u64,
    pub func: String,
    pub file: String,
    pub line: u32,
    pub asm: String,
    /// Cached function classification
    pub kind: FunctionKind,
    /// Cached instruction width in bytes (2 or 4)
    pub width: u8,
    /// Accumulated event counters for this PC
    pub events: EventVec,
}

impl PCRecord {
    /// True if any event counter is non-zero.
    pub fn has_events(&self) -> bool {
        self.events.iter().any(|&e| e > 0)
    }
}

/// PC → record table.
#[derive(Debug, Default)]
pub struct PCTable {
    records: HashMap<u64, PCRecord>,
}

impl PCTable {
    pub fn new() -> Self {
        PCTable {
            records: HashMap::new(),
        }
    }

    /// Insert or overwrite the record for `pc`.
    pub fn load(&mut self, pc: u64, func: &str, asm: &str, file: &str, line: u32) {
        let record = PCRecord {
            pc,
            func: func.to_owned(),
            file: file.to_owned(),
            line,
            asm: asm.to_owned(),
            kind: FunctionKind::classify(func),
            width: classify_width(asm),
            events: zeroed(),
        };
        self.records.insert(pc, record);
    }

    /// Look up `pc`, synthesising an `unknown` record if it was never loaded.
    pub fn ensure(&mut self, pc: u64) -> &mut PCRecord {
        self.records.entry(pc).or_insert_with(|| PCRecord {
            pc,
            func: "unknown".into(),
            file: "unknown".into(),
            line: 0,
            asm: String::new(),
            kind: FunctionKind::Normal,
            width: 4,
            events: zeroed(),
        })
    }

    pub fn get(&self, pc: u64) -> Option<&PCRecord> {
        self.records.get(&pc)
    }

    pub fn get_mut(&mut self, pc: u64) -> Option<&mut PCRecord> {
        self.records.get_mut(&pc)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u64, &PCRecord)> {
        self.records.iter()
    }

    /// All PCs in ascending numeric order, for deterministic emission.
    pub fn sorted_pcs(&self) -> Vec<u64> {
        let mut pcs: Vec<u64> = self.records.keys().copied().collect();
        pcs.sort_unstable();
        pcs
    }

    /// Order-independent fingerprint of the loaded PC set, used to detect
    /// checkpoint/table mismatches.
    pub fn digest(&self) -> u64 {
        self.records
            .keys()
            .fold(0u64, |acc, &pc| acc ^ pc.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_function() {
        assert_eq!(FunctionKind::classify("main"), FunctionKind::Normal);
        assert_eq!(
            FunctionKind::classify("__riscv_save_4"),
            FunctionKind::FrameSaveHelper
        );
        assert_eq!(
            FunctionKind::classify("__riscv_restore_4"),
            FunctionKind::FrameRestoreHelper
        );
        assert!(FunctionKind::FrameSaveHelper.is_helper());
        assert!(!FunctionKind::Normal.is_helper());
    }

    #[test]
    fn test_classify_width() {
        assert_eq!(classify_width("c.addi sp,sp,-16"), 2);
        assert_eq!(classify_width("c.jr ra"), 2);
        assert_eq!(classify_width("addi a0,a0,4"), 4);
        assert_eq!(classify_width("jal ra,1000e"), 4);
        // "c." must start a token, not merely appear inside one
        assert_eq!(classify_width("vsetvlic.x a0"), 4);
        assert_eq!(classify_width(""), 4);
    }

    #[test]
    fn test_load_and_lookup() {
        let mut table = PCTable::new();
        table.load(0x1000, "main", "addi a0,a0,1", "main.c", 12);
        let rec = table.get(0x1000).unwrap();
        assert_eq!(rec.func, "main");
        assert_eq!(rec.line, 12);
        assert_eq!(rec.width, 4);
        assert_eq!(rec.kind, FunctionKind::Normal);
        assert!(!rec.has_events());
    }

    #[test]
    fn test_duplicate_load_overwrites() {
        let mut table = PCTable::new();
        table.load(0x1000, "main", "addi a0,a0,1", "main.c", 12);
        table.load(0x1000, "start", "c.nop", "crt.S", 3);
        assert_eq!(table.len(), 1);
        let rec = table.get(0x1000).unwrap();
        assert_eq!(rec.func, "start");
        assert_eq!(rec.width, 2);
    }

    #[test]
    fn test_ensure_synthesises_unknown() {
        let mut table = PCTable::new();
        let rec = table.ensure(0x9000);
        assert_eq!(rec.func, "unknown");
        assert_eq!(rec.file, "unknown");
        assert_eq!(rec.line, 0);
        assert_eq!(rec.width, 4);
        assert_eq!(rec.kind, FunctionKind::Normal);
    }

    #[test]
    fn test_sorted_pcs() {
        let mut table = PCTable::new();
        table.load(0x3000, "c", "ret", "", 0);
        table.load(0x1000, "a", "ret", "", 0);
        table.load(0x2000, "b", "ret", "", 0);
        assert_eq!(table.sorted_pcs(), vec![0x1000, 0x2000, 0x3000]);
    }
}
