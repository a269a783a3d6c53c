//! Event trace replay.
//!
//! Reads the line-oriented trace a simulator dumps for offline profiling
//! and drives a [`FlowTracker`] with it, one executed instruction per line:
//!
//! ```text
//! # pc  dest_reg  is_branch  events...
//! 0x10000  -1  0  1  3
//! 0x10004   1  1  1  2
//! ```
//!
//! - `pc` — instruction address, hexadecimal (`0x` prefix optional)
//! - `dest_reg` — link-register hint: negative = unknown, `0` = zero
//!   register, positive = link register written
//! - `is_branch` — `1` when the instruction may redirect control flow
//! - `events...` — one count per event index, in canonical order; omitted
//!   trailing counts are zero
//!
//! Blank lines and `#` comments (whole-line or trailing) are skipped.
//! Instructions must appear in issue order; the tracker reconstructs all
//! control flow from that order alone.

use crate::error::{ProfileError, Result};
use crate::events::MAX_EVENTS;
use crate::tracker::FlowTracker;

/// Replay a trace into `tracker`. Returns the number of instructions
/// replayed.
pub fn replay(text: &str, tracker: &mut FlowTracker) -> Result<u64> {
    let mut replayed = 0u64;
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let (pc, dest_reg, is_branch, events) = parse_line(line).map_err(|msg| {
            ProfileError::Trace {
                line: idx + 1,
                msg,
            }
        })?;
        tracker.record_multi(pc, &events, dest_reg, is_branch);
        replayed += 1;
    }
    Ok(replayed)
}

type TraceLine = (u64, i32, bool, Vec<u64>);

fn parse_line(line: &str) -> std::result::Result<TraceLine, String> {
    let mut fields = line.split_whitespace();

    let pc_text = fields.next().ok_or_else(|| "missing pc".to_owned())?;
    let pc_text = pc_text.strip_prefix("0x").unwrap_or(pc_text);
    let pc = u64::from_str_radix(pc_text, 16).map_err(|_| format!("bad pc `{}`", pc_text))?;

    let reg_text = fields.next().ok_or_else(|| "missing dest_reg".to_owned())?;
    let dest_reg: i32 = reg_text
        .parse()
        .map_err(|_| format!("bad dest_reg `{}`", reg_text))?;

    let branch_text = fields.next().ok_or_else(|| "missing is_branch".to_owned())?;
    let is_branch = match branch_text {
        "0" => false,
        "1" => true,
        other => return Err(format!("bad is_branch `{}` (expected 0 or 1)", other)),
    };

    let mut events = Vec::new();
    for tok in fields {
        if events.len() == MAX_EVENTS {
            return Err(format!("more than {} event counts", MAX_EVENTS));
        }
        let count: u64 = tok.parse().map_err(|_| format!("bad event count `{}`", tok))?;
        events.push(count);
    }
    if events.is_empty() {
        return Err("missing event counts".to_owned());
    }
    Ok((pc, dest_reg, is_branch, events))
}
