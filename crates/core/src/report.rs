//! Callgrind text-format emission.
//!
//! Linearises the PC table and edge maps into the callgrind on-disk format:
//! a comment header, `positions:`/`events:` declarations, one cost line per
//! PC with sticky `fn=`/`fl=` markers, call edges as `cfn=`/`cfl=`/`calls=`
//! followed by the inclusive-cost line at the caller position, conditional
//! branches as `jcnd=taken/total`, unconditional jumps as `jump=`, and a
//! `totals:` trailer.
//!
//! Output is byte-deterministic: PCs ascend numerically, call and jump
//! targets keep first-observation order, and branch directions are emitted
//! taken-then-fallthrough. Edges originating inside frame-save/restore
//! helpers are never emitted.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::edges::EdgeMaps;
use crate::error::Result;
use crate::events::MAX_EVENTS;
use crate::pctable::{PCRecord, PCTable};
use crate::Options;

/// Format version emitted in the header.
const FORMAT_VERSION: u32 = 1;

/// Serialise the profile to `out` in callgrind format.
pub fn write_report<W: Write>(
    mut out: W,
    table: &PCTable,
    edges: &EdgeMaps,
    options: &Options,
    part: u32,
) -> Result<()> {
    let num_events = options
        .num_events
        .min(options.event_names.len())
        .min(MAX_EVENTS);

    writeln!(out, "# callgrind format")?;
    writeln!(out, "version: {}", FORMAT_VERSION)?;
    writeln!(out, "creator: {}", options.creator)?;
    writeln!(out, "pid: {}", std::process::id())?;
    writeln!(out, "cmd: {}", options.command)?;
    writeln!(out, "part: {}", part)?;
    writeln!(out)?;

    if options.dump_instr {
        writeln!(out, "positions: instr line")?;
    } else {
        writeln!(out, "positions: line")?;
    }
    write!(out, "events:")?;
    for name in options.event_names.iter().take(num_events) {
        write!(out, " {}", name)?;
    }
    writeln!(out)?;
    writeln!(out)?;

    let mut current_func = "";
    let mut current_file = "";
    for pc in table.sorted_pcs() {
        let rec = match table.get(pc) {
            Some(rec) if rec.has_events() => rec,
            _ => continue,
        };

        if rec.func != current_func {
            current_func = &rec.func;
            writeln!(out, "fn={}", current_func)?;
        }
        if rec.file != current_file {
            current_file = &rec.file;
            writeln!(out, "fl={}", current_file)?;
        }

        // Self-cost line at this position
        write!(out, "{}{}", instr_pos(options, pc), rec.line)?;
        for i in 0..num_events {
            write!(out, " {}", rec.events[i])?;
        }
        if options.dump_instr && !rec.asm.is_empty() {
            write!(out, " # {}", rec.asm)?;
        }
        writeln!(out)?;

        // Helpers are accounted for self cost only; none of their outgoing
        // edges reach the report.
        if rec.kind.is_helper() {
            continue;
        }

        write_call_edges(&mut out, table, edges, options, num_events, rec)?;

        if options.collect_jumps {
            write_branch_edges(&mut out, table, edges, options, pc)?;
            write_jump_edges(&mut out, table, edges, options, pc)?;
        }
    }

    writeln!(out)?;
    write!(out, "totals:")?;
    let totals = sum_events(table, num_events);
    for total in &totals {
        write!(out, " {}", total)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_call_edges<W: Write>(
    out: &mut W,
    table: &PCTable,
    edges: &EdgeMaps,
    options: &Options,
    num_events: usize,
    rec: &PCRecord,
) -> Result<()> {
    let Some(site) = edges.calls.get(&rec.pc) else {
        return Ok(());
    };
    for edge in &site.targets {
        let (callee_func, callee_file, callee_line) = match table.get(edge.target_pc) {
            Some(callee) => (callee.func.as_str(), callee.file.as_str(), callee.line),
            None => ("unknown", "unknown", 0),
        };
        writeln!(out, "cfn={}", callee_func)?;
        writeln!(out, "cfl={}", callee_file)?;
        writeln!(
            out,
            "calls={} {}{}",
            edge.count,
            instr_pos(options, edge.target_pc),
            callee_line
        )?;
        // Inclusive cost attributed to the caller position
        write!(out, "{}{}", instr_pos(options, rec.pc), rec.line)?;
        for i in 0..num_events {
            write!(out, " {}", edge.incl[i])?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_branch_edges<W: Write>(
    out: &mut W,
    table: &PCTable,
    edges: &EdgeMaps,
    options: &Options,
    pc: u64,
) -> Result<()> {
    let Some(edge) = edges.branches.get(&pc) else {
        return Ok(());
    };
    // Taken direction first, then fall-through, each once if observed
    if edge.taken_count > 0 {
        writeln!(
            out,
            "jcnd={}/{} {}{}",
            edge.taken_count,
            edge.total_executed,
            instr_pos(options, edge.taken_target),
            line_of(table, edge.taken_target)
        )?;
    }
    if edge.fallthrough_count > 0 {
        writeln!(
            out,
            "jcnd={}/{} {}{}",
            edge.fallthrough_count,
            edge.total_executed,
            instr_pos(options, edge.fallthrough_target),
            line_of(table, edge.fallthrough_target)
        )?;
    }
    Ok(())
}

fn write_jump_edges<W: Write>(
    out: &mut W,
    table: &PCTable,
    edges: &EdgeMaps,
    options: &Options,
    pc: u64,
) -> Result<()> {
    let Some(site) = edges.jumps.get(&pc) else {
        return Ok(());
    };
    for jump in &site.targets {
        let target_func = table
            .get(jump.target_pc)
            .map(|r| r.func.as_str())
            .unwrap_or("unknown");
        write!(out, "jump=")?;
        if options.dump_instr {
            write!(out, "0x{:x}", jump.target_pc)?;
        }
        writeln!(out, "/{} {}", target_func, jump.count)?;
    }
    Ok(())
}

fn instr_pos(options: &Options, pc: u64) -> String {
    if options.dump_instr {
        format!("0x{:x} ", pc)
    } else {
        String::new()
    }
}

fn line_of(table: &PCTable, pc: u64) -> u32 {
    table.get(pc).map(|r| r.line).unwrap_or(0)
}

fn sum_events(table: &PCTable, num_events: usize) -> Vec<u64> {
    let mut totals = vec![0u64; num_events];
    for (_, rec) in table.iter() {
        for (i, total) in totals.iter_mut().enumerate() {
            *total += rec.events[i];
        }
    }
    totals
}

/// Write the report to `path` via a sibling temp file and an atomic rename,
/// so no partial content is ever visible at the final path.
pub fn write_output(
    path: &Path,
    table: &PCTable,
    edges: &EdgeMaps,
    options: &Options,
    part: u32,
) -> Result<()> {
    let tmp = temp_path(path);
    let file = fs::File::create(&tmp)?;
    let mut writer = BufWriter::new(file);
    let written = write_report(&mut writer, table, edges, options, part)
        .and_then(|()| writer.flush().map_err(Into::into));
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    drop(writer);
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    debug!(path = %path.display(), "callgrind output written");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}
