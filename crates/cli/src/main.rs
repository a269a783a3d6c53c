//! simgrind frontend v0.3.0.
//!
//! Offline callgrind profile generation: loads an `objdump -d -l` listing
//! and a per-instruction event trace dumped by the simulator, reconstructs
//! the control flow, and writes a callgrind-compatible report.
//!
//! ```text
//! simgrind app.dis app.trace -o callgrind.out.app
//! ```
//!
//! Long simulations can be cut into parts: pass `--checkpoint` to save the
//! profiling state after a run and `--resume` to continue from it; each
//! resumed run advances the `part:` number in the report header.
//!
//! Diagnostics go to stderr and are controlled with `RUST_LOG`
//! (e.g. `RUST_LOG=simgrind_core=debug`).

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use simgrind_core::{checkpoint, objdump, trace, FlowTracker, Options, Result};
use tracing_subscriber::EnvFilter;

fn print_usage(program: &str) {
    eprintln!("Usage: {} <disasm> <trace> [options]", program);
    eprintln!();
    eprintln!("Inputs:");
    eprintln!("  <disasm>   objdump -d -l listing of the simulated binary");
    eprintln!("  <trace>    per-instruction event trace from the simulator");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o, --output <file>      output path (default: callgrind.out.<pid>)");
    eprintln!("      --events <n>         number of event counters to emit (default: 2)");
    eprintln!("      --event-names <l>    comma-separated event names in counter order");
    eprintln!("      --no-instr           omit instruction addresses from positions");
    eprintln!("      --no-branch-sim      do not derive branch-prediction counters");
    eprintln!("      --no-jumps           do not record branch/jump edges");
    eprintln!("      --creator <name>     creator field in the report header");
    eprintln!("      --cmd <text>         cmd field in the report header");
    eprintln!("      --resume <file>      restore profiling state from a checkpoint");
    eprintln!("      --checkpoint <file>  save profiling state after the run");
    eprintln!("  -h, --help               show this help");
}

struct Cli {
    disasm: PathBuf,
    trace: PathBuf,
    output: PathBuf,
    resume: Option<PathBuf>,
    checkpoint: Option<PathBuf>,
    options: Options,
}

fn parse_args(args: &[String]) -> std::result::Result<Cli, String> {
    let mut options = Options::default();
    let mut positionals: Vec<String> = Vec::new();
    let mut output: Option<PathBuf> = None;
    let mut resume: Option<PathBuf> = None;
    let mut checkpoint: Option<PathBuf> = None;
    let mut num_events: Option<usize> = None;
    let mut names_set = false;

    fn take_value(args: &[String], i: &mut usize, name: &str) -> std::result::Result<String, String> {
        *i += 1;
        args.get(*i)
            .cloned()
            .ok_or_else(|| format!("{} requires a value", name))
    }

    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-o" | "--output" => output = Some(PathBuf::from(take_value(args, &mut i, arg)?)),
            "--events" => {
                num_events = Some(
                    take_value(args, &mut i, arg)?
                        .parse()
                        .map_err(|_| "--events expects a number".to_owned())?,
                )
            }
            "--event-names" => {
                options.event_names = take_value(args, &mut i, arg)?
                    .split(',')
                    .map(|s| s.trim().to_owned())
                    .filter(|s| !s.is_empty())
                    .collect();
                names_set = true;
            }
            "--no-instr" => options.dump_instr = false,
            "--no-branch-sim" => options.branch_sim = false,
            "--no-jumps" => options.collect_jumps = false,
            "--creator" => options.creator = take_value(args, &mut i, arg)?,
            "--cmd" => options.command = take_value(args, &mut i, arg)?,
            "--resume" => resume = Some(PathBuf::from(take_value(args, &mut i, arg)?)),
            "--checkpoint" => checkpoint = Some(PathBuf::from(take_value(args, &mut i, arg)?)),
            "-h" | "--help" => return Err(String::new()),
            flag if flag.starts_with('-') => {
                return Err(format!("unknown option `{}`", flag));
            }
            _ => positionals.push(args[i].clone()),
        }
        i += 1;
    }

    if positionals.len() != 2 {
        return Err(format!(
            "expected 2 inputs (disassembly, trace), got {}",
            positionals.len()
        ));
    }

    options.num_events = match num_events {
        Some(n) => n,
        // An explicit name list implies emitting all of it
        None if names_set => options.event_names.len(),
        None => options.num_events,
    };

    Ok(Cli {
        disasm: PathBuf::from(&positionals[0]),
        trace: PathBuf::from(&positionals[1]),
        output: output
            .unwrap_or_else(|| PathBuf::from(format!("callgrind.out.{}", process::id()))),
        resume,
        checkpoint,
        options,
    })
}

fn run(cli: &Cli) -> Result<()> {
    let mut tracker = FlowTracker::new(cli.options.clone());

    let listing = fs::read_to_string(&cli.disasm)?;
    let loaded = objdump::load_disassembly(&listing, tracker.table_mut())?;

    if let Some(path) = &cli.resume {
        let state = checkpoint::load_from_file(path)?;
        tracker.restore_state(state)?;
        eprintln!("Resumed from {} (part {})", path.display(), tracker.part());
    }

    let events = fs::read_to_string(&cli.trace)?;
    let replayed = trace::replay(&events, &mut tracker)?;

    tracker.write_output(&cli.output)?;

    if let Some(path) = &cli.checkpoint {
        checkpoint::save_to_file(&tracker, path)?;
        eprintln!("Checkpoint saved to {}", path.display());
    }

    eprintln!(
        "{} instructions replayed across {} loaded PCs, call stack depth {}",
        replayed,
        loaded,
        tracker.stack_depth()
    );
    println!("Callgrind output written to: {}", cli.output.display());
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("error: {}", msg);
                eprintln!();
            }
            print_usage(args.first().map(String::as_str).unwrap_or("simgrind"));
            process::exit(if msg.is_empty() { 0 } else { 1 });
        }
    };

    if let Err(err) = run(&cli) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}
