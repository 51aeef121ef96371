//! The demo CLI binary (`spec.md` §6 "Exposed interfaces"): loads a JSON
//! snapshot fixture and runs one `<command> <set> [args...]` invocation
//! against it. `clap` only parses this outer shape; the Runner owns
//! parsing each set's own positionals.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use corewalker::cancel::CancelFlag;
use corewalker::config::AnalysisConfig;
use corewalker::fixture::SnapshotFixture;
use corewalker::roots::FixedRoots;
use corewalker::Session;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON snapshot fixture to load (see `corewalker::fixture`).
    #[arg(long)]
    snapshot: PathBuf,

    /// Visitor command name, e.g. "count", "list", "explain".
    command: String,

    /// Iterator set name, e.g. "allocations", "single", "chain".
    set: String,

    /// Positional arguments for the chosen set (e.g. an address for
    /// "single", an address and a link offset for "chain").
    positionals: Vec<String>,

    /// Overrides the `explain` visitor's per-kind anchor-chain cap.
    #[arg(long)]
    max_chains_per_kind: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let raw = fs::read_to_string(&args.snapshot)
        .with_context(|| format!("reading snapshot fixture {}", args.snapshot.display()))?;
    let fixture: SnapshotFixture =
        serde_json::from_str(&raw).with_context(|| "parsing snapshot fixture as JSON")?;
    let loaded = fixture
        .load()
        .with_context(|| "building session state from snapshot fixture")?;

    let mut config = AnalysisConfig::new(loaded.width, loaded.order);
    if let Some(cap) = args.max_chains_per_kind {
        config = config.max_chains_per_kind(cap);
    }

    let roots = loaded.roots;
    let session: Session<_, _, FixedRoots, FixedRoots, FixedRoots> = Session::new(
        loaded.finder,
        loaded.address_map,
        loaded.signatures,
        roots.clone(),
        roots.clone(),
        roots,
        config,
    );

    let report = session
        .run(&args.command, &args.set, &args.positionals, &CancelFlag::new())
        .with_context(|| format!("running \"{} {}\"", args.command, args.set))?;
    print!("{report}");
    Ok(())
}
