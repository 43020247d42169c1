//! solpatch CLI

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, ValueHint};
use tracing_subscriber::EnvFilter;

use solpatch_core::output::{write_json_pretty, write_ndjson};
use solpatch_core::patch::FilePatch;
use solpatch_core::{default_root, run as run_patch, PatchOptions, PatchReport};

/// Rewrite `${CMAKE_SOURCE_DIR}` to `${CMAKE_SOURCE_DIR}/solidity` in every
/// CMakeLists.txt of the vendored solidity submodule.
#[derive(Debug, Parser)]
#[command(name = "solpatch", version)]
pub struct Cli {
    /// Trees to patch (defaults to <repo-root>/solidity)
    #[arg(value_hint = ValueHint::DirPath, conflicts_with = "repo_root")]
    paths: Vec<PathBuf>,

    /// Repository checkout containing the solidity submodule
    #[arg(long = "repo-root", value_hint = ValueHint::DirPath)]
    repo_root: Option<PathBuf>,

    /// Follow symlinks while walking paths
    #[arg(long = "follow-symlinks", action = ArgAction::SetTrue)]
    follow_symlinks: bool,

    /// Report what would change without writing
    #[arg(short = 'n', long = "dry-run", action = ArgAction::SetTrue)]
    dry_run: bool,

    /// Fail if any file still needs patching (implies --dry-run)
    #[arg(long = "check", action = ArgAction::SetTrue)]
    check: bool,

    /// Print the path of every patched file
    #[arg(short = 'l', long = "list", action = ArgAction::SetTrue)]
    list: bool,

    /// Emit the report as a single JSON array
    #[arg(long = "json", action = ArgAction::SetTrue, conflicts_with = "ndjson")]
    json: bool,

    /// Emit the report as newline-delimited JSON
    #[arg(long = "ndjson", action = ArgAction::SetTrue)]
    ndjson: bool,
}

/// Parse CLI args and patch the selected trees.
pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    execute(&cli, &mut handle)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Already installed when called twice in one process; keep the first.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn execute(cli: &Cli, out: impl Write) -> Result<()> {
    let roots = resolve_roots(cli);
    let opts = PatchOptions {
        follow_symlinks: cli.follow_symlinks,
        dry_run: cli.dry_run || cli.check,
    };

    let report = run_patch(&roots, &opts)?;
    write_report(cli, &report.patches, out)?;

    if cli.check && !report.patches.is_empty() {
        return Err(pending_error(&report));
    }

    Ok(())
}

fn resolve_roots(cli: &Cli) -> Vec<PathBuf> {
    if !cli.paths.is_empty() {
        return cli.paths.clone();
    }

    let repo_root = cli
        .repo_root
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    vec![default_root(repo_root)]
}

fn write_report(cli: &Cli, patches: &[FilePatch], mut w: impl Write) -> Result<()> {
    if cli.ndjson {
        write_ndjson(patches, &mut w)?;
    } else if cli.json {
        write_json_pretty(patches, &mut w)?;
    } else if cli.list {
        write_plain(patches, &mut w)?;
    }
    Ok(())
}

fn write_plain(patches: &[FilePatch], mut w: impl Write) -> Result<()> {
    for item in patches {
        writeln!(w, "{}", item.path.display())?;
    }
    Ok(())
}

fn pending_error(report: &PatchReport) -> anyhow::Error {
    let files = report.patches.len();
    anyhow!(
        "{files} file{} still reference{} ${{CMAKE_SOURCE_DIR}} outside the submodule ({} occurrence{})",
        if files == 1 { "" } else { "s" },
        if files == 1 { "s" } else { "" },
        report.total_replacements(),
        if report.total_replacements() == 1 { "" } else { "s" },
    )
}
