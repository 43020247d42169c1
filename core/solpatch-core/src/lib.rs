//! solpatch-core: points a vendored Solidity checkout's CMake files at itself.
//!
//! The Solidity sources live in a `solidity/` submodule, but their
//! `CMakeLists.txt` files refer to `${CMAKE_SOURCE_DIR}` as if Solidity were
//! the top-level project. This crate finds those files and rewrites each
//! `${CMAKE_SOURCE_DIR}` into `${CMAKE_SOURCE_DIR}/solidity`.
//!
//! ## Pipeline
//!
//! - [`discovery`] walks the roots and collects every file named exactly
//!   `CMakeLists.txt`
//! - [`rewrite`] holds the single substitution rule, applied per line
//! - [`patch`] rewrites one file in place through a temp file and an atomic rename
//! - [`output`] renders the per-file reports as JSON or NDJSON
//!
//! Occurrences already followed by `/solidity` are never touched, so running
//! the patcher again is a no-op.
//!
//! ```rust,no_run
//! use solpatch_core::{run, PatchOptions};
//!
//! let report = run(&["solidity"], &PatchOptions::default())?;
//! println!("patched {} of {} files", report.patches.len(), report.scanned);
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

pub mod discovery;
pub mod output;
pub mod patch;
pub mod rewrite;

use crate::discovery::{CMakeDiscovery, PathDiscovery};
use crate::patch::{patch_file, FilePatch};
use crate::rewrite::SourceDirRewrite;

/// File name of the build files that get patched.
pub const CMAKE_LISTS: &str = "CMakeLists.txt";
/// The CMake variable being redirected.
pub const SOURCE_DIR_VAR: &str = "${CMAKE_SOURCE_DIR}";
/// Directory the submodule is checked out into, relative to the repo root.
pub const SUBMODULE_DIR: &str = "solidity";
/// What every unpatched `${CMAKE_SOURCE_DIR}` becomes.
pub const REPLACEMENT: &str = "${CMAKE_SOURCE_DIR}/solidity";

#[derive(Debug, Default, Clone)]
pub struct PatchOptions {
    pub follow_symlinks: bool,
    pub dry_run: bool,
}

/// Outcome of a whole run.
#[derive(Debug, Default, Clone)]
pub struct PatchReport {
    /// Number of `CMakeLists.txt` files visited.
    pub scanned: usize,
    /// Files with at least one replacement, in traversal order.
    pub patches: Vec<FilePatch>,
}

impl PatchReport {
    pub fn total_replacements(&self) -> usize {
        self.patches.iter().map(|p| p.replacements).sum()
    }
}

/// Default patch root for a repository checkout: `<repo_root>/solidity`.
pub fn default_root(repo_root: impl AsRef<Path>) -> PathBuf {
    repo_root.as_ref().join(SUBMODULE_DIR)
}

/// Patch every `CMakeLists.txt` below `roots`, one file at a time.
///
/// The first error aborts the run. Files patched before it stay patched.
pub fn run<P: AsRef<Path>>(roots: &[P], opts: &PatchOptions) -> Result<PatchReport> {
    let rule = SourceDirRewrite::new()?;
    let discovery = PathDiscovery::new(roots.iter().map(|p| p.as_ref().to_path_buf()))
        .follow_symlinks(opts.follow_symlinks);
    let files = discovery.discover()?;

    let mut report = PatchReport {
        scanned: files.len(),
        patches: Vec::new(),
    };

    for file in &files {
        let patched = patch_file(&file.path, &rule, opts.dry_run)?;
        if patched.replacements > 0 {
            report.patches.push(patched);
        }
    }

    debug!(
        scanned = report.scanned,
        patched = report.patches.len(),
        "run complete"
    );

    Ok(report)
}

/// Patch a single tree with default options.
pub fn patch_tree(root: impl AsRef<Path>) -> Result<PatchReport> {
    run(&[root], &PatchOptions::default())
}
