//! In-place patching of a single build file

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::rewrite::SourceDirRewrite;

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePatch {
    pub path: PathBuf,
    pub replacements: usize,
    pub lines_changed: usize,
    /// False for dry runs and for files that needed no change.
    pub written: bool,
}

/// Rewrite `path` with `rule`.
///
/// Files without an eligible occurrence are left untouched. With `dry_run`
/// the report is computed but nothing is written.
pub fn patch_file(path: &Path, rule: &SourceDirRewrite, dry_run: bool) -> Result<FilePatch> {
    let content = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let rewritten = rule.rewrite(&content);

    let mut report = FilePatch {
        path: path.to_path_buf(),
        replacements: rewritten.replacements,
        lines_changed: rewritten.lines_changed,
        written: false,
    };

    if !rewritten.is_changed() {
        debug!(path = %path.display(), "already patched");
        return Ok(report);
    }

    if dry_run {
        info!(
            path = %path.display(),
            replacements = report.replacements,
            "would patch"
        );
        return Ok(report);
    }

    replace_atomically(path, &rewritten.bytes)?;
    report.written = true;
    info!(
        path = %path.display(),
        replacements = report.replacements,
        "patched"
    );

    Ok(report)
}

/// Write `bytes` to a temp file beside `path`, then rename it over `path`.
///
/// The original keeps its permissions. If any step fails the original is
/// left as it was and the temp file is removed on drop.
pub fn replace_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => return Err(anyhow!("no parent directory for {}", path.display())),
    };

    let permissions = fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .permissions();

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("failed to write temp file for {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("failed to flush temp file for {}", path.display()))?;
    fs::set_permissions(tmp.path(), permissions)
        .with_context(|| format!("failed to copy permissions to {}", tmp.path().display()))?;

    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to replace {}", path.display()))?;

    Ok(())
}
