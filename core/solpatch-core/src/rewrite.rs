//! The `${CMAKE_SOURCE_DIR}` rewrite rule

use std::borrow::Cow;

use anyhow::Result;
use regex::bytes::Regex;

use crate::{REPLACEMENT, SOURCE_DIR_VAR, SUBMODULE_DIR};

/// Result of rewriting a whole buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub bytes: Vec<u8>,
    pub replacements: usize,
    pub lines_changed: usize,
}

impl Rewritten {
    pub fn is_changed(&self) -> bool {
        self.replacements > 0
    }
}

/// Rewrites `${CMAKE_SOURCE_DIR}` to `${CMAKE_SOURCE_DIR}/solidity`, leaving
/// occurrences that already point into the submodule alone.
#[derive(Debug, Clone)]
pub struct SourceDirRewrite {
    pattern: Regex,
    guard: Vec<u8>,
}

impl SourceDirRewrite {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(&regex::escape(SOURCE_DIR_VAR))?;
        let guard = format!("/{SUBMODULE_DIR}").into_bytes();
        Ok(Self { pattern, guard })
    }

    /// Rewrite every eligible occurrence in `line`.
    ///
    /// An occurrence is eligible when the bytes after it do not start with
    /// `/solidity`, the equivalent of the lookahead `(?!/solidity)` which the
    /// `regex` crate does not support. Returns the line and the number of
    /// substitutions made; untouched lines come back borrowed.
    pub fn rewrite_line<'a>(&self, line: &'a [u8]) -> (Cow<'a, [u8]>, usize) {
        let mut out = Vec::new();
        let mut last = 0;
        let mut count = 0;

        for m in self.pattern.find_iter(line) {
            if line[m.end()..].starts_with(&self.guard) {
                continue;
            }
            out.extend_from_slice(&line[last..m.start()]);
            out.extend_from_slice(REPLACEMENT.as_bytes());
            last = m.end();
            count += 1;
        }

        if count == 0 {
            return (Cow::Borrowed(line), 0);
        }

        out.extend_from_slice(&line[last..]);
        (Cow::Owned(out), count)
    }

    /// Rewrite `content` line by line, keeping each line's terminator.
    pub fn rewrite(&self, content: &[u8]) -> Rewritten {
        let mut bytes = Vec::with_capacity(content.len());
        let mut replacements = 0;
        let mut lines_changed = 0;

        for line in content.split_inclusive(|b| *b == b'\n') {
            let (rewritten, count) = self.rewrite_line(line);
            if count > 0 {
                replacements += count;
                lines_changed += 1;
            }
            bytes.extend_from_slice(&rewritten);
        }

        Rewritten {
            bytes,
            replacements,
            lines_changed,
        }
    }
}
