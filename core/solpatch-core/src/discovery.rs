//! CMakeLists.txt discovery helpers for solpatch-core

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::CMAKE_LISTS;

/// Path to a discovered `CMakeLists.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CMakeListsRef {
    pub path: PathBuf,
}

/// Trait for enumerating build files from some backing store.
pub trait CMakeDiscovery {
    fn discover(&self) -> Result<Vec<CMakeListsRef>>;
}

/// Recursive filesystem walker that collects every `CMakeLists.txt` below its roots.
#[derive(Debug, Clone)]
pub struct PathDiscovery {
    roots: Vec<PathBuf>,
    follow_symlinks: bool,
}

impl PathDiscovery {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let roots = roots.into_iter().map(Into::into).collect();
        Self {
            roots,
            follow_symlinks: false,
        }
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

impl CMakeDiscovery for PathDiscovery {
    fn discover(&self) -> Result<Vec<CMakeListsRef>> {
        let mut found = Vec::new();

        for root in &self.roots {
            // A missing root walks as empty; any other stat failure is fatal.
            match fs::metadata(root) {
                Ok(_) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    warn!(root = %root.display(), "root path does not exist, nothing to patch");
                    continue;
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("failed to stat {}", root.display()))
                }
            }

            let walker = WalkDir::new(root)
                .follow_links(self.follow_symlinks)
                .sort_by_file_name();

            for entry in walker {
                // walkdir's message already names the entry and the io error.
                let entry =
                    entry.map_err(|err| anyhow!("failed to walk {}: {err}", root.display()))?;
                if entry.file_type().is_file() && is_cmake_lists(entry.path()) {
                    debug!(path = %entry.path().display(), "found build file");
                    found.push(CMakeListsRef {
                        path: entry.path().to_path_buf(),
                    });
                }
            }
        }

        Ok(found)
    }
}

/// Collect every `CMakeLists.txt` below `root`. A missing root yields nothing.
pub fn locate_cmake_files(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let found = PathDiscovery::new([root.as_ref()]).discover()?;
    Ok(found.into_iter().map(|f| f.path).collect())
}

fn is_cmake_lists(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == CMAKE_LISTS)
}
