use crate::error::PerFileError;
use glob::Pattern;
use std::io;
use std::path::{Path, PathBuf};
use tracing::error;
use walkdir::{DirEntry, WalkDir};

/// Paths the walk must never yield or descend into.
#[derive(Debug, Default)]
pub struct WalkFilter {
    /// Category destination folders directly under the root.
    pub skip_dirs: Vec<PathBuf>,
    /// Files owned by the tool itself (registry, report).
    pub skip_files: Vec<PathBuf>,
    pub ignore_patterns: Vec<Pattern>,
}

impl WalkFilter {
    /// Compile glob ignore patterns, logging and dropping invalid ones.
    pub fn with_ignore_globs(mut self, ignore_globs: &[String]) -> Self {
        self.ignore_patterns = ignore_globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();
        self
    }

    fn allows(&self, entry: &DirEntry) -> bool {
        let path = entry.path();
        if entry.file_type().is_dir() && self.skip_dirs.iter().any(|d| d == path) {
            return false;
        }
        if self.skip_files.iter().any(|f| f == path) {
            return false;
        }
        !self
            .ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(path))
    }
}

/// Depth-first walk of `root` yielding regular files, sorted by name within
/// each directory. Symlinks are not followed and are not yielded.
///
/// Directory listings are read in full before their entries are yielded, so
/// callers may move yielded files away while iteration continues.
pub fn walk_files<'a>(
    root: &Path,
    filter: &'a WalkFilter,
) -> impl Iterator<Item = Result<PathBuf, PerFileError>> + 'a {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| entry.depth() == 0 || filter.allows(entry))
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
            Ok(_) => None,
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                let io_err = err
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop"));
                Some(Err(PerFileError::from_io(&path, io_err)))
            }
        })
}
