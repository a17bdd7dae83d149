use crate::config::CollisionPolicy;
use crate::error::MoveError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved(PathBuf),
    /// Destination was occupied and the policy is `skip`. Holds the occupied path.
    Skipped(PathBuf),
}

/// Relocates files into `<root>/<category>`.
#[derive(Debug, Clone)]
pub struct Mover {
    root: PathBuf,
    policy: CollisionPolicy,
}

impl Mover {
    pub fn new(root: impl Into<PathBuf>, policy: CollisionPolicy) -> Self {
        Self {
            root: root.into(),
            policy,
        }
    }

    pub fn category_dir(&self, category: &str) -> PathBuf {
        self.root.join(category)
    }

    pub fn move_file(&self, source: &Path, category: &str) -> Result<MoveOutcome, MoveError> {
        let dest_dir = self.category_dir(category);
        let file_name = source.file_name().ok_or_else(|| MoveError::Io {
            path: source.to_path_buf(),
            destination: dest_dir.clone(),
            error: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        })?;
        let mut destination = dest_dir.join(file_name);

        fs::create_dir_all(&dest_dir).map_err(|error| MoveError::Io {
            path: source.to_path_buf(),
            destination: dest_dir.clone(),
            error,
        })?;

        if exists(&destination) {
            match self.policy {
                CollisionPolicy::Fail => {
                    return Err(MoveError::DestinationExists {
                        path: source.to_path_buf(),
                        destination,
                    });
                }
                CollisionPolicy::Skip => {
                    debug!("Skipping {}: {} exists", source.display(), destination.display());
                    return Ok(MoveOutcome::Skipped(destination));
                }
                CollisionPolicy::Rename => {
                    destination = next_free_name(&dest_dir, Path::new(file_name));
                }
                CollisionPolicy::Overwrite => {
                    warn!("Overwriting {}", destination.display());
                }
            }
        }

        match fs::rename(source, &destination) {
            Ok(()) => {
                debug!("Moved {} -> {}", source.display(), destination.display());
                Ok(MoveOutcome::Moved(destination))
            }
            Err(error) if is_cross_device(&error) => Err(MoveError::CrossDevice {
                path: source.to_path_buf(),
                destination,
            }),
            Err(error) => Err(MoveError::Io {
                path: source.to_path_buf(),
                destination,
                error,
            }),
        }
    }
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// First `stem (N).ext` in `dir` that is not taken, starting at N = 1.
fn next_free_name(dir: &Path, file_name: &Path) -> PathBuf {
    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = file_name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut n = 1u32;
    loop {
        let candidate = dir.join(format!("{} ({}){}", stem, n, extension));
        if !exists(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(unix)]
fn is_cross_device(error: &io::Error) -> bool {
    // EXDEV
    error.raw_os_error() == Some(18)
}

#[cfg(windows)]
fn is_cross_device(error: &io::Error) -> bool {
    // ERROR_NOT_SAME_DEVICE
    error.raw_os_error() == Some(17)
}

#[cfg(not(any(unix, windows)))]
fn is_cross_device(_error: &io::Error) -> bool {
    false
}
