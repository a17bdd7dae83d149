use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Persistence error: could not write {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Report error: could not write {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure to relocate a single file into its category folder.
#[derive(Error, Debug)]
pub enum MoveError {
    #[error("destination already exists: {}", destination.display())]
    DestinationExists { path: PathBuf, destination: PathBuf },

    #[error("cannot move {} to {}: different filesystems", path.display(), destination.display())]
    CrossDevice { path: PathBuf, destination: PathBuf },

    #[error("cannot move {} to {}: {error}", path.display(), destination.display())]
    Io {
        path: PathBuf,
        destination: PathBuf,
        error: io::Error,
    },
}

impl MoveError {
    pub fn path(&self) -> &Path {
        match self {
            MoveError::DestinationExists { path, .. }
            | MoveError::CrossDevice { path, .. }
            | MoveError::Io { path, .. } => path,
        }
    }
}

/// A non-fatal problem with one discovered path. Collected into the scan
/// report; never aborts the walk.
#[derive(Error, Debug)]
pub enum PerFileError {
    #[error("{} vanished during scan", path.display())]
    Vanished { path: PathBuf },

    #[error("cannot read {}: {error}", path.display())]
    Io { path: PathBuf, error: io::Error },

    #[error("{} is not valid UTF-8 and cannot be tracked", path.display())]
    NonUtf8Path { path: PathBuf },

    #[error(transparent)]
    Move(#[from] MoveError),
}

impl PerFileError {
    /// Classify an I/O failure on `path`, treating `NotFound` as a file that
    /// disappeared underneath us.
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::NotFound {
            PerFileError::Vanished {
                path: path.to_path_buf(),
            }
        } else {
            PerFileError::Io {
                path: path.to_path_buf(),
                error,
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            PerFileError::Vanished { path }
            | PerFileError::Io { path, .. }
            | PerFileError::NonUtf8Path { path } => path,
            PerFileError::Move(err) => err.path(),
        }
    }
}
