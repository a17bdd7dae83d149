use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One file visited during a walk. Never persisted.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Lowercased extension including the leading dot, if the name has one.
    pub extension: Option<String>,
    pub size: u64,
}

impl FileRecord {
    pub fn from_path(path: &Path) -> io::Result<FileRecord> {
        let metadata = fs::metadata(path)?;
        Ok(FileRecord::new(path.to_path_buf(), metadata.len()))
    }

    pub fn new(path: PathBuf, size: u64) -> FileRecord {
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()));
        FileRecord {
            path,
            extension,
            size,
        }
    }

    pub fn identity_key(&self) -> IdentityKey {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        IdentityKey {
            name,
            size: self.size,
        }
    }
}

/// Case-folded file name plus exact byte size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub name: String,
    pub size: u64,
}

/// Identity keys observed during a single scan. Dropped with the scan.
#[derive(Debug, Default)]
pub struct SeenSet {
    keys: HashSet<IdentityKey>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_duplicate(&self, key: &IdentityKey) -> bool {
        self.keys.contains(key)
    }

    pub fn record_seen(&mut self, key: IdentityKey) {
        self.keys.insert(key);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}
