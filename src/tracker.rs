use crate::error::{Error, PerFileError};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

/// Result of one sweep over the registry.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Files deleted from disk and dropped from the registry.
    pub deleted: Vec<PathBuf>,
    /// Expired entries whose file was already gone. Dropped from the registry.
    pub vanished: Vec<PathBuf>,
    /// Expired entries that could not be deleted. Kept for a later sweep.
    pub failed: Vec<PerFileError>,
}

/// First-seen timestamps for unclassified files, persisted as a flat JSON
/// object of `"<absolute path>": <unix seconds>`.
///
/// The whole registry is held in memory and rewritten on every save, which
/// is fine for the few hundred entries a downloads folder produces.
#[derive(Debug)]
pub struct UnknownTracker {
    path: PathBuf,
    entries: BTreeMap<PathBuf, i64>,
    dirty: bool,
}

impl UnknownTracker {
    /// Load the registry at `path`. Missing, unreadable or corrupt files all
    /// yield an empty registry.
    pub fn load(path: impl Into<PathBuf>) -> UnknownTracker {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => parse_registry(&path, &text),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No registry at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(err) => {
                warn!("Cannot read registry {}: {}; starting empty", path.display(), err);
                BTreeMap::new()
            }
        };
        debug!("Loaded {} unknown-file entries", entries.len());
        UnknownTracker {
            path,
            entries,
            dirty: false,
        }
    }

    /// Record `file` as first seen at `now`. An existing timestamp is kept.
    /// Returns true if a new entry was added.
    ///
    /// Registry keys are JSON strings, so a path that is not valid UTF-8 is
    /// refused rather than poisoning the next save.
    pub fn mark_seen(&mut self, file: &Path, now: i64) -> Result<bool, PerFileError> {
        if file.to_str().is_none() {
            return Err(PerFileError::NonUtf8Path {
                path: file.to_path_buf(),
            });
        }
        if self.entries.contains_key(file) {
            return Ok(false);
        }
        self.entries.insert(file.to_path_buf(), now);
        self.dirty = true;
        Ok(true)
    }

    pub fn first_seen(&self, file: &Path) -> Option<i64> {
        self.entries.get(file).copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Path, i64)> {
        self.entries.iter().map(|(p, t)| (p.as_path(), *t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Delete every tracked file whose age is at least `retention_secs`.
    pub fn sweep_expired(&mut self, now: i64, retention_secs: i64) -> SweepReport {
        let mut report = SweepReport::default();

        let expired: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|(_, first_seen)| now.saturating_sub(**first_seen) >= retention_secs)
            .map(|(path, _)| path.clone())
            .collect();

        for path in expired {
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!("Deleted unknown file: {}", path.display());
                    self.entries.remove(&path);
                    report.deleted.push(path);
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    warn!("Unknown file '{}' no longer exists, forgetting it", path.display());
                    self.entries.remove(&path);
                    report.vanished.push(path);
                }
                Err(err) => {
                    error!("Error deleting {}: {}", path.display(), err);
                    if fs::symlink_metadata(&path).is_err() {
                        self.entries.remove(&path);
                        report.vanished.push(path);
                    } else {
                        report.failed.push(PerFileError::from_io(&path, err));
                    }
                }
            }
        }

        if !report.deleted.is_empty() || !report.vanished.is_empty() {
            self.dirty = true;
        }
        report
    }

    /// Write the registry through a temporary file in the same directory and
    /// rename it over the old one.
    pub fn save(&mut self) -> Result<(), Error> {
        self.write_atomic().map_err(|source| Error::Persistence {
            path: self.path.clone(),
            source,
        })?;
        self.dirty = false;
        debug!("Saved {} unknown-file entries to {}", self.entries.len(), self.path.display());
        Ok(())
    }

    fn write_atomic(&self) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut object = Map::new();
        for (path, first_seen) in &self.entries {
            let key = path.to_str().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("path is not valid UTF-8: {}", path.display()),
                )
            })?;
            object.insert(key.to_string(), Value::from(*first_seen));
        }

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, &Value::Object(object))?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn parse_registry(path: &Path, text: &str) -> BTreeMap<PathBuf, i64> {
    let mut entries = BTreeMap::new();

    let object = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => object,
        Ok(_) => {
            warn!("Registry {} is not a JSON object; starting empty", path.display());
            return entries;
        }
        Err(err) => {
            warn!("Registry {} is corrupt ({}); starting empty", path.display(), err);
            return entries;
        }
    };

    for (key, value) in object {
        match value.as_i64().or_else(|| value.as_f64().map(|t| t as i64)) {
            Some(first_seen) => {
                entries.insert(PathBuf::from(key), first_seen);
            }
            None => warn!("Skipping corrupt registry entry for {}: {}", key, value),
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const DAY: i64 = 86_400;

    #[test]
    fn test_mark_seen_keeps_first_timestamp() {
        let tmp = tempdir().unwrap();
        let mut tracker = UnknownTracker::load(tmp.path().join("reg.json"));
        let file = tmp.path().join("b.xyz");

        assert!(tracker.mark_seen(&file, 1_000).unwrap());
        assert!(!tracker.mark_seen(&file, 2_000).unwrap());
        assert_eq!(tracker.first_seen(&file), Some(1_000));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_corrupt_registry_loads_empty() {
        let tmp = tempdir().unwrap();
        let reg = tmp.path().join("reg.json");

        fs::write(&reg, "{ not json").unwrap();
        assert!(UnknownTracker::load(&reg).is_empty());

        fs::write(&reg, "").unwrap();
        assert!(UnknownTracker::load(&reg).is_empty());

        fs::write(&reg, "[1, 2, 3]").unwrap();
        assert!(UnknownTracker::load(&reg).is_empty());
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let tmp = tempdir().unwrap();
        let reg = tmp.path().join("reg.json");
        fs::write(
            &reg,
            r#"{"/a/one.xyz": 1700000000.75, "/a/two.xyz": "yesterday", "/a/three.xyz": 1700000100}"#,
        )
        .unwrap();

        let tracker = UnknownTracker::load(&reg);
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.first_seen(Path::new("/a/one.xyz")), Some(1_700_000_000));
        assert_eq!(tracker.first_seen(Path::new("/a/three.xyz")), Some(1_700_000_100));
    }

    #[test]
    fn test_save_and_reload() {
        let tmp = tempdir().unwrap();
        let reg = tmp.path().join("state").join("reg.json");
        let mut tracker = UnknownTracker::load(&reg);
        tracker.mark_seen(Path::new("/dl/a.xyz"), 10).unwrap();
        tracker.mark_seen(Path::new("/dl/b.bin"), 20).unwrap();
        tracker.save().unwrap();
        assert!(!tracker.is_dirty());

        let reloaded = UnknownTracker::load(&reg);
        let original: Vec<_> = tracker.entries().collect();
        let restored: Vec<_> = reloaded.entries().collect();
        assert_eq!(original, restored);
    }

    #[test]
    fn test_sweep_only_touches_expired() {
        let tmp = tempdir().unwrap();
        let now = 10 * DAY;
        let old = tmp.path().join("old.xyz");
        let edge = tmp.path().join("edge.xyz");
        let young = tmp.path().join("young.xyz");
        for f in [&old, &edge, &young] {
            fs::write(f, b"x").unwrap();
        }

        let mut tracker = UnknownTracker::load(tmp.path().join("reg.json"));
        tracker.mark_seen(&old, now - 4 * DAY).unwrap();
        tracker.mark_seen(&edge, now - 3 * DAY).unwrap();
        tracker.mark_seen(&young, now - 3 * DAY + 1).unwrap();

        let report = tracker.sweep_expired(now, 3 * DAY);
        assert_eq!(report.deleted.len(), 2);
        assert!(!old.exists());
        assert!(!edge.exists());
        assert!(young.exists());
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.first_seen(&young), Some(now - 3 * DAY + 1));
    }

    #[test]
    fn test_sweep_forgets_missing_files() {
        let tmp = tempdir().unwrap();
        let gone = tmp.path().join("gone.xyz");
        let mut tracker = UnknownTracker::load(tmp.path().join("reg.json"));
        tracker.mark_seen(&gone, 0).unwrap();

        let report = tracker.sweep_expired(5 * DAY, 3 * DAY);
        assert!(report.deleted.is_empty());
        assert_eq!(report.vanished, vec![gone]);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_sweep_keeps_entry_when_delete_fails() {
        let tmp = tempdir().unwrap();
        // remove_file refuses directories, so the path survives the sweep
        let stuck = tmp.path().join("stuck.xyz");
        fs::create_dir(&stuck).unwrap();
        let mut tracker = UnknownTracker::load(tmp.path().join("reg.json"));
        tracker.mark_seen(&stuck, 0).unwrap();

        let report = tracker.sweep_expired(5 * DAY, 3 * DAY);
        assert!(report.deleted.is_empty());
        assert!(report.vanished.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path(), stuck.as_path());
        assert!(stuck.exists());
        assert_eq!(tracker.first_seen(&stuck), Some(0));
        assert!(!tracker.is_dirty());
    }

    #[cfg(unix)]
    #[test]
    fn test_sweep_keeps_entry_in_read_only_dir() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir().unwrap();
        let locked = tmp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        let file = locked.join("held.xyz");
        fs::write(&file, b"x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // Permission bits do not bind a privileged user.
        let canary = locked.join("canary");
        if fs::write(&canary, b"").is_ok() {
            let _ = fs::remove_file(&canary);
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let mut tracker = UnknownTracker::load(tmp.path().join("reg.json"));
        tracker.mark_seen(&file, 0).unwrap();
        let report = tracker.sweep_expired(5 * DAY, 3 * DAY);

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert!(file.exists());
        assert_eq!(tracker.first_seen(&file), Some(0));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_is_refused() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = tempdir().unwrap();
        let reg = tmp.path().join("reg.json");
        let bad = tmp.path().join(OsStr::from_bytes(b"bad\xff.xyz"));
        let mut tracker = UnknownTracker::load(&reg);

        let err = tracker.mark_seen(&bad, 1).unwrap_err();
        assert!(matches!(err, PerFileError::NonUtf8Path { .. }));
        assert!(tracker.is_empty());
        assert!(!tracker.is_dirty());

        tracker.mark_seen(&tmp.path().join("ok.xyz"), 1).unwrap();
        tracker.save().unwrap();
        assert_eq!(UnknownTracker::load(&reg).len(), 1);
    }
}
