use crate::classifier::CategoryTable;
use crate::config::AppConfig;
use crate::dupes::{FileRecord, SeenSet};
use crate::error::{Error, PerFileError};
use crate::mover::{MoveOutcome, Mover};
use crate::progress::ProgressReporter;
use crate::report::{self, ScanReport};
use crate::scanner::{self, WalkFilter};
use crate::tracker::{SweepReport, UnknownTracker};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct Organizer {
    config: AppConfig,
    table: CategoryTable,
}

impl Organizer {
    pub fn new(config: AppConfig) -> Self {
        let table = CategoryTable::from_config(&config.categories);
        Self { config, table }
    }

    /// Organize the source root using the current wall-clock time.
    pub fn organize(&self, reporter: &dyn ProgressReporter) -> Result<ScanReport, Error> {
        self.organize_at(now(), reporter)
    }

    /// Walk the source root once, moving recognised files into their category
    /// folders and tracking the rest, then persist the registry and write the
    /// report. `now` is the first-seen timestamp given to new unknown files.
    pub fn organize_at(
        &self,
        now: i64,
        reporter: &dyn ProgressReporter,
    ) -> Result<ScanReport, Error> {
        let root = self.validate_root()?;
        let registry_path = resolve(&self.config.registry_path());
        let report_path = resolve(&self.config.report_path());
        info!("Organizing {}", root.display());

        let mut tracker = UnknownTracker::load(&registry_path);
        let mover = Mover::new(&root, self.config.collision_policy);
        let filter = WalkFilter {
            skip_dirs: self.table.names().map(|name| root.join(name)).collect(),
            skip_files: vec![registry_path, report_path.clone()],
            ..Default::default()
        }
        .with_ignore_globs(&self.config.ignore_patterns);

        reporter.on_scan_start(&root);
        let scan_start = Instant::now();
        let mut report = ScanReport::new(&self.table);
        let mut seen = SeenSet::new();

        for item in scanner::walk_files(&root, &filter) {
            match item {
                Ok(path) => {
                    report.total_files_seen += 1;
                    reporter.on_scan_progress(report.total_files_seen, &path);
                    self.process_file(&path, now, &mover, &mut seen, &mut tracker, &mut report);
                }
                Err(err) => {
                    warn!("{}", err);
                    report.errors.push(err);
                }
            }
        }

        let scan_duration = scan_start.elapsed();
        reporter.on_scan_complete(report.total_files_seen, scan_duration.as_secs_f64());
        debug!(
            "Walk completed in {:.2}s: {} files, {} moved, {} duplicates, {} unknown",
            scan_duration.as_secs_f64(),
            report.total_files_seen,
            report.total_moved(),
            report.duplicates.len(),
            report.unknown.len(),
        );

        if tracker.is_dirty() {
            tracker.save()?;
        }

        let text = report::render(&report);
        report::write_report(&report_path, &text).map_err(|source| Error::Report {
            path: report_path.clone(),
            source,
        })?;
        info!("Report saved to {}", report_path.display());

        Ok(report)
    }

    fn process_file(
        &self,
        path: &Path,
        now: i64,
        mover: &Mover,
        seen: &mut SeenSet,
        tracker: &mut UnknownTracker,
        report: &mut ScanReport,
    ) {
        let record = match FileRecord::from_path(path) {
            Ok(record) => record,
            Err(err) => {
                let err = PerFileError::from_io(path, err);
                warn!("{}", err);
                report.errors.push(err);
                return;
            }
        };

        let key = record.identity_key();
        if seen.is_duplicate(&key) {
            debug!("Duplicate: {}", path.display());
            report.duplicates.push(record.path);
            return;
        }
        seen.record_seen(key);

        let category = record
            .extension
            .as_deref()
            .and_then(|ext| self.table.classify(ext));

        match category {
            Some(category) => match mover.move_file(&record.path, &category.name) {
                Ok(MoveOutcome::Moved(_)) => report.tally_moved(&category.name),
                Ok(MoveOutcome::Skipped(_)) => report.skipped.push(record.path),
                Err(err) => {
                    warn!("{}", err);
                    report.errors.push(err.into());
                }
            },
            None => match tracker.mark_seen(&record.path, now) {
                Ok(added) => {
                    if added {
                        debug!("Tracking unknown file: {}", path.display());
                    }
                    report.unknown.push(record.path);
                }
                Err(err) => {
                    warn!("{}", err);
                    report.errors.push(err);
                }
            },
        }
    }

    /// Sweep expired unknown files using the current wall-clock time.
    pub fn sweep(&self, reporter: &dyn ProgressReporter) -> Result<SweepReport, Error> {
        self.sweep_at(now(), reporter)
    }

    /// Delete unknown files tracked for at least the retention window and
    /// persist the pruned registry.
    pub fn sweep_at(
        &self,
        now: i64,
        reporter: &dyn ProgressReporter,
    ) -> Result<SweepReport, Error> {
        let mut tracker = UnknownTracker::load(resolve(&self.config.registry_path()));
        reporter.on_sweep_start(tracker.len());
        let sweep_start = Instant::now();

        let result = tracker.sweep_expired(now, self.config.retention_seconds());
        if tracker.is_dirty() {
            tracker.save()?;
        }

        reporter.on_sweep_complete(result.deleted.len(), sweep_start.elapsed().as_secs_f64());
        info!(
            "Sweep: {} deleted, {} already gone, {} failed, {} still tracked",
            result.deleted.len(),
            result.vanished.len(),
            result.failed.len(),
            tracker.len(),
        );
        Ok(result)
    }

    /// Organize then sweep, the way a scheduled run does.
    pub fn run(
        &self,
        reporter: &dyn ProgressReporter,
    ) -> Result<(ScanReport, SweepReport), Error> {
        let scan = self.organize(reporter)?;
        let sweep = self.sweep(reporter)?;
        Ok((scan, sweep))
    }

    /// Load the registry without modifying it.
    pub fn pending(&self) -> UnknownTracker {
        UnknownTracker::load(resolve(&self.config.registry_path()))
    }

    fn validate_root(&self) -> Result<PathBuf, Error> {
        let configured = Path::new(&self.config.source_root);
        if self.config.source_root.trim().is_empty() {
            return Err(Error::Config("source_root is not set".to_string()));
        }

        let root = fs::canonicalize(configured).map_err(|e| {
            Error::Config(format!("source root {}: {}", configured.display(), e))
        })?;
        if !root.is_dir() {
            return Err(Error::Config(format!(
                "source root {} is not a directory",
                root.display()
            )));
        }
        fs::read_dir(&root).map_err(|e| {
            Error::Config(format!("source root {} is not readable: {}", root.display(), e))
        })?;
        Ok(root)
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Absolute form of `path`, canonical when it already exists.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => fs::canonicalize(parent)
            .map(|p| p.join(name))
            .unwrap_or(absolute),
        _ => absolute,
    }
}
