use crate::classifier::CategoryTable;
use crate::error::PerFileError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Tallies from one organize run.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub total_files_seen: usize,
    /// Moved count per category, in category-table order.
    pub moved: Vec<(String, usize)>,
    pub duplicates: Vec<PathBuf>,
    pub unknown: Vec<PathBuf>,
    /// Files left in place because the destination was occupied.
    pub skipped: Vec<PathBuf>,
    pub errors: Vec<PerFileError>,
}

impl ScanReport {
    pub fn new(table: &CategoryTable) -> Self {
        Self {
            moved: table.names().map(|name| (name.to_string(), 0)).collect(),
            ..Default::default()
        }
    }

    pub fn tally_moved(&mut self, category: &str) {
        if let Some((_, count)) = self.moved.iter_mut().find(|(name, _)| name == category) {
            *count += 1;
        }
    }

    pub fn moved_count(&self, category: &str) -> usize {
        self.moved
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn total_moved(&self) -> usize {
        self.moved.iter().map(|(_, count)| count).sum()
    }
}

/// Render a report as plain text. Output depends only on `report`.
pub fn render(report: &ScanReport) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("Total files scanned: {}", report.total_files_seen));

    lines.push("\nFiles moved:".to_string());
    for (category, count) in &report.moved {
        lines.push(format!("  {}: {}", category, count));
    }

    push_paths(&mut lines, "Duplicates found", &report.duplicates);
    push_paths(&mut lines, "Unknown files tracked", &report.unknown);

    if !report.skipped.is_empty() {
        push_paths(&mut lines, "Skipped (destination exists)", &report.skipped);
    }

    if !report.errors.is_empty() {
        lines.push(format!("\nErrors: {}", report.errors.len()));
        lines.extend(report.errors.iter().map(|err| format!("  {}", err)));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn push_paths(lines: &mut Vec<String>, title: &str, paths: &[PathBuf]) {
    lines.push(format!("\n{}: {}", title, paths.len()));
    lines.extend(paths.iter().map(|path| format!("  {}", path.display())));
}

/// Write `text` to `path`, replacing any previous report.
pub fn write_report(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoryConfig;

    fn sample() -> ScanReport {
        let table = CategoryTable::from_config(&[
            CategoryConfig::new("Pictures", &[".png"]),
            CategoryConfig::new("Music", &[".mp3"]),
        ]);
        let mut report = ScanReport::new(&table);
        report.total_files_seen = 4;
        report.tally_moved("Pictures");
        report.duplicates.push(PathBuf::from("/dl/b/A.PNG"));
        report.unknown.push(PathBuf::from("/dl/z.xyz"));
        report.unknown.push(PathBuf::from("/dl/a.xyz"));
        report
    }

    #[test]
    fn test_render_layout() {
        let text = render(&sample());
        let expected = "Total files scanned: 4\n\
                        \n\
                        Files moved:\n  Pictures: 1\n  Music: 0\n\
                        \n\
                        Duplicates found: 1\n  /dl/b/A.PNG\n\
                        \n\
                        Unknown files tracked: 2\n  /dl/z.xyz\n  /dl/a.xyz\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_is_pure() {
        let report = sample();
        assert_eq!(render(&report), render(&report));
    }

    #[test]
    fn test_errors_and_skipped_sections() {
        let mut report = sample();
        report.skipped.push(PathBuf::from("/dl/song.mp3"));
        report.errors.push(PerFileError::Vanished {
            path: PathBuf::from("/dl/gone.png"),
        });
        let text = render(&report);
        assert!(text.contains("Skipped (destination exists): 1\n  /dl/song.mp3"));
        assert!(text.contains("Errors: 1\n  /dl/gone.png vanished during scan"));
    }

    #[test]
    fn test_tally_ignores_unknown_category() {
        let mut report = sample();
        report.tally_moved("Nope");
        assert_eq!(report.total_moved(), 1);
        assert_eq!(report.moved_count("Pictures"), 1);
    }
}
