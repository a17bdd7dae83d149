use crate::error::Error;
use config::{Config, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SECONDS_PER_DAY: u64 = 86_400;

/// What to do when a category folder already holds a file with the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Leave the source in place and record a per-file error.
    #[default]
    Fail,
    /// Leave the source in place and list it as skipped.
    Skip,
    /// Move to the first free `name (N).ext`.
    Rename,
    /// Replace the existing file.
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    pub extensions: Vec<String>,
}

impl CategoryConfig {
    pub fn new(name: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub source_root: String,
    #[serde(default = "default_registry_path")]
    pub registry_path: String,
    #[serde(default = "default_report_path")]
    pub report_path: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
    #[serde(default)]
    pub collision_policy: CollisionPolicy,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryConfig>,
}

impl AppConfig {
    /// Default configuration rooted at `source_root`.
    pub fn new(source_root: impl AsRef<Path>) -> Self {
        Self {
            source_root: source_root.as_ref().to_string_lossy().into_owned(),
            registry_path: default_registry_path(),
            report_path: default_report_path(),
            retention_days: default_retention_days(),
            collision_policy: CollisionPolicy::default(),
            ignore_patterns: Vec::new(),
            categories: default_categories(),
        }
    }

    /// Retention window in seconds, saturating at `i64::MAX` for absurdly
    /// large day counts.
    pub fn retention_seconds(&self) -> i64 {
        i64::try_from(self.retention_days.saturating_mul(SECONDS_PER_DAY)).unwrap_or(i64::MAX)
    }

    pub fn registry_path(&self) -> PathBuf {
        PathBuf::from(&self.registry_path)
    }

    pub fn report_path(&self) -> PathBuf {
        PathBuf::from(&self.report_path)
    }
}

fn default_categories() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::new("Pictures", &[".gif", ".png", ".jpg", ".webp"]),
        CategoryConfig::new("Videos", &[".mp4"]),
        CategoryConfig::new("Music", &[".mp3"]),
        CategoryConfig::new(
            "Forms",
            &[".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx"],
        ),
    ]
}

fn default_registry_path() -> String {
    "unknown_files.json".to_string()
}

fn default_report_path() -> String {
    "organizer_report.txt".to_string()
}

fn default_retention_days() -> u64 {
    3
}

/// Load `Config.*` from the working directory (optional) overlaid with
/// `TIDY_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, Error> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("TIDY").try_parsing(true))
        .build()?;
    Ok(builder.try_deserialize::<AppConfig>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{ConfigError, FileFormat};

    fn from_toml(text: &str) -> Result<AppConfig, ConfigError> {
        Config::builder()
            .add_source(ConfigFile::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize::<AppConfig>()
    }

    #[test]
    fn test_defaults_fill_everything_but_root() {
        let config = from_toml(r#"source_root = "/data/downloads""#).unwrap();
        assert_eq!(config.source_root, "/data/downloads");
        assert_eq!(config.retention_days, 3);
        assert_eq!(config.retention_seconds(), 3 * 86_400);
        assert_eq!(config.collision_policy, CollisionPolicy::Fail);
        assert_eq!(config.registry_path, "unknown_files.json");
        assert_eq!(config.report_path, "organizer_report.txt");

        let names: Vec<&str> = config.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Pictures", "Videos", "Music", "Forms"]);
    }

    #[test]
    fn test_huge_retention_saturates() {
        let mut config = AppConfig::new("/dl");
        config.retention_days = 200_000_000_000_000;
        assert_eq!(config.retention_seconds(), i64::MAX);

        config.retention_days = u64::MAX;
        assert_eq!(config.retention_seconds(), i64::MAX);

        config.retention_days = 0;
        assert_eq!(config.retention_seconds(), 0);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        assert!(from_toml("retention_days = 7").is_err());
    }

    #[test]
    fn test_categories_keep_file_order() {
        let config = from_toml(
            r#"
            source_root = "/srv/in"
            collision_policy = "rename"

            [[categories]]
            name = "Archives"
            extensions = [".zip", ".7z"]

            [[categories]]
            name = "Books"
            extensions = [".epub"]
            "#,
        )
        .unwrap();
        assert_eq!(config.collision_policy, CollisionPolicy::Rename);
        assert_eq!(config.categories[0], CategoryConfig::new("Archives", &[".zip", ".7z"]));
        assert_eq!(config.categories[1].name, "Books");
    }
}
