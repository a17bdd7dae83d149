/// Extension-based classification into destination categories.
///
/// The table is built once from configuration and never mutated. Lookups
/// are case-insensitive and tolerate a missing leading dot.
use crate::config::CategoryConfig;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    extensions: HashSet<String>,
}

impl Category {
    pub fn contains(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }
}

/// Ordered category table. Iteration order is the configured order, which
/// is also the order categories appear in the report.
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

impl CategoryTable {
    pub fn from_config(categories: &[CategoryConfig]) -> Self {
        let categories = categories
            .iter()
            .map(|c| Category {
                name: c.name.clone(),
                extensions: c.extensions.iter().map(|e| normalize_extension(e)).collect(),
            })
            .collect();
        Self { categories }
    }

    /// Look up the category for `extension`.
    ///
    /// If an extension is listed under more than one category the first one
    /// in configured order wins.
    pub fn classify(&self, extension: &str) -> Option<&Category> {
        let ext = normalize_extension(extension);
        if ext.len() <= 1 {
            return None;
        }
        self.categories.iter().find(|c| c.contains(&ext))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }
}

/// Lowercase and ensure a single leading dot: `"PNG"` and `".Png"` both
/// become `".png"`.
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim().trim_start_matches('.');
    format!(".{}", trimmed.to_lowercase())
}
