//! Ignore filter
//!
//! Gitignore-style (wildmatch) rules deciding which artifact paths stay out
//! of a publish. Rules come from an optional rule file followed by inline
//! patterns; later rules win, `!pattern` re-includes, and `dir/` rules
//! exclude a whole subtree. The filter is immutable once built and can be
//! shared across threads.

use crate::domain::{IdsnapError, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    matcher: Gitignore,
}

impl IgnoreFilter {
    /// Filter that excludes nothing
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
        }
    }

    /// Build from a rule file (skipped when absent) plus inline patterns
    pub fn load(rule_file: Option<&Path>, patterns: &[String]) -> Result<Self> {
        let mut builder = GitignoreBuilder::new("");

        if let Some(path) = rule_file {
            if path.is_file() {
                if let Some(err) = builder.add(path) {
                    return Err(IdsnapError::Configuration(format!(
                        "Invalid ignore rule file {}: {}",
                        path.display(),
                        err
                    )));
                }
                tracing::debug!(path = %path.display(), "Loaded ignore rule file");
            } else {
                tracing::debug!(path = %path.display(), "Ignore rule file not present, excluding nothing from it");
            }
        }

        for pattern in patterns {
            builder.add_line(None, pattern).map_err(|e| {
                IdsnapError::Configuration(format!("Invalid ignore pattern '{pattern}': {e}"))
            })?;
        }

        let matcher = builder
            .build()
            .map_err(|e| IdsnapError::Configuration(format!("Failed to build ignore rules: {e}")))?;

        Ok(Self { matcher })
    }

    /// Build from inline patterns only
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let owned: Vec<String> = patterns.iter().map(|p| p.as_ref().to_string()).collect();
        Self::load(None, &owned)
    }

    /// Number of rules loaded
    pub fn len(&self) -> usize {
        self.matcher.num_ignores() as usize + self.matcher.num_whitelists() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a file at `relative_path` is excluded
    ///
    /// An excluded parent directory excludes everything below it, and a
    /// `!pattern` on the file cannot bring it back. This matches what a walk
    /// that prunes excluded directories sees.
    pub fn should_exclude(&self, relative_path: impl AsRef<Path>) -> bool {
        let path = relative_path.as_ref();
        let parent_excluded = path
            .ancestors()
            .skip(1)
            .filter(|p| !p.as_os_str().is_empty())
            .any(|dir| self.excludes_entry(dir, true));

        parent_excluded || self.excludes_entry(path, false)
    }

    /// Whether one walk entry is excluded on its own; used to prune directories
    pub(crate) fn excludes_entry(&self, relative_path: &Path, is_dir: bool) -> bool {
        self.matcher.matched(relative_path, is_dir).is_ignore()
    }
}

impl Default for IgnoreFilter {
    fn default() -> Self {
        Self::empty()
    }
}
