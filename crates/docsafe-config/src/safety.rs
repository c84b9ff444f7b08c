//! Policy knobs for temporary workspaces and commits.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::defaults::default_temp_prefix;

/// Temporary-file and backup policy.
///
/// The defaults are the conservative choice: temporaries are always
/// removed and commits do not leave `.bak` siblings behind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Prefix for private temporary roots.
    pub temp_prefix: String,
    /// Parent directory for temporary roots; the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
    /// Keep temporaries when the owning scope finishes successfully.
    pub keep_temp_on_success: bool,
    /// Remove temporaries when the owning scope fails.
    pub cleanup_on_error: bool,
    /// Back up the original file before a transaction commit replaces it.
    pub backup_on_commit: bool,
}

impl SafetyConfig {
    /// Prefix for private temporary roots.
    #[must_use]
    pub fn temp_prefix(&self) -> &str {
        &self.temp_prefix
    }

    /// Parent directory for temporary roots, if one was configured.
    #[must_use]
    pub fn temp_dir(&self) -> Option<&Path> {
        self.temp_dir.as_deref()
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            temp_prefix: default_temp_prefix(),
            temp_dir: None,
            keep_temp_on_success: false,
            cleanup_on_error: true,
            backup_on_commit: false,
        }
    }
}
