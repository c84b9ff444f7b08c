//! Configuration for the docsafe document safety layer.
//!
//! [`Config`] is loaded through `ortho_config`, which layers defaults,
//! configuration files, `DOCSAFE_*` environment variables and command-line
//! flags. The core crate consumes the [`LoggingConfig`] and [`SafetyConfig`]
//! views rather than the aggregate.

mod defaults;
mod logging;
mod safety;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    BACKUP_SUFFIX, DEFAULT_LOG_FILTER, DEFAULT_TEMP_PREFIX, default_log_filter,
    default_log_filter_string, default_log_format, default_temp_prefix,
};
pub use logging::{LogFormat, LogFormatParseError, LoggingConfig};
pub use safety::SafetyConfig;

/// Aggregate configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "DOCSAFE")]
pub struct Config {
    /// `tracing_subscriber::EnvFilter` directive string.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format of the installed subscriber.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Parent directory for temporary roots; the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
    /// Prefix for private temporary roots.
    #[ortho_config(default = default_temp_prefix())]
    pub temp_prefix: String,
    /// Keep temporaries when the owning scope finishes successfully.
    #[ortho_config(default = false)]
    pub keep_temp_on_success: bool,
    /// Remove temporaries when the owning scope fails.
    #[ortho_config(default = true)]
    pub cleanup_on_error: bool,
    /// Back up the original file before a transaction commit replaces it.
    #[ortho_config(default = false)]
    pub backup_on_commit: bool,
}

impl Default for Config {
    fn default() -> Self {
        let safety = SafetyConfig::default();
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            temp_dir: safety.temp_dir,
            temp_prefix: safety.temp_prefix,
            keep_temp_on_success: safety.keep_temp_on_success,
            cleanup_on_error: safety.cleanup_on_error,
            backup_on_commit: safety.backup_on_commit,
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration layer could not be read or merged.
    #[error("failed to load configuration: {source}")]
    Load {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// The temp prefix would escape the temp directory.
    #[error("temp prefix '{prefix}' must be non-empty and free of path separators")]
    InvalidTempPrefix {
        /// Rejected prefix.
        prefix: String,
    },
}

impl From<Arc<OrthoError>> for ConfigError {
    fn from(source: Arc<OrthoError>) -> Self {
        Self::Load { source }
    }
}

impl Config {
    /// Loads every layer without command-line flags and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a layer holds an invalid value and
    /// [`ConfigError::InvalidTempPrefix`] when validation fails.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_args([OsString::from("docsafe")])
    }

    /// Loads every layer, treating `args` as the command line, and validates
    /// the result.
    ///
    /// # Errors
    ///
    /// As for [`Config::from_env`].
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let config = Self::load_from_iter(args)?;
        config.validate()?;
        Ok(config)
    }

    /// Logging view.
    #[must_use]
    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            filter: self.log_filter.clone(),
            format: self.log_format,
        }
    }

    /// Workspace and commit policy view.
    #[must_use]
    pub fn safety(&self) -> SafetyConfig {
        SafetyConfig {
            temp_prefix: self.temp_prefix.clone(),
            temp_dir: self.temp_dir.clone(),
            keep_temp_on_success: self.keep_temp_on_success,
            cleanup_on_error: self.cleanup_on_error,
            backup_on_commit: self.backup_on_commit,
        }
    }

    /// Parent directory for temporary roots, if one was configured.
    #[must_use]
    pub fn temp_dir(&self) -> Option<&Path> {
        self.temp_dir.as_deref()
    }

    /// Checks invariants the loader cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTempPrefix`] for an empty prefix or one
    /// containing a path separator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.temp_prefix;
        if prefix.is_empty() || prefix.contains(['/', '\\']) {
            return Err(ConfigError::InvalidTempPrefix {
                prefix: prefix.clone(),
            });
        }
        Ok(())
    }
}
