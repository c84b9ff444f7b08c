//! Default values shared by the configuration types and the core crate.

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Prefix given to private temporary roots.
pub const DEFAULT_TEMP_PREFIX: &str = "docsafe_";

/// Suffix appended to a file name to form its backup sibling.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Owned temp prefix used by serde defaults.
#[must_use]
pub fn default_temp_prefix() -> String {
    DEFAULT_TEMP_PREFIX.to_owned()
}
