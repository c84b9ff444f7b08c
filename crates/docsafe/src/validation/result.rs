//! Aggregated outcome of one validation call.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::issue::{Severity, ValidationIssue};

/// A typed metadata value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// A yes/no fact.
    Flag(bool),
    /// A count.
    Count(usize),
    /// A list of names.
    Names(Vec<String>),
}

impl MetadataValue {
    /// Returns the count, if this is a count.
    #[must_use]
    pub const fn as_count(&self) -> Option<usize> {
        match self {
            Self::Count(count) => Some(*count),
            _ => None,
        }
    }

    /// Returns the flag, if this is a flag.
    #[must_use]
    pub const fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the names, if this is a name list.
    #[must_use]
    pub fn as_names(&self) -> Option<&[String]> {
        match self {
            Self::Names(names) => Some(names),
            _ => None,
        }
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        Self::Count(value)
    }
}

impl From<Vec<String>> for MetadataValue {
    fn from(value: Vec<String>) -> Self {
        Self::Names(value)
    }
}

/// Findings and metadata for one validated path.
///
/// Issues keep detection order. Results are only built inside the crate;
/// callers read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    path: PathBuf,
    issues: Vec<ValidationIssue>,
    metadata: BTreeMap<String, MetadataValue>,
}

impl ValidationResult {
    pub(crate) fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            issues: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub(crate) fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub(crate) fn record(&mut self, key: &str, value: impl Into<MetadataValue>) {
        self.metadata.insert(key.to_owned(), value.into());
    }

    /// Path that was validated.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every finding in detection order.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Returns true when no finding is an error.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    /// Error findings.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.with_severity(Severity::Error)
    }

    /// Warning findings.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.with_severity(Severity::Warning)
    }

    /// Informational findings.
    pub fn infos(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.with_severity(Severity::Info)
    }

    /// All metadata, ordered by key.
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, MetadataValue> {
        &self.metadata
    }

    /// Metadata value for `key`.
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&MetadataValue> {
        self.metadata.get(key)
    }

    /// Count stored under `key`.
    #[must_use]
    pub fn count(&self, key: &str) -> Option<usize> {
        self.metadata_value(key).and_then(MetadataValue::as_count)
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(move |issue| issue.severity() == severity)
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.is_valid() { "PASSED" } else { "FAILED" };
        writeln!(f, "Validation of {}: {verdict}", self.path.display())?;
        writeln!(f, "  errors: {}", self.errors().count())?;
        writeln!(f, "  warnings: {}", self.warnings().count())?;
        write!(f, "  info: {}", self.infos().count())?;
        for issue in self.errors().chain(self.warnings()) {
            write!(f, "\n  {issue}")?;
        }
        Ok(())
    }
}
