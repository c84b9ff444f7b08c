//! Document validation.
//!
//! The [`Validator`] runs four independent checks. Each returns a fresh
//! [`ValidationResult`]; quality problems are reported as issues and never
//! as errors. None of the checks modify the file.
//!
//! - [`Validator::validate_format`]: container integrity.
//! - [`Validator::validate_styles`]: defined versus referenced styles.
//! - [`Validator::validate_structure`]: heading hierarchy.
//! - [`Validator::validate_content`]: word-count bounds.

mod content;
mod format;
mod issue;
mod result;
mod structure;
mod styles;

use std::fmt;
use std::path::Path;

use tracing::debug;

pub use content::ContentRules;
pub use format::{ACCEPTED_EXTENSIONS, FormatRules};
pub use issue::{IssueCode, IssueLocation, Severity, ValidationIssue};
pub use result::{MetadataValue, ValidationResult};
pub use structure::StructureRules;
pub use styles::StyleRules;

use crate::document::{Document, DocumentLoader, OoxmlLoader};
use crate::error::SafetyError;

const VALIDATION_TARGET: &str = "docsafe::validation";

/// Runs document checks.
///
/// Style, structure and content checks read documents through a
/// [`DocumentLoader`]; [`Validator::new`] uses [`OoxmlLoader`].
#[derive(Clone, Copy)]
pub struct Validator<'a> {
    loader: &'a dyn DocumentLoader,
}

impl Validator<'static> {
    /// Creates a validator reading documents from disk.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loader: &OoxmlLoader,
        }
    }
}

impl Default for Validator<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Validator<'a> {
    /// Creates a validator that reads documents through `loader`.
    #[must_use]
    pub fn with_loader(loader: &'a dyn DocumentLoader) -> Self {
        Self { loader }
    }

    /// Checks that `path` is an intact zipped WordprocessingML container.
    ///
    /// Unlike the other checks this inspects the container itself, so a
    /// file that is not a zip archive is reported as an `InvalidZip` issue
    /// rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::NotFound`] when `path` does not exist.
    pub fn validate_format(
        &self,
        path: &Path,
        rules: FormatRules,
    ) -> Result<ValidationResult, SafetyError> {
        let result = format::validate(path, rules)?;
        log_outcome("format", &result);
        Ok(result)
    }

    /// Compares the styles the document defines with those it references.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::NotFound`] or [`SafetyError::Corruption`] when
    /// the document cannot be loaded.
    pub fn validate_styles(
        &self,
        path: &Path,
        rules: StyleRules,
    ) -> Result<ValidationResult, SafetyError> {
        self.run("styles", path, |document, result| {
            styles::inspect(document, rules, result);
        })
    }

    /// Checks the heading hierarchy.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::NotFound`] or [`SafetyError::Corruption`] when
    /// the document cannot be loaded.
    pub fn validate_structure(
        &self,
        path: &Path,
        rules: StructureRules,
    ) -> Result<ValidationResult, SafetyError> {
        self.run("structure", path, |document, result| {
            structure::inspect(document, rules, result);
        })
    }

    /// Checks the word count against bounds.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::NotFound`] or [`SafetyError::Corruption`] when
    /// the document cannot be loaded.
    pub fn validate_content(
        &self,
        path: &Path,
        rules: ContentRules,
    ) -> Result<ValidationResult, SafetyError> {
        self.run("content", path, |document, result| {
            content::inspect(document, rules, result);
        })
    }

    fn run<F>(
        &self,
        check: &'static str,
        path: &Path,
        inspect: F,
    ) -> Result<ValidationResult, SafetyError>
    where
        F: FnOnce(&Document, &mut ValidationResult),
    {
        let document = self.loader.load(path)?;
        let mut result = ValidationResult::new(path);
        inspect(&document, &mut result);
        log_outcome(check, &result);
        Ok(result)
    }
}

impl fmt::Debug for Validator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator").finish_non_exhaustive()
    }
}

fn log_outcome(check: &'static str, result: &ValidationResult) {
    debug!(
        target: VALIDATION_TARGET,
        check,
        path = %result.path().display(),
        valid = result.is_valid(),
        errors = result.errors().count(),
        warnings = result.warnings().count(),
        "validation finished"
    );
}
