//! Safe editing and validation of zipped WordprocessingML documents.
//!
//! The crate protects a caller's original document while it is being
//! changed, and inspects documents for integrity and quality problems.
//!
//! - [`Workspace`] owns temporary files and removes them on every exit
//!   path, including unwinding.
//! - [`SafeWriter`] writes bytes with overwrite protection, an optional
//!   `.bak` copy and a single atomic rename.
//! - [`Transaction`] hands out a working copy of a document and replaces the
//!   original only on [`Transaction::commit`]. Dropping an open transaction
//!   rolls it back.
//! - [`Validator`] reports on container integrity, style hygiene, heading
//!   structure and word counts through [`ValidationResult`]s.
//!
//! All operations are synchronous. Callers serialise work on a given target
//! path; distinct paths may be processed concurrently.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use docsafe::{ContentRules, Transaction, TransactionOptions, Validator};
//!
//! # fn main() -> Result<(), docsafe::SafetyError> {
//! let target = Path::new("report.docx");
//! let mut transaction = Transaction::open_with(target, TransactionOptions::new().backup(true))?;
//! // ... edit transaction.working_path()? ...
//! let validator = Validator::new();
//! let outcome = transaction.commit_validated(|working| {
//!     validator.validate_content(working, ContentRules::between(100, 5000))
//! })?;
//! assert!(outcome.committed());
//! # Ok(())
//! # }
//! ```

pub mod document;
mod error;
pub mod telemetry;
mod transaction;
pub mod validation;
mod workspace;
mod writer;

pub use error::{ErrorKind, SafetyError};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transaction::{CommitOutcome, Transaction, TransactionOptions, TransactionState};
pub use validation::{
    ContentRules, FormatRules, IssueCode, IssueLocation, MetadataValue, Severity, StructureRules,
    StyleRules, ValidationIssue, ValidationResult, Validator,
};
pub use workspace::{EntryKind, TempEntry, Workspace, WorkspaceOptions};
pub use writer::{ConfirmOverwrite, SafeWriteRequest, SafeWriter, WriteReport, backup_path};

#[cfg(test)]
mod tests;
