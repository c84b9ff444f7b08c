//! Commit-or-rollback editing of a single document.
//!
//! A [`Transaction`] copies its target into a private workspace and hands
//! the caller the working path. The target is only touched by
//! [`Transaction::commit`], which replaces it atomically through the
//! [`SafeWriter`]. Dropping an open transaction rolls it back.

use std::fs;
use std::path::{Path, PathBuf};

use docsafe_config::SafetyConfig;
use strum::Display;
use tracing::{debug, info};

use crate::error::SafetyError;
use crate::validation::ValidationResult;
use crate::workspace::{Workspace, WorkspaceOptions};
use crate::writer::{SafeWriteRequest, SafeWriter, WriteReport};

#[cfg(test)]
mod tests;

const TRANSACTION_TARGET: &str = "docsafe::transaction";

/// Lifecycle state of a [`Transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TransactionState {
    /// The working copy is live and may be committed or rolled back.
    #[strum(serialize = "open")]
    Open,
    /// The working copy replaced the original.
    #[strum(serialize = "committed")]
    Committed,
    /// The working copy was discarded.
    #[strum(serialize = "rolled back")]
    RolledBack,
}

/// Policy for a [`Transaction`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    backup: bool,
    workspace: WorkspaceOptions,
}

impl TransactionOptions {
    /// No backup, default workspace policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps a `.bak` copy of the original when committing.
    #[must_use]
    pub fn backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    /// Policy for the workspace holding the working copy.
    ///
    /// Error cleanup is always on: a rolled back working copy is removed
    /// whatever `workspace` says.
    #[must_use]
    pub fn workspace(mut self, workspace: WorkspaceOptions) -> Self {
        self.workspace = workspace.cleanup_on_error(true);
        self
    }

    /// Whether commits keep a backup.
    #[must_use]
    pub const fn backs_up(&self) -> bool {
        self.backup
    }
}

impl From<&SafetyConfig> for TransactionOptions {
    fn from(config: &SafetyConfig) -> Self {
        Self::new()
            .backup(config.backup_on_commit)
            .workspace(WorkspaceOptions::from(config))
    }
}

/// Result of [`Transaction::commit_validated`].
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// The working copy passed validation and replaced the original.
    Committed(WriteReport),
    /// Validation found errors; nothing was written and the transaction is
    /// still open.
    Rejected(ValidationResult),
}

impl CommitOutcome {
    /// Returns true when the working copy was committed.
    #[must_use]
    pub const fn committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

/// A pending edit of one document.
#[derive(Debug)]
pub struct Transaction {
    original: PathBuf,
    working: PathBuf,
    workspace: Option<Workspace>,
    backup: Option<PathBuf>,
    options: TransactionOptions,
    state: TransactionState,
}

impl Transaction {
    /// Opens a transaction on `original` with default options.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::NotFound`] when `original` is not an existing
    /// regular file, or [`SafetyError::Io`] when the working copy cannot be
    /// made.
    pub fn open(original: &Path) -> Result<Self, SafetyError> {
        Self::open_with(original, TransactionOptions::new())
    }

    /// Opens a transaction on `original`.
    ///
    /// # Errors
    ///
    /// As for [`Transaction::open`].
    pub fn open_with(original: &Path, options: TransactionOptions) -> Result<Self, SafetyError> {
        if !original.is_file() {
            return Err(SafetyError::not_found(original));
        }
        let mut workspace = Workspace::with_options(options.workspace.clone())?;
        let working = workspace.copy_to_temp(original)?;
        debug!(
            target: TRANSACTION_TARGET,
            original = %original.display(),
            working = %working.display(),
            "transaction opened"
        );
        Ok(Self {
            original: original.to_path_buf(),
            working,
            workspace: Some(workspace),
            backup: None,
            options,
            state: TransactionState::Open,
        })
    }

    /// Runs `body` against a working copy of `original`.
    ///
    /// Commits when `body` returns `Ok` and rolls back otherwise, including
    /// when `body` panics.
    ///
    /// # Errors
    ///
    /// Returns the error from `body`, or a [`SafetyError`] from opening or
    /// committing converted into `E`.
    pub fn run<T, E, F>(original: &Path, options: TransactionOptions, body: F) -> Result<T, E>
    where
        F: FnOnce(&Path) -> Result<T, E>,
        E: From<SafetyError>,
    {
        let mut transaction = Self::open_with(original, options)?;
        let value = body(&transaction.working)?;
        transaction.commit()?;
        Ok(value)
    }

    /// Target document.
    #[must_use]
    pub fn original_path(&self) -> &Path {
        &self.original
    }

    /// Path of the working copy the caller may edit.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::TransactionMisuse`] once the transaction is
    /// committed or rolled back.
    pub fn working_path(&self) -> Result<&Path, SafetyError> {
        self.ensure_open("access the working copy of")?;
        Ok(&self.working)
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> TransactionState {
        self.state
    }

    /// Returns true once the working copy has replaced the original.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.state == TransactionState::Committed
    }

    /// Backup written by the commit, if any.
    #[must_use]
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup.as_deref()
    }

    /// Returns true when the commit left a backup that still exists.
    #[must_use]
    pub fn has_backup(&self) -> bool {
        self.backup.as_deref().is_some_and(Path::is_file)
    }

    /// Replaces the original with the working copy.
    ///
    /// On failure the transaction stays open so the caller can retry or roll
    /// back.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::TransactionMisuse`] when the transaction is not
    /// open, or the writer's error when the replacement fails.
    pub fn commit(&mut self) -> Result<WriteReport, SafetyError> {
        self.ensure_open("commit")?;
        let payload = fs::read(&self.working)
            .map_err(|source| SafetyError::io("read working copy", &self.working, source))?;
        let request = SafeWriteRequest::new(&self.original, &payload)
            .allow_overwrite(true)
            .backup(self.options.backup);
        let report = SafeWriter::new().write_file(&request)?;

        self.backup = report.backup().map(Path::to_path_buf);
        self.finish(TransactionState::Committed);
        info!(
            target: TRANSACTION_TARGET,
            original = %self.original.display(),
            backup = self.backup.is_some(),
            "transaction committed"
        );
        Ok(report)
    }

    /// Validates the working copy with `check` and commits only when the
    /// result has no errors.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::TransactionMisuse`] when the transaction is not
    /// open, the error from `check`, or a commit failure.
    pub fn commit_validated<F>(&mut self, check: F) -> Result<CommitOutcome, SafetyError>
    where
        F: FnOnce(&Path) -> Result<ValidationResult, SafetyError>,
    {
        self.ensure_open("commit")?;
        let result = check(&self.working)?;
        if !result.is_valid() {
            debug!(
                target: TRANSACTION_TARGET,
                original = %self.original.display(),
                errors = result.errors().count(),
                "commit rejected by validation"
            );
            return Ok(CommitOutcome::Rejected(result));
        }
        self.commit().map(CommitOutcome::Committed)
    }

    /// Discards the working copy.
    ///
    /// Rolling back a committed or already rolled back transaction does
    /// nothing.
    pub fn rollback(&mut self) {
        if self.state != TransactionState::Open {
            debug!(
                target: TRANSACTION_TARGET,
                original = %self.original.display(),
                state = %self.state,
                "rollback ignored"
            );
            return;
        }
        self.finish(TransactionState::RolledBack);
        debug!(
            target: TRANSACTION_TARGET,
            original = %self.original.display(),
            "transaction rolled back"
        );
    }

    /// Copies the commit's backup back over the original.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::TransactionMisuse`] unless the transaction is
    /// committed with a backup, and [`SafetyError::NotFound`] when the backup
    /// file has since been removed.
    pub fn restore_backup(&self) -> Result<WriteReport, SafetyError> {
        let backup = match (&self.state, &self.backup) {
            (TransactionState::Committed, Some(backup)) => backup,
            _ => return Err(SafetyError::misuse("restore a backup for", self.state)),
        };
        let writer = SafeWriter::new();
        let payload = writer.read_file(backup)?;
        let request = SafeWriteRequest::new(&self.original, &payload).allow_overwrite(true);
        let report = writer.write_file(&request)?;
        info!(
            target: TRANSACTION_TARGET,
            original = %self.original.display(),
            backup = %backup.display(),
            "backup restored"
        );
        Ok(report)
    }

    fn ensure_open(&self, operation: &'static str) -> Result<(), SafetyError> {
        match self.state {
            TransactionState::Open => Ok(()),
            state => Err(SafetyError::misuse(operation, state)),
        }
    }

    fn finish(&mut self, state: TransactionState) {
        if state == TransactionState::Committed
            && let Some(workspace) = self.workspace.as_mut()
        {
            workspace.mark_succeeded();
        }
        self.workspace = None;
        self.state = state;
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.state == TransactionState::Open {
            debug!(
                target: TRANSACTION_TARGET,
                original = %self.original.display(),
                "open transaction dropped, rolling back"
            );
            self.finish(TransactionState::RolledBack);
        }
    }
}
