//! Unit tests for document transactions.

use std::cell::RefCell;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use crate::error::ErrorKind;
use crate::tests::support::{DocxFixture, read_bytes};
use crate::validation::{ContentRules, Validator};
use crate::writer::backup_path;

const ORIGINAL: &[u8] = b"original document";
const EDITED: &[u8] = b"edited document";

#[fixture]
fn dir() -> TempDir {
    TempDir::new().expect("temp dir")
}

fn target(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("report.docx");
    fs::write(&path, ORIGINAL).expect("write original");
    path
}

fn edit(transaction: &Transaction, content: &[u8]) -> PathBuf {
    let working = transaction.working_path().expect("open transaction");
    fs::write(working, content).expect("edit working copy");
    working.to_path_buf()
}

#[rstest]
fn open_missing_file_is_not_found(dir: TempDir) {
    let error = Transaction::open(&dir.path().join("absent.docx")).expect_err("missing target");
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[rstest]
fn open_directory_is_not_found(dir: TempDir) {
    let error = Transaction::open(dir.path()).expect_err("directory target");
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[rstest]
fn working_copy_starts_as_a_copy_elsewhere(dir: TempDir) {
    let original = target(&dir);
    let transaction = Transaction::open(&original).expect("open");

    let working = transaction.working_path().expect("working path");
    assert_ne!(working, original.as_path());
    assert!(!working.starts_with(dir.path()));
    assert_eq!(read_bytes(working), ORIGINAL);
    assert_eq!(transaction.state(), TransactionState::Open);
    assert_eq!(transaction.original_path(), original.as_path());
}

#[rstest]
fn dropping_an_open_transaction_leaves_the_original_untouched(dir: TempDir) {
    let original = target(&dir);
    let modified = fs::metadata(&original)
        .and_then(|meta| meta.modified())
        .expect("mtime");

    let working = {
        let transaction = Transaction::open(&original).expect("open");
        edit(&transaction, EDITED)
    };

    assert_eq!(read_bytes(&original), ORIGINAL);
    let after = fs::metadata(&original)
        .and_then(|meta| meta.modified())
        .expect("mtime");
    assert_eq!(after, modified);
    assert!(!working.exists(), "working copy should be removed");
}

#[rstest]
fn rollback_discards_the_working_copy(dir: TempDir) {
    let original = target(&dir);
    let mut transaction = Transaction::open(&original).expect("open");
    let working = edit(&transaction, EDITED);

    transaction.rollback();

    assert_eq!(transaction.state(), TransactionState::RolledBack);
    assert!(!working.exists());
    assert_eq!(read_bytes(&original), ORIGINAL);
    let error = transaction.working_path().expect_err("rolled back");
    assert_eq!(error.kind(), ErrorKind::TransactionMisuse);
}

#[rstest]
fn commit_replaces_the_original(dir: TempDir) {
    let original = target(&dir);
    let mut transaction = Transaction::open(&original).expect("open");
    let working = edit(&transaction, EDITED);

    let report = transaction.commit().expect("commit");

    assert!(report.replaced());
    assert_eq!(report.bytes_written(), EDITED.len());
    assert_eq!(read_bytes(&original), EDITED);
    assert!(transaction.is_committed());
    assert!(!transaction.has_backup());
    assert!(transaction.backup_path().is_none());
    assert!(!backup_path(&original).exists());
    assert!(!working.exists());
}

#[rstest]
fn commit_with_backup_keeps_the_previous_content(dir: TempDir) {
    let original = target(&dir);
    let mut transaction =
        Transaction::open_with(&original, TransactionOptions::new().backup(true)).expect("open");
    edit(&transaction, EDITED);

    transaction.commit().expect("commit");

    let backup = transaction.backup_path().expect("backup recorded").to_path_buf();
    assert_eq!(backup, backup_path(&original));
    assert!(transaction.has_backup());
    assert_eq!(read_bytes(&backup), ORIGINAL);
    assert_eq!(read_bytes(&original), EDITED);

    transaction.restore_backup().expect("restore");
    assert_eq!(read_bytes(&original), ORIGINAL);
}

#[rstest]
fn has_backup_is_false_once_the_backup_is_deleted(dir: TempDir) {
    let original = target(&dir);
    let mut transaction =
        Transaction::open_with(&original, TransactionOptions::new().backup(true)).expect("open");
    transaction.commit().expect("commit");
    fs::remove_file(backup_path(&original)).expect("remove backup");

    assert!(!transaction.has_backup());
    let error = transaction.restore_backup().expect_err("backup gone");
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[rstest]
fn second_commit_is_misuse_and_changes_nothing(dir: TempDir) {
    let original = target(&dir);
    let mut transaction = Transaction::open(&original).expect("open");
    edit(&transaction, EDITED);
    transaction.commit().expect("first commit");
    fs::write(&original, b"changed after commit").expect("external change");

    let error = transaction.commit().expect_err("second commit");

    assert_eq!(error.kind(), ErrorKind::TransactionMisuse);
    assert_eq!(
        error.to_string(),
        "cannot commit a transaction that is committed"
    );
    assert_eq!(read_bytes(&original), b"changed after commit");
}

#[rstest]
fn commit_after_rollback_is_misuse(dir: TempDir) {
    let original = target(&dir);
    let mut transaction = Transaction::open(&original).expect("open");
    transaction.rollback();

    let error = transaction.commit().expect_err("commit after rollback");
    assert_eq!(error.kind(), ErrorKind::TransactionMisuse);
    assert_eq!(read_bytes(&original), ORIGINAL);
}

#[rstest]
fn rollback_after_commit_is_a_no_op(dir: TempDir) {
    let original = target(&dir);
    let mut transaction = Transaction::open(&original).expect("open");
    edit(&transaction, EDITED);
    transaction.commit().expect("commit");

    transaction.rollback();

    assert_eq!(transaction.state(), TransactionState::Committed);
    assert_eq!(read_bytes(&original), EDITED);
}

#[rstest]
fn restore_backup_requires_a_committed_backup(dir: TempDir) {
    let original = target(&dir);
    let mut transaction = Transaction::open(&original).expect("open");

    let open_error = transaction.restore_backup().expect_err("still open");
    assert_eq!(open_error.kind(), ErrorKind::TransactionMisuse);

    transaction.commit().expect("commit");
    let no_backup = transaction.restore_backup().expect_err("no backup taken");
    assert_eq!(no_backup.kind(), ErrorKind::TransactionMisuse);
}

#[rstest]
fn failed_commit_keeps_the_transaction_open(dir: TempDir) {
    let original = target(&dir);
    let mut transaction = Transaction::open(&original).expect("open");
    edit(&transaction, EDITED);
    fs::remove_file(&original).expect("remove original");
    fs::create_dir(&original).expect("directory in its place");

    let error = transaction.commit().expect_err("directory destination");
    assert_eq!(error.kind(), ErrorKind::OverwriteDenied);
    assert_eq!(transaction.state(), TransactionState::Open);
    assert_eq!(
        read_bytes(transaction.working_path().expect("still open")),
        EDITED
    );

    fs::remove_dir(&original).expect("remove directory");
    transaction.commit().expect("retry");
    assert_eq!(read_bytes(&original), EDITED);
}

#[rstest]
fn run_commits_when_the_body_succeeds(dir: TempDir) {
    let original = target(&dir);

    let value = Transaction::run(&original, TransactionOptions::new(), |working| {
        fs::write(working, EDITED).map_err(|source| SafetyError::io("edit", working, source))?;
        Ok::<_, SafetyError>(7)
    })
    .expect("run");

    assert_eq!(value, 7);
    assert_eq!(read_bytes(&original), EDITED);
}

#[rstest]
fn run_rolls_back_when_the_body_fails(dir: TempDir) {
    let original = target(&dir);
    let seen = RefCell::new(None);

    let result: Result<(), SafetyError> =
        Transaction::run(&original, TransactionOptions::new(), |working| {
            fs::write(working, EDITED).expect("edit");
            *seen.borrow_mut() = Some(working.to_path_buf());
            Err(SafetyError::corruption(working, "edit went wrong"))
        });

    assert_eq!(result.expect_err("body error").kind(), ErrorKind::Corruption);
    assert_eq!(read_bytes(&original), ORIGINAL);
    let working = seen.into_inner().expect("body ran");
    assert!(!working.exists());
}

#[rstest]
fn run_rolls_back_when_the_body_panics(dir: TempDir) {
    let original = target(&dir);
    let seen = RefCell::new(None);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        Transaction::run(
            &original,
            TransactionOptions::new(),
            |working| -> Result<(), SafetyError> {
                fs::write(working, EDITED).expect("edit");
                *seen.borrow_mut() = Some(working.to_path_buf());
                panic!("edit panicked");
            },
        )
    }));

    assert!(outcome.is_err());
    assert_eq!(read_bytes(&original), ORIGINAL);
    let working = seen.into_inner().expect("body ran");
    assert!(!working.exists());
}

fn docx_target(dir: &TempDir, words: usize) -> PathBuf {
    DocxFixture::new()
        .heading(1, "Report")
        .words(words)
        .write_to(&dir.path().join("report.docx"))
}

fn content_check(working: &Path) -> Result<ValidationResult, SafetyError> {
    Validator::new().validate_content(working, ContentRules::between(100, 5000))
}

#[rstest]
fn validated_commit_rejects_and_keeps_the_transaction_open(dir: TempDir) {
    let original = docx_target(&dir, 20);
    let before = read_bytes(&original);
    let mut transaction = Transaction::open(&original).expect("open");
    let short = DocxFixture::new().heading(1, "Report").words(50).to_bytes();
    edit(&transaction, &short);

    let outcome = transaction
        .commit_validated(content_check)
        .expect("validation ran");

    let CommitOutcome::Rejected(result) = outcome else {
        panic!("expected rejection");
    };
    assert_eq!(result.errors().count(), 1);
    assert_eq!(transaction.state(), TransactionState::Open);
    assert_eq!(read_bytes(&original), before);

    let long = DocxFixture::new().heading(1, "Report").words(150).to_bytes();
    edit(&transaction, &long);
    let retried = transaction
        .commit_validated(content_check)
        .expect("validation ran");
    assert!(retried.committed());
    assert_eq!(read_bytes(&original), long);
}

#[rstest]
fn validated_commit_propagates_check_errors(dir: TempDir) {
    let original = target(&dir);
    let mut transaction = Transaction::open(&original).expect("open");

    let error = transaction
        .commit_validated(content_check)
        .expect_err("not a zip container");

    assert_eq!(error.kind(), ErrorKind::Corruption);
    assert_eq!(transaction.state(), TransactionState::Open);
}

#[rstest]
fn options_follow_safety_config(dir: TempDir) {
    let config = SafetyConfig {
        temp_dir: Some(dir.path().to_path_buf()),
        backup_on_commit: true,
        ..SafetyConfig::default()
    };
    let options = TransactionOptions::from(&config);
    assert!(options.backs_up());

    let original = target(&dir);
    let transaction = Transaction::open_with(&original, options).expect("open");
    let working = transaction.working_path().expect("working path");
    assert!(working.starts_with(dir.path()));
}

#[rstest]
#[case::from_config(TransactionOptions::from(&SafetyConfig {
    cleanup_on_error: false,
    ..SafetyConfig::default()
}))]
#[case::explicit(
    TransactionOptions::new().workspace(WorkspaceOptions::new().cleanup_on_error(false))
)]
fn rollback_removes_the_working_copy_despite_error_retention(
    dir: TempDir,
    #[case] options: TransactionOptions,
) {
    let original = target(&dir);
    let mut transaction = Transaction::open_with(&original, options).expect("open");
    let working = transaction.working_path().expect("working path").to_path_buf();

    transaction.rollback();

    assert!(!working.exists(), "{} was retained", working.display());
    assert_eq!(read_bytes(&original), ORIGINAL);
}

#[test]
fn state_names_read_naturally() {
    assert_eq!(TransactionState::Open.to_string(), "open");
    assert_eq!(TransactionState::RolledBack.to_string(), "rolled back");
}
