//! Overwrite-protected, atomic file writes.
//!
//! [`SafeWriter::write_file`] never leaves a half-written destination: the
//! payload is staged in a private workspace beside the destination, synced,
//! and renamed over it. The rename is the only mutation the destination ever
//! sees.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};

use docsafe_config::BACKUP_SUFFIX;
use tracing::{debug, info};

use crate::error::SafetyError;
use crate::workspace::{Workspace, WorkspaceOptions};

const WRITER_TARGET: &str = "docsafe::writer";
const STAGING_PREFIX: &str = ".docsafe_staging_";

/// Decides whether an existing destination may be replaced.
///
/// Implemented for every `Fn(&Path) -> bool`, so closures can be passed
/// directly.
pub trait ConfirmOverwrite {
    /// Returns `true` to allow `path` to be replaced.
    fn confirm(&self, path: &Path) -> bool;
}

impl<F> ConfirmOverwrite for F
where
    F: Fn(&Path) -> bool,
{
    fn confirm(&self, path: &Path) -> bool {
        self(path)
    }
}

/// A single write to perform.
#[derive(Clone, Copy)]
pub struct SafeWriteRequest<'a> {
    destination: &'a Path,
    payload: &'a [u8],
    allow_overwrite: bool,
    confirm: Option<&'a dyn ConfirmOverwrite>,
    backup: bool,
}

impl<'a> SafeWriteRequest<'a> {
    /// Creates a request that refuses to overwrite and makes no backup.
    #[must_use]
    pub fn new(destination: &'a Path, payload: &'a [u8]) -> Self {
        Self {
            destination,
            payload,
            allow_overwrite: false,
            confirm: None,
            backup: false,
        }
    }

    /// Permits replacing an existing destination.
    ///
    /// Ignored when a confirmation callback is supplied.
    #[must_use]
    pub fn allow_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }

    /// Asks `confirm` before replacing an existing destination.
    #[must_use]
    pub fn confirm_with(mut self, confirm: &'a dyn ConfirmOverwrite) -> Self {
        self.confirm = Some(confirm);
        self
    }

    /// Copies an existing destination to `<path>.bak` before replacing it.
    #[must_use]
    pub fn backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    /// Destination path.
    #[must_use]
    pub const fn destination(&self) -> &'a Path {
        self.destination
    }

    /// Bytes to write.
    #[must_use]
    pub const fn payload(&self) -> &'a [u8] {
        self.payload
    }
}

impl fmt::Debug for SafeWriteRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeWriteRequest")
            .field("destination", &self.destination)
            .field("payload_len", &self.payload.len())
            .field("allow_overwrite", &self.allow_overwrite)
            .field("confirm", &self.confirm.is_some())
            .field("backup", &self.backup)
            .finish()
    }
}

/// What a successful write did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    path: PathBuf,
    replaced: bool,
    backup: Option<PathBuf>,
    bytes_written: usize,
}

impl WriteReport {
    /// Destination that now holds the payload.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an existing file was replaced.
    #[must_use]
    pub const fn replaced(&self) -> bool {
        self.replaced
    }

    /// Backup written before the replacement, if any.
    #[must_use]
    pub fn backup(&self) -> Option<&Path> {
        self.backup.as_deref()
    }

    /// Payload length.
    #[must_use]
    pub const fn bytes_written(&self) -> usize {
        self.bytes_written
    }
}

/// Returns the backup sibling for `path` (`report.docx` → `report.docx.bak`).
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Stateless writer enforcing overwrite protection.
#[derive(Debug, Default, Clone, Copy)]
pub struct SafeWriter;

impl SafeWriter {
    /// Creates a writer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Writes `request.payload()` to `request.destination()`.
    ///
    /// # Process
    ///
    /// 1. When the destination exists, consults the confirmation callback,
    ///    or the `allow_overwrite` flag when no callback is set.
    /// 2. When a backup is requested for an existing destination, copies it
    ///    to its `.bak` sibling.
    /// 3. Stages the payload beside the destination and renames it over.
    ///
    /// # Errors
    ///
    /// - [`SafetyError::OverwriteDenied`] when replacing is not permitted or
    ///   the destination is a directory.
    /// - [`SafetyError::Backup`] when the backup copy fails; the destination
    ///   is left untouched.
    /// - [`SafetyError::Io`] when staging or the final rename fails.
    pub fn write_file(&self, request: &SafeWriteRequest<'_>) -> Result<WriteReport, SafetyError> {
        let destination = request.destination;
        let exists = destination
            .try_exists()
            .map_err(|source| SafetyError::io("inspect", destination, source))?;

        let mut backup = None;
        if exists {
            if destination.is_dir() {
                return Err(SafetyError::overwrite_denied(
                    destination,
                    "destination is a directory",
                ));
            }
            authorise_overwrite(request)?;
            if request.backup {
                backup = Some(create_backup(destination)?);
            }
        }

        let parent = parent_dir(destination);
        fs::create_dir_all(parent)
            .map_err(|source| SafetyError::io("create parent directory", parent, source))?;
        replace_atomically(destination, request.payload)?;

        info!(
            target: WRITER_TARGET,
            path = %destination.display(),
            replaced = exists,
            backup = backup.is_some(),
            bytes = request.payload.len(),
            "file written"
        );
        Ok(WriteReport {
            path: destination.to_path_buf(),
            replaced: exists,
            backup,
            bytes_written: request.payload.len(),
        })
    }

    /// Reads a regular file.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::NotFound`] for a missing path and
    /// [`SafetyError::Io`] when the path is not a regular file or cannot be
    /// read.
    pub fn read_file(&self, source: &Path) -> Result<Vec<u8>, SafetyError> {
        if !source.exists() {
            return Err(SafetyError::not_found(source));
        }
        if !source.is_file() {
            return Err(SafetyError::io(
                "read",
                source,
                io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }
        fs::read(source).map_err(|error| SafetyError::io("read", source, error))
    }

    /// Copies `source` to `destination` with the same protection as
    /// [`SafeWriter::write_file`].
    ///
    /// # Errors
    ///
    /// Propagates failures from [`SafeWriter::read_file`] and
    /// [`SafeWriter::write_file`].
    pub fn copy_file(
        &self,
        source: &Path,
        destination: &Path,
        allow_overwrite: bool,
    ) -> Result<WriteReport, SafetyError> {
        let payload = self.read_file(source)?;
        let request = SafeWriteRequest::new(destination, &payload).allow_overwrite(allow_overwrite);
        self.write_file(&request)
    }
}

fn authorise_overwrite(request: &SafeWriteRequest<'_>) -> Result<(), SafetyError> {
    let destination = request.destination;
    match request.confirm {
        Some(confirm) if confirm.confirm(destination) => Ok(()),
        Some(_) => Err(SafetyError::overwrite_denied(
            destination,
            "overwrite was not confirmed",
        )),
        None if request.allow_overwrite => Ok(()),
        None => Err(SafetyError::overwrite_denied(
            destination,
            "destination exists and overwriting is not allowed",
        )),
    }
}

fn create_backup(destination: &Path) -> Result<PathBuf, SafetyError> {
    let backup = backup_path(destination);
    fs::copy(destination, &backup)
        .map_err(|source| SafetyError::backup(destination, &backup, source))?;
    debug!(
        target: WRITER_TARGET,
        path = %destination.display(),
        backup = %backup.display(),
        "backup written"
    );
    Ok(backup)
}

/// Stages `payload` in a workspace beside `destination`, then renames it over.
///
/// The staging workspace lives in the destination's directory so the rename
/// never crosses a filesystem boundary.
fn replace_atomically(destination: &Path, payload: &[u8]) -> Result<(), SafetyError> {
    let parent = parent_dir(destination);
    let mut staging = Workspace::in_dir(parent, WorkspaceOptions::new().prefix(STAGING_PREFIX))?;
    let hint = destination
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("staged");
    let staged = staging.create_temp_file(hint)?;

    let mut file = File::create(&staged)
        .map_err(|source| SafetyError::io("open staged file", &staged, source))?;
    file.write_all(payload)
        .map_err(|source| SafetyError::io("write staged file", &staged, source))?;
    file.sync_all()
        .map_err(|source| SafetyError::io("sync staged file", &staged, source))?;
    drop(file);

    fs::rename(&staged, destination)
        .map_err(|source| SafetyError::io("replace", destination, source))?;
    sync_dir(parent);
    staging.mark_succeeded();
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(error) = File::open(dir).and_then(|handle| handle.sync_all()) {
        debug!(
            target: WRITER_TARGET,
            dir = %dir.display(),
            error = %error,
            "directory sync failed"
        );
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}
