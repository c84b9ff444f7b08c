//! Scoped temporary files and directories.
//!
//! A [`Workspace`] owns a private temporary root and every path it creates
//! beneath it. Dropping the workspace deletes those paths on every exit
//! route, including unwinding. Cleanup is best-effort: a path that cannot be
//! removed is logged and the remaining paths are still attempted. Cleanup
//! never raises.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::SystemTime;

use docsafe_config::{DEFAULT_TEMP_PREFIX, SafetyConfig};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::error::SafetyError;

const WORKSPACE_TARGET: &str = "docsafe::workspace";

/// Construction policy for a [`Workspace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceOptions {
    prefix: String,
    parent: Option<PathBuf>,
    cleanup_on_success: bool,
    cleanup_on_error: bool,
}

impl WorkspaceOptions {
    /// Default policy: system temp dir, always clean up.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_TEMP_PREFIX.to_owned(),
            parent: None,
            cleanup_on_success: true,
            cleanup_on_error: true,
        }
    }

    /// Sets the prefix of the private root directory name.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Places the private root inside `parent` instead of the system temp dir.
    #[must_use]
    pub fn parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Chooses whether temporaries are removed after a successful scope.
    ///
    /// Passing `false` retains them for diagnosis.
    #[must_use]
    pub fn cleanup_on_success(mut self, cleanup: bool) -> Self {
        self.cleanup_on_success = cleanup;
        self
    }

    /// Chooses whether temporaries are removed after a failed scope.
    #[must_use]
    pub fn cleanup_on_error(mut self, cleanup: bool) -> Self {
        self.cleanup_on_error = cleanup;
        self
    }

    fn retains(&self, succeeded: bool) -> bool {
        if succeeded {
            !self.cleanup_on_success
        } else {
            !self.cleanup_on_error
        }
    }
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&SafetyConfig> for WorkspaceOptions {
    fn from(config: &SafetyConfig) -> Self {
        let options = Self::new()
            .prefix(config.temp_prefix())
            .cleanup_on_success(!config.keep_temp_on_success)
            .cleanup_on_error(config.cleanup_on_error);
        match config.temp_dir() {
            Some(dir) => options.parent(dir),
            None => options,
        }
    }
}

/// Kind of path a workspace created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
}

/// A path created by a [`Workspace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempEntry {
    path: PathBuf,
    name_hint: String,
    kind: EntryKind,
    created_at: SystemTime,
}

impl TempEntry {
    /// Absolute path of the entry.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name hint supplied at creation.
    #[must_use]
    pub fn name_hint(&self) -> &str {
        &self.name_hint
    }

    /// Whether the entry is a file or a directory.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        self.kind
    }

    /// When the entry was created.
    #[must_use]
    pub const fn created_at(&self) -> SystemTime {
        self.created_at
    }
}

/// Scoped owner of temporary filesystem resources.
///
/// A scope counts as successful only when [`Workspace::mark_succeeded`] was
/// called and the thread is not unwinding.
#[derive(Debug)]
pub struct Workspace {
    root: Option<TempDir>,
    root_path: PathBuf,
    options: WorkspaceOptions,
    entries: Vec<TempEntry>,
    succeeded: bool,
}

impl Workspace {
    /// Creates a workspace under the system temp dir with default policy.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::Io`] when the private root cannot be created.
    pub fn new() -> Result<Self, SafetyError> {
        Self::with_options(WorkspaceOptions::new())
    }

    /// Creates a workspace rooted inside `parent`.
    ///
    /// Used to keep temporaries on the same filesystem as a final rename
    /// target.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::Io`] when the private root cannot be created.
    pub fn in_dir(parent: &Path, options: WorkspaceOptions) -> Result<Self, SafetyError> {
        Self::with_options(options.parent(parent))
    }

    /// Creates a workspace with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::Io`] when the private root cannot be created.
    pub fn with_options(options: WorkspaceOptions) -> Result<Self, SafetyError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&options.prefix);
        let root = match &options.parent {
            Some(parent) => builder
                .tempdir_in(parent)
                .map_err(|source| SafetyError::io("create temp root in", parent, source))?,
            None => {
                let parent = std::env::temp_dir();
                builder
                    .tempdir()
                    .map_err(|source| SafetyError::io("create temp root in", &parent, source))?
            }
        };
        let root_path = root.path().to_path_buf();
        debug!(
            target: WORKSPACE_TARGET,
            root = %root_path.display(),
            "workspace created"
        );
        Ok(Self {
            root: Some(root),
            root_path,
            options,
            entries: Vec::new(),
            succeeded: false,
        })
    }

    /// Private root directory holding every entry.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Paths created so far, in creation order.
    #[must_use]
    pub fn entries(&self) -> &[TempEntry] {
        &self.entries
    }

    /// Policy this workspace was created with.
    #[must_use]
    pub const fn options(&self) -> &WorkspaceOptions {
        &self.options
    }

    /// Records that the enclosing operation succeeded.
    ///
    /// Only affects cleanup when `cleanup_on_success` is disabled.
    pub fn mark_succeeded(&mut self) {
        self.succeeded = true;
    }

    /// Creates an empty, uniquely named file.
    ///
    /// Only the final component of `name_hint` is used, so a hint can never
    /// place the file outside the private root.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::Io`] when the file cannot be created.
    pub fn create_temp_file(&mut self, name_hint: &str) -> Result<PathBuf, SafetyError> {
        let hint = sanitise_hint(name_hint, "file");
        let path = self.next_path(&hint);
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| SafetyError::io("create temp file", &path, source))?;
        self.record(path.clone(), hint, EntryKind::File);
        Ok(path)
    }

    /// Copies an existing file into a new temporary file.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::NotFound`] when `source` does not exist and
    /// [`SafetyError::Io`] when the copy fails.
    pub fn copy_to_temp(&mut self, source: &Path) -> Result<PathBuf, SafetyError> {
        if !source.is_file() {
            return Err(SafetyError::not_found(source));
        }
        let hint = source
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("copy")
            .to_owned();
        let path = self.create_temp_file(&hint)?;
        fs::copy(source, &path).map_err(|error| SafetyError::io("copy", source, error))?;
        Ok(path)
    }

    /// Creates a uniquely named directory.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::Io`] when the directory cannot be created.
    pub fn create_temp_dir(&mut self) -> Result<PathBuf, SafetyError> {
        let path = self.next_path("dir");
        fs::create_dir(&path).map_err(|source| SafetyError::io("create temp dir", &path, source))?;
        self.record(path.clone(), "dir".to_owned(), EntryKind::Directory);
        Ok(path)
    }

    fn next_path(&self, hint: &str) -> PathBuf {
        self.root_path
            .join(format!("{:04}_{hint}", self.entries.len()))
    }

    fn record(&mut self, path: PathBuf, name_hint: String, kind: EntryKind) {
        debug!(
            target: WORKSPACE_TARGET,
            path = %path.display(),
            ?kind,
            "temporary created"
        );
        self.entries.push(TempEntry {
            path,
            name_hint,
            kind,
            created_at: SystemTime::now(),
        });
    }

    fn release(&mut self) {
        let Some(root) = self.root.take() else {
            return;
        };

        let succeeded = self.succeeded && !thread::panicking();
        if self.options.retains(succeeded) {
            let kept = root.keep();
            info!(
                target: WORKSPACE_TARGET,
                root = %kept.display(),
                succeeded,
                "workspace retained"
            );
            return;
        }

        for entry in self.entries.iter().rev() {
            let removal = match entry.kind {
                EntryKind::File => fs::remove_file(&entry.path),
                EntryKind::Directory => fs::remove_dir_all(&entry.path),
            };
            log_removal_failure(&entry.path, removal);
        }

        let root_path = root.path().to_path_buf();
        log_removal_failure(&root_path, root.close());
        debug!(
            target: WORKSPACE_TARGET,
            root = %root_path.display(),
            "workspace released"
        );
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.release();
    }
}

fn log_removal_failure(path: &Path, result: io::Result<()>) {
    match result {
        Err(error) if error.kind() != io::ErrorKind::NotFound => {
            warn!(
                target: WORKSPACE_TARGET,
                path = %path.display(),
                error = %error,
                "failed to remove temporary"
            );
        }
        _ => {}
    }
}

fn sanitise_hint(hint: &str, fallback: &str) -> String {
    Path::new(hint)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(fallback)
        .to_owned()
}
