//! Read-only access to the zip container of a document.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::SafetyError;

/// An opened document container.
///
/// Part names are the archive entry names, e.g. `word/document.xml`.
#[derive(Debug)]
pub struct Package {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
}

impl Package {
    /// Opens `path` as a zip container.
    ///
    /// Only the central directory is read; parts are decompressed on demand.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::NotFound`] for a missing path and
    /// [`SafetyError::Corruption`] when the file is not a readable zip
    /// archive.
    pub fn open(path: &Path) -> Result<Self, SafetyError> {
        let file = File::open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => SafetyError::not_found(path),
            _ => SafetyError::io("open", path, source),
        })?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|error| match error {
            ZipError::Io(source) => SafetyError::io("read archive", path, source),
            other => SafetyError::corruption(path, format!("not a zip archive: {other}")),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    /// Path the package was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entry names in archive order.
    #[must_use]
    pub fn part_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_owned).collect()
    }

    /// Number of entries.
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.archive.len()
    }

    /// Returns true when an entry called `name` exists.
    #[must_use]
    pub fn has_part(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    /// Reads and decompresses a part, verifying its checksum.
    ///
    /// Returns `Ok(None)` when the part does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::Corruption`] when the entry cannot be
    /// decompressed or fails its CRC check.
    pub fn read_part(&mut self, name: &str) -> Result<Option<Vec<u8>>, SafetyError> {
        let mut entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(error) => {
                return Err(SafetyError::corruption(&self.path, format!("{name}: {error}")));
            }
        };
        let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
        entry
            .read_to_end(&mut bytes)
            .map_err(|error| SafetyError::corruption(&self.path, format!("{name}: {error}")))?;
        Ok(Some(bytes))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::error::ErrorKind;
    use crate::tests::support::DocxFixture;

    #[test]
    fn lists_and_reads_parts() {
        let dir = TempDir::new().expect("temp dir");
        let path = DocxFixture::new()
            .paragraph("Hello")
            .write_to(&dir.path().join("doc.docx"));

        let mut package = Package::open(&path).expect("open");
        assert_eq!(package.path(), path);
        assert!(package.has_part("word/document.xml"));
        assert!(!package.has_part("word/missing.xml"));
        assert_eq!(package.part_count(), package.part_names().len());

        let document = package
            .read_part("word/document.xml")
            .expect("read")
            .expect("present");
        assert!(String::from_utf8_lossy(&document).contains("Hello"));
        assert!(package.read_part("word/missing.xml").expect("read").is_none());
    }

    #[test]
    fn non_zip_input_is_corruption() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("plain.docx");
        std::fs::write(&path, b"this is not a zip archive").expect("write");

        let error = Package::open(&path).expect_err("should not open");
        assert_eq!(error.kind(), ErrorKind::Corruption);
    }

    #[test]
    fn missing_input_is_not_found() {
        let dir = TempDir::new().expect("temp dir");
        let error = Package::open(&dir.path().join("absent.docx")).expect_err("should not open");
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn damaged_part_fails_checksum() {
        let dir = TempDir::new().expect("temp dir");
        let path = DocxFixture::new()
            .paragraph("Intact")
            .damaged_part()
            .write_to(&dir.path().join("damaged.docx"));

        let mut package = Package::open(&path).expect("central directory is intact");
        let error = package
            .read_part(DocxFixture::DAMAGED_PART)
            .expect_err("checksum should fail");
        assert_eq!(error.kind(), ErrorKind::Corruption);
        assert!(package.read_part("word/document.xml").expect("read").is_some());
    }
}
