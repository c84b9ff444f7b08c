//! Container integrity checks.

use std::ffi::OsStr;
use std::path::Path;

use super::issue::{IssueCode, IssueLocation, ValidationIssue};
use super::result::ValidationResult;
use crate::document::xml::check_well_formed;
use crate::document::{DOCUMENT_PART, Document, Package, REQUIRED_PARTS};
use crate::error::SafetyError;

/// File extensions of zipped WordprocessingML documents and templates.
pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["docx", "docm", "dotx", "dotm"];

/// Options for [`Validator::validate_format`](super::Validator::validate_format).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatRules {
    /// Read every part in full, verifying checksums, and parse every XML
    /// part. Otherwise only the central directory and the body are read.
    pub check_corruption: bool,
}

impl FormatRules {
    /// Central directory and body only.
    #[must_use]
    pub const fn shallow() -> Self {
        Self {
            check_corruption: false,
        }
    }

    /// Every part.
    #[must_use]
    pub const fn deep() -> Self {
        Self {
            check_corruption: true,
        }
    }
}

impl Default for FormatRules {
    fn default() -> Self {
        Self::shallow()
    }
}

pub(super) fn validate(path: &Path, rules: FormatRules) -> Result<ValidationResult, SafetyError> {
    if !path.exists() {
        return Err(SafetyError::not_found(path));
    }
    let mut result = ValidationResult::new(path);
    if !path.is_file() {
        result.push(ValidationIssue::error(
            IssueCode::NotAFile,
            format!("Not a file: {}", path.display()),
        ));
        return Ok(result);
    }
    check_extension(path, &mut result);

    let mut package = match Package::open(path) {
        Ok(package) => package,
        Err(SafetyError::Corruption { message, .. }) => {
            result.push(
                ValidationIssue::error(
                    IssueCode::InvalidZip,
                    format!("Not a valid zip file: {message}"),
                )
                .suggest("The file may be damaged or not a word-processing document"),
            );
            return Ok(result);
        }
        Err(error) => return Err(error),
    };

    result.record("part_count", package.part_count());
    for required in REQUIRED_PARTS {
        if !package.has_part(required) {
            result.push(
                ValidationIssue::error(
                    IssueCode::MissingRequiredPart,
                    format!("Missing required part: {required}"),
                )
                .at(part(required))
                .suggest("The file may be damaged or not a word-processing document"),
            );
        }
    }

    if package.has_part(DOCUMENT_PART) {
        inspect_body(&mut package, &mut result);
    }
    if rules.check_corruption {
        inspect_all_parts(&mut package, &mut result);
    }
    Ok(result)
}

fn check_extension(path: &Path, result: &mut ValidationResult) {
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        result.push(
            ValidationIssue::warning(
                IssueCode::UnexpectedExtension,
                format!("Unexpected file extension: '{extension}'"),
            )
            .suggest("Use .docx, .docm, .dotx or .dotm"),
        );
    }
}

fn inspect_body(package: &mut Package, result: &mut ValidationResult) {
    let bytes = match package.read_part(DOCUMENT_PART) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return,
        Err(error) => {
            result.push(corrupt_part(DOCUMENT_PART, &error));
            return;
        }
    };
    match Document::parse_body(&bytes) {
        Ok(document) => {
            let paragraphs = document.paragraphs().len();
            result.record("has_body", document.has_body());
            result.record("paragraph_count", paragraphs);
            result.push(ValidationIssue::info(
                IssueCode::DocumentSummary,
                format!("Document has {paragraphs} paragraphs"),
            ));
        }
        Err(message) => result.push(malformed(DOCUMENT_PART, &message)),
    }
}

/// Reads every part so checksum failures surface, and parses XML parts.
///
/// The body is skipped because [`inspect_body`] already read it.
fn inspect_all_parts(package: &mut Package, result: &mut ValidationResult) {
    for name in package.part_names() {
        if name == DOCUMENT_PART || name.ends_with('/') {
            continue;
        }
        match package.read_part(&name) {
            Ok(Some(bytes)) if is_xml_part(&name) => {
                if let Err(message) = check_well_formed(&bytes) {
                    result.push(malformed(&name, &message));
                }
            }
            Ok(_) => {}
            Err(error) => result.push(corrupt_part(&name, &error)),
        }
    }
}

fn is_xml_part(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml") || ext.eq_ignore_ascii_case("rels"))
}

fn part(name: &str) -> IssueLocation {
    IssueLocation::Part {
        name: name.to_owned(),
    }
}

fn malformed(name: &str, message: &str) -> ValidationIssue {
    ValidationIssue::error(IssueCode::MalformedXml, format!("Malformed XML in {name}: {message}"))
        .at(part(name))
        .suggest("The file may be damaged")
}

fn corrupt_part(name: &str, error: &SafetyError) -> ValidationIssue {
    ValidationIssue::error(IssueCode::CorruptPart, format!("Unreadable part {name}: {error}"))
        .at(part(name))
        .suggest("The file may be damaged")
}
