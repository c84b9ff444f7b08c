//! Read-only document model.
//!
//! [`Package`] opens the zip container; [`Document`] is the parsed body and
//! style table the validator inspects. Loading goes through the
//! [`DocumentLoader`] trait so checks can run against documents built in
//! memory.

mod model;
mod package;
pub(crate) mod xml;

use std::path::Path;

pub use model::{Document, Heading, MAX_HEADING_LEVEL, Paragraph, StyleDefinition};
pub use package::Package;

use crate::error::SafetyError;

/// Content types part every container must carry.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
/// Main document body part.
pub const DOCUMENT_PART: &str = "word/document.xml";
/// Package relationships part.
pub const RELATIONSHIPS_PART: &str = "_rels/.rels";
/// Style definitions part.
pub const STYLES_PART: &str = "word/styles.xml";

/// Parts whose absence makes a container invalid.
pub const REQUIRED_PARTS: [&str; 3] = [CONTENT_TYPES_PART, DOCUMENT_PART, RELATIONSHIPS_PART];

/// Produces a [`Document`] for a path.
pub trait DocumentLoader {
    /// Loads the document stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::NotFound`] when `path` does not exist and
    /// [`SafetyError::Corruption`] when it cannot be read as a document.
    fn load(&self, path: &Path) -> Result<Document, SafetyError>;
}

/// Loads zipped WordprocessingML documents from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct OoxmlLoader;

impl DocumentLoader for OoxmlLoader {
    fn load(&self, path: &Path) -> Result<Document, SafetyError> {
        let mut package = Package::open(path)?;
        let body = package
            .read_part(DOCUMENT_PART)?
            .ok_or_else(|| SafetyError::corruption(path, format!("missing {DOCUMENT_PART}")))?;
        let document = Document::parse_body(&body).map_err(|message| {
            SafetyError::corruption(path, format!("{DOCUMENT_PART}: {message}"))
        })?;

        match package.read_part(STYLES_PART)? {
            Some(styles) => {
                let definitions = Document::parse_styles(&styles).map_err(|message| {
                    SafetyError::corruption(path, format!("{STYLES_PART}: {message}"))
                })?;
                Ok(document.with_styles(definitions))
            }
            None => Ok(document),
        }
    }
}
