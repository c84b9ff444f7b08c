//! Individual validation findings.

use std::fmt;

use serde::Serialize;
use strum::{Display, EnumString};

use crate::error::ErrorKind;

/// How serious a finding is. Only [`Severity::Error`] makes a result invalid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, Serialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The document is unusable or breaks a required rule.
    Error,
    /// The document works but should be reviewed.
    Warning,
    /// Informational detail.
    Info,
}

/// Machine-readable identity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    /// Path is not a regular file.
    NotAFile,
    /// Extension is not one of the WordprocessingML extensions.
    UnexpectedExtension,
    /// Container is not a zip archive.
    InvalidZip,
    /// A required part is absent.
    MissingRequiredPart,
    /// A part is not well-formed XML.
    MalformedXml,
    /// A part cannot be decompressed or fails its checksum.
    CorruptPart,
    /// Summary of the parsed body.
    DocumentSummary,
    /// The styles part is absent.
    MissingStyles,
    /// Style counts.
    StyleSummary,
    /// A defined style is never referenced.
    UnusedStyle,
    /// A referenced style is not defined.
    UndefinedStyle,
    /// Heading counts.
    HeadingSummary,
    /// Headings were required but none exist.
    NoHeadings,
    /// The first paragraph is not a heading.
    MissingLeadingHeading,
    /// A heading skips one or more levels.
    HeadingLevelJump,
    /// A heading is deeper than allowed.
    HeadingTooDeep,
    /// A heading has no text.
    EmptyHeading,
    /// The document has no text at all.
    EmptyDocument,
    /// Word and character counts.
    ContentSummary,
    /// Fewer words than the minimum.
    InsufficientWords,
    /// More words than the maximum.
    ExcessiveWords,
    /// The body contains no words.
    EmptyContent,
}

impl IssueCode {
    /// Error taxonomy entry for findings that describe a damaged container.
    #[must_use]
    pub const fn classification(self) -> Option<ErrorKind> {
        match self {
            Self::InvalidZip
            | Self::MissingRequiredPart
            | Self::MalformedXml
            | Self::CorruptPart => Some(ErrorKind::Corruption),
            _ => None,
        }
    }
}

/// Where in the document a finding applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum IssueLocation {
    /// A container part.
    Part {
        /// Part name, e.g. `word/document.xml`.
        name: String,
    },
    /// A paragraph by zero-based index.
    Paragraph {
        /// Paragraph index.
        index: usize,
    },
    /// The n-th heading, counted from one.
    Heading {
        /// Heading ordinal.
        ordinal: usize,
        /// Heading text, shortened.
        text: String,
    },
    /// A style by id.
    Style {
        /// Style id.
        id: String,
    },
}

impl fmt::Display for IssueLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Part { name } => write!(f, "part '{name}'"),
            Self::Paragraph { index } => write!(f, "paragraph {}", index + 1),
            Self::Heading { ordinal, text } if text.is_empty() => write!(f, "heading {ordinal}"),
            Self::Heading { ordinal, text } => write!(f, "heading {ordinal}: '{text}'"),
            Self::Style { id } => write!(f, "style '{id}'"),
        }
    }
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    severity: Severity,
    code: IssueCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<IssueLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
}

impl ValidationIssue {
    /// Creates a finding.
    #[must_use]
    pub fn new(severity: Severity, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            location: None,
            suggestion: None,
        }
    }

    /// Creates an error finding.
    #[must_use]
    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Creates a warning finding.
    #[must_use]
    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Creates an informational finding.
    #[must_use]
    pub fn info(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    /// Attaches a location.
    #[must_use]
    pub fn at(mut self, location: IssueLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Attaches a remediation hint.
    #[must_use]
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Severity of the finding.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Machine-readable code.
    #[must_use]
    pub const fn code(&self) -> IssueCode {
        self.code
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Where the finding applies, if known.
    #[must_use]
    pub const fn location(&self) -> Option<&IssueLocation> {
        self.location.as_ref()
    }

    /// Suggested remediation, if any.
    #[must_use]
    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    /// Error taxonomy entry, see [`IssueCode::classification`].
    #[must_use]
    pub const fn classification(&self) -> Option<ErrorKind> {
        self.code.classification()
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.severity.to_string().to_uppercase())?;
        if let Some(location) = &self.location {
            write!(f, " ({location})")?;
        }
        write!(f, " {}", self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " -> {suggestion}")?;
        }
        Ok(())
    }
}
