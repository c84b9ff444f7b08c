//! Heading hierarchy checks.

use super::issue::{IssueCode, IssueLocation, ValidationIssue};
use super::result::ValidationResult;
use crate::document::{Document, Heading, Paragraph};

const HEADING_TEXT_LIMIT: usize = 50;

/// Options for [`Validator::validate_structure`](super::Validator::validate_structure).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructureRules {
    /// Require at least one heading, and expect the document to open with
    /// one.
    pub require_heading: bool,
    /// Deepest heading level allowed, e.g. `Some(3)` for H1 to H3.
    pub max_depth: Option<u8>,
}

pub(super) fn inspect(document: &Document, rules: StructureRules, result: &mut ValidationResult) {
    let headings = document.headings();
    result.record("paragraph_count", document.paragraphs().len());
    result.record("heading_count", headings.len());
    result.push(ValidationIssue::info(
        IssueCode::HeadingSummary,
        format!("Found {} headings", headings.len()),
    ));

    let deepest = headings.iter().map(Heading::level).max();
    if let Some(level) = deepest {
        result.record("max_heading_level", usize::from(level));
        result.push(ValidationIssue::info(
            IssueCode::HeadingSummary,
            format!("Maximum heading level: H{level}"),
        ));
    }

    if rules.require_heading {
        match headings.first() {
            None => result.push(
                ValidationIssue::error(
                    IssueCode::NoHeadings,
                    "Document does not contain any headings",
                )
                .suggest("Add at least one heading to structure the document"),
            ),
            Some(first) if first.index() > 0 => result.push(
                ValidationIssue::warning(
                    IssueCode::MissingLeadingHeading,
                    "Document does not start with a heading",
                )
                .at(IssueLocation::Paragraph { index: 0 })
                .suggest("Consider starting with a heading"),
            ),
            Some(_) => {}
        }
    }

    if let (Some(limit), Some(level)) = (rules.max_depth, deepest)
        && level > limit
    {
        result.push(
            ValidationIssue::warning(
                IssueCode::HeadingTooDeep,
                format!("Document uses heading level H{level}, exceeding max depth H{limit}"),
            )
            .suggest(format!("Limit heading depth to H{limit}")),
        );
    }

    check_sequence(&headings, result);

    if !document.paragraphs().iter().any(Paragraph::has_text) {
        result.push(ValidationIssue::warning(
            IssueCode::EmptyDocument,
            "Document appears to be empty (no text content)",
        ));
    }
}

/// Flags level jumps and empty headings. The first heading is compared
/// against level 0, so a document opening with H2 is a jump.
fn check_sequence(headings: &[Heading], result: &mut ValidationResult) {
    let mut previous = 0_u8;
    for (position, heading) in headings.iter().enumerate() {
        let ordinal = position + 1;
        let level = heading.level();
        if level > previous + 1 {
            result.push(
                ValidationIssue::warning(
                    IssueCode::HeadingLevelJump,
                    format!("Heading level jump: H{previous} -> H{level}"),
                )
                .at(IssueLocation::Heading {
                    ordinal,
                    text: heading.text().chars().take(HEADING_TEXT_LIMIT).collect(),
                })
                .suggest(format!("Use H{} instead of H{level}", previous + 1)),
            );
        }
        if heading.text().is_empty() {
            result.push(
                ValidationIssue::warning(
                    IssueCode::EmptyHeading,
                    format!("Empty heading at H{level}"),
                )
                .at(IssueLocation::Heading {
                    ordinal,
                    text: String::new(),
                })
                .suggest("Remove the empty heading or add content"),
            );
        }
        previous = level;
    }
}
