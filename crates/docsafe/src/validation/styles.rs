//! Style hygiene: defined versus referenced styles.

use super::issue::{IssueCode, IssueLocation, ValidationIssue};
use super::result::ValidationResult;
use crate::document::{Document, StyleDefinition};

/// Unused styles reported individually before the rest are summarised.
const UNUSED_STYLE_WARNING_LIMIT: usize = 5;

/// Options for [`Validator::validate_styles`](super::Validator::validate_styles).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleRules {
    /// Warn about defined styles nothing references.
    pub check_unused: bool,
    /// Warn about referenced styles with no definition.
    pub check_undefined: bool,
}

impl StyleRules {
    /// Summary only; both hygiene checks are opt-in.
    #[must_use]
    pub const fn summary() -> Self {
        Self {
            check_unused: false,
            check_undefined: false,
        }
    }

    /// Both hygiene checks.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            check_unused: true,
            check_undefined: true,
        }
    }
}

impl Default for StyleRules {
    fn default() -> Self {
        Self::summary()
    }
}

pub(super) fn inspect(document: &Document, rules: StyleRules, result: &mut ValidationResult) {
    let Some(styles) = document.styles() else {
        result.push(
            ValidationIssue::warning(IssueCode::MissingStyles, "No styles part found")
                .suggest("The document may have no custom styles"),
        );
        return;
    };

    let referenced = document.referenced_styles();
    let defined_names: Vec<String> = styles
        .iter()
        .map(|style| style.display_name().to_owned())
        .collect();
    let used_names: Vec<String> = referenced
        .iter()
        .map(|id| {
            document
                .style(id)
                .map_or(*id, StyleDefinition::display_name)
                .to_owned()
        })
        .collect();

    result.push(ValidationIssue::info(
        IssueCode::StyleSummary,
        format!(
            "Found {} defined styles, {} used",
            defined_names.len(),
            used_names.len()
        ),
    ));
    result.record("defined_style_count", defined_names.len());
    result.record("used_style_count", used_names.len());
    result.record("defined_styles", defined_names);
    result.record("used_styles", used_names);

    if rules.check_undefined {
        for id in referenced.iter().filter(|id| document.style(id).is_none()) {
            result.push(
                ValidationIssue::warning(
                    IssueCode::UndefinedStyle,
                    format!("Style '{id}' is used but not defined"),
                )
                .at(style_location(id))
                .suggest("Add a style definition or remove the reference"),
            );
        }
    }

    if rules.check_unused {
        let unused: Vec<&StyleDefinition> = styles
            .iter()
            .filter(|style| !referenced.contains(style.id()))
            .collect();
        if unused.is_empty() {
            return;
        }
        result.push(ValidationIssue::info(
            IssueCode::UnusedStyle,
            format!("Found {} unused styles", unused.len()),
        ));
        for style in unused.iter().take(UNUSED_STYLE_WARNING_LIMIT) {
            result.push(
                ValidationIssue::warning(
                    IssueCode::UnusedStyle,
                    format!("Style '{}' is defined but never used", style.display_name()),
                )
                .at(style_location(style.id()))
                .suggest("Consider removing the unused style"),
            );
        }
        let remaining = unused.len().saturating_sub(UNUSED_STYLE_WARNING_LIMIT);
        if remaining > 0 {
            result.push(ValidationIssue::info(
                IssueCode::UnusedStyle,
                format!("... and {remaining} more unused styles"),
            ));
        }
    }
}

fn style_location(id: &str) -> IssueLocation {
    IssueLocation::Style { id: id.to_owned() }
}
