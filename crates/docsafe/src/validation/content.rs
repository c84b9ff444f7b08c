//! Word-count bounds.

use super::issue::{IssueCode, ValidationIssue};
use super::result::ValidationResult;
use crate::document::Document;

/// Options for [`Validator::validate_content`](super::Validator::validate_content).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentRules {
    /// Fewest words allowed.
    pub min_words: Option<usize>,
    /// Most words allowed.
    pub max_words: Option<usize>,
}

impl ContentRules {
    /// Bounds the word count on both sides.
    #[must_use]
    pub const fn between(min_words: usize, max_words: usize) -> Self {
        Self {
            min_words: Some(min_words),
            max_words: Some(max_words),
        }
    }
}

pub(super) fn inspect(document: &Document, rules: ContentRules, result: &mut ValidationResult) {
    let words = document.word_count();
    let characters = document.character_count();
    result.record("word_count", words);
    result.record("character_count", characters);
    result.push(ValidationIssue::info(
        IssueCode::ContentSummary,
        format!("Word count: {words}"),
    ));
    result.push(ValidationIssue::info(
        IssueCode::ContentSummary,
        format!("Character count: {characters}"),
    ));

    if let Some(min) = rules.min_words
        && words < min
    {
        result.push(
            ValidationIssue::error(
                IssueCode::InsufficientWords,
                format!("Document has {words} words, minimum is {min}"),
            )
            .suggest(format!("Add at least {} more words", min - words)),
        );
    }
    if let Some(max) = rules.max_words
        && words > max
    {
        result.push(
            ValidationIssue::error(
                IssueCode::ExcessiveWords,
                format!("Document has {words} words, maximum is {max}"),
            )
            .suggest(format!("Remove at least {} words", words - max)),
        );
    }
    if words == 0 {
        result.push(ValidationIssue::warning(
            IssueCode::EmptyContent,
            "Document contains no text",
        ));
    }
}
