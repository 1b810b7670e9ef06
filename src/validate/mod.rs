//! Local validation of filter expressions.
//!
//! Five independent checks run over the same token stream and never stop
//! at the first problem, so an author sees everything that is wrong at once:
//!
//! 1. syntax shape (dangling logic, empty parentheses, quotes, known typos)
//! 2. parenthesis balance, over raw characters
//! 3. field names against the catalog
//! 4. operator keywords and value quoting
//! 5. values (empty values, regular expression syntax)
//!
//! Nothing here returns an error: every problem is data in
//! [`ValidationResult`].

mod fields;
mod operators;
mod parens;
mod shape;
mod syntax;
mod values;

use crate::fields::FieldCatalog;
use crate::filter::parser::text_to_tree;
use crate::filter::tokenizer::{Token, significant, tokenize};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

pub use shape::{ConditionShape, condition_shapes};
pub use syntax::known_misspelling;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A span of the expression to mark in the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub start: usize,
    pub end: usize,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// Outcome of one validation category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Default for CheckResult {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Errors and highlights collected by one stage
#[derive(Debug, Default)]
pub(crate) struct StageReport {
    pub check: CheckResult,
    pub highlights: Vec<Highlight>,
}

impl StageReport {
    pub fn error_at(&mut self, start: usize, end: usize, message: String) {
        self.error_with_suggestion(start, end, message, None);
    }

    pub fn error_on(&mut self, token: &Token, message: String, suggestion: Option<String>) {
        self.error_with_suggestion(token.start, token.end, message, suggestion);
    }

    pub fn error_with_suggestion(
        &mut self,
        start: usize,
        end: usize,
        message: String,
        suggestion: Option<String>,
    ) {
        self.check.valid = false;
        self.check.errors.push(message.clone());
        self.highlights.push(Highlight {
            start,
            end,
            severity: Severity::Error,
            message,
            suggestion,
        });
    }

    pub fn warning_on(&mut self, token: &Token, message: String) {
        self.check.warnings.push(message.clone());
        self.highlights.push(Highlight {
            start: token.start,
            end: token.end,
            severity: Severity::Warning,
            message,
            suggestion: None,
        });
    }

    pub fn absorb(&mut self, other: StageReport) {
        self.check.valid &= other.check.valid;
        self.check.errors.extend(other.check.errors);
        self.check.warnings.extend(other.check.warnings);
        self.highlights.extend(other.highlights);
    }
}

/// How the authoritative check ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ServerStatus {
    Confirmed,
    Rejected { error: String },
    /// The call never produced an answer; local validation stands alone
    Unavailable { reason: String },
}

/// Authoritative result merged into a [`ValidationResult`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerValidation {
    #[serde(flatten)]
    pub status: ServerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression_tree: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_channels: Option<u64>,
}

impl ServerValidation {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            status: ServerStatus::Unavailable {
                reason: reason.into(),
            },
            expression_tree: None,
            matched_count: None,
            total_channels: None,
        }
    }
}

/// The categories an editor shows a status indicator for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Syntax,
    Fields,
    Operators,
    Values,
    Server,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Syntax => "Syntax",
            Category::Fields => "Fields",
            Category::Operators => "Operators",
            Category::Values => "Values",
            Category::Server => "Server",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Ok,
    Warning,
    Error,
    NotChecked,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub syntax: CheckResult,
    pub fields: CheckResult,
    pub operators: CheckResult,
    pub values: CheckResult,
    pub highlights: Vec<Highlight>,
    #[serde(rename = "serverValidation", skip_serializing_if = "Option::is_none")]
    pub server_validation: Option<ServerValidation>,
}

impl ValidationResult {
    /// Merge an authoritative result. A server rejection makes the result
    /// invalid; an unavailable server leaves local validity untouched.
    pub fn merge_server(&mut self, server: ServerValidation) {
        if matches!(server.status, ServerStatus::Rejected { .. }) {
            self.valid = false;
        }
        self.server_validation = Some(server);
    }

    pub fn local_valid(&self) -> bool {
        self.syntax.valid && self.fields.valid && self.operators.valid && self.values.valid
    }

    pub fn error_count(&self) -> usize {
        self.highlights
            .iter()
            .filter(|h| h.severity == Severity::Error)
            .count()
    }

    pub fn indicators(&self) -> Vec<(Category, Indicator)> {
        let local = |check: &CheckResult| {
            if !check.valid {
                Indicator::Error
            } else if !check.warnings.is_empty() {
                Indicator::Warning
            } else {
                Indicator::Ok
            }
        };
        let server = match self.server_validation.as_ref().map(|s| &s.status) {
            None => Indicator::NotChecked,
            Some(ServerStatus::Confirmed) => Indicator::Ok,
            Some(ServerStatus::Rejected { .. }) => Indicator::Error,
            Some(ServerStatus::Unavailable { .. }) => Indicator::Unavailable,
        };
        vec![
            (Category::Syntax, local(&self.syntax)),
            (Category::Fields, local(&self.fields)),
            (Category::Operators, local(&self.operators)),
            (Category::Values, local(&self.values)),
            (Category::Server, server),
        ]
    }
}

/// Run every local check over `text`.
pub fn validate(text: &str, catalog: &FieldCatalog) -> ValidationResult {
    let tokens = tokenize(text, catalog);
    let sig = significant(&tokens);
    let shapes = condition_shapes(&sig);

    let mut syntax = syntax::check(&sig, &shapes);
    syntax.absorb(parens::check(text));
    let fields = fields::check(&shapes, catalog);
    let operators = operators::check(&shapes);
    let values = values::check(&sig, &shapes);

    let nothing_found =
        syntax.check.valid && fields.check.valid && operators.check.valid && values.check.valid;
    if nothing_found && let Err(err) = text_to_tree(text) {
        let offset = err.offset().unwrap_or(0);
        let (start, end) = tokens
            .iter()
            .find(|t| t.start == offset)
            .map_or((offset, offset), |t| (t.start, t.end));
        let message = match &err {
            crate::filter::FilterParseError::Syntax { message, .. } => message.clone(),
            other => other.to_string(),
        };
        syntax.error_at(start, end, message);
    }

    let mut highlights = Vec::new();
    for stage in [&syntax, &fields, &operators, &values] {
        highlights.extend(stage.highlights.iter().cloned());
    }

    let mut result = ValidationResult {
        valid: false,
        syntax: syntax.check,
        fields: fields.check,
        operators: operators.check,
        values: values.check,
        highlights: dedup_highlights(highlights),
        server_validation: None,
    };
    result.valid = result.local_valid();
    result
}

/// Several stages can flag the same span with the same message; keep the
/// first and order the rest by position.
fn dedup_highlights(highlights: Vec<Highlight>) -> Vec<Highlight> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Highlight> = highlights
        .into_iter()
        .filter(|h| seen.insert((h.start, h.end, h.message.clone())))
        .collect();
    unique.sort_by_key(|h| (h.start, h.end));
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> FieldCatalog {
        FieldCatalog::from_names(["channel_name", "group_title"])
    }

    #[test]
    fn test_valid_expression_has_no_highlights() {
        let result = validate(r#"channel_name contains "sport""#, &catalog());
        assert!(result.valid);
        assert!(result.highlights.is_empty());
        assert!(result.server_validation.is_none());
    }

    #[test]
    fn test_all_stages_report_independently() {
        let result = validate(r#"(foo contans "x" AND group_title equals sport"#, &catalog());
        assert!(!result.valid);
        assert!(!result.syntax.valid);
        assert!(!result.fields.valid);
        assert!(!result.operators.valid);
        assert!(result.values.valid);
    }

    #[test]
    fn test_dedup_keeps_distinct_positions() {
        let result = validate(r#"((channel_name contains "x""#, &catalog());
        let unclosed: Vec<_> = result
            .highlights
            .iter()
            .filter(|h| h.message.contains("Unclosed"))
            .map(|h| h.start)
            .collect();
        assert_eq!(unclosed, vec![0, 1]);
    }

    #[test]
    fn test_incomplete_condition_is_caught_by_structure_check() {
        // Parses nowhere, but no individual stage objects to the tokens
        let result = validate(r#"channel_name contains "x" group_title"#, &catalog());
        assert!(!result.valid);
        assert!(!result.syntax.valid);
    }

    #[test]
    fn test_server_merge() {
        let mut result = validate(r#"channel_name contains "x""#, &catalog());
        result.merge_server(ServerValidation::unavailable("connection refused"));
        assert!(result.valid);
        assert_eq!(
            result.indicators().last(),
            Some(&(Category::Server, Indicator::Unavailable))
        );

        result.merge_server(ServerValidation {
            status: ServerStatus::Rejected {
                error: "bad regex".to_string(),
            },
            expression_tree: None,
            matched_count: None,
            total_channels: None,
        });
        assert!(!result.valid);
        assert!(result.local_valid());
    }

    #[test]
    fn test_empty_value_is_a_warning_only() {
        let result = validate(r#"channel_name equals """#, &catalog());
        assert!(result.valid);
        assert_eq!(result.values.warnings.len(), 1);
        assert_eq!(result.highlights[0].severity, Severity::Warning);
        assert_eq!(
            result.indicators()[3],
            (Category::Values, Indicator::Warning)
        );
    }
}
