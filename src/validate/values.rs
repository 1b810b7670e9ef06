use super::{Highlight, Severity, StageReport};
use super::shape::ConditionShape;
use crate::filter::operator::FilterOperator;
use crate::filter::tokenizer::Token;
use regex::RegexBuilder;

pub(crate) fn check(tokens: &[&Token], shapes: &[ConditionShape<'_>]) -> StageReport {
    let mut report = StageReport::default();

    for token in tokens {
        if token.is_unterminated_value() {
            report.check.valid = false;
            report
                .check
                .errors
                .push(format!("Unterminated quoted value at offset {}", token.start));
            // Same span and message as the syntax stage so the highlight merges
            report.highlights.push(Highlight {
                start: token.start,
                end: token.start + 1,
                severity: Severity::Error,
                message: "Unmatched quote".to_string(),
                suggestion: None,
            });
        } else if token.unquoted() == Some("") {
            report.warning_on(token, "Empty value will match almost nothing".to_string());
        }
    }

    for shape in shapes {
        let (Some(operator), Some(value)) = (shape.operator, shape.value) else {
            continue;
        };
        let Some(qualified) = operator.qualified_operator() else {
            continue;
        };
        if qualified.operator != FilterOperator::Matches {
            continue;
        }
        let Some(pattern) = value.unquoted().filter(|p| !p.is_empty()) else {
            continue;
        };
        if let Err(err) = RegexBuilder::new(pattern)
            .case_insensitive(!qualified.case_sensitive)
            .build()
        {
            let detail = err.to_string();
            let summary = detail.lines().last().unwrap_or("invalid pattern").trim();
            report.warning_on(value, format!("Not a valid regular expression: {summary}"));
        }
    }

    report
}
