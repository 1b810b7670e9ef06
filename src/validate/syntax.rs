use super::StageReport;
use super::shape::ConditionShape;
use crate::filter::tokenizer::{Token, TokenKind};

/// Misspellings of operator keywords seen often enough to correct by name.
const KNOWN_MISSPELLINGS: &[(&str, &str)] = &[
    ("contans", "contains"),
    ("contians", "contains"),
    ("conatins", "contains"),
    ("containz", "contains"),
    ("contain", "contains"),
    ("contais", "contains"),
    ("cotains", "contains"),
    ("equls", "equals"),
    ("eqals", "equals"),
    ("eqauls", "equals"),
    ("equal", "equals"),
    ("equels", "equals"),
    ("euqals", "equals"),
    ("matchs", "matches"),
    ("mathces", "matches"),
    ("macthes", "matches"),
    ("match", "matches"),
    ("startswith", "starts_with"),
    ("startwith", "starts_with"),
    ("start_with", "starts_with"),
    ("starts-with", "starts_with"),
    ("starts_width", "starts_with"),
    ("stats_with", "starts_with"),
    ("endswith", "ends_with"),
    ("endwith", "ends_with"),
    ("end_with", "ends_with"),
    ("ends-with", "ends_with"),
    ("ends_width", "ends_with"),
];

/// Correction for a known operator misspelling, if `word` is one
pub fn known_misspelling(word: &str) -> Option<&'static str> {
    let lower = word.to_lowercase();
    KNOWN_MISSPELLINGS
        .iter()
        .find(|(typo, _)| *typo == lower)
        .map(|(_, fix)| *fix)
}

pub(crate) fn check(tokens: &[&Token], shapes: &[ConditionShape<'_>]) -> StageReport {
    let mut report = StageReport::default();

    let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
        report.check.valid = false;
        report
            .check
            .errors
            .push("Filter expression is empty".to_string());
        return report;
    };

    if first.kind == TokenKind::Logic {
        report.error_on(
            first,
            format!("Expression cannot start with '{}'", first.text),
            None,
        );
    }
    if last.kind == TokenKind::Logic && tokens.len() > 1 {
        report.error_on(
            last,
            format!("Expression cannot end with '{}'", last.text),
            None,
        );
    }

    for pair in tokens.windows(2) {
        let (prev, next) = (pair[0], pair[1]);

        if prev.is_open_paren() && next.is_close_paren() {
            report.error_at(prev.start, next.end, "Empty parentheses".to_string());
        }
        if prev.kind == TokenKind::Logic && next.kind == TokenKind::Logic {
            report.error_on(
                next,
                format!(
                    "Consecutive logical operators '{}' and '{}'",
                    prev.text, next.text
                ),
                None,
            );
        }
        if prev.is_open_paren() && next.kind == TokenKind::Logic {
            report.error_on(
                next,
                format!("'{}' has nothing on its left", next.text),
                None,
            );
        }
        if prev.kind == TokenKind::Logic && next.is_close_paren() {
            report.error_on(
                prev,
                format!("'{}' has nothing on its right", prev.text),
                None,
            );
        }
    }

    for token in tokens {
        if token.is_unterminated_value() {
            report.error_at(token.start, token.start + 1, "Unmatched quote".to_string());
        } else if token.kind == TokenKind::Error && !token.is_word() {
            report.error_on(
                token,
                format!("Unexpected character '{}'", token.text),
                None,
            );
        }
    }

    for operator in shapes.iter().filter_map(|s| s.operator) {
        if operator.kind == TokenKind::Operator {
            continue;
        }
        if let Some(fix) = known_misspelling(&operator.text) {
            report.error_on(
                operator,
                format!("Unknown operator '{}', did you mean '{fix}'?", operator.text),
                Some(fix.to_string()),
            );
        }
    }

    report
}
