use super::StageReport;
use super::shape::ConditionShape;
use super::syntax::known_misspelling;
use crate::filter::operator::QualifiedOperator;
use crate::filter::suggest::suggest;
use crate::filter::tokenizer::TokenKind;
use std::sync::LazyLock;

static OPERATOR_KEYWORDS: LazyLock<Vec<String>> = LazyLock::new(QualifiedOperator::all_keywords);

pub(crate) fn check(shapes: &[ConditionShape<'_>]) -> StageReport {
    let mut report = StageReport::default();

    for shape in shapes {
        if shape.field.kind == TokenKind::Operator {
            // Reported by the field stage
            continue;
        }

        let Some(operator) = shape.operator else {
            report.error_on(
                shape.field,
                format!("Missing operator after field '{}'", shape.field.text),
                None,
            );
            continue;
        };

        if operator.kind != TokenKind::Operator {
            // Known typos are the syntax stage's to report
            if known_misspelling(&operator.text).is_some() {
                continue;
            }
            let suggestion = suggest(&operator.text, OPERATOR_KEYWORDS.as_slice());
            let message = match &suggestion {
                Some(s) => format!("Unknown operator '{}', did you mean '{s}'?", operator.text),
                None => format!("Unknown operator '{}'", operator.text),
            };
            report.error_on(operator, message, suggestion);
            continue;
        }

        match shape.value {
            None => report.error_on(
                operator,
                format!("Missing value after operator '{}'", operator.text),
                None,
            ),
            Some(value) if value.is_word() => report.error_on(
                value,
                format!("Missing quotes around value '{}'", value.text),
                Some(format!("\"{}\"", value.text)),
            ),
            Some(_) => {}
        }
    }

    report
}
