use super::StageReport;
use super::shape::ConditionShape;
use crate::fields::FieldCatalog;
use crate::filter::suggest::suggest;
use crate::filter::tokenizer::TokenKind;

pub(crate) fn check(shapes: &[ConditionShape<'_>], catalog: &FieldCatalog) -> StageReport {
    let mut report = StageReport::default();

    for shape in shapes {
        let field = shape.field;
        if field.kind == TokenKind::Field {
            continue;
        }

        if field.kind == TokenKind::Operator {
            report.error_on(
                field,
                format!("Missing field name before operator '{}'", field.text),
                None,
            );
            continue;
        }

        let suggestion = suggest(&field.text, catalog.names());
        let message = match &suggestion {
            Some(s) => format!("Unknown field '{}', did you mean '{s}'?", field.text),
            None => format!("Unknown field '{}'", field.text),
        };
        report.error_on(field, message, suggestion);
    }

    report
}
