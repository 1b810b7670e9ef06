use crate::filter::tokenizer::{Token, TokenKind};

/// Positions of one `field [modifiers] operator value` run in the token
/// stream. Built from token positions only, so words inside quoted values
/// are never mistaken for fields or operators.
#[derive(Debug, Clone, Copy)]
pub struct ConditionShape<'a> {
    pub field: &'a Token,
    pub operator: Option<&'a Token>,
    pub value: Option<&'a Token>,
}

fn is_boundary(token: &Token) -> bool {
    token.kind == TokenKind::Logic || token.kind == TokenKind::Parenthesis
}

/// A condition starts at the beginning of input, after `(` and after a
/// logical keyword; leading modifiers are skipped.
pub fn condition_shapes<'a>(tokens: &[&'a Token]) -> Vec<ConditionShape<'a>> {
    let mut shapes = Vec::new();
    let mut at_start = true;
    let mut i = 0;

    while let Some(token) = tokens.get(i).copied() {
        if token.is_open_paren() || token.kind == TokenKind::Logic {
            at_start = true;
            i += 1;
            continue;
        }
        if !at_start {
            i += 1;
            continue;
        }
        at_start = false;

        while tokens.get(i).is_some_and(|t| t.modifier().is_some()) {
            i += 1;
        }
        let Some(field) = tokens.get(i).copied() else {
            break;
        };
        if !field.is_word() || field.kind == TokenKind::Logic {
            continue;
        }
        i += 1;

        while tokens.get(i).is_some_and(|t| t.modifier().is_some()) {
            i += 1;
        }

        let mut shape = ConditionShape {
            field,
            operator: None,
            value: None,
        };
        if let Some(operator) = tokens.get(i).copied()
            && operator.is_word()
            && operator.kind != TokenKind::Logic
        {
            shape.operator = Some(operator);
            i += 1;
            if let Some(value) = tokens.get(i).copied()
                && !is_boundary(value)
            {
                shape.value = Some(value);
                i += 1;
            }
        }
        shapes.push(shape);
    }

    shapes
}
