use super::error::FilterParseError;
use super::operator::{FilterOperator, LogicalOperator, Modifier};
use super::suggest::suggest;
use super::tokenizer::{Token, TokenKind, significant, tokenize};
use super::tree::{Condition, ConditionNode, ConditionTree};
use crate::fields::FieldCatalog;

/// Deepest parenthesis nesting accepted, the same limit serde_json applies.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Parse expression text into a condition tree.
///
/// ```text
/// expression := and_chain (OR and_chain)*
/// and_chain  := term (AND term)*
/// term       := '(' expression ')' | condition
/// condition  := modifier* field modifier* operator quoted_value
/// ```
///
/// AND binds tighter than OR. Chains of the same operator flatten into one
/// group; parenthesised sub-expressions keep their own group.
pub fn text_to_tree(text: &str) -> Result<ConditionNode, FilterParseError> {
    // Field names are positional here, so no catalog is needed
    let tokens = tokenize(text, &FieldCatalog::default());
    let mut parser = Parser {
        tokens: significant(&tokens),
        pos: 0,
        end: text.len(),
        depth: 0,
    };

    if parser.tokens.is_empty() {
        return Err(FilterParseError::syntax("Filter expression is empty", Some(0)));
    }

    let node = parser.parse_expression()?;

    if let Some(token) = parser.peek() {
        let message = if token.is_close_paren() {
            "Unmatched closing parenthesis".to_string()
        } else {
            format!(
                "Unexpected '{}' after complete condition; expected AND or OR",
                token.text
            )
        };
        return Err(FilterParseError::syntax(message, Some(token.start)));
    }

    Ok(node)
}

/// Parse into the persisted `{root}` form
pub fn parse_tree(text: &str) -> Result<ConditionTree, FilterParseError> {
    text_to_tree(text).map(ConditionTree::new)
}

struct Parser<'a> {
    tokens: Vec<&'a Token>,
    pos: usize,
    end: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_logical(&self) -> Option<LogicalOperator> {
        self.peek().and_then(Token::logical_operator)
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |t| t.start)
    }

    fn parse_expression(&mut self) -> Result<ConditionNode, FilterParseError> {
        self.parse_chain(LogicalOperator::Or)
    }

    fn parse_chain(&mut self, operator: LogicalOperator) -> Result<ConditionNode, FilterParseError> {
        let mut children = vec![self.parse_operand(operator)?];
        while self.peek_logical() == Some(operator) {
            self.advance();
            children.push(self.parse_operand(operator)?);
        }

        if children.len() == 1 {
            Ok(children.remove(0))
        } else {
            Ok(ConditionNode::group(operator, children))
        }
    }

    fn parse_operand(&mut self, chain: LogicalOperator) -> Result<ConditionNode, FilterParseError> {
        match chain {
            LogicalOperator::Or => self.parse_chain(LogicalOperator::And),
            LogicalOperator::And => self.parse_term(),
        }
    }

    fn parse_term(&mut self) -> Result<ConditionNode, FilterParseError> {
        let Some(token) = self.peek() else {
            return Err(FilterParseError::syntax(
                "Unexpected end of expression; expected a condition",
                Some(self.end),
            ));
        };

        if token.is_open_paren() {
            if self.depth >= MAX_NESTING_DEPTH {
                return Err(FilterParseError::syntax(
                    "Expression nested too deeply",
                    Some(token.start),
                ));
            }
            self.advance();
            if self.peek().is_some_and(Token::is_close_paren) {
                return Err(FilterParseError::syntax(
                    "Empty parentheses",
                    Some(token.start),
                ));
            }
            self.depth += 1;
            let node = self.parse_expression();
            self.depth -= 1;
            let node = node?;
            match self.peek() {
                Some(close) if close.is_close_paren() => {
                    self.advance();
                    Ok(node)
                }
                _ => Err(FilterParseError::syntax(
                    "Missing closing parenthesis",
                    Some(token.start),
                )),
            }
        } else {
            self.parse_condition()
        }
    }

    fn parse_condition(&mut self) -> Result<ConditionNode, FilterParseError> {
        let mut negate = false;
        let mut case_sensitive = false;
        self.parse_modifiers(&mut negate, &mut case_sensitive)?;

        let field = self.expect_field()?;
        self.parse_modifiers(&mut negate, &mut case_sensitive)?;

        let operator = self.expect_operator(&field, &mut negate, &mut case_sensitive)?;
        let value = self.expect_value(operator)?;

        Ok(ConditionNode::Condition(Condition {
            field,
            operator,
            value,
            negate,
            case_sensitive,
        }))
    }

    fn parse_modifiers(
        &mut self,
        negate: &mut bool,
        case_sensitive: &mut bool,
    ) -> Result<(), FilterParseError> {
        while let Some(token) = self.peek() {
            let Some(modifier) = token.modifier() else {
                break;
            };
            apply_modifier(modifier, negate, case_sensitive, token.start)?;
            self.advance();
        }
        Ok(())
    }

    fn expect_field(&mut self) -> Result<String, FilterParseError> {
        let offset = self.offset();
        let Some(token) = self.advance() else {
            return Err(FilterParseError::syntax(
                "Unexpected end of expression; expected a field name",
                Some(offset),
            ));
        };

        match token.kind {
            TokenKind::Field => Ok(token.text.clone()),
            TokenKind::Error if token.is_word() => Ok(token.text.clone()),
            TokenKind::Error => Err(FilterParseError::syntax(
                format!("Unexpected character '{}'", token.text),
                Some(token.start),
            )),
            TokenKind::Value => Err(FilterParseError::syntax(
                "Expected a field name before the value",
                Some(token.start),
            )),
            _ => Err(FilterParseError::syntax(
                format!("Expected a field name, found '{}'", token.text),
                Some(token.start),
            )),
        }
    }

    fn expect_operator(
        &mut self,
        field: &str,
        negate: &mut bool,
        case_sensitive: &mut bool,
    ) -> Result<FilterOperator, FilterParseError> {
        let offset = self.offset();
        let token = match self.peek() {
            Some(token) if token.kind == TokenKind::Operator || token.is_word() => token,
            _ => {
                return Err(FilterParseError::syntax(
                    format!("Expected an operator after field '{field}'"),
                    Some(offset),
                ));
            }
        };

        let Some(qualified) = token.qualified_operator() else {
            let keywords = FilterOperator::ALL.map(|op| op.keyword());
            let hint = suggest(&token.text, &keywords)
                .map(|s| format!(" (did you mean '{s}'?)"))
                .unwrap_or_default();
            return Err(FilterParseError::syntax(
                format!("Unknown operator '{}'{hint}", token.text),
                Some(token.start),
            ));
        };
        self.advance();

        if qualified.negate {
            apply_modifier(Modifier::Not, negate, case_sensitive, token.start)?;
        }
        if qualified.case_sensitive {
            apply_modifier(Modifier::CaseSensitive, negate, case_sensitive, token.start)?;
        }
        Ok(qualified.operator)
    }

    fn expect_value(&mut self, operator: FilterOperator) -> Result<String, FilterParseError> {
        let offset = self.offset();
        let Some(token) = self.peek() else {
            return Err(FilterParseError::syntax(
                format!("Expected a quoted value after '{operator}'"),
                Some(offset),
            ));
        };

        if token.is_unterminated_value() {
            return Err(FilterParseError::syntax(
                "Unterminated quoted value",
                Some(token.start),
            ));
        }
        if let Some(value) = token.unquoted() {
            self.advance();
            return Ok(value.to_string());
        }
        if token.is_word() {
            return Err(FilterParseError::syntax(
                format!("Value '{}' must be quoted", token.text),
                Some(token.start),
            ));
        }
        Err(FilterParseError::syntax(
            format!("Expected a quoted value after '{operator}'"),
            Some(token.start),
        ))
    }
}

fn apply_modifier(
    modifier: Modifier,
    negate: &mut bool,
    case_sensitive: &mut bool,
    offset: usize,
) -> Result<(), FilterParseError> {
    let flag = match modifier {
        Modifier::Not => negate,
        Modifier::CaseSensitive => case_sensitive,
    };
    if *flag {
        return Err(FilterParseError::syntax(
            format!("Duplicate '{}' modifier", modifier.keyword()),
            Some(offset),
        ));
    }
    *flag = true;
    Ok(())
}
