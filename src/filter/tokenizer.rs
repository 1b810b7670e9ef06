use super::operator::{LogicalOperator, Modifier, QualifiedOperator};
use super::suggest::suggest;
use crate::fields::FieldCatalog;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(?:"[^"]*"|'[^']*')"#).expect("valid quoted string regex"));
static UNTERMINATED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)^["'].*"#).expect("valid unterminated quote regex"));
static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.\-]+").expect("valid bare word regex"));
static GLYPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\(|\)|&&|\|\|)").expect("valid glyph regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+").expect("valid whitespace regex"));

/// Every non-field word the language reserves, in suggestion priority order.
static KEYWORDS: LazyLock<Vec<String>> = LazyLock::new(|| {
    let mut keywords = QualifiedOperator::all_keywords();
    keywords.extend(
        [LogicalOperator::And, LogicalOperator::Or]
            .iter()
            .map(|op| op.keyword().to_string()),
    );
    keywords.extend(
        [Modifier::Not, Modifier::CaseSensitive]
            .iter()
            .map(|m| m.keyword().to_string()),
    );
    keywords
});

/// Lexical class of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Field,
    Operator,
    Value,
    Logic,
    Modifier,
    Parenthesis,
    Whitespace,
    Error,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Field => "field",
            TokenKind::Operator => "operator",
            TokenKind::Value => "value",
            TokenKind::Logic => "logic",
            TokenKind::Modifier => "modifier",
            TokenKind::Parenthesis => "parenthesis",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Error => "error",
        };
        f.write_str(name)
    }
}

/// A classified span of the source text. `start..end` are byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Token {
    fn new(kind: TokenKind, text: &str, start: usize) -> Self {
        Self {
            kind,
            text: text.to_string(),
            start,
            end: start + text.len(),
            valid: kind != TokenKind::Error,
            suggestion: None,
        }
    }

    /// True for bare words, whatever they were classified as.
    pub fn is_word(&self) -> bool {
        match self.kind {
            TokenKind::Field | TokenKind::Operator | TokenKind::Modifier => true,
            TokenKind::Logic => !self.is_glyph(),
            TokenKind::Error => WORD_RE.is_match(&self.text),
            _ => false,
        }
    }

    fn is_glyph(&self) -> bool {
        self.text == "&&" || self.text == "||"
    }

    pub fn is_open_paren(&self) -> bool {
        self.kind == TokenKind::Parenthesis && self.text == "("
    }

    pub fn is_close_paren(&self) -> bool {
        self.kind == TokenKind::Parenthesis && self.text == ")"
    }

    /// A quoted value whose closing quote is missing
    pub fn is_unterminated_value(&self) -> bool {
        self.kind == TokenKind::Value && !self.valid
    }

    /// The text between the quotes of a terminated value token
    pub fn unquoted(&self) -> Option<&str> {
        if self.kind != TokenKind::Value || !self.valid || self.text.len() < 2 {
            return None;
        }
        self.text.get(1..self.text.len() - 1)
    }

    pub fn logical_operator(&self) -> Option<LogicalOperator> {
        (self.kind == TokenKind::Logic)
            .then(|| LogicalOperator::from_word(&self.text))
            .flatten()
    }

    pub fn modifier(&self) -> Option<Modifier> {
        (self.kind == TokenKind::Modifier)
            .then(|| Modifier::from_word(&self.text))
            .flatten()
    }

    pub fn qualified_operator(&self) -> Option<QualifiedOperator> {
        (self.kind == TokenKind::Operator)
            .then(|| QualifiedOperator::parse(&self.text))
            .flatten()
    }
}

/// Split `text` into tokens that exactly tile the input.
///
/// Unrecognised input is never dropped; it becomes an `Error` token, with a
/// suggestion when one of the keywords or catalog fields is close enough.
pub fn tokenize(text: &str, catalog: &FieldCatalog) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut candidates: Option<Vec<String>> = None;
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];

        let token = if let Some(m) = QUOTED_RE.find(rest) {
            Token::new(TokenKind::Value, m.as_str(), pos)
        } else if let Some(m) = UNTERMINATED_RE.find(rest) {
            let mut token = Token::new(TokenKind::Value, m.as_str(), pos);
            token.valid = false;
            token
        } else if let Some(m) = WORD_RE.find(rest) {
            let mut token = classify_word(m.as_str(), pos, catalog);
            if token.kind == TokenKind::Error {
                let candidates = candidates.get_or_insert_with(|| suggestion_candidates(catalog));
                token.suggestion = suggest(&token.text, candidates.as_slice());
            }
            token
        } else if let Some(m) = GLYPH_RE.find(rest) {
            let kind = match m.as_str() {
                "(" | ")" => TokenKind::Parenthesis,
                _ => TokenKind::Logic,
            };
            Token::new(kind, m.as_str(), pos)
        } else if let Some(m) = WHITESPACE_RE.find(rest) {
            Token::new(TokenKind::Whitespace, m.as_str(), pos)
        } else {
            let len = rest.chars().next().map_or(1, char::len_utf8);
            Token::new(TokenKind::Error, &rest[..len], pos)
        };

        pos = token.end;
        tokens.push(token);
    }

    tokens
}

fn classify_word(word: &str, start: usize, catalog: &FieldCatalog) -> Token {
    let kind = if catalog.contains(word) {
        TokenKind::Field
    } else if QualifiedOperator::parse(word).is_some() {
        TokenKind::Operator
    } else if LogicalOperator::from_word(word).is_some() {
        TokenKind::Logic
    } else if Modifier::from_word(word).is_some() {
        TokenKind::Modifier
    } else {
        TokenKind::Error
    };
    Token::new(kind, word, start)
}

fn suggestion_candidates(catalog: &FieldCatalog) -> Vec<String> {
    catalog
        .names()
        .iter()
        .cloned()
        .chain(KEYWORDS.iter().cloned())
        .collect()
}

/// Tokens with whitespace stripped out, for the structural passes
pub fn significant(tokens: &[Token]) -> Vec<&Token> {
    tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Whitespace)
        .collect()
}
