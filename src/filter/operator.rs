use super::error::FilterParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Base comparison operators, before any modifier prefix is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Contains,
    Equals,
    Matches,
    StartsWith,
    EndsWith,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 5] = [
        FilterOperator::Contains,
        FilterOperator::Equals,
        FilterOperator::Matches,
        FilterOperator::StartsWith,
        FilterOperator::EndsWith,
    ];

    /// Get the keyword used for this operator in expression text
    pub fn keyword(&self) -> &'static str {
        match self {
            FilterOperator::Contains => "contains",
            FilterOperator::Equals => "equals",
            FilterOperator::Matches => "matches",
            FilterOperator::StartsWith => "starts_with",
            FilterOperator::EndsWith => "ends_with",
        }
    }

    fn from_keyword(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.keyword() == s)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Boolean combinator of a group node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    #[serde(rename = "AND", alias = "and", alias = "all", alias = "ALL")]
    And,
    #[serde(rename = "OR", alias = "or", alias = "any", alias = "ANY")]
    Or,
}

impl LogicalOperator {
    pub fn keyword(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }

    /// Recognise a logical keyword or glyph (`AND`/`OR` are case-insensitive)
    pub fn from_word(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("and") || word == "&&" {
            Some(LogicalOperator::And)
        } else if word.eq_ignore_ascii_case("or") || word == "||" {
            Some(LogicalOperator::Or)
        } else {
            None
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for LogicalOperator {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "and" | "all" | "&&" => Ok(LogicalOperator::And),
            "or" | "any" | "||" => Ok(LogicalOperator::Or),
            _ => Err(FilterParseError::InvalidTree(format!(
                "Unknown logical operator '{s}'. Valid operators are: AND, OR"
            ))),
        }
    }
}

/// Prefix keywords that qualify a condition's operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Not,
    CaseSensitive,
}

impl Modifier {
    pub fn keyword(&self) -> &'static str {
        match self {
            Modifier::Not => "not",
            Modifier::CaseSensitive => "case_sensitive",
        }
    }

    pub fn from_word(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("not") {
            Some(Modifier::Not)
        } else if word.eq_ignore_ascii_case("case_sensitive") {
            Some(Modifier::CaseSensitive)
        } else {
            None
        }
    }
}

/// An operator together with the modifiers folded into it.
///
/// The serialized form is one of exactly four shapes: `<op>`, `not_<op>`,
/// `case_sensitive_<op>` and `not_case_sensitive_<op>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QualifiedOperator {
    pub operator: FilterOperator,
    pub negate: bool,
    pub case_sensitive: bool,
}

impl QualifiedOperator {
    pub fn new(operator: FilterOperator, negate: bool, case_sensitive: bool) -> Self {
        Self {
            operator,
            negate,
            case_sensitive,
        }
    }

    /// Parse a serialized operator keyword, returning `None` for anything
    /// outside the four legal shapes.
    pub fn parse(s: &str) -> Option<Self> {
        let (negate, rest) = match s.strip_prefix("not_") {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (case_sensitive, rest) = match rest.strip_prefix("case_sensitive_") {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        FilterOperator::from_keyword(rest).map(|op| Self::new(op, negate, case_sensitive))
    }

    pub fn serialized(&self) -> String {
        let mut out = String::new();
        if self.negate {
            out.push_str("not_");
        }
        if self.case_sensitive {
            out.push_str("case_sensitive_");
        }
        out.push_str(self.operator.keyword());
        out
    }

    /// Every keyword the tokenizer recognises as an operator
    pub fn all_keywords() -> Vec<String> {
        let mut keywords = Vec::with_capacity(FilterOperator::ALL.len() * 4);
        for (negate, case_sensitive) in [(false, false), (true, false), (false, true), (true, true)]
        {
            for op in FilterOperator::ALL {
                keywords.push(Self::new(op, negate, case_sensitive).serialized());
            }
        }
        keywords
    }
}

impl fmt::Display for QualifiedOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialized())
    }
}
