//! Channel filter expression language
//!
//! Operators select channels with short, human-writable expressions. The
//! same expression has two forms: text for editing and a condition tree for
//! persistence and evaluation. This module converts between the two.
//!
//! # Syntax
//!
//! ```text
//! field operator "value"                  A single condition
//! not field operator "value"              Negated condition
//! field not case_sensitive operator "v"   Modifiers may also follow the field
//! A AND B, A OR B                         AND binds tighter than OR
//! (A OR B) AND C                          Parentheses group explicitly
//! ```
//!
//! # Operators
//!
//! - `contains`, `equals`, `matches`, `starts_with`, `ends_with`
//! - composed forms `not_<op>`, `case_sensitive_<op>`, `not_case_sensitive_<op>`
//!
//! # Examples
//!
//! ```text
//! channel_name contains "sport"
//! group_title equals "News" AND not channel_name contains "adult"
//! (channel_name contains "BBC" OR channel_name contains "CNN") AND tvg_id ends_with ".uk"
//! ```
//!
//! Text → tree → text is normalising rather than byte-preserving: spacing,
//! quote choice and redundant parentheses are canonicalised.

pub mod error;
pub mod operator;
pub mod parser;
pub mod record;
pub mod render;
pub mod suggest;
pub mod tokenizer;
pub mod tree;

pub use error::FilterParseError;
pub use operator::{FilterOperator, LogicalOperator, Modifier, QualifiedOperator};
pub use parser::{parse_tree, text_to_tree};
pub use record::{FilterRecord, LegacyCondition};
pub use render::tree_to_text;
pub use suggest::suggest;
pub use tokenizer::{Token, TokenKind, tokenize};
pub use tree::{Condition, ConditionNode, ConditionTree, Group};
