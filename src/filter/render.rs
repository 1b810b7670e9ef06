use super::operator::Modifier;
use super::tree::{Condition, ConditionNode, ConditionTree, Group};
use std::fmt;

/// Render a node in canonical text form.
///
/// Every group with two or more children is wrapped in parentheses, so the
/// output never depends on AND/OR precedence. Single-child groups render as
/// their child.
pub fn tree_to_text(node: &ConditionNode) -> String {
    let mut out = String::new();
    write_node(&mut out, node);
    out
}

fn write_node(out: &mut String, node: &ConditionNode) {
    match node {
        ConditionNode::Condition(c) => write_condition(out, c),
        ConditionNode::Group(g) => write_group(out, g),
    }
}

fn write_condition(out: &mut String, c: &Condition) {
    out.push_str(&c.field);
    out.push(' ');
    if c.negate {
        out.push_str(Modifier::Not.keyword());
        out.push(' ');
    }
    if c.case_sensitive {
        out.push_str(Modifier::CaseSensitive.keyword());
        out.push(' ');
    }
    out.push_str(c.operator.keyword());
    out.push(' ');
    write_value(out, &c.value);
}

fn write_group(out: &mut String, g: &Group) {
    match g.children.as_slice() {
        [] => {}
        [only] => write_node(out, only),
        children => {
            out.push('(');
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                    out.push_str(g.operator.keyword());
                    out.push(' ');
                }
                write_node(out, child);
            }
            out.push(')');
        }
    }
}

// The language has no escapes; a value holding both quote characters
// cannot be represented faithfully and keeps double quotes.
fn write_value(out: &mut String, value: &str) {
    let quote = if value.contains('"') && !value.contains('\'') {
        '\''
    } else {
        '"'
    };
    out.push(quote);
    out.push_str(value);
    out.push(quote);
}

impl fmt::Display for ConditionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&tree_to_text(self))
    }
}

impl fmt::Display for ConditionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&tree_to_text(&self.root))
    }
}
