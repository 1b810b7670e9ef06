use super::error::FilterParseError;
use super::operator::{FilterOperator, LogicalOperator, QualifiedOperator};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Leaf test of one field against one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: String,
    pub operator: FilterOperator,
    pub value: String,
    pub negate: bool,
    pub case_sensitive: bool,
}

impl Condition {
    pub fn qualified_operator(&self) -> QualifiedOperator {
        QualifiedOperator::new(self.operator, self.negate, self.case_sensitive)
    }
}

/// Boolean combination of child nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub operator: LogicalOperator,
    pub children: Vec<ConditionNode>,
}

/// A node of the condition tree.
///
/// Groups with a single child are accepted but carry no meaning of their
/// own; the canonical renderer never produces them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "NodeRecord")]
pub enum ConditionNode {
    Condition(Condition),
    Group(Group),
}

impl ConditionNode {
    pub fn condition(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        ConditionNode::Condition(Condition {
            field: field.into(),
            operator,
            value: value.into(),
            negate: false,
            case_sensitive: false,
        })
    }

    pub fn group(operator: LogicalOperator, children: Vec<ConditionNode>) -> Self {
        ConditionNode::Group(Group { operator, children })
    }

    pub fn and(children: Vec<ConditionNode>) -> Self {
        Self::group(LogicalOperator::And, children)
    }

    pub fn or(children: Vec<ConditionNode>) -> Self {
        Self::group(LogicalOperator::Or, children)
    }

    /// Set `negate` on a condition; groups are returned unchanged
    pub fn negated(mut self) -> Self {
        if let ConditionNode::Condition(c) = &mut self {
            c.negate = true;
        }
        self
    }

    /// Set `case_sensitive` on a condition; groups are returned unchanged
    pub fn case_sensitive(mut self) -> Self {
        if let ConditionNode::Condition(c) = &mut self {
            c.case_sensitive = true;
        }
        self
    }

    /// Number of leaf conditions below (and including) this node
    pub fn condition_count(&self) -> usize {
        match self {
            ConditionNode::Condition(_) => 1,
            ConditionNode::Group(g) => g.children.iter().map(Self::condition_count).sum(),
        }
    }

    /// Every field referenced by the tree, in first-use order
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ConditionNode::Condition(c) => {
                if !out.contains(&c.field.as_str()) {
                    out.push(&c.field);
                }
            }
            ConditionNode::Group(g) => g.children.iter().for_each(|c| c.collect_fields(out)),
        }
    }
}

impl Serialize for ConditionNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConditionNode::Condition(c) => {
                let mut state = serializer.serialize_struct("Condition", 4)?;
                state.serialize_field("type", "condition")?;
                state.serialize_field("field", &c.field)?;
                state.serialize_field("operator", &c.qualified_operator().serialized())?;
                state.serialize_field("value", &c.value)?;
                state.end()
            }
            ConditionNode::Group(g) => {
                let mut state = serializer.serialize_struct("Group", 3)?;
                state.serialize_field("type", "group")?;
                state.serialize_field("operator", &g.operator)?;
                state.serialize_field("children", &g.children)?;
                state.end()
            }
        }
    }
}

/// Wire shape of a node. Untagged so that trees written without a `type`
/// key still load; `negate`/`case_sensitive` flags are folded into the
/// serialized operator.
#[derive(Deserialize)]
#[serde(untagged)]
enum NodeRecord {
    Group {
        operator: LogicalOperator,
        children: Vec<ConditionNode>,
    },
    Condition {
        field: String,
        operator: String,
        #[serde(default)]
        value: String,
        #[serde(default)]
        negate: bool,
        #[serde(default)]
        case_sensitive: bool,
    },
}

impl TryFrom<NodeRecord> for ConditionNode {
    type Error = FilterParseError;

    fn try_from(record: NodeRecord) -> Result<Self, Self::Error> {
        match record {
            NodeRecord::Group { operator, children } => {
                if children.is_empty() {
                    return Err(FilterParseError::InvalidTree(format!(
                        "{operator} group has no children"
                    )));
                }
                Ok(ConditionNode::group(operator, children))
            }
            NodeRecord::Condition {
                field,
                operator,
                value,
                negate,
                case_sensitive,
            } => {
                let qualified = QualifiedOperator::parse(&operator).ok_or_else(|| {
                    FilterParseError::InvalidTree(format!(
                        "Unknown operator '{operator}' on field '{field}'"
                    ))
                })?;
                if field.is_empty() {
                    return Err(FilterParseError::InvalidTree(
                        "Condition has an empty field name".to_string(),
                    ));
                }
                Ok(ConditionNode::Condition(Condition {
                    field,
                    operator: qualified.operator,
                    value,
                    negate: negate || qualified.negate,
                    case_sensitive: case_sensitive || qualified.case_sensitive,
                }))
            }
        }
    }
}

/// A whole expression, persisted as `{"root": <node>}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionTree {
    pub root: ConditionNode,
}

impl ConditionTree {
    pub fn new(root: ConditionNode) -> Self {
        Self { root }
    }

    /// Load a tree document: either the `{root}` envelope or a bare node.
    ///
    /// Strict JSON is tried first; hand-edited JSON5 is accepted as a fallback.
    pub fn from_json(text: &str) -> Result<Self, FilterParseError> {
        Self::from_value(parse_lenient(text)?)
    }

    pub fn from_value(value: Value) -> Result<Self, FilterParseError> {
        match value {
            Value::Object(mut map) if map.contains_key("root") => {
                let root = map.remove("root").unwrap_or(Value::Null);
                Ok(Self::new(serde_json::from_value(root)?))
            }
            // Persisted records sometimes hold the tree as an embedded string
            Value::String(inner) => Self::from_json(&inner),
            other => Ok(Self::new(serde_json::from_value(other)?)),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, FilterParseError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Strict JSON, falling back to JSON5. The strict error is the one reported.
pub(crate) fn parse_lenient(text: &str) -> Result<Value, FilterParseError> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(value),
        Err(strict_err) => {
            json5::from_str::<Value>(text).map_err(|_| FilterParseError::Json(strict_err))
        }
    }
}

impl From<ConditionNode> for ConditionTree {
    fn from(root: ConditionNode) -> Self {
        Self::new(root)
    }
}
