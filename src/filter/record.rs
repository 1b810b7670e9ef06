use super::error::FilterParseError;
use super::operator::{LogicalOperator, QualifiedOperator};
use super::tree::{Condition, ConditionNode, ConditionTree, parse_lenient};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the legacy flat `conditions` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyCondition {
    pub field_name: String,
    pub operator: String,
    pub value: String,
}

/// A filter as returned by the filter listing endpoint.
///
/// Newer records carry `condition_tree` (object, or the same JSON embedded
/// in a string); older ones carry `conditions` + `logical_operator`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default)]
    pub is_inverse: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_tree: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<LegacyCondition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_operator: Option<String>,
}

impl FilterRecord {
    /// Whether a JSON document looks like a record rather than a bare tree
    pub fn looks_like_record(value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|map| map.contains_key("condition_tree") || map.contains_key("conditions"))
    }

    /// Resolve the record to a tree, preferring `condition_tree`
    pub fn to_tree(&self) -> Result<ConditionTree, FilterParseError> {
        if let Some(tree) = self.condition_tree.as_ref().filter(|v| !v.is_null()) {
            return ConditionTree::from_value(tree.clone());
        }

        match &self.conditions {
            Some(conditions) if !conditions.is_empty() => {
                let operator = match self.logical_operator.as_deref() {
                    Some(op) if !op.trim().is_empty() => op.trim().parse()?,
                    _ => LogicalOperator::And,
                };
                legacy_group(conditions, operator).map(ConditionTree::new)
            }
            Some(_) => Err(FilterParseError::InvalidTree(
                "Legacy filter has an empty conditions list".to_string(),
            )),
            None => Err(FilterParseError::InvalidTree(
                "Filter record has neither condition_tree nor conditions".to_string(),
            )),
        }
    }
}

/// Load any stored form of a filter: a bare node, the `{root}` envelope or a
/// whole filter record.
pub fn load_tree(text: &str) -> Result<ConditionTree, FilterParseError> {
    let value = parse_lenient(text)?;
    if FilterRecord::looks_like_record(&value) {
        serde_json::from_value::<FilterRecord>(value)?.to_tree()
    } else {
        ConditionTree::from_value(value)
    }
}

fn legacy_group(
    conditions: &[LegacyCondition],
    operator: LogicalOperator,
) -> Result<ConditionNode, FilterParseError> {
    let children = conditions
        .iter()
        .map(|legacy| {
            let qualified = QualifiedOperator::parse(&legacy.operator).ok_or_else(|| {
                FilterParseError::InvalidTree(format!(
                    "Unknown operator '{}' on field '{}'",
                    legacy.operator, legacy.field_name
                ))
            })?;
            Ok(ConditionNode::Condition(Condition {
                field: legacy.field_name.clone(),
                operator: qualified.operator,
                value: legacy.value.clone(),
                negate: qualified.negate,
                case_sensitive: qualified.case_sensitive,
            }))
        })
        .collect::<Result<Vec<_>, FilterParseError>>()?;

    Ok(ConditionNode::group(operator, children))
}
