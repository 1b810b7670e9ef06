use channel_filter::fields::FieldCatalog;
use channel_filter::filter::{
    ConditionNode, ConditionTree, FilterOperator, LogicalOperator, parse_tree, text_to_tree,
    tree_to_text,
};
use channel_filter::validate;

fn sample_trees() -> Vec<ConditionNode> {
    vec![
        ConditionNode::condition("channel_name", FilterOperator::Contains, "sport"),
        ConditionNode::condition("group_title", FilterOperator::Equals, "News")
            .negated()
            .case_sensitive(),
        ConditionNode::condition("tvg_name", FilterOperator::Matches, r#"^HD "Plus"$"#),
        ConditionNode::and(vec![
            ConditionNode::or(vec![
                ConditionNode::condition("channel_name", FilterOperator::StartsWith, "BBC"),
                ConditionNode::condition("channel_name", FilterOperator::EndsWith, "CNN")
                    .negated(),
            ]),
            ConditionNode::condition("tvg_id", FilterOperator::EndsWith, ".uk"),
            ConditionNode::or(vec![
                ConditionNode::condition("group_title", FilterOperator::Equals, "a"),
                ConditionNode::and(vec![
                    ConditionNode::condition("group_title", FilterOperator::Equals, "b"),
                    ConditionNode::condition("stream_url", FilterOperator::Contains, "c")
                        .case_sensitive(),
                ]),
            ]),
        ]),
    ]
}

#[test]
fn test_tree_text_tree_round_trip() {
    for tree in sample_trees() {
        let text = tree_to_text(&tree);
        let parsed = text_to_tree(&text)
            .unwrap_or_else(|e| panic!("rendered text {text:?} failed to parse: {e}"));
        assert_eq!(parsed, tree, "round trip through {text:?}");
    }
}

#[test]
fn test_rendering_is_idempotent() {
    for tree in sample_trees() {
        let once = tree_to_text(&tree);
        let twice = tree_to_text(&text_to_tree(&once).unwrap());
        assert_eq!(once, twice);
    }
}

#[test]
fn test_text_round_trip_normalises() {
    // Extra spacing, single quotes and redundant parentheses are not preserved
    let input = "((channel_name   contains  'sport'))";
    let canonical = tree_to_text(&text_to_tree(input).unwrap());
    assert_eq!(canonical, r#"channel_name contains "sport""#);
    assert_ne!(canonical, input);
}

#[test]
fn test_modifier_composition() {
    let node = text_to_tree(r#"group_title not case_sensitive equals "News""#).unwrap();
    let value = serde_json::to_value(&node).unwrap();
    assert_eq!(value["operator"], "not_case_sensitive_equals");

    let rendered = tree_to_text(&node);
    assert_eq!(rendered, r#"group_title not case_sensitive equals "News""#);
}

#[test]
fn test_bbc_cnn_scenario() {
    let text = r#"(channel_name contains "BBC" OR channel_name contains "CNN") AND group_title equals "News""#;
    let tree = parse_tree(text).unwrap();

    let expected = ConditionNode::group(
        LogicalOperator::And,
        vec![
            ConditionNode::group(
                LogicalOperator::Or,
                vec![
                    ConditionNode::condition("channel_name", FilterOperator::Contains, "BBC"),
                    ConditionNode::condition("channel_name", FilterOperator::Contains, "CNN"),
                ],
            ),
            ConditionNode::condition("group_title", FilterOperator::Equals, "News"),
        ],
    );
    assert_eq!(tree.root, expected);
    assert_eq!(tree.root.condition_count(), 3);

    // Persisted and reloaded through the envelope
    let json = tree.to_json_pretty().unwrap();
    let reloaded = ConditionTree::from_json(&json).unwrap();
    assert_eq!(reloaded, tree);
    assert_eq!(
        tree_to_text(&reloaded.root),
        r#"((channel_name contains "BBC" OR channel_name contains "CNN") AND group_title equals "News")"#
    );
}

#[test]
fn test_negated_condition_beside_or_group() {
    let text = r#"(channel_name contains "BBC" OR channel_name contains "CNN") AND not group_title contains "Adult""#;
    let catalog = FieldCatalog::from_names(["channel_name", "group_title"]);
    let result = validate(text, &catalog);
    assert!(result.valid, "{:?}", result.highlights);

    let root = text_to_tree(text).unwrap();
    let ConditionNode::Group(top) = &root else {
        panic!("expected a group at the top, got {root:?}");
    };
    assert_eq!(top.operator, LogicalOperator::And);
    assert_eq!(top.children.len(), 2);

    let ConditionNode::Group(either) = &top.children[0] else {
        panic!("expected an OR group first, got {:?}", top.children[0]);
    };
    assert_eq!(either.operator, LogicalOperator::Or);
    assert_eq!(either.children.len(), 2);
    assert!(
        either
            .children
            .iter()
            .all(|c| matches!(c, ConditionNode::Condition(_)))
    );

    let ConditionNode::Condition(adult) = &top.children[1] else {
        panic!("expected a condition second, got {:?}", top.children[1]);
    };
    assert_eq!(adult.field, "group_title");
    assert_eq!(adult.operator, FilterOperator::Contains);
    assert_eq!(adult.value, "Adult");
    assert!(adult.negate);
    assert!(!adult.case_sensitive);

    assert_eq!(
        tree_to_text(&root),
        r#"((channel_name contains "BBC" OR channel_name contains "CNN") AND group_title not contains "Adult")"#
    );
}

#[test]
fn test_group_operator_spellings_in_json() {
    for op in ["AND", "and", "all"] {
        let json = format!(
            r#"{{"type":"group","operator":"{op}","children":[
                {{"type":"condition","field":"a","operator":"equals","value":"1"}},
                {{"type":"condition","field":"b","operator":"equals","value":"2"}}]}}"#
        );
        let tree = ConditionTree::from_json(&json).unwrap();
        assert_eq!(tree_to_text(&tree.root), r#"(a equals "1" AND b equals "2")"#);
    }
}

#[test]
fn test_empty_group_is_rejected() {
    let json = r#"{"type":"group","operator":"AND","children":[]}"#;
    assert!(ConditionTree::from_json(json).is_err());
}
