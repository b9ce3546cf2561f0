use super::*;

#[test]
fn titanic_tree_is_well_formed() {
    let tree = TreeNode::titanic(&Palette::default());
    tree.validate().unwrap();
    assert_eq!(tree.depth(), 3);
    assert_eq!(tree.leaf_count(), 8);
    assert_eq!(tree.label(), "Sex");
}

#[test]
fn split_without_children_is_rejected() {
    let tree = TreeNode::split("Sex", SplitAttribute::Sex, vec![]);
    let err = tree.validate().unwrap_err();
    assert!(matches!(err, TreeflowError::MalformedTree(_)));
}

#[test]
fn incomplete_nested_split_names_its_location() {
    let tree = TreeNode::split(
        "Sex",
        SplitAttribute::Sex,
        vec![
            Branch::new("female", TreeNode::leaf("Survive", Outcome::Survived)),
            Branch::new(
                "male",
                TreeNode::split(
                    "Pclass",
                    SplitAttribute::Pclass,
                    vec![
                        Branch::new("1", TreeNode::leaf("Survive", Outcome::Survived)),
                        Branch::new("2", TreeNode::leaf("Die", Outcome::Died)),
                        Branch::new("4", TreeNode::leaf("Die", Outcome::Died)),
                    ],
                ),
            ),
        ],
    );
    let msg = tree.validate().unwrap_err().to_string();
    assert!(msg.contains("root/male"), "{msg}");
    assert!(msg.contains("'3'"), "{msg}");
}

#[test]
fn parses_declarative_json() {
    let json = r##"{
      "label": "Sex", "split": "Sex",
      "children": [
        { "value": "female", "color": "#f472b6",
          "node": { "label": "Survive", "outcome": 1, "color": "#22c55e" } },
        { "value": "male",
          "node": { "label": "Age", "split": "Age", "children": [
            { "value": "<10", "node": { "label": "Survive", "outcome": 1 } },
            { "value": "10+", "node": { "label": "Die", "outcome": 0 } }
          ] } }
      ]
    }"##;
    let tree: TreeNode = serde_json::from_str(json).unwrap();
    tree.validate().unwrap();
    let TreeNode::Split(root) = &tree else {
        panic!("root should be a split");
    };
    assert_eq!(root.split, SplitAttribute::Sex);
    assert_eq!(root.children[0].color, Some(Rgba8::rgb(0xf4, 0x72, 0xb6)));
    assert!(matches!(
        root.children[1].node,
        TreeNode::Split(SplitNode {
            split: SplitAttribute::Age,
            ..
        })
    ));
}

#[test]
fn leaf_with_children_does_not_parse() {
    let json = r#"{ "label": "X", "outcome": 1, "children": [] }"#;
    assert!(serde_json::from_str::<TreeNode>(json).is_err());
}
