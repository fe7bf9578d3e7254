use std::collections::HashSet;
use std::path::Path;

use rstest::rstest;
use taxonomy_layout::config::TaxonomyConfig;
use taxonomy_layout::model::{Level, TaxonomyNode};
use taxonomy_layout::tree::{self, StructureIssue};

fn fixture(name: &str) -> Vec<TaxonomyNode> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let input = std::fs::read_to_string(&path).expect("fixture read failed");
    serde_json::from_str(&input).expect("fixture parse failed")
}

fn ids(nodes: &[TaxonomyNode]) -> Vec<&str> {
    nodes.iter().map(|node| node.id.as_str()).collect()
}

#[test]
fn cascade_delete_removes_exactly_the_subtree() {
    let nodes = fixture("campaign.json");
    let expected: HashSet<String> = tree::descendants_of(&nodes, "theme-safety")
        .into_iter()
        .chain(["theme-safety".to_string()])
        .collect();

    let (remaining, removed) = tree::cascade_delete(&nodes, "theme-safety");
    assert_eq!(removed[0], "theme-safety");
    assert_eq!(removed.iter().cloned().collect::<HashSet<_>>(), expected);
    assert_eq!(remaining.len() + removed.len(), nodes.len());
    assert!(remaining.iter().all(|node| !expected.contains(&node.id)));
    assert!(remaining.iter().any(|node| node.id == "theme-service"));
}

#[test]
fn cascade_delete_of_unknown_id_is_a_no_op() {
    let nodes = fixture("campaign.json");
    let (remaining, removed) = tree::cascade_delete(&nodes, "nope");
    assert!(removed.is_empty());
    assert_eq!(remaining, nodes);
}

#[test]
fn search_keeps_matches_with_their_context() {
    let nodes = fixture("campaign.json");
    let found = tree::search_by_name(&nodes, "CHECKLIST");
    let found_ids: HashSet<&str> = ids(&found).into_iter().collect();
    let expected: HashSet<&str> = [
        "pillar-brand",
        "theme-safety",
        "subject-inspections",
        "topic-checklist",
        "subtopic-gas",
        "subtopic-electrical",
    ]
    .into_iter()
    .collect();
    assert_eq!(found_ids, expected);
    // Original order is preserved.
    assert_eq!(ids(&found)[0], "pillar-brand");
}

#[rstest]
#[case("emissions")]
#[case("SCOPE 3")]
fn search_for_a_deep_subtopic_keeps_its_ancestor_chain(#[case] term: &str) {
    let nodes = fixture("campaign.json");
    assert_eq!(
        tree::name_matches(&nodes, term),
        HashSet::from(["subtopic-scope3".to_string()])
    );
    let found = tree::search_by_name(&nodes, term);
    assert_eq!(
        ids(&found),
        vec![
            "pillar-growth",
            "theme-climate",
            "subject-targets",
            "topic-2030",
            "subtopic-scope3",
        ]
    );
}

#[rstest]
#[case("")]
#[case("   ")]
fn blank_search_returns_everything(#[case] term: &str) {
    let nodes = fixture("campaign.json");
    assert_eq!(tree::search_by_name(&nodes, term), nodes);
}

#[test]
fn name_matches_excludes_context() {
    let nodes = fixture("campaign.json");
    let matches = tree::name_matches(&nodes, "inspection");
    let expected: HashSet<String> = ["subject-inspections", "topic-checklist", "topic-reports"]
        .into_iter()
        .map(str::to_string)
        .collect();
    assert_eq!(matches, expected);
}

#[rstest]
#[case(None, vec!["pillar-brand", "pillar-growth"])]
#[case(Some("pillar-brand"), vec!["theme-safety", "theme-service"])]
#[case(Some("topic-checklist"), vec!["subtopic-gas", "subtopic-electrical"])]
#[case(Some("subtopic-gas"), vec![])]
#[case(Some("missing"), vec![])]
fn children_are_sorted_by_order(#[case] parent: Option<&str>, #[case] expected: Vec<&str>) {
    let nodes = fixture("campaign.json");
    let children = tree::children_of(&nodes, parent);
    assert_eq!(ids(&children), expected);
}

#[test]
fn path_runs_from_root_to_target() {
    let nodes = fixture("campaign.json");
    let path = tree::path_to(&nodes, "subtopic-scope3");
    assert_eq!(
        ids(&path),
        vec![
            "pillar-growth",
            "theme-climate",
            "subject-targets",
            "topic-2030",
            "subtopic-scope3"
        ]
    );
    assert!(tree::path_to(&nodes, "missing").is_empty());
}

#[test]
fn subtree_filter_keeps_relative_order() {
    let nodes = fixture("campaign.json");
    assert_eq!(tree::filter_by_subtree(&nodes, None), nodes);
    let growth = tree::filter_by_subtree(&nodes, Some("pillar-growth"));
    assert_eq!(
        ids(&growth),
        vec![
            "pillar-growth",
            "theme-climate",
            "subject-targets",
            "topic-2030",
            "subtopic-scope3"
        ]
    );
    assert!(tree::filter_by_subtree(&nodes, Some("missing")).is_empty());
}

#[test]
fn descendant_counts_group_by_level() {
    let nodes = fixture("campaign.json");
    let counts = tree::count_descendants_by_level(&nodes, "pillar-brand");
    assert_eq!(counts.get(&Level::NarrativeTheme), Some(&2));
    assert_eq!(counts.get(&Level::Subject), Some(&3));
    assert_eq!(counts.get(&Level::Topic), Some(&3));
    assert_eq!(counts.get(&Level::Subtopic), Some(&2));
    assert_eq!(counts.get(&Level::Pillar), None);
}

#[test]
fn build_tree_nests_every_node_once() {
    let nodes = fixture("campaign.json");
    let forest = tree::build_tree(&nodes);
    assert_eq!(forest.len(), 2);
    assert_eq!(forest[0].node.id, "pillar-brand");
    assert_eq!(forest.iter().map(|root| root.count()).sum::<usize>(), nodes.len());
    assert_eq!(forest[0].children[1].node.id, "theme-service");
}

#[test]
fn cyclic_data_terminates_everywhere() {
    let nodes = fixture("malformed.json");
    let descendants = tree::descendants_of(&nodes, "x");
    assert!(descendants.contains("y"));
    assert!(!descendants.contains("x"));
    let path = tree::path_to(&nodes, "x");
    assert!(!path.is_empty());
    assert!(path.len() <= 2);

    let depths = tree::depths(&nodes);
    assert_eq!(depths["y"], 0);
    assert_eq!(depths["x"], 1);
    assert_eq!(depths["self"], 0);

    let built = tree::build_tree(&nodes);
    assert_eq!(built.iter().map(|root| root.count()).sum::<usize>(), nodes.len());
}

#[test]
fn validation_reports_each_problem() {
    let nodes = fixture("malformed.json");
    let issues = tree::validate(&nodes, &TaxonomyConfig::default());
    assert!(issues.contains(&StructureIssue::DanglingParent {
        id: "orphan".to_string(),
        parent_id: "gone".to_string(),
    }));
    assert!(issues.contains(&StructureIssue::Cycle { id: "y".to_string() }));
    assert!(issues.contains(&StructureIssue::Cycle {
        id: "self".to_string()
    }));
    assert!(issues.contains(&StructureIssue::LevelMismatch {
        id: "s".to_string(),
        expected: Level::Subject,
        actual: Level::Topic,
    }));
    assert!(issues.contains(&StructureIssue::ObjectiveNotAllowed {
        id: "s".to_string(),
        level: Level::Topic,
    }));
}

#[test]
fn nodes_round_trip_through_camel_case_json() {
    let node = TaxonomyNode::new("n1", "Trust", Level::NarrativeTheme, Some("p1"), 3)
        .with_audiences(["Media"]);
    let json = serde_json::to_value(&node).expect("serialize");
    assert_eq!(json["parentId"], "p1");
    assert_eq!(json["level"], "narrative_theme");
    assert!(json.get("createdAt").is_some());
    let back: TaxonomyNode = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, node);
}
