use super::Forest;
use crate::config::TaxonomyConfig;
use crate::model::{Level, TaxonomyNode};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureIssue {
    #[error("node `{id}` has an empty name")]
    EmptyName { id: String },
    #[error("id `{id}` is used by more than one node")]
    DuplicateId { id: String },
    #[error("node `{id}` references missing parent `{parent_id}`")]
    DanglingParent { id: String, parent_id: String },
    #[error("node `{id}` is part of a parent cycle")]
    Cycle { id: String },
    #[error("root node `{id}` is a {level}, expected pillar")]
    RootNotPillar { id: String, level: Level },
    #[error("pillar `{id}` must not have a parent")]
    PillarWithParent { id: String },
    #[error("node `{id}` is a {actual}, expected {expected} under its parent")]
    LevelMismatch {
        id: String,
        expected: Level,
        actual: Level,
    },
    #[error("node `{id}` sits under a subtopic, which cannot have children")]
    ChildOfSubtopic { id: String },
    #[error("node `{id}` is a {level} and cannot carry an objective")]
    ObjectiveNotAllowed { id: String, level: Level },
    #[error("objective of `{id}` has {lines} lines, advisory limit is {limit}")]
    ObjectiveTooLong { id: String, lines: usize, limit: usize },
    #[error("node `{id}` uses unknown audience `{tag}`")]
    UnknownAudience { id: String, tag: String },
    #[error("node `{id}` uses unknown geography `{tag}`")]
    UnknownGeography { id: String, tag: String },
}

/// Reports every structural and content problem in `nodes`. An empty result
/// means the list satisfies the taxonomy invariants.
pub fn validate(nodes: &[TaxonomyNode], config: &TaxonomyConfig) -> Vec<StructureIssue> {
    let mut issues = Vec::new();
    let forest = Forest::build(nodes);

    let mut seen: HashSet<&str> = HashSet::new();
    for node in nodes {
        if !seen.insert(node.id.as_str()) {
            issues.push(StructureIssue::DuplicateId {
                id: node.id.clone(),
            });
        }
    }

    for &idx in &forest.dangling {
        let node = &nodes[idx];
        issues.push(StructureIssue::DanglingParent {
            id: node.id.clone(),
            parent_id: node.parent_id.clone().unwrap_or_default(),
        });
    }
    for &idx in &forest.broken_cycles {
        issues.push(StructureIssue::Cycle {
            id: nodes[idx].id.clone(),
        });
    }

    let audiences = vocabulary(&config.audiences);
    let geographies = vocabulary(&config.geographies);

    for (idx, node) in nodes.iter().enumerate() {
        if node.name.trim().is_empty() {
            issues.push(StructureIssue::EmptyName {
                id: node.id.clone(),
            });
        }

        match (node.parent_id.as_ref(), forest.parents[idx]) {
            (None, _) if node.level != Level::Pillar => {
                issues.push(StructureIssue::RootNotPillar {
                    id: node.id.clone(),
                    level: node.level,
                });
            }
            (Some(_), _) if node.level == Level::Pillar => {
                issues.push(StructureIssue::PillarWithParent {
                    id: node.id.clone(),
                });
            }
            (Some(_), Some(parent)) => {
                match nodes[parent].level.child() {
                    Some(expected) if expected != node.level => {
                        issues.push(StructureIssue::LevelMismatch {
                            id: node.id.clone(),
                            expected,
                            actual: node.level,
                        });
                    }
                    Some(_) => {}
                    None => issues.push(StructureIssue::ChildOfSubtopic {
                        id: node.id.clone(),
                    }),
                }
            }
            _ => {}
        }

        if let Some(objective) = node.objective.as_deref().filter(|text| !text.trim().is_empty()) {
            if !node.level.allows_objective() {
                issues.push(StructureIssue::ObjectiveNotAllowed {
                    id: node.id.clone(),
                    level: node.level,
                });
            } else {
                let lines = objective.lines().count();
                if lines > config.objective_line_limit {
                    issues.push(StructureIssue::ObjectiveTooLong {
                        id: node.id.clone(),
                        lines,
                        limit: config.objective_line_limit,
                    });
                }
            }
        }

        if let Some(known) = &audiences {
            for tag in &node.audiences {
                if !known.contains(&tag.trim().to_lowercase()) {
                    issues.push(StructureIssue::UnknownAudience {
                        id: node.id.clone(),
                        tag: tag.clone(),
                    });
                }
            }
        }
        if let Some(known) = &geographies {
            for tag in &node.geographies {
                if !known.contains(&tag.trim().to_lowercase()) {
                    issues.push(StructureIssue::UnknownGeography {
                        id: node.id.clone(),
                        tag: tag.clone(),
                    });
                }
            }
        }
    }

    issues
}

// An empty vocabulary means tags are free text.
fn vocabulary(values: &[String]) -> Option<HashSet<String>> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().map(|value| value.trim().to_lowercase()).collect())
}
