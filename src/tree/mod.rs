mod forest;
mod validate;

pub use forest::Forest;
pub use validate::{StructureIssue, validate};

use crate::model::{Level, TaxonomyNode, TreeNode};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

pub struct TreeIndex<'a> {
    nodes: &'a [TaxonomyNode],
    by_id: HashMap<&'a str, usize>,
    children: HashMap<&'a str, Vec<usize>>,
    roots: Vec<usize>,
}

impl<'a> TreeIndex<'a> {
    pub fn new(nodes: &'a [TaxonomyNode]) -> Self {
        let mut by_id: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            by_id.entry(node.id.as_str()).or_insert(idx);
        }
        let mut children: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut roots = Vec::new();
        for (idx, node) in nodes.iter().enumerate() {
            match node.parent_id.as_deref() {
                Some(parent) => children.entry(parent).or_default().push(idx),
                None => roots.push(idx),
            }
        }
        for group in children.values_mut() {
            sort_siblings(nodes, group);
        }
        sort_siblings(nodes, &mut roots);
        Self {
            nodes,
            by_id,
            children,
            roots,
        }
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Declared children of `parent`, or the parentless nodes for `None`.
    pub fn child_positions(&self, parent: Option<&str>) -> &[usize] {
        match parent {
            Some(id) => self.children.get(id).map(Vec::as_slice).unwrap_or(&[]),
            None => &self.roots,
        }
    }

    pub fn descendant_positions(&self, id: &str) -> Vec<usize> {
        let mut out = Vec::new();
        let Some(start) = self.position(id) else {
            return out;
        };
        let mut visited: HashSet<usize> = HashSet::new();
        visited.insert(start);
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(self.nodes[start].id.as_str());
        while let Some(current) = queue.pop_front() {
            for &child in self.child_positions(Some(current)) {
                if !visited.insert(child) {
                    continue;
                }
                out.push(child);
                queue.push_back(self.nodes[child].id.as_str());
            }
        }
        out
    }

    pub fn path_positions(&self, id: &str) -> Vec<usize> {
        let mut path = Vec::new();
        let Some(mut current) = self.position(id) else {
            return path;
        };
        let mut visited: HashSet<usize> = HashSet::new();
        loop {
            if !visited.insert(current) {
                break;
            }
            path.push(current);
            let Some(parent) = self.nodes[current]
                .parent_id
                .as_deref()
                .and_then(|parent| self.position(parent))
            else {
                break;
            };
            current = parent;
        }
        path.reverse();
        path
    }
}

fn sort_siblings(nodes: &[TaxonomyNode], group: &mut [usize]) {
    group.sort_by_key(|&idx| (nodes[idx].order, idx));
}

pub fn descendants_of(nodes: &[TaxonomyNode], node_id: &str) -> HashSet<String> {
    let index = TreeIndex::new(nodes);
    index
        .descendant_positions(node_id)
        .into_iter()
        .map(|idx| nodes[idx].id.clone())
        .collect()
}

pub fn path_to(nodes: &[TaxonomyNode], node_id: &str) -> Vec<TaxonomyNode> {
    let index = TreeIndex::new(nodes);
    index
        .path_positions(node_id)
        .into_iter()
        .map(|idx| nodes[idx].clone())
        .collect()
}

pub fn children_of(nodes: &[TaxonomyNode], parent_id: Option<&str>) -> Vec<TaxonomyNode> {
    let index = TreeIndex::new(nodes);
    index
        .child_positions(parent_id)
        .iter()
        .map(|&idx| nodes[idx].clone())
        .collect()
}

pub fn filter_by_subtree(nodes: &[TaxonomyNode], root_id: Option<&str>) -> Vec<TaxonomyNode> {
    let Some(root_id) = root_id else {
        return nodes.to_vec();
    };
    let index = TreeIndex::new(nodes);
    let Some(root) = index.position(root_id) else {
        return Vec::new();
    };
    let mut keep: HashSet<usize> = index.descendant_positions(root_id).into_iter().collect();
    keep.insert(root);
    retain_positions(nodes, &keep)
}

/// Case-insensitive name search that keeps each match's ancestors and
/// descendants so the hit stays reachable in a hierarchical view.
pub fn search_by_name(nodes: &[TaxonomyNode], term: &str) -> Vec<TaxonomyNode> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return nodes.to_vec();
    }
    let index = TreeIndex::new(nodes);
    let mut keep: HashSet<usize> = HashSet::new();
    for (idx, node) in nodes.iter().enumerate() {
        if !node.name.to_lowercase().contains(&needle) {
            continue;
        }
        keep.insert(idx);
        keep.extend(index.path_positions(&node.id));
        keep.extend(index.descendant_positions(&node.id));
    }
    retain_positions(nodes, &keep)
}

pub fn name_matches(nodes: &[TaxonomyNode], term: &str) -> HashSet<String> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return HashSet::new();
    }
    nodes
        .iter()
        .filter(|node| node.name.to_lowercase().contains(&needle))
        .map(|node| node.id.clone())
        .collect()
}

pub fn count_descendants_by_level(nodes: &[TaxonomyNode], node_id: &str) -> BTreeMap<Level, usize> {
    let index = TreeIndex::new(nodes);
    let mut counts = BTreeMap::new();
    for idx in index.descendant_positions(node_id) {
        *counts.entry(nodes[idx].level).or_insert(0) += 1;
    }
    counts
}

/// Removes `node_id` and its whole subtree. Returns the surviving nodes in
/// their original order and the removed ids (target first).
pub fn cascade_delete(nodes: &[TaxonomyNode], node_id: &str) -> (Vec<TaxonomyNode>, Vec<String>) {
    let index = TreeIndex::new(nodes);
    let Some(target) = index.position(node_id) else {
        return (nodes.to_vec(), Vec::new());
    };
    let mut doomed = vec![target];
    doomed.extend(index.descendant_positions(node_id));
    let removed_ids: Vec<String> = doomed.iter().map(|&idx| nodes[idx].id.clone()).collect();
    let removed_set: HashSet<&str> = removed_ids.iter().map(String::as_str).collect();
    let remaining = nodes
        .iter()
        .filter(|node| !removed_set.contains(node.id.as_str()))
        .cloned()
        .collect();
    (remaining, removed_ids)
}

pub fn depths(nodes: &[TaxonomyNode]) -> HashMap<String, usize> {
    let forest = Forest::build(nodes);
    let mut out = HashMap::with_capacity(nodes.len());
    for (idx, node) in nodes.iter().enumerate() {
        out.entry(node.id.clone()).or_insert(forest.depth[idx]);
    }
    out
}

pub fn parent_edges(nodes: &[TaxonomyNode]) -> Vec<(String, String)> {
    let forest = Forest::build(nodes);
    forest
        .breadth_first
        .iter()
        .flat_map(|&parent| {
            forest.children[parent]
                .iter()
                .map(move |&child| (nodes[parent].id.clone(), nodes[child].id.clone()))
        })
        .collect()
}

/// Nested projection of the flat list, roots sorted by `order`.
pub fn build_tree(nodes: &[TaxonomyNode]) -> Vec<TreeNode> {
    let forest = Forest::build(nodes);
    let mut built: Vec<Option<TreeNode>> = vec![None; nodes.len()];
    // Children always come later in breadth-first order, so walking it
    // backwards finishes every subtree before its parent.
    for &idx in forest.breadth_first.iter().rev() {
        let children = forest.children[idx]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[idx] = Some(TreeNode {
            node: nodes[idx].clone(),
            children,
        });
    }
    forest
        .roots
        .iter()
        .filter_map(|&root| built[root].take())
        .collect()
}

fn retain_positions(nodes: &[TaxonomyNode], keep: &HashSet<usize>) -> Vec<TaxonomyNode> {
    nodes
        .iter()
        .enumerate()
        .filter(|(idx, _)| keep.contains(idx))
        .map(|(_, node)| node.clone())
        .collect()
}
