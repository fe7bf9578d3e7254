use crate::model::TaxonomyNode;
use std::collections::{HashMap, VecDeque};
use tracing::warn;

/// Acyclic view of a node slice, indexed by position. Missing parents and
/// links that close a cycle (walked in input order) are dropped.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    pub parents: Vec<Option<usize>>,
    pub children: Vec<Vec<usize>>,
    pub roots: Vec<usize>,
    pub depth: Vec<usize>,
    /// Roots first, then each tier left to right.
    pub breadth_first: Vec<usize>,
    pub dangling: Vec<usize>,
    pub broken_cycles: Vec<usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Fresh,
    OnChain,
    Done,
}

impl Forest {
    pub fn build(nodes: &[TaxonomyNode]) -> Self {
        let count = nodes.len();
        let mut by_id: HashMap<&str, usize> = HashMap::with_capacity(count);
        for (idx, node) in nodes.iter().enumerate() {
            by_id.entry(node.id.as_str()).or_insert(idx);
        }

        let mut dangling = Vec::new();
        let mut parents: Vec<Option<usize>> = Vec::with_capacity(count);
        for (idx, node) in nodes.iter().enumerate() {
            let parent = match node.parent_id.as_deref() {
                Some(parent_id) => match by_id.get(parent_id) {
                    Some(&parent) => Some(parent),
                    None => {
                        warn!(node = %node.id, parent = %parent_id, "dangling parent; treating node as root");
                        dangling.push(idx);
                        None
                    }
                },
                None => None,
            };
            parents.push(parent);
        }

        let broken_cycles = break_cycles(nodes, &mut parents);

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut roots = Vec::new();
        for (idx, parent) in parents.iter().enumerate() {
            match parent {
                Some(parent) => children[*parent].push(idx),
                None => roots.push(idx),
            }
        }
        for group in &mut children {
            group.sort_by_key(|&idx| (nodes[idx].order, idx));
        }
        roots.sort_by_key(|&idx| (nodes[idx].order, idx));

        let mut depth = vec![0usize; count];
        let mut breadth_first = Vec::with_capacity(count);
        let mut queue: VecDeque<usize> = roots.iter().copied().collect();
        while let Some(idx) = queue.pop_front() {
            breadth_first.push(idx);
            for &child in &children[idx] {
                depth[child] = depth[idx] + 1;
                queue.push_back(child);
            }
        }

        Self {
            parents,
            children,
            roots,
            depth,
            breadth_first,
            dangling,
            broken_cycles,
        }
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.depth.iter().copied().max()
    }

    /// Positions belonging to the subtree under `root`, breadth-first.
    pub fn subtree(&self, root: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut queue = VecDeque::from([root]);
        while let Some(idx) = queue.pop_front() {
            out.push(idx);
            queue.extend(self.children[idx].iter().copied());
        }
        out
    }
}

fn break_cycles(nodes: &[TaxonomyNode], parents: &mut [Option<usize>]) -> Vec<usize> {
    let mut state = vec![Visit::Fresh; parents.len()];
    let mut broken = Vec::new();
    let mut chain: Vec<usize> = Vec::new();
    for start in 0..parents.len() {
        if state[start] == Visit::Done {
            continue;
        }
        chain.clear();
        let mut current = start;
        loop {
            match state[current] {
                Visit::Done => break,
                Visit::OnChain => {
                    if let Some(&last) = chain.last() {
                        warn!(node = %nodes[last].id, "parent cycle; treating node as root");
                        parents[last] = None;
                        broken.push(last);
                    }
                    break;
                }
                Visit::Fresh => {}
            }
            state[current] = Visit::OnChain;
            chain.push(current);
            match parents[current] {
                Some(parent) => current = parent,
                None => break,
            }
        }
        for &idx in &chain {
            state[idx] = Visit::Done;
        }
    }
    broken
}
