use super::NodeSize;
use super::tidy::Spacing;
use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::tree::Forest;
use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::debug;

/// Horizontal card centers from the dagre layered solver.
///
/// Each root's subtree is solved on its own, then the subtrees are packed
/// left to right with `root_gap` and the whole forest is centered on x = 0.
pub fn assign_centers_layered(
    forest: &Forest,
    sizes: &[NodeSize],
    config: &LayoutConfig,
    spacing: Spacing,
) -> Result<Vec<f32>, LayoutError> {
    let mut centers = vec![0.0f32; forest.len()];
    let mut placed: Vec<(Vec<usize>, f32, f32)> = Vec::with_capacity(forest.roots.len());

    for &root in &forest.roots {
        let members = forest.subtree(root);
        let local = if members.len() == 1 {
            vec![(root, 0.0)]
        } else {
            run_dagre(forest, &members, sizes, config, spacing)?
        };
        let mut left = f32::MAX;
        let mut right = f32::MIN;
        for (idx, x) in local {
            centers[idx] = x;
            left = left.min(x - sizes[idx].width / 2.0);
            right = right.max(x + sizes[idx].width / 2.0);
        }
        placed.push((members, left, right));
    }

    let total: f32 = placed.iter().map(|(_, left, right)| right - left).sum::<f32>()
        + spacing.root_gap * placed.len().saturating_sub(1) as f32;
    let mut cursor = -total / 2.0;
    for (members, left, right) in placed {
        let shift = cursor - left;
        for idx in members {
            centers[idx] += shift;
        }
        cursor += (right - left) + spacing.root_gap;
    }
    Ok(centers)
}

fn run_dagre(
    forest: &Forest,
    members: &[usize],
    sizes: &[NodeSize],
    config: &LayoutConfig,
    spacing: Spacing,
) -> Result<Vec<(usize, f32)>, LayoutError> {
    let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
        DagreGraph::new(Some(GraphOption {
            directed: Some(true),
            multigraph: Some(false),
            compound: Some(false),
        }));

    let mut graph_config = DagreConfig::default();
    graph_config.rankdir = Some("TB".to_string());
    graph_config.nodesep = Some(spacing.sibling_gap);
    graph_config.ranksep = Some(config.min_tier_gap);
    graph_config.marginx = Some(0.0);
    graph_config.marginy = Some(0.0);
    dagre_graph.set_graph(graph_config);

    // Positions are used as solver keys so duplicate ids cannot collide.
    let keys: Vec<String> = members.iter().map(|idx| format!("n{idx}")).collect();
    for (key, &idx) in keys.iter().zip(members) {
        let mut node = DagreNode::default();
        node.width = sizes[idx].width;
        node.height = sizes[idx].height;
        dagre_graph.set_node(key.clone(), Some(node));
    }
    for &idx in members {
        let from = format!("n{idx}");
        for &child in &forest.children[idx] {
            let to = format!("n{child}");
            let _ = dagre_graph.set_edge(&from, &to, Some(DagreEdge::default()), None);
        }
    }

    catch_unwind(AssertUnwindSafe(|| dagre_layout::run_layout(&mut dagre_graph)))
        .map_err(|payload| LayoutError::Solver(panic_message(payload.as_ref())))?;
    debug!(nodes = members.len(), "dagre subtree solved");

    let mut out = Vec::with_capacity(members.len());
    for (key, &idx) in keys.iter().zip(members) {
        let Some(dagre_node) = dagre_graph.node(key) else {
            return Err(LayoutError::Solver(format!("solver dropped node {key}")));
        };
        if !dagre_node.x.is_finite() {
            return Err(LayoutError::Solver(format!(
                "solver returned a non-finite position for {key}"
            )));
        }
        out.push((idx, dagre_node.x));
    }
    Ok(out)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "solver panicked".to_string()
}
