mod layered;
pub mod size;
pub mod tidy;
pub mod tiers;

pub use size::{NodeSize, estimate_node_size, estimate_sizes};
pub use tidy::Spacing;
pub use tiers::Tier;

use crate::config::{LayoutConfig, LayoutEngine};
use crate::error::LayoutError;
use crate::model::{Level, TaxonomyNode};
use crate::tree::Forest;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeBox {
    pub id: String,
    pub level: Level,
    pub depth: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NodeBox {
    pub fn left(&self) -> f32 {
        self.x - self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeLayout {
    pub from: String,
    pub to: String,
    pub points: Vec<(f32, f32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeLayout {
    pub engine: LayoutEngine,
    pub nodes: BTreeMap<String, NodeBox>,
    pub edges: Vec<EdgeLayout>,
    pub tiers: Vec<Tier>,
    pub min_x: f32,
    pub max_x: f32,
    pub width: f32,
    pub height: f32,
}

impl TreeLayout {
    pub fn empty(engine: LayoutEngine) -> Self {
        Self {
            engine,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            tiers: Vec::new(),
            min_x: 0.0,
            max_x: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<Position> {
        self.nodes.get(id).map(|node| Position { x: node.x, y: node.y })
    }

    /// The id → `{x, y}` map handed to the rendering surface.
    pub fn positions(&self) -> BTreeMap<String, Position> {
        self.nodes
            .iter()
            .map(|(id, node)| (id.clone(), Position { x: node.x, y: node.y }))
            .collect()
    }
}

/// Lays out `nodes` with the engine selected in `config`.
pub fn compute_layout(
    nodes: &[TaxonomyNode],
    config: &LayoutConfig,
) -> Result<TreeLayout, LayoutError> {
    match config.engine {
        LayoutEngine::Tidy => Ok(layout_tidy(nodes, config)),
        LayoutEngine::Layered => layout_layered(nodes, config),
    }
}

/// Subtree-width centering layout. Never fails.
pub fn layout_tidy(nodes: &[TaxonomyNode], config: &LayoutConfig) -> TreeLayout {
    if nodes.is_empty() {
        return TreeLayout::empty(LayoutEngine::Tidy);
    }
    let forest = Forest::build(nodes);
    let sizes = estimate_sizes(nodes, config);
    let spacing = Spacing::resolve(config, nodes.len());
    let centers = tidy::assign_centers(&forest, config.node_width, spacing);
    assemble(nodes, &forest, &sizes, &centers, config, LayoutEngine::Tidy)
}

/// Layered-solver layout. Fails only when the solver does.
pub fn layout_layered(
    nodes: &[TaxonomyNode],
    config: &LayoutConfig,
) -> Result<TreeLayout, LayoutError> {
    if nodes.is_empty() {
        return Ok(TreeLayout::empty(LayoutEngine::Layered));
    }
    let forest = Forest::build(nodes);
    let sizes = estimate_sizes(nodes, config);
    let spacing = Spacing::resolve(config, nodes.len());
    let centers = layered::assign_centers_layered(&forest, &sizes, config, spacing)?;
    Ok(assemble(
        nodes,
        &forest,
        &sizes,
        &centers,
        config,
        LayoutEngine::Layered,
    ))
}

fn assemble(
    nodes: &[TaxonomyNode],
    forest: &Forest,
    sizes: &[NodeSize],
    centers: &[f32],
    config: &LayoutConfig,
    engine: LayoutEngine,
) -> TreeLayout {
    let tiers = tiers::compute_tiers(forest, sizes, config.min_tier_gap);

    let mut boxes: BTreeMap<String, NodeBox> = BTreeMap::new();
    let mut min_x = f32::MAX;
    let mut max_x = f32::MIN;
    for (idx, node) in nodes.iter().enumerate() {
        let depth = forest.depth[idx];
        let node_box = NodeBox {
            id: node.id.clone(),
            level: node.level,
            depth,
            x: centers[idx],
            y: tiers[depth].y,
            width: sizes[idx].width,
            height: sizes[idx].height,
        };
        min_x = min_x.min(node_box.left());
        max_x = max_x.max(node_box.right());
        boxes.entry(node.id.clone()).or_insert(node_box);
    }

    let mut edges = Vec::new();
    for &parent in &forest.breadth_first {
        let tier = &tiers[forest.depth[parent]];
        let elbow_y = tier.bottom() + config.min_tier_gap / 2.0;
        let from_x = centers[parent];
        let from_y = tier.y + sizes[parent].height;
        for &child in &forest.children[parent] {
            let to_x = centers[child];
            let to_y = tiers[forest.depth[child]].y;
            edges.push(EdgeLayout {
                from: nodes[parent].id.clone(),
                to: nodes[child].id.clone(),
                points: vec![
                    (from_x, from_y),
                    (from_x, elbow_y),
                    (to_x, elbow_y),
                    (to_x, to_y),
                ],
            });
        }
    }

    let height = tiers.last().map(Tier::bottom).unwrap_or(0.0);
    debug!(
        engine = ?engine,
        nodes = nodes.len(),
        roots = forest.roots.len(),
        tiers = tiers.len(),
        "layout computed"
    );

    TreeLayout {
        engine,
        nodes: boxes,
        edges,
        tiers,
        min_x,
        max_x,
        width: max_x - min_x,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty_layout() {
        let layout = layout_tidy(&[], &LayoutConfig::default());
        assert!(layout.is_empty());
        assert!(layout.positions().is_empty());
        let layered = layout_layered(&[], &LayoutConfig::default()).expect("empty layered");
        assert!(layered.is_empty());
    }

    #[test]
    fn single_node_sits_at_origin() {
        let nodes = vec![TaxonomyNode::new("p", "Brand", Level::Pillar, None, 0)];
        let layout = layout_tidy(&nodes, &LayoutConfig::default());
        assert_eq!(layout.position("p"), Some(Position { x: 0.0, y: 0.0 }));
        assert_eq!(layout.width, 240.0);
        assert!(layout.edges.is_empty());
    }

    #[test]
    fn edges_bend_halfway_through_the_gap() {
        let nodes = vec![
            TaxonomyNode::new("p", "Brand", Level::Pillar, None, 0),
            TaxonomyNode::new("t", "Trust", Level::NarrativeTheme, Some("p"), 0),
        ];
        let config = LayoutConfig::default();
        let layout = layout_tidy(&nodes, &config);
        assert_eq!(layout.edges.len(), 1);
        let points = &layout.edges[0].points;
        assert_eq!(points[0], (0.0, 72.0));
        assert_eq!(points[1], (0.0, 72.0 + 30.0));
        assert_eq!(points[3], (0.0, 132.0));
    }
}
