use crate::layout::{Position, TreeLayout};
use crate::model::TaxonomyNode;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Layout snapshot for the web front-end.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub engine: String,
    pub width: f32,
    pub height: f32,
    pub min_x: f32,
    pub max_x: f32,
    pub positions: BTreeMap<String, Position>,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub tiers: Vec<TierDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub name: String,
    pub level: String,
    pub parent_id: Option<String>,
    pub depth: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub points: Vec<[f32; 2]>,
}

#[derive(Debug, Serialize)]
pub struct TierDump {
    pub depth: usize,
    pub y: f32,
    pub height: f32,
}

impl LayoutDump {
    /// Nodes are listed in input order; ids missing from the layout are skipped.
    pub fn from_layout(layout: &TreeLayout, nodes: &[TaxonomyNode]) -> Self {
        let mut seen: HashSet<&str> = HashSet::new();
        let node_dumps = nodes
            .iter()
            .filter(|node| seen.insert(node.id.as_str()))
            .filter_map(|node| {
                let node_box = layout.nodes.get(&node.id)?;
                Some(NodeDump {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    level: node.level.as_str().to_string(),
                    parent_id: node.parent_id.clone(),
                    depth: node_box.depth,
                    x: node_box.x,
                    y: node_box.y,
                    width: node_box.width,
                    height: node_box.height,
                })
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from.clone(),
                to: edge.to.clone(),
                points: edge.points.iter().map(|(x, y)| [*x, *y]).collect(),
            })
            .collect();

        let tiers = layout
            .tiers
            .iter()
            .map(|tier| TierDump {
                depth: tier.depth,
                y: tier.y,
                height: tier.height,
            })
            .collect();

        LayoutDump {
            engine: format!("{:?}", layout.engine).to_lowercase(),
            width: layout.width,
            height: layout.height,
            min_x: layout.min_x,
            max_x: layout.max_x,
            positions: layout.positions(),
            nodes: node_dumps,
            edges,
            tiers,
        }
    }
}

pub fn write_layout_dump(
    path: &Path,
    layout: &TreeLayout,
    nodes: &[TaxonomyNode],
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, nodes);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
