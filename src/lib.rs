#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod layout_dump;
pub mod model;
pub mod render;
pub mod session;
pub mod store;
pub mod text_metrics;
pub mod theme;
pub mod tree;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, LayoutEngine, TaxonomyConfig, load_config};
pub use error::{LayoutError, StoreError};
pub use layout::{Position, TreeLayout, compute_layout, layout_tidy};
pub use model::{Level, NewNode, NodeUpdate, TaxonomyNode, TreeNode};
pub use session::LayoutSession;
pub use store::{JsonFileStore, MemoryStore, NodeStore};

use serde::Deserialize;

/// Layout overrides accepted by the embedding surfaces.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOptions {
    pub engine: Option<String>,
    pub node_width: Option<f32>,
    pub min_tier_gap: Option<f32>,
    pub sibling_gap: Option<f32>,
    pub root_gap: Option<f32>,
    pub density_scaling: Option<bool>,
}

impl LayoutOptions {
    pub fn apply(&self, mut config: LayoutConfig) -> anyhow::Result<LayoutConfig> {
        if let Some(engine) = self.engine.as_deref() {
            config.engine = LayoutEngine::from_token(engine)
                .ok_or_else(|| anyhow::anyhow!("unknown layout engine `{engine}`"))?;
        }
        if let Some(value) = self.node_width {
            config.node_width = value.max(1.0);
        }
        if let Some(value) = self.min_tier_gap {
            config.min_tier_gap = value.max(0.0);
        }
        if let Some(value) = self.sibling_gap {
            config.sibling_gap = value.max(0.0);
        }
        if let Some(value) = self.root_gap {
            config.root_gap = value.max(0.0);
        }
        if let Some(value) = self.density_scaling {
            config.density_scaling = value;
        }
        Ok(config)
    }
}

/// Lays out a JSON node array and returns the layout dump as JSON.
pub fn layout_json(nodes_json: &str, options: &LayoutOptions) -> anyhow::Result<String> {
    let nodes: Vec<TaxonomyNode> = serde_json::from_str(nodes_json)?;
    let config = options.apply(LayoutConfig::default())?;
    let layout = compute_layout(&nodes, &config)?;
    let dump = layout_dump::LayoutDump::from_layout(&layout, &nodes);
    Ok(serde_json::to_string(&dump)?)
}
