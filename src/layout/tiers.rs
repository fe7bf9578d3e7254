use super::NodeSize;
use crate::tree::Forest;
use serde::Serialize;

/// All nodes sharing one depth. `y` is the top edge of the tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tier {
    pub depth: usize,
    pub y: f32,
    pub height: f32,
}

impl Tier {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Tier height is the tallest card at that depth; each tier starts
/// `min_tier_gap` below the previous tier's bottom.
pub fn compute_tiers(forest: &Forest, sizes: &[NodeSize], min_tier_gap: f32) -> Vec<Tier> {
    let Some(max_depth) = forest.max_depth() else {
        return Vec::new();
    };
    let mut heights = vec![0.0f32; max_depth + 1];
    for (idx, size) in sizes.iter().enumerate() {
        let depth = forest.depth[idx];
        heights[depth] = heights[depth].max(size.height);
    }
    let mut tiers = Vec::with_capacity(heights.len());
    let mut y = 0.0f32;
    for (depth, height) in heights.into_iter().enumerate() {
        tiers.push(Tier { depth, y, height });
        y += height + min_tier_gap;
    }
    tiers
}
