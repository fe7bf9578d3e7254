use crate::config::LayoutConfig;
use crate::tree::Forest;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    pub sibling_gap: f32,
    pub root_gap: f32,
}

impl Spacing {
    pub fn resolve(config: &LayoutConfig, node_count: usize) -> Self {
        if !config.density_scaling {
            return Self {
                sibling_gap: config.sibling_gap,
                root_gap: config.root_gap,
            };
        }
        let density_scale = if node_count >= 10 {
            0.7
        } else if node_count >= 6 {
            0.8
        } else {
            1.0
        };
        let scale = |gap: f32| (gap * density_scale).max(config.min_density_gap.min(gap));
        Self {
            sibling_gap: scale(config.sibling_gap),
            root_gap: scale(config.root_gap),
        }
    }
}

/// Horizontal footprint of every subtree, computed leaves first.
pub fn subtree_widths(forest: &Forest, node_width: f32, sibling_gap: f32) -> Vec<f32> {
    let mut widths = vec![node_width; forest.len()];
    for &idx in forest.breadth_first.iter().rev() {
        let children = &forest.children[idx];
        if children.is_empty() {
            continue;
        }
        let total: f32 = children.iter().map(|&child| widths[child]).sum();
        widths[idx] = total + sibling_gap * (children.len() - 1) as f32;
    }
    widths
}

/// Spans go top-down, roots left to right around x = 0. Leaves sit mid-span;
/// parents are then centered bottom-up over their first and last child.
pub fn assign_centers(forest: &Forest, node_width: f32, spacing: Spacing) -> Vec<f32> {
    let widths = subtree_widths(forest, node_width, spacing.sibling_gap);
    let mut span_left = vec![0.0f32; forest.len()];

    let roots_total: f32 = forest.roots.iter().map(|&root| widths[root]).sum::<f32>()
        + spacing.root_gap * forest.roots.len().saturating_sub(1) as f32;
    let mut cursor = -roots_total / 2.0;
    for &root in &forest.roots {
        span_left[root] = cursor;
        cursor += widths[root] + spacing.root_gap;
    }

    for &idx in &forest.breadth_first {
        let mut cursor = span_left[idx];
        for &child in &forest.children[idx] {
            span_left[child] = cursor;
            cursor += widths[child] + spacing.sibling_gap;
        }
    }

    let mut centers = vec![0.0f32; forest.len()];
    for &idx in forest.breadth_first.iter().rev() {
        let children = &forest.children[idx];
        centers[idx] = match (children.first(), children.last()) {
            (Some(&first), Some(&last)) => (centers[first] + centers[last]) / 2.0,
            _ => span_left[idx] + widths[idx] / 2.0,
        };
    }
    centers
}
