use crate::config::{LayoutConfig, SizeConfig};
use crate::model::TaxonomyNode;
use crate::text_metrics;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeSize {
    pub width: f32,
    pub height: f32,
}

pub fn estimate_sizes(nodes: &[TaxonomyNode], config: &LayoutConfig) -> Vec<NodeSize> {
    nodes
        .iter()
        .map(|node| estimate_node_size(node, config))
        .collect()
}

/// Cards share one width; the height grows with the objective text and the
/// audience/geography pill rows that wrap inside the card.
pub fn estimate_node_size(node: &TaxonomyNode, config: &LayoutConfig) -> NodeSize {
    NodeSize {
        width: config.node_width,
        height: estimate_height(node, &config.size, config.node_width),
    }
}

pub fn estimate_height(node: &TaxonomyNode, size: &SizeConfig, node_width: f32) -> f32 {
    let mut height = size.base_height;
    if let Some(objective) = node.visible_objective() {
        let available = (node_width - size.text_padding_x * 2.0).max(1.0);
        let lines = wrapped_line_count(objective, available, size).min(size.objective_max_lines);
        if lines > 0 {
            height += size.objective_padding + lines as f32 * size.objective_line_height;
        }
    }
    height += pill_block_height(node.audiences.len(), size);
    height += pill_block_height(node.geographies.len(), size);
    height
}

fn pill_block_height(count: usize, size: &SizeConfig) -> f32 {
    if count == 0 {
        return 0.0;
    }
    let rows = count.div_ceil(size.pills_per_row.max(1));
    size.pill_block_padding + rows as f32 * size.pill_row_height
}

pub fn wrapped_line_count(text: &str, available_width: f32, size: &SizeConfig) -> usize {
    wrap_lines(text, available_width, size).len()
}

/// Greedy word wrap. Every paragraph yields at least one line; words wider
/// than a line are split at the widest prefix that fits.
pub fn wrap_lines(text: &str, available_width: f32, size: &SizeConfig) -> Vec<String> {
    let space = text_width(" ", size);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let first = lines.len();
        let mut current = String::new();
        let mut current_width = 0.0f32;
        for word in paragraph.split_whitespace() {
            let word_width = text_width(word, size);
            if word_width > available_width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let mut rest = word;
                while text_width(rest, size) > available_width {
                    let (head, tail) = split_at_width(rest, available_width, size);
                    if tail.is_empty() {
                        break;
                    }
                    lines.push(head.to_string());
                    rest = tail;
                }
                current = rest.to_string();
                current_width = text_width(rest, size);
                continue;
            }
            let needed = if current.is_empty() {
                word_width
            } else {
                current_width + space + word_width
            };
            if needed > available_width {
                lines.push(std::mem::replace(&mut current, word.to_string()));
                current_width = word_width;
            } else {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                current_width = needed;
            }
        }
        if !current.is_empty() || lines.len() == first {
            lines.push(current);
        }
    }
    lines
}

/// Splits after the longest prefix that fits, keeping at least one char.
fn split_at_width<'a>(
    word: &'a str,
    available_width: f32,
    size: &SizeConfig,
) -> (&'a str, &'a str) {
    let mut cut = 0;
    for (idx, ch) in word.char_indices() {
        let end = idx + ch.len_utf8();
        if cut > 0 && text_width(&word[..end], size) > available_width {
            break;
        }
        cut = end;
    }
    word.split_at(cut)
}

fn text_width(text: &str, size: &SizeConfig) -> f32 {
    let estimate =
        || text.chars().count() as f32 * size.objective_font_size * size.avg_char_width_ratio;
    if size.fast_text_metrics {
        return estimate();
    }
    text_metrics::measure_text_width(text, size.objective_font_size, &size.objective_font_family)
        .unwrap_or_else(estimate)
}
