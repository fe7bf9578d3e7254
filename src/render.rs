use crate::config::{Config, RenderConfig, SizeConfig};
use crate::layout::size::wrap_lines;
use crate::layout::{NodeBox, TreeLayout};
use crate::model::TaxonomyNode;
use crate::theme::Theme;
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::path::Path;

const STRIPE_WIDTH: f32 = 6.0;
const LEVEL_LABEL_OFFSET: f32 = 22.0;
const NAME_OFFSET: f32 = 48.0;
const PILL_GAP: f32 = 6.0;

/// Repaint-only state: drawing it never needs a new layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Highlight {
    pub selected: Option<String>,
    pub matches: HashSet<String>,
}

pub fn render_svg(
    layout: &TreeLayout,
    nodes: &[TaxonomyNode],
    config: &Config,
    highlight: &Highlight,
) -> String {
    let theme = &config.theme;
    let padding = config.render.padding;
    let width = (layout.width + padding * 2.0).max(200.0);
    let height = (layout.height + padding * 2.0).max(200.0);
    let offset_x = padding - layout.min_x;
    let offset_y = padding;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    for edge in &layout.edges {
        let points: Vec<(f32, f32)> = edge
            .points
            .iter()
            .map(|(x, y)| (x + offset_x, y + offset_y))
            .collect();
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\"/>",
            points_to_path(&points),
            theme.line_color
        ));
    }

    let by_id: HashMap<&str, &TaxonomyNode> = nodes
        .iter()
        .rev()
        .map(|node| (node.id.as_str(), node))
        .collect();
    for node_box in layout.nodes.values() {
        let Some(node) = by_id.get(node_box.id.as_str()) else {
            continue;
        };
        svg.push_str(&card_svg(
            node_box,
            node,
            offset_x,
            offset_y,
            theme,
            &config.layout.size,
            highlight,
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn card_svg(
    node_box: &NodeBox,
    node: &TaxonomyNode,
    offset_x: f32,
    offset_y: f32,
    theme: &Theme,
    size: &SizeConfig,
    highlight: &Highlight,
) -> String {
    let x = node_box.left() + offset_x;
    let y = node_box.y + offset_y;
    let level_color = theme.level_colors.color(node.level);
    let selected = highlight.selected.as_deref() == Some(node.id.as_str());
    let fill = if highlight.matches.contains(&node.id) {
        theme.search_highlight.as_str()
    } else {
        theme.card_fill.as_str()
    };
    let (stroke, stroke_width) = if selected {
        (theme.selected_border.as_str(), 2.5)
    } else {
        (level_color, 1.2)
    };

    let mut out = String::new();
    out.push_str(&format!(
        "<g class=\"card level-{}\" data-id=\"{}\">",
        node.level.as_str(),
        escape_xml(&node.id)
    ));
    out.push_str(&format!(
        "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"8\" ry=\"8\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\"/>",
        node_box.width, node_box.height
    ));
    out.push_str(&format!(
        "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{STRIPE_WIDTH}\" height=\"{:.2}\" rx=\"3\" ry=\"3\" fill=\"{level_color}\"/>",
        node_box.height
    ));

    let text_x = x + size.text_padding_x;
    out.push_str(&format!(
        "<text x=\"{text_x:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{:.1}\" fill=\"{level_color}\">{}</text>",
        y + LEVEL_LABEL_OFFSET,
        theme.font_family,
        theme.font_size * 0.8,
        escape_xml(&node.level.label().to_uppercase())
    ));
    out.push_str(&format!(
        "<text x=\"{text_x:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" font-weight=\"600\" fill=\"{}\">{}</text>",
        y + NAME_OFFSET,
        theme.font_family,
        theme.font_size,
        theme.card_text_color,
        escape_xml(&node.name)
    ));

    let inner_width = (node_box.width - size.text_padding_x * 2.0).max(1.0);
    let mut cursor = y + size.base_height;
    if let Some(objective) = node.visible_objective() {
        let lines = objective_lines(objective, inner_width, size);
        if !lines.is_empty() {
            cursor += size.objective_padding;
            for line in &lines {
                cursor += size.objective_line_height;
                out.push_str(&format!(
                    "<text x=\"{text_x:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
                    cursor - 4.0,
                    theme.font_family,
                    size.objective_font_size,
                    theme.muted_text_color,
                    escape_xml(line)
                ));
            }
        }
    }
    for tags in [&node.audiences, &node.geographies] {
        cursor = pills_svg(&mut out, tags, text_x, cursor, inner_width, theme, size);
    }

    out.push_str("</g>");
    out
}

fn pills_svg(
    out: &mut String,
    tags: &[String],
    x: f32,
    top: f32,
    inner_width: f32,
    theme: &Theme,
    size: &SizeConfig,
) -> f32 {
    if tags.is_empty() {
        return top;
    }
    let per_row = size.pills_per_row.max(1);
    let pill_width = (inner_width - PILL_GAP * (per_row - 1) as f32) / per_row as f32;
    let pill_height = size.pill_row_height - 4.0;
    let block_top = top + size.pill_block_padding;
    for (idx, tag) in tags.iter().enumerate() {
        let column = idx % per_row;
        let row = idx / per_row;
        let pill_x = x + column as f32 * (pill_width + PILL_GAP);
        let pill_y = block_top + row as f32 * size.pill_row_height;
        out.push_str(&format!(
            "<rect x=\"{pill_x:.2}\" y=\"{pill_y:.2}\" width=\"{pill_width:.2}\" height=\"{pill_height:.2}\" rx=\"9\" ry=\"9\" fill=\"{}\"/>",
            theme.pill_fill
        ));
        out.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"11\" fill=\"{}\">{}</text>",
            pill_x + pill_width / 2.0,
            pill_y + pill_height / 2.0 + 4.0,
            theme.font_family,
            theme.pill_text_color,
            escape_xml(tag)
        ));
    }
    let rows = tags.len().div_ceil(per_row);
    top + size.pill_block_padding + rows as f32 * size.pill_row_height
}

/// Objective lines as the size model breaks them, capped at the same count.
fn objective_lines(text: &str, available_width: f32, size: &SizeConfig) -> Vec<String> {
    let mut lines = wrap_lines(text, available_width, size);
    if lines.len() > size.objective_max_lines {
        lines.truncate(size.objective_max_lines);
        if let Some(last) = lines.last_mut() {
            last.push('…');
        }
    }
    lines
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].0, points[0].1));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    anyhow::bail!("PNG output requires the `png` feature")
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compute_layout;
    use crate::layout::size::estimate_height;
    use crate::model::Level;

    fn sample() -> Vec<TaxonomyNode> {
        vec![
            TaxonomyNode::new("p", "Brand & Trust", Level::Pillar, None, 0)
                .with_objective("Be the most trusted name in the category")
                .with_audiences(["Consumers", "Investors"]),
            TaxonomyNode::new("t", "Safety", Level::NarrativeTheme, Some("p"), 0),
        ]
    }

    #[test]
    fn render_svg_basic() {
        let config = Config::default();
        let nodes = sample();
        let layout = compute_layout(&nodes, &config.layout).unwrap();
        let svg = render_svg(&layout, &nodes, &config, &Highlight::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Brand &amp; Trust"));
        assert!(svg.contains("Investors"));
        assert!(svg.contains("<path"));
    }

    #[test]
    fn highlight_changes_paint_only() {
        let config = Config::default();
        let nodes = sample();
        let layout = compute_layout(&nodes, &config.layout).unwrap();
        let highlight = Highlight {
            selected: Some("t".to_string()),
            matches: HashSet::from(["p".to_string()]),
        };
        let svg = render_svg(&layout, &nodes, &config, &highlight);
        assert!(svg.contains(&config.theme.selected_border));
        assert!(svg.contains(&config.theme.search_highlight));
    }

    #[test]
    fn wrap_respects_line_cap() {
        let size = SizeConfig::default();
        let text = "word ".repeat(200);
        let lines = objective_lines(&text, 200.0, &size);
        assert_eq!(lines.len(), size.objective_max_lines);
        assert!(lines[2].ends_with('…'));
    }

    #[test]
    fn drawn_objective_fits_the_reserved_height() {
        let size = SizeConfig {
            fast_text_metrics: false,
            objective_max_lines: 8,
            ..SizeConfig::default()
        };
        let node = TaxonomyNode::new("p", "Brand", Level::Pillar, None, 0).with_objective(
            "Position the brand as the reliable long-term partner for every household, \
             with MMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMMM and iiiiiiiiiiiiiiiiiiiiiiiiii tokens",
        );
        let available = 240.0 - size.text_padding_x * 2.0;
        let objective = node.visible_objective().expect("pillars keep objectives");
        let drawn = objective_lines(objective, available, &size);
        let reserved = estimate_height(&node, &size, 240.0) - size.base_height;
        let used = size.objective_padding + drawn.len() as f32 * size.objective_line_height;
        assert!(drawn.len() <= size.objective_max_lines);
        assert!(used <= reserved + 1e-3, "{used} > {reserved}");
    }
}
