use crate::model::Level;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_AUDIENCES: [&str; 6] = [
    "Employees",
    "Investors",
    "Customers",
    "Media",
    "Regulators",
    "Partners",
];

const DEFAULT_GEOGRAPHIES: [&str; 6] = [
    "Global",
    "North America",
    "Europe",
    "Asia Pacific",
    "Latin America",
    "Middle East & Africa",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutEngine {
    /// Bottom-up subtree widths, top-down centering.
    #[default]
    Tidy,
    /// Delegates horizontal placement to the dagre layered solver.
    Layered,
}

impl LayoutEngine {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "tidy" | "tree" | "centered" => Some(Self::Tidy),
            "layered" | "dagre" | "solver" => Some(Self::Layered),
            _ => None,
        }
    }
}

/// Inputs of the node height estimate. Width is `LayoutConfig::node_width`
/// for every card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeConfig {
    pub base_height: f32,
    pub text_padding_x: f32,
    pub objective_padding: f32,
    pub objective_font_size: f32,
    pub objective_line_height: f32,
    pub objective_max_lines: usize,
    pub objective_font_family: String,
    pub pill_block_padding: f32,
    pub pill_row_height: f32,
    pub pills_per_row: usize,
    /// Character-count width estimate instead of font metrics.
    pub fast_text_metrics: bool,
    pub avg_char_width_ratio: f32,
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            base_height: 72.0,
            text_padding_x: 16.0,
            objective_padding: 8.0,
            objective_font_size: 12.0,
            objective_line_height: 16.0,
            objective_max_lines: 3,
            objective_font_family: "Inter, Segoe UI, system-ui, sans-serif".to_string(),
            pill_block_padding: 10.0,
            pill_row_height: 22.0,
            pills_per_row: 3,
            fast_text_metrics: true,
            avg_char_width_ratio: 0.56,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub timeout_ms: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { timeout_ms: 5_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: f32,
    pub min_tier_gap: f32,
    pub sibling_gap: f32,
    pub root_gap: f32,
    pub engine: LayoutEngine,
    pub density_scaling: bool,
    pub min_density_gap: f32,
    pub size: SizeConfig,
    pub solver: SolverConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 240.0,
            min_tier_gap: 60.0,
            sibling_gap: 40.0,
            root_gap: 120.0,
            engine: LayoutEngine::Tidy,
            density_scaling: false,
            min_density_gap: 16.0,
            size: SizeConfig::default(),
            solver: SolverConfig::default(),
        }
    }
}

/// Controlled vocabularies and content limits of the taxonomy itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    pub audiences: Vec<String>,
    pub geographies: Vec<String>,
    pub objective_line_limit: usize,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            audiences: DEFAULT_AUDIENCES.iter().map(|v| v.to_string()).collect(),
            geographies: DEFAULT_GEOGRAPHIES.iter().map(|v| v.to_string()).collect(),
            objective_line_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub padding: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            padding: 40.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub taxonomy: TaxonomyConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::modern();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            taxonomy: TaxonomyConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    node_width: Option<f32>,
    min_tier_gap: Option<f32>,
    sibling_gap: Option<f32>,
    root_gap: Option<f32>,
    engine: Option<String>,
    density_scaling: Option<bool>,
    min_density_gap: Option<f32>,
    base_height: Option<f32>,
    objective_line_height: Option<f32>,
    objective_max_lines: Option<usize>,
    pill_row_height: Option<f32>,
    pills_per_row: Option<usize>,
    fast_text_metrics: Option<bool>,
    solver_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaxonomyConfigFile {
    audiences: Option<Vec<String>>,
    geographies: Option<Vec<String>>,
    objective_line_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    card_fill: Option<String>,
    card_text_color: Option<String>,
    line_color: Option<String>,
    pill_fill: Option<String>,
    selected_border: Option<String>,
    search_highlight: Option<String>,
    pillar_color: Option<String>,
    narrative_theme_color: Option<String>,
    subject_color: Option<String>,
    topic_color: Option<String>,
    subtopic_color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    taxonomy: Option<TaxonomyConfigFile>,
    render_width: Option<f32>,
    render_height: Option<f32>,
    render_padding: Option<f32>,
}

/// Loads a JSON5 configuration file over the defaults. `None` yields the
/// defaults unchanged.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "classic" || theme_name == "default" {
            config.theme = Theme::classic();
        } else if theme_name == "modern" {
            config.theme = Theme::modern();
        } else {
            anyhow::bail!("unknown theme `{theme_name}`");
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.card_fill {
            config.theme.card_fill = v;
        }
        if let Some(v) = vars.card_text_color {
            config.theme.card_text_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.pill_fill {
            config.theme.pill_fill = v;
        }
        if let Some(v) = vars.selected_border {
            config.theme.selected_border = v;
        }
        if let Some(v) = vars.search_highlight {
            config.theme.search_highlight = v;
        }
        let level_overrides = [
            (Level::Pillar, vars.pillar_color),
            (Level::NarrativeTheme, vars.narrative_theme_color),
            (Level::Subject, vars.subject_color),
            (Level::Topic, vars.topic_color),
            (Level::Subtopic, vars.subtopic_color),
        ];
        for (level, color) in level_overrides {
            if let Some(color) = color {
                config.theme.level_colors.set(level, color);
            }
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.node_width {
            config.layout.node_width = v.max(1.0);
        }
        if let Some(v) = layout.min_tier_gap {
            config.layout.min_tier_gap = v.max(0.0);
        }
        if let Some(v) = layout.sibling_gap {
            config.layout.sibling_gap = v.max(0.0);
        }
        if let Some(v) = layout.root_gap {
            config.layout.root_gap = v.max(0.0);
        }
        if let Some(v) = layout.engine {
            config.layout.engine = LayoutEngine::from_token(&v)
                .ok_or_else(|| anyhow::anyhow!("unknown layout engine `{v}`"))?;
        }
        if let Some(v) = layout.density_scaling {
            config.layout.density_scaling = v;
        }
        if let Some(v) = layout.min_density_gap {
            config.layout.min_density_gap = v.max(0.0);
        }
        if let Some(v) = layout.base_height {
            config.layout.size.base_height = v.max(1.0);
        }
        if let Some(v) = layout.objective_line_height {
            config.layout.size.objective_line_height = v.max(0.0);
        }
        if let Some(v) = layout.objective_max_lines {
            config.layout.size.objective_max_lines = v;
        }
        if let Some(v) = layout.pill_row_height {
            config.layout.size.pill_row_height = v.max(0.0);
        }
        if let Some(v) = layout.pills_per_row {
            config.layout.size.pills_per_row = v.max(1);
        }
        if let Some(v) = layout.fast_text_metrics {
            config.layout.size.fast_text_metrics = v;
        }
        if let Some(v) = layout.solver_timeout_ms {
            config.layout.solver.timeout_ms = v;
        }
    }

    if let Some(taxonomy) = parsed.taxonomy {
        if let Some(v) = taxonomy.audiences {
            config.taxonomy.audiences = v;
        }
        if let Some(v) = taxonomy.geographies {
            config.taxonomy.geographies = v;
        }
        if let Some(v) = taxonomy.objective_line_limit {
            config.taxonomy.objective_line_limit = v;
        }
    }

    if let Some(v) = parsed.render_width {
        config.render.width = v;
    }
    if let Some(v) = parsed.render_height {
        config.render.height = v;
    }
    if let Some(v) = parsed.render_padding {
        config.render.padding = v.max(0.0);
    }
    config.render.background = config.theme.background.clone();

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json5_overrides_merge_over_defaults() {
        let raw = r#"{
            // comments and trailing commas are allowed
            theme: 'classic',
            themeVariables: { pillarColor: '#000000' },
            layout: { nodeWidth: 200, siblingGap: 24, engine: 'layered', },
            taxonomy: { audiences: ['Staff'] },
        }"#;
        let config = parse_config(raw).expect("config should parse");
        assert_eq!(config.layout.node_width, 200.0);
        assert_eq!(config.layout.sibling_gap, 24.0);
        assert_eq!(config.layout.min_tier_gap, LayoutConfig::default().min_tier_gap);
        assert_eq!(config.layout.engine, LayoutEngine::Layered);
        assert_eq!(config.theme.level_colors.pillar, "#000000");
        assert_eq!(config.theme.level_colors.topic, Theme::classic().level_colors.topic);
        assert_eq!(config.taxonomy.audiences, vec!["Staff".to_string()]);
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let err = parse_config("{ layout: { engine: 'spiral' } }").unwrap_err();
        assert!(err.to_string().contains("spiral"));
    }
}
