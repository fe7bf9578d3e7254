use crate::model::Level;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelPalette {
    pub pillar: String,
    pub narrative_theme: String,
    pub subject: String,
    pub topic: String,
    pub subtopic: String,
}

impl LevelPalette {
    pub fn color(&self, level: Level) -> &str {
        match level {
            Level::Pillar => &self.pillar,
            Level::NarrativeTheme => &self.narrative_theme,
            Level::Subject => &self.subject,
            Level::Topic => &self.topic,
            Level::Subtopic => &self.subtopic,
        }
    }

    pub fn set(&mut self, level: Level, color: String) {
        match level {
            Level::Pillar => self.pillar = color,
            Level::NarrativeTheme => self.narrative_theme = color,
            Level::Subject => self.subject = color,
            Level::Topic => self.topic = color,
            Level::Subtopic => self.subtopic = color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub background: String,
    pub card_fill: String,
    pub card_text_color: String,
    pub muted_text_color: String,
    pub line_color: String,
    pub pill_fill: String,
    pub pill_text_color: String,
    pub selected_border: String,
    pub search_highlight: String,
    pub level_colors: LevelPalette,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 14.0,
            background: "#FFFFFF".to_string(),
            card_fill: "#FFFFFF".to_string(),
            card_text_color: "#333333".to_string(),
            muted_text_color: "#666666".to_string(),
            line_color: "#999999".to_string(),
            pill_fill: "#ECECFF".to_string(),
            pill_text_color: "#333333".to_string(),
            selected_border: "#9370DB".to_string(),
            search_highlight: "#FFF3B0".to_string(),
            level_colors: LevelPalette {
                pillar: "#1F4E79".to_string(),
                narrative_theme: "#2E75B6".to_string(),
                subject: "#548235".to_string(),
                topic: "#BF9000".to_string(),
                subtopic: "#7F7F7F".to_string(),
            },
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            background: "#FFFFFF".to_string(),
            card_fill: "#F8FAFF".to_string(),
            card_text_color: "#1C2430".to_string(),
            muted_text_color: "#5B6677".to_string(),
            line_color: "#7A8AA6".to_string(),
            pill_fill: "#EEF2F8".to_string(),
            pill_text_color: "#1C2430".to_string(),
            selected_border: "#3B82F6".to_string(),
            search_highlight: "#FEF3C7".to_string(),
            level_colors: LevelPalette {
                pillar: "#4F46E5".to_string(),
                narrative_theme: "#0EA5E9".to_string(),
                subject: "#10B981".to_string(),
                topic: "#F59E0B".to_string(),
                subtopic: "#94A3B8".to_string(),
            },
        }
    }
}
