use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The five fixed hierarchy levels, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Pillar,
    NarrativeTheme,
    Subject,
    Topic,
    Subtopic,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Pillar,
        Level::NarrativeTheme,
        Level::Subject,
        Level::Topic,
        Level::Subtopic,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Pillar => 0,
            Self::NarrativeTheme => 1,
            Self::Subject => 2,
            Self::Topic => 3,
            Self::Subtopic => 4,
        }
    }

    pub fn child(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn parent(self) -> Option<Self> {
        self.index().checked_sub(1).map(|idx| Self::ALL[idx])
    }

    /// Objectives are only meaningful on the top three levels.
    pub fn allows_objective(self) -> bool {
        matches!(self, Self::Pillar | Self::NarrativeTheme | Self::Subject)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pillar => "pillar",
            Self::NarrativeTheme => "narrative_theme",
            Self::Subject => "subject",
            Self::Topic => "topic",
            Self::Subtopic => "subtopic",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "pillar" => Some(Self::Pillar),
            "narrative_theme" | "narrative-theme" | "theme" => Some(Self::NarrativeTheme),
            "subject" => Some(Self::Subject),
            "topic" => Some(Self::Topic),
            "subtopic" => Some(Self::Subtopic),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pillar => "Pillar",
            Self::NarrativeTheme => "Narrative Theme",
            Self::Subject => "Subject",
            Self::Topic => "Topic",
            Self::Subtopic => "Subtopic",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyNode {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub audiences: Vec<String>,
    #[serde(default)]
    pub geographies: Vec<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub level: Level,
    #[serde(default)]
    pub order: i64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl TaxonomyNode {
    /// Builds a node with empty optional content and the current time as
    /// both timestamps.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        level: Level,
        parent_id: Option<&str>,
        order: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            objective: None,
            notes: None,
            audiences: Vec::new(),
            geographies: Vec::new(),
            parent_id: parent_id.map(str::to_string),
            level,
            order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_objective(mut self, objective: impl Into<String>) -> Self {
        self.objective = Some(objective.into());
        self
    }

    pub fn with_audiences<I, S>(mut self, audiences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audiences = audiences.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_geographies<I, S>(mut self, geographies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.geographies = geographies.into_iter().map(Into::into).collect();
        self
    }

    /// Objective text that should be displayed, if the level allows one.
    pub fn visible_objective(&self) -> Option<&str> {
        if !self.level.allows_objective() {
            return None;
        }
        self.objective
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Nested projection of the flat list. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: TaxonomyNode,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }
}

/// Creation request. The level is derived from the parent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNode {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub audiences: Vec<String>,
    #[serde(default)]
    pub geographies: Vec<String>,
}

impl NewNode {
    pub fn named(name: impl Into<String>, parent_id: Option<&str>) -> Self {
        Self {
            name: name.into(),
            parent_id: parent_id.map(str::to_string),
            ..Default::default()
        }
    }
}

/// Update request. `None` leaves the field untouched; for the optional text
/// fields `Some(None)` clears the value. On the wire an absent key leaves the
/// field alone and an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub objective: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub notes: Option<Option<String>>,
    pub audiences: Option<Vec<String>>,
    pub geographies: Option<Vec<String>>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
