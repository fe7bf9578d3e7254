use crate::model::Level;

/// Failure of a layout run. Structural problems in the input are never
/// reported here; they are repaired by root promotion instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("layout solver failed: {0}")]
    Solver(String),
    #[error("layout solver did not finish within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("layout task was cancelled: {0}")]
    Cancelled(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("node `{0}` not found")]
    NotFound(String),
    #[error("parent node `{0}` not found")]
    ParentNotFound(String),
    #[error("a {0} cannot have children")]
    NoChildLevel(Level),
    #[error("node name must not be empty")]
    EmptyName,
    #[error("a {0} cannot carry an objective")]
    ObjectiveNotAllowed(Level),
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
