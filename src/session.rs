use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::layout::{TreeLayout, compute_layout};
use crate::model::{Level, TaxonomyNode};
use crate::render::Highlight;
use crate::tree;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
struct NodeSignature {
    id: String,
    parent_id: Option<String>,
    level: Level,
    order: i64,
    name: String,
    objective: Option<String>,
    audiences: Vec<String>,
    geographies: Vec<String>,
}

/// Everything in the node list that can move a card: identity, parent links,
/// sibling order and the content that feeds the height estimate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuralSignature(Vec<NodeSignature>);

impl StructuralSignature {
    pub fn of(nodes: &[TaxonomyNode]) -> Self {
        Self(
            nodes
                .iter()
                .map(|node| NodeSignature {
                    id: node.id.clone(),
                    parent_id: node.parent_id.clone(),
                    level: node.level,
                    order: node.order,
                    name: node.name.clone(),
                    objective: node.objective.clone(),
                    audiences: node.audiences.clone(),
                    geographies: node.geographies.clone(),
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Relaid,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Applied { version: u64 },
    Discarded { version: u64, latest: u64 },
    Failed(LayoutError),
}

pub struct LayoutResult {
    pub version: u64,
    pub outcome: Result<TreeLayout, LayoutError>,
}

pub struct LayoutJob {
    version: u64,
    snapshot: Vec<TaxonomyNode>,
    config: LayoutConfig,
}

impl LayoutJob {
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Runs the layout on the blocking pool, bounded by the solver timeout.
    pub async fn run(self) -> LayoutResult {
        let LayoutJob {
            version,
            snapshot,
            config,
        } = self;
        let timeout_ms = config.solver.timeout_ms;
        let outcome = run_bounded(timeout_ms, move || compute_layout(&snapshot, &config)).await;
        LayoutResult { version, outcome }
    }
}

async fn run_bounded<F>(timeout_ms: u64, work: F) -> Result<TreeLayout, LayoutError>
where
    F: FnOnce() -> Result<TreeLayout, LayoutError> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(work);
    match tokio::time::timeout(Duration::from_millis(timeout_ms), handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) if join_error.is_panic() => {
            Err(LayoutError::Solver(join_error.to_string()))
        }
        Ok(Err(join_error)) => Err(LayoutError::Cancelled(join_error.to_string())),
        Err(_) => Err(LayoutError::Timeout { timeout_ms }),
    }
}

pub struct LayoutSession {
    config: LayoutConfig,
    signature: Option<StructuralSignature>,
    current: Option<Arc<TreeLayout>>,
    requested_version: u64,
    applied_version: u64,
    layout_runs: u64,
    selected: Option<String>,
    search_term: String,
    last_error: Option<LayoutError>,
}

impl LayoutSession {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            signature: None,
            current: None,
            requested_version: 0,
            applied_version: 0,
            layout_runs: 0,
            selected: None,
            search_term: String::new(),
            last_error: None,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
        self.signature = None;
    }

    pub fn layout(&self) -> Option<&TreeLayout> {
        self.current.as_deref()
    }

    pub fn shared_layout(&self) -> Option<Arc<TreeLayout>> {
        self.current.clone()
    }

    pub fn layout_runs(&self) -> u64 {
        self.layout_runs
    }

    pub fn applied_version(&self) -> u64 {
        self.applied_version
    }

    pub fn last_error(&self) -> Option<&LayoutError> {
        self.last_error.as_ref()
    }

    pub fn needs_layout(&self, nodes: &[TaxonomyNode]) -> bool {
        self.signature.as_ref() != Some(&StructuralSignature::of(nodes))
    }

    /// Lays out synchronously if the structure changed since the last run.
    pub fn sync(&mut self, nodes: &[TaxonomyNode]) -> Result<Refresh, LayoutError> {
        let signature = StructuralSignature::of(nodes);
        if self.signature.as_ref() == Some(&signature) {
            return Ok(Refresh::Unchanged);
        }
        self.run_now(nodes, signature)?;
        Ok(Refresh::Relaid)
    }

    /// Explicit user request: lay out even when nothing changed.
    pub fn auto_organize(&mut self, nodes: &[TaxonomyNode]) -> Result<(), LayoutError> {
        self.run_now(nodes, StructuralSignature::of(nodes))
    }

    fn run_now(
        &mut self,
        nodes: &[TaxonomyNode],
        signature: StructuralSignature,
    ) -> Result<(), LayoutError> {
        self.requested_version += 1;
        self.layout_runs += 1;
        // Recorded even on failure: a failed run is not retried until the
        // structure changes again or the user re-organizes.
        self.signature = Some(signature);
        let outcome = compute_layout(nodes, &self.config);
        self.apply(self.requested_version, outcome)
    }

    /// Swaps in a finished layout, or keeps the previous one on failure.
    fn apply(
        &mut self,
        version: u64,
        outcome: Result<TreeLayout, LayoutError>,
    ) -> Result<(), LayoutError> {
        match outcome {
            Ok(layout) => {
                self.current = Some(Arc::new(layout));
                self.applied_version = version;
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, version, "layout failed; keeping previous positions");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub fn begin(&mut self, nodes: &[TaxonomyNode]) -> Option<LayoutJob> {
        let signature = StructuralSignature::of(nodes);
        if self.signature.as_ref() == Some(&signature) {
            return None;
        }
        Some(self.start_job(nodes, signature))
    }

    pub fn begin_forced(&mut self, nodes: &[TaxonomyNode]) -> LayoutJob {
        self.start_job(nodes, StructuralSignature::of(nodes))
    }

    fn start_job(&mut self, nodes: &[TaxonomyNode], signature: StructuralSignature) -> LayoutJob {
        self.requested_version += 1;
        self.layout_runs += 1;
        self.signature = Some(signature);
        debug!(version = self.requested_version, nodes = nodes.len(), "layout job started");
        LayoutJob {
            version: self.requested_version,
            snapshot: nodes.to_vec(),
            config: self.config.clone(),
        }
    }

    /// Applies a finished job unless a newer request superseded it.
    pub fn complete(&mut self, result: LayoutResult) -> Completion {
        if result.version != self.requested_version {
            debug!(
                version = result.version,
                latest = self.requested_version,
                "discarding stale layout"
            );
            return Completion::Discarded {
                version: result.version,
                latest: self.requested_version,
            };
        }
        match self.apply(result.version, result.outcome) {
            Ok(()) => Completion::Applied {
                version: result.version,
            },
            Err(err) => Completion::Failed(err),
        }
    }

    pub fn select(&mut self, node_id: Option<&str>) {
        self.selected = node_id.map(str::to_string);
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = term.to_string();
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn highlight(&self, nodes: &[TaxonomyNode]) -> Highlight {
        Highlight {
            selected: self.selected.clone(),
            matches: tree::name_matches(nodes, &self.search_term),
        }
    }
}
