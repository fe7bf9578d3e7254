use crate::error::StoreError;
use crate::model::{Level, NewNode, NodeUpdate, TaxonomyNode};
use crate::tree;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

pub trait NodeStore {
    fn load_all(&self) -> Result<Vec<TaxonomyNode>, StoreError>;
    fn get(&self, id: &str) -> Result<Option<TaxonomyNode>, StoreError>;
    fn create(&mut self, request: NewNode) -> Result<TaxonomyNode, StoreError>;
    fn update(&mut self, id: &str, update: NodeUpdate) -> Result<TaxonomyNode, StoreError>;
    /// Removes the node and every descendant. Returns the removed ids,
    /// target first.
    fn delete(&mut self, id: &str) -> Result<Vec<String>, StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    nodes: Vec<TaxonomyNode>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodes(nodes: Vec<TaxonomyNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[TaxonomyNode] {
        &self.nodes
    }
}

impl NodeStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<TaxonomyNode>, StoreError> {
        Ok(self.nodes.clone())
    }

    fn get(&self, id: &str) -> Result<Option<TaxonomyNode>, StoreError> {
        Ok(self.nodes.iter().find(|node| node.id == id).cloned())
    }

    fn create(&mut self, request: NewNode) -> Result<TaxonomyNode, StoreError> {
        let node = build_node(&self.nodes, request)?;
        info!(id = %node.id, level = %node.level, "node created");
        self.nodes.push(node.clone());
        Ok(node)
    }

    fn update(&mut self, id: &str, update: NodeUpdate) -> Result<TaxonomyNode, StoreError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|node| node.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        apply_update(node, update)?;
        info!(id = %node.id, "node updated");
        Ok(node.clone())
    }

    fn delete(&mut self, id: &str) -> Result<Vec<String>, StoreError> {
        if !self.nodes.iter().any(|node| node.id == id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let (remaining, removed) = tree::cascade_delete(&self.nodes, id);
        self.nodes = remaining;
        info!(id, removed = removed.len(), "node deleted");
        Ok(removed)
    }
}

/// Node list persisted as a pretty-printed JSON array. Every mutation
/// rewrites the file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let nodes = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            Vec::new()
        };
        Ok(Self {
            path,
            inner: MemoryStore::with_nodes(nodes),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `change` to a copy of the nodes and swaps it in only once
    /// the copy is on disk.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut MemoryStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut staged = self.inner.clone();
        let value = change(&mut staged)?;
        write_nodes(&self.path, staged.nodes())?;
        self.inner = staged;
        Ok(value)
    }
}

impl NodeStore for JsonFileStore {
    fn load_all(&self) -> Result<Vec<TaxonomyNode>, StoreError> {
        self.inner.load_all()
    }

    fn get(&self, id: &str) -> Result<Option<TaxonomyNode>, StoreError> {
        self.inner.get(id)
    }

    fn create(&mut self, request: NewNode) -> Result<TaxonomyNode, StoreError> {
        self.commit(|nodes| nodes.create(request))
    }

    fn update(&mut self, id: &str, update: NodeUpdate) -> Result<TaxonomyNode, StoreError> {
        self.commit(|nodes| nodes.update(id, update))
    }

    fn delete(&mut self, id: &str) -> Result<Vec<String>, StoreError> {
        self.commit(|nodes| nodes.delete(id))
    }
}

fn write_nodes(path: &Path, nodes: &[TaxonomyNode]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(nodes)?;
    fs::write(path, json)?;
    Ok(())
}

fn build_node(nodes: &[TaxonomyNode], request: NewNode) -> Result<TaxonomyNode, StoreError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(StoreError::EmptyName);
    }

    let level = match request.parent_id.as_deref() {
        None => Level::Pillar,
        Some(parent_id) => {
            let parent = nodes
                .iter()
                .find(|node| node.id == parent_id)
                .ok_or_else(|| StoreError::ParentNotFound(parent_id.to_string()))?;
            parent
                .level
                .child()
                .ok_or(StoreError::NoChildLevel(parent.level))?
        }
    };

    let objective = non_empty(request.objective);
    if objective.is_some() && !level.allows_objective() {
        return Err(StoreError::ObjectiveNotAllowed(level));
    }

    let order = nodes
        .iter()
        .filter(|node| node.parent_id == request.parent_id)
        .map(|node| node.order)
        .max()
        .map_or(0, |max| max + 1);

    let mut node = TaxonomyNode::new(
        Uuid::new_v4().to_string(),
        name,
        level,
        request.parent_id.as_deref(),
        order,
    );
    node.description = non_empty(request.description);
    node.objective = objective;
    node.notes = non_empty(request.notes);
    node.audiences = request.audiences;
    node.geographies = request.geographies;
    Ok(node)
}

fn apply_update(node: &mut TaxonomyNode, update: NodeUpdate) -> Result<(), StoreError> {
    if let Some(Some(objective)) = &update.objective
        && !objective.trim().is_empty()
        && !node.level.allows_objective()
    {
        return Err(StoreError::ObjectiveNotAllowed(node.level));
    }
    if let Some(name) = update.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        node.name = name.to_string();
    }
    if let Some(description) = update.description {
        node.description = non_empty(description);
    }
    if let Some(objective) = update.objective {
        node.objective = non_empty(objective);
    }
    if let Some(notes) = update.notes {
        node.notes = non_empty(notes);
    }
    if let Some(audiences) = update.audiences {
        node.audiences = audiences;
    }
    if let Some(geographies) = update.geographies {
        node.geographies = geographies;
    }
    node.updated_at = Utc::now();
    Ok(())
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
