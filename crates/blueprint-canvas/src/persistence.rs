//! Editor snapshot persistence.
//!
//! The store writes the live canvas after every significant mutation and
//! reads it back once when a session starts. Backends are plain key-value
//! stores keyed by a snapshot name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{CanvasError, Result};
use crate::types::{CanvasEdge, CanvasGraph, CanvasNode, ProjectIdentity};

/// Default key the editor snapshot is stored under.
pub const DEFAULT_SNAPSHOT_KEY: &str = "blueprint-canvas";

/// Persisted editor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<CanvasEdge>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl EditorSnapshot {
    /// Capture a graph and its project identity.
    pub fn capture(graph: &CanvasGraph, identity: &ProjectIdentity) -> Self {
        Self {
            nodes: graph.nodes.clone(),
            edges: graph.edges.clone(),
            project_name: Some(identity.project_name.clone()),
            project_id: identity.project_id.clone(),
        }
    }

    /// Split into graph and identity, filling defaults for missing fields.
    pub fn into_parts(self) -> (CanvasGraph, ProjectIdentity) {
        let mut identity = ProjectIdentity::default();
        if let Some(name) = self.project_name {
            identity.project_name = name;
        }
        identity.project_id = self.project_id;
        (
            CanvasGraph {
                nodes: self.nodes,
                edges: self.edges,
            },
            identity,
        )
    }
}

/// Key-value storage for editor snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Read the snapshot, `None` if nothing has been saved yet.
    fn load(&self) -> Result<Option<EditorSnapshot>>;

    /// Write the snapshot, replacing any previous value.
    fn save(&self, snapshot: &EditorSnapshot) -> Result<()>;
}

/// In-memory snapshot store.
#[derive(Debug)]
pub struct MemorySnapshotStore {
    values: Mutex<HashMap<String, String>>,
    key: String,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::with_key(DEFAULT_SNAPSHOT_KEY)
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            key: key.into(),
        }
    }

    /// Raw JSON stored under this store's key.
    pub fn raw(&self) -> Option<String> {
        self.values.lock().ok()?.get(&self.key).cloned()
    }
}

impl Default for MemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<EditorSnapshot>> {
        let values = self
            .values
            .lock()
            .map_err(|_| CanvasError::persistence("snapshot store lock poisoned"))?;
        match values.get(&self.key) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &EditorSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        self.values
            .lock()
            .map_err(|_| CanvasError::persistence("snapshot store lock poisoned"))?
            .insert(self.key.clone(), json);
        Ok(())
    }
}

/// Snapshot store backed by a JSON file per key.
///
/// # Example
///
/// ```ignore
/// use blueprint_canvas::{FileSnapshotStore, GraphStore};
///
/// let store = FileSnapshotStore::new(".blueprint");
/// let canvas = GraphStore::restore(Box::new(store))?;
/// ```
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
    key: String,
}

impl FileSnapshotStore {
    /// Create a store that persists to the given directory.
    ///
    /// The directory will be created if it doesn't exist when saving.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::with_key(dir, DEFAULT_SNAPSHOT_KEY)
    }

    pub fn with_key(dir: impl AsRef<Path>, key: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            key: key.into(),
        }
    }

    /// Path of the snapshot file.
    pub fn file_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<EditorSnapshot>> {
        let path = self.file_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let snapshot = serde_json::from_str(&content)?;
        log::info!("Loaded editor snapshot from {:?}", path);
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &EditorSnapshot) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.file_path();
        // Write then rename so a crash never leaves a truncated snapshot
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(snapshot)?)?;
        std::fs::rename(&tmp, &path)?;
        log::debug!("Saved editor snapshot to {:?}", path);
        Ok(())
    }
}
