//! Core types for architecture canvases
//!
//! These types define the structure of the editable graph: component nodes,
//! the edges between them, and the project identity the canvas belongs to.

use serde::{Deserialize, Serialize};

use crate::constants::defaults;

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// The kind of architecture component a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Client-facing application
    Frontend,
    /// Server-side service
    Backend,
    /// Data store
    Database,
    /// Anything else
    #[default]
    Generic,
}

impl NodeKind {
    /// Stable lowercase name, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::Database => "database",
            Self::Generic => "generic",
        }
    }
}

/// Position on the canvas (x, y)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Display and generation payload of a node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Human-readable label, also used as the component name when generating
    pub label: String,
    /// Palette component this node was created from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Framework the component should be generated with (e.g., "axum", "react")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
}

impl NodeData {
    /// Create node data with just a label
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Set the framework
    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }
}

/// A component node on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasNode {
    /// Unique identifier for this node
    pub id: NodeId,
    /// Kind of component
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    pub position: Position,
    pub data: NodeData,
    /// UI selection state
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
}

impl CanvasNode {
    /// Create a node with the given ID
    pub fn new(id: impl Into<String>, kind: NodeKind, position: Position, data: NodeData) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            data,
            selected: false,
        }
    }

    /// Create a node with a freshly generated ID
    pub fn generate(kind: NodeKind, position: Position, data: NodeData) -> Self {
        Self::new(
            format!("{}-{}", kind.as_str(), uuid::Uuid::new_v4()),
            kind,
            position,
            data,
        )
    }
}

/// A proposed connection between two nodes, before it becomes an edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Check whether this connection joins the same unordered pair as `source`/`target`
    pub fn same_pair(&self, source: &str, target: &str) -> bool {
        (self.source == source && self.target == target)
            || (self.source == target && self.target == source)
    }
}

/// An edge connecting two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Target node ID
    pub target: NodeId,
    #[serde(default)]
    pub animated: bool,
    /// UI selection state
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
}

impl CanvasEdge {
    /// Create an edge with the given ID
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            animated: false,
            selected: false,
        }
    }

    /// Build the edge for an accepted connection
    ///
    /// Connections drawn by the user are animated.
    pub fn from_connection(connection: &Connection) -> Self {
        Self {
            id: format!(
                "edge-{}-{}-{}",
                connection.source,
                connection.target,
                uuid::Uuid::new_v4().simple()
            ),
            source: connection.source.clone(),
            target: connection.target.clone(),
            animated: true,
            selected: false,
        }
    }

    /// The connection this edge realizes
    pub fn connection(&self) -> Connection {
        Connection::new(self.source.clone(), self.target.clone())
    }

    /// Check whether this edge touches the given node
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// The node and edge collections of a canvas
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasGraph {
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<CanvasEdge>,
}

impl CanvasGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&CanvasNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a node by ID (mutable)
    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut CanvasNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Find an edge by ID (mutable)
    pub fn find_edge_mut(&mut self, id: &str) -> Option<&mut CanvasEdge> {
        self.edges.iter_mut().find(|e| e.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Get edges touching a node, in either direction
    pub fn incident_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a CanvasEdge> + 'a {
        self.edges.iter().filter(move |e| e.touches(node_id))
    }

    /// Remove a node and every edge touching it
    ///
    /// Returns the removed node, if it existed.
    pub fn remove_node_cascade(&mut self, node_id: &str) -> Option<CanvasNode> {
        let pos = self.nodes.iter().position(|n| n.id == node_id)?;
        let removed = self.nodes.remove(pos);
        self.edges.retain(|e| !e.touches(node_id));
        Some(removed)
    }
}

/// Name and remote ID of the project a canvas belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectIdentity {
    pub project_name: String,
    /// Remote project ID, absent until the project is saved remotely
    pub project_id: Option<String>,
}

impl Default for ProjectIdentity {
    fn default() -> Self {
        Self {
            project_name: defaults::PROJECT_NAME.to_string(),
            project_id: None,
        }
    }
}
