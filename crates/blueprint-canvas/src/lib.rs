//! Blueprint Canvas - editable architecture graphs with undo/redo
//!
//! This crate owns the state of the diagram editor:
//!
//! - Nodes (architecture components) and the edges between them
//! - Validation of new connections (no self-loops, no parallel edges)
//! - Incremental change sets from the canvas UI, classified as
//!   significant (add/remove) or cosmetic (position/selection)
//! - A bounded, linear undo/redo timeline of compressed snapshots
//! - Persistence of the editor snapshot to a key-value backend
//!
//! # Example
//!
//! ```ignore
//! use blueprint_canvas::{CanvasNode, Connection, GraphStore, NodeData, NodeKind, Position};
//!
//! let mut canvas = GraphStore::new()?;
//! canvas.add_node(CanvasNode::new("web", NodeKind::Frontend, Position::default(), NodeData::labeled("Web")));
//! canvas.add_node(CanvasNode::new("api", NodeKind::Backend, Position::new(200.0, 0.0), NodeData::labeled("API")));
//! canvas.connect(Connection::new("web", "api"));
//! canvas.undo()?;
//! ```

pub mod changes;
pub mod constants;
pub mod error;
pub mod history;
pub mod persistence;
pub mod store;
pub mod types;
pub mod validation;

// Re-export key types
pub use changes::{ChangeSummary, EdgeChange, NodeChange};
pub use error::{CanvasError, Result};
pub use history::HistoryTimeline;
pub use persistence::{EditorSnapshot, FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use store::GraphStore;
pub use types::{
    CanvasEdge, CanvasGraph, CanvasNode, Connection, EdgeId, NodeData, NodeId, NodeKind, Position,
    ProjectIdentity,
};
pub use validation::{validate_connection, ConnectionRejection};
