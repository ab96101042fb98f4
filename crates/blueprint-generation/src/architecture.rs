//! Architecture specification built from the canvas
//!
//! This is what the generation service receives: the raw graph plus a
//! few derived summaries (component names, frameworks, counts).

use std::collections::BTreeMap;

use blueprint_canvas::{CanvasEdge, CanvasGraph, CanvasNode, ProjectIdentity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary metadata sent alongside the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureMetadata {
    pub node_count: usize,
    pub edge_count: usize,
    /// Number of nodes of each kind
    pub node_types: BTreeMap<String, usize>,
    pub generated_at: String,
}

/// Specification of the architecture to generate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureSpec {
    pub name: String,
    pub description: String,
    /// Component labels in node order
    pub components: Vec<String>,
    /// Distinct frameworks in first-seen order
    pub frameworks: Vec<String>,
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<CanvasEdge>,
    pub metadata: ArchitectureMetadata,
}

impl ArchitectureSpec {
    /// Build a specification from the current canvas
    pub fn from_canvas(graph: &CanvasGraph, identity: &ProjectIdentity) -> Self {
        Self::from_canvas_at(graph, identity, Utc::now())
    }

    /// Build a specification with an explicit timestamp
    pub fn from_canvas_at(
        graph: &CanvasGraph,
        identity: &ProjectIdentity,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let components = graph
            .nodes
            .iter()
            .map(|n| n.data.label.clone())
            .collect();

        let mut frameworks: Vec<String> = Vec::new();
        for framework in graph.nodes.iter().filter_map(|n| n.data.framework.as_deref()) {
            let framework = framework.trim();
            if !framework.is_empty() && !frameworks.iter().any(|f| f == framework) {
                frameworks.push(framework.to_string());
            }
        }

        let mut node_types = BTreeMap::new();
        for node in &graph.nodes {
            *node_types.entry(node.kind.as_str().to_string()).or_insert(0) += 1;
        }

        Self {
            name: identity.project_name.clone(),
            description: format!(
                "{} with {} components and {} connections",
                identity.project_name,
                graph.nodes.len(),
                graph.edges.len()
            ),
            components,
            frameworks,
            nodes: graph.nodes.clone(),
            edges: graph.edges.clone(),
            metadata: ArchitectureMetadata {
                node_count: graph.nodes.len(),
                edge_count: graph.edges.len(),
                node_types,
                generated_at: generated_at.to_rfc3339(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_canvas::{NodeData, NodeKind, Position};

    fn node(id: &str, kind: NodeKind, framework: Option<&str>) -> CanvasNode {
        let mut data = NodeData::labeled(id.to_uppercase());
        data.framework = framework.map(str::to_string);
        CanvasNode::new(id, kind, Position::default(), data)
    }

    #[test]
    fn test_from_canvas() {
        let mut graph = CanvasGraph::new();
        graph.nodes.push(node("web", NodeKind::Frontend, Some("react")));
        graph.nodes.push(node("api", NodeKind::Backend, Some("axum")));
        graph.nodes.push(node("jobs", NodeKind::Backend, Some("axum")));
        graph.nodes.push(node("db", NodeKind::Database, Some("  ")));
        graph.edges.push(CanvasEdge::new("e1", "web", "api"));

        let identity = ProjectIdentity {
            project_name: "Shop".into(),
            project_id: Some("p-1".into()),
        };
        let at = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let spec = ArchitectureSpec::from_canvas_at(&graph, &identity, at);

        assert_eq!(spec.name, "Shop");
        assert_eq!(spec.components, vec!["WEB", "API", "JOBS", "DB"]);
        assert_eq!(spec.frameworks, vec!["react", "axum"]);
        assert_eq!(spec.metadata.node_count, 4);
        assert_eq!(spec.metadata.edge_count, 1);
        assert_eq!(spec.metadata.node_types["backend"], 2);
        assert_eq!(spec.metadata.generated_at, "2026-01-02T03:04:05+00:00");
    }

    #[test]
    fn test_empty_canvas() {
        let spec = ArchitectureSpec::from_canvas(&CanvasGraph::new(), &ProjectIdentity::default());
        assert!(spec.components.is_empty());
        assert!(spec.frameworks.is_empty());
        assert!(spec.metadata.node_types.is_empty());
    }
}
