//! Undo/redo timeline using compressed snapshots
//!
//! Each entry is an immutable, zstd-compressed copy of the canvas graph.
//! The timeline is linear: pushing after an undo discards the redo branch.
//!
//! The pointer is `None` only while the timeline is empty. After every push
//! it points at the newest entry, so evicting from the front on the same
//! push never leaves it dangling.

use std::collections::VecDeque;

use crate::constants::history::{COMPRESSION_LEVEL, MAX_HISTORY};
use crate::error::{CanvasError, Result};
use crate::types::CanvasGraph;

/// Bounded linear undo/redo timeline
#[derive(Debug, Clone)]
pub struct HistoryTimeline {
    /// Compressed graph states (zstd), oldest first
    entries: VecDeque<Vec<u8>>,
    /// Current position in the timeline
    index: Option<usize>,
    /// Maximum number of entries to keep
    max_history: usize,
}

impl HistoryTimeline {
    /// Create an empty timeline with the specified capacity
    pub fn new(max_history: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            index: None,
            max_history: max_history.max(1),
        }
    }

    /// Create a timeline holding a single genesis entry
    pub fn seeded(graph: &CanvasGraph, max_history: usize) -> Result<Self> {
        let mut timeline = Self::new(max_history);
        timeline.push(graph)?;
        Ok(timeline)
    }

    /// Push a new snapshot
    ///
    /// Truncates any redo entries, appends, then evicts the oldest entries
    /// until the timeline fits its capacity.
    pub fn push(&mut self, graph: &CanvasGraph) -> Result<()> {
        let compressed = compress(graph)?;

        let keep = self.index.map_or(0, |i| i + 1);
        self.entries.truncate(keep);

        self.entries.push_back(compressed);
        while self.entries.len() > self.max_history {
            self.entries.pop_front();
        }
        self.index = Some(self.entries.len() - 1);

        Ok(())
    }

    /// Undo: move back one entry
    ///
    /// Returns the graph to restore, or None at the oldest entry. The
    /// pointer only moves once the entry has been decoded.
    pub fn undo(&mut self) -> Option<Result<CanvasGraph>> {
        match self.index {
            Some(i) if i > 0 => {
                let graph = self.decompress(i - 1);
                if graph.is_ok() {
                    self.index = Some(i - 1);
                }
                Some(graph)
            }
            _ => None,
        }
    }

    /// Redo: move forward one entry
    ///
    /// Returns the graph to restore, or None at the newest entry. The
    /// pointer only moves once the entry has been decoded.
    pub fn redo(&mut self) -> Option<Result<CanvasGraph>> {
        let next = self.index.map_or(0, |i| i + 1);
        if next < self.entries.len() {
            let graph = self.decompress(next);
            if graph.is_ok() {
                self.index = Some(next);
            }
            Some(graph)
        } else {
            None
        }
    }

    /// Get the graph at the current position without moving
    pub fn current(&self) -> Option<Result<CanvasGraph>> {
        self.index.map(|i| self.decompress(i))
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.index, Some(i) if i > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.index.map_or(0, |i| i + 1) < self.entries.len()
    }

    /// Current position, `None` when empty
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Change the capacity, evicting the oldest entries if needed
    ///
    /// The pointer keeps referring to the same snapshot. If that snapshot
    /// was evicted, it moves to the oldest surviving entry.
    pub fn set_max_history(&mut self, max_history: usize) {
        self.max_history = max_history.max(1);
        let evicted = self.entries.len().saturating_sub(self.max_history);
        if evicted == 0 {
            return;
        }
        self.entries.drain(..evicted);
        self.index = self.index.map(|i| i.saturating_sub(evicted));
    }

    #[cfg(test)]
    pub(crate) fn corrupt_entry(&mut self, index: usize) {
        self.entries[index] = vec![0xde, 0xad, 0xbe, 0xef];
    }

    /// Drop every entry and seed a single genesis entry
    pub fn reset(&mut self, genesis: &CanvasGraph) -> Result<()> {
        self.entries.clear();
        self.index = None;
        self.push(genesis)
    }

    /// Get the total compressed size of all entries
    pub fn compressed_size(&self) -> usize {
        self.entries.iter().map(|s| s.len()).sum()
    }

    /// Decompress the entry at the given index
    pub fn entry(&self, index: usize) -> Result<CanvasGraph> {
        self.decompress(index)
    }

    fn decompress(&self, index: usize) -> Result<CanvasGraph> {
        let compressed = self
            .entries
            .get(index)
            .ok_or(CanvasError::HistoryOutOfRange {
                index,
                len: self.entries.len(),
            })?;
        let json = zstd::decode_all(&compressed[..])
            .map_err(|e| CanvasError::Compression(e.to_string()))?;
        Ok(serde_json::from_slice(&json)?)
    }
}

impl Default for HistoryTimeline {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

fn compress(graph: &CanvasGraph) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(graph)?;
    zstd::encode_all(&json[..], COMPRESSION_LEVEL)
        .map_err(|e| CanvasError::Compression(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CanvasNode, NodeData, NodeKind, Position};

    fn make_graph(label: &str) -> CanvasGraph {
        let mut graph = CanvasGraph::new();
        graph.nodes.push(CanvasNode::new(
            "node1",
            NodeKind::Generic,
            Position::default(),
            NodeData::labeled(label),
        ));
        graph
    }

    fn label(graph: &CanvasGraph) -> &str {
        &graph.nodes[0].data.label
    }

    #[test]
    fn test_empty_timeline() {
        let mut timeline = HistoryTimeline::new(10);
        assert_eq!(timeline.index(), None);
        assert!(!timeline.can_undo());
        assert!(!timeline.can_redo());
        assert!(timeline.undo().is_none());
        assert!(timeline.redo().is_none());
        assert!(timeline.current().is_none());
    }

    #[test]
    fn test_push_and_undo() {
        let mut timeline = HistoryTimeline::new(10);
        timeline.push(&make_graph("first")).unwrap();
        timeline.push(&make_graph("second")).unwrap();
        timeline.push(&make_graph("third")).unwrap();

        assert_eq!(timeline.index(), Some(2));
        assert_eq!(label(&timeline.current().unwrap().unwrap()), "third");

        let undone = timeline.undo().unwrap().unwrap();
        assert_eq!(label(&undone), "second");
        let undone = timeline.undo().unwrap().unwrap();
        assert_eq!(label(&undone), "first");

        assert!(timeline.undo().is_none());
        assert_eq!(timeline.index(), Some(0));
    }

    #[test]
    fn test_redo() {
        let mut timeline = HistoryTimeline::new(10);
        timeline.push(&make_graph("first")).unwrap();
        timeline.push(&make_graph("second")).unwrap();

        timeline.undo();
        let redone = timeline.redo().unwrap().unwrap();
        assert_eq!(label(&redone), "second");
        assert!(timeline.redo().is_none());
    }

    #[test]
    fn test_push_truncates_redo() {
        let mut timeline = HistoryTimeline::new(10);
        timeline.push(&make_graph("first")).unwrap();
        timeline.push(&make_graph("second")).unwrap();
        timeline.push(&make_graph("third")).unwrap();
        timeline.undo();
        timeline.undo();

        timeline.push(&make_graph("fourth")).unwrap();

        assert!(!timeline.can_redo());
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.index(), Some(1));
        assert_eq!(label(&timeline.entry(0).unwrap()), "first");
        assert_eq!(label(&timeline.current().unwrap().unwrap()), "fourth");
    }

    #[test]
    fn test_eviction_keeps_pointer_on_tail() {
        let mut timeline = HistoryTimeline::new(3);
        for i in 0..7 {
            timeline.push(&make_graph(&format!("graph_{}", i))).unwrap();
            assert!(timeline.len() <= 3);
            assert_eq!(timeline.index(), Some(timeline.len() - 1));
        }

        assert_eq!(label(&timeline.entry(0).unwrap()), "graph_4");
        assert_eq!(label(&timeline.current().unwrap().unwrap()), "graph_6");

        timeline.undo();
        timeline.undo();
        assert!(!timeline.can_undo());
    }

    #[test]
    fn test_eviction_after_undo() {
        let mut timeline = HistoryTimeline::new(3);
        for i in 0..3 {
            timeline.push(&make_graph(&format!("graph_{}", i))).unwrap();
        }
        timeline.undo();
        timeline.push(&make_graph("branch")).unwrap();

        // Redo entry dropped first, so nothing needs evicting
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline.index(), Some(2));
        assert_eq!(label(&timeline.entry(0).unwrap()), "graph_0");
    }

    #[test]
    fn test_shrink_capacity_evicts_multiple() {
        let mut timeline = HistoryTimeline::new(10);
        for i in 0..6 {
            timeline.push(&make_graph(&format!("graph_{}", i))).unwrap();
        }
        timeline.undo();
        timeline.undo();
        assert_eq!(timeline.index(), Some(3));

        timeline.set_max_history(4);
        assert_eq!(timeline.len(), 4);
        assert_eq!(timeline.index(), Some(1));
        assert_eq!(label(&timeline.current().unwrap().unwrap()), "graph_3");

        timeline.set_max_history(1);
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.index(), Some(0));
        assert_eq!(label(&timeline.current().unwrap().unwrap()), "graph_5");
    }

    #[test]
    fn test_reset_seeds_genesis() {
        let mut timeline = HistoryTimeline::new(10);
        timeline.push(&make_graph("first")).unwrap();
        timeline.push(&make_graph("second")).unwrap();

        timeline.reset(&CanvasGraph::new()).unwrap();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.index(), Some(0));
        assert!(!timeline.can_undo());
        assert!(timeline.current().unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_entries_are_independent_of_source() {
        let mut timeline = HistoryTimeline::new(10);
        let mut graph = make_graph("original");
        timeline.push(&graph).unwrap();

        graph.nodes[0].data.label = "mutated".to_string();
        assert_eq!(label(&timeline.current().unwrap().unwrap()), "original");
    }

    #[test]
    fn test_undecodable_entry_does_not_move_pointer() {
        let mut timeline = HistoryTimeline::new(10);
        timeline.push(&make_graph("first")).unwrap();
        timeline.push(&make_graph("second")).unwrap();
        timeline.push(&make_graph("third")).unwrap();

        timeline.corrupt_entry(1);
        assert!(timeline.undo().unwrap().is_err());
        assert_eq!(timeline.index(), Some(2));

        timeline.index = Some(0);
        assert!(timeline.redo().unwrap().is_err());
        assert_eq!(timeline.index(), Some(0));
    }
}
