//! Sheet hierarchy of a project.
//!
//! Every schematic file is one node, every `(sheet ...)` box that places a
//! file is one edge from the placing sheet to the placed file. A file placed
//! twice therefore has two incoming edges but is loaded only once.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use uuid::Uuid;

use crate::core::EdeaError;
use crate::parser::schema::Schematic;

#[derive(Debug, Clone)]
pub struct SheetNode {
    pub file_name: String,
    pub schematic: Schematic,
}

/// One placement of a sub-sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetEdge {
    pub sheet_uuid: Uuid,
    pub sheet_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct SheetHierarchy {
    graph: DiGraph<SheetNode, SheetEdge>,
    /// file name -> node index
    file_indices: HashMap<String, NodeIndex>,
    root: Option<NodeIndex>,
}

impl SheetHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a loaded schematic file. The first file added is the root.
    pub fn add_sheet(&mut self, file_name: &str, schematic: Schematic) -> NodeIndex {
        let idx = self.graph.add_node(SheetNode {
            file_name: file_name.to_string(),
            schematic,
        });
        self.file_indices.insert(file_name.to_string(), idx);
        self.root.get_or_insert(idx);
        idx
    }

    pub fn add_instance(&mut self, parent: NodeIndex, child: NodeIndex, edge: SheetEdge) -> EdgeIndex {
        self.graph.add_edge(parent, child, edge)
    }

    pub fn index_of(&self, file_name: &str) -> Option<NodeIndex> {
        self.file_indices.get(file_name).copied()
    }

    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&SheetNode> {
        self.graph.node_weight(idx)
    }

    pub fn schematic(&self, file_name: &str) -> Option<&Schematic> {
        self.index_of(file_name)
            .and_then(|idx| self.graph.node_weight(idx))
            .map(|node| &node.schematic)
    }

    /// Number of distinct schematic files.
    pub fn file_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.graph
            .node_weights()
            .map(|node| node.file_name.as_str())
            .collect()
    }

    /// Sub-sheets placed on `idx`, in placement order.
    pub fn children(&self, idx: NodeIndex) -> Vec<(&SheetEdge, NodeIndex)> {
        let mut edges: Vec<_> = self.graph.edges_directed(idx, Direction::Outgoing).collect();
        edges.sort_by_key(|e| e.id());
        edges.into_iter().map(|e| (e.weight(), e.target())).collect()
    }

    /// Fail if a sheet (directly or indirectly) places itself.
    pub fn check_acyclic(&self) -> Result<(), EdeaError> {
        toposort(&self.graph, None).map(|_| ()).map_err(|cycle| {
            let file = self
                .graph
                .node_weight(cycle.node_id())
                .map(|node| node.file_name.clone())
                .unwrap_or_default();
            EdeaError::Hierarchy(format!("Sheet {} is part of a cycle", file))
        })
    }

    /// Depth-first walk over every sheet instance, starting at the root.
    ///
    /// The callback gets the node and the instance path (`/<root>/<sheet>/...`).
    /// Only call this on an acyclic hierarchy.
    pub fn walk_instances<'a>(&'a self, mut visit: impl FnMut(&'a SheetNode, &str)) {
        let Some(root) = self.root else {
            return;
        };
        let Some(root_node) = self.graph.node_weight(root) else {
            return;
        };
        let path = format!("/{}", root_node.schematic.uuid);
        self.walk_from(root, &path, &mut visit);
    }

    fn walk_from<'a>(&'a self, idx: NodeIndex, path: &str, visit: &mut impl FnMut(&'a SheetNode, &str)) {
        let Some(node) = self.graph.node_weight(idx) else {
            return;
        };
        visit(node, path);
        for (edge, child) in self.children(idx) {
            let child_path = format!("{}/{}", path, edge.sheet_uuid);
            self.walk_from(child, &child_path, visit);
        }
    }
}
