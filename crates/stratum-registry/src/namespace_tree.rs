//! Namespace Tree - hierarchical storage for provider entries.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: `NamespaceData` (the text and/or native form at that level)
//! - Edges: `Contains(name)` from a package to each child

use std::sync::Arc;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::module::NativeModule;

/// Edge types in the namespace graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceEdge {
    /// Parent namespace contains child namespace.
    /// The String is the child's simple name.
    Contains(String),
}

/// Data stored in each namespace node.
#[derive(Debug, Default, Clone)]
pub struct NamespaceData {
    /// Definition-language source.
    pub text: Option<Arc<str>>,

    /// Symbols bound directly by Rust code.
    pub native: Option<NativeModule>,

    /// Declared as a package even if it has no children yet.
    pub package: bool,
}

impl NamespaceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything was registered at this node.
    pub fn is_defined(&self) -> bool {
        self.text.is_some() || self.native.is_some() || self.package
    }
}

/// The namespace graph.
///
/// Intermediate nodes are created on demand, so registering `a.b.c` makes
/// `a` and `a.b` implicit packages.
pub struct NamespaceTree {
    /// The directed graph storing all namespaces.
    graph: DiGraph<NamespaceData, NamespaceEdge>,

    /// The root node. It has no name and never holds an entry.
    root: NodeIndex,
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NamespaceTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceTree")
            .field("nodes", &self.graph.node_count())
            .finish()
    }
}

impl NamespaceTree {
    /// Create a new namespace tree with an empty root.
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(NamespaceData::new());
        Self { graph, root }
    }

    /// Get the root namespace node index.
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Get a namespace node's data.
    pub fn get_namespace(&self, node: NodeIndex) -> Option<&NamespaceData> {
        self.graph.node_weight(node)
    }

    /// Get a mutable reference to a namespace node's data.
    pub fn get_namespace_mut(&mut self, node: NodeIndex) -> Option<&mut NamespaceData> {
        self.graph.node_weight_mut(node)
    }

    /// Find a child namespace by name.
    fn find_child(&self, parent: NodeIndex, name: &str) -> Option<NodeIndex> {
        self.graph.edges(parent).find_map(|edge| match edge.weight() {
            NamespaceEdge::Contains(child_name) if child_name == name => Some(edge.target()),
            _ => None,
        })
    }

    /// Get or create a child namespace.
    fn get_or_create_child(&mut self, parent: NodeIndex, name: &str) -> NodeIndex {
        if let Some(child) = self.find_child(parent, name) {
            return child;
        }

        let child = self.graph.add_node(NamespaceData::new());
        self.graph
            .add_edge(parent, child, NamespaceEdge::Contains(name.to_string()));
        child
    }

    /// Get or create a namespace path from root.
    pub fn get_or_create_path<S: AsRef<str>>(&mut self, path: &[S]) -> NodeIndex {
        let mut current = self.root;
        for segment in path {
            current = self.get_or_create_child(current, segment.as_ref());
        }
        current
    }

    /// Get an existing namespace by path, or None if it doesn't exist.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeIndex> {
        let mut current = self.root;
        for segment in path {
            current = self.find_child(current, segment.as_ref())?;
        }
        Some(current)
    }

    /// Find the parent namespace of a node.
    fn find_parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|edge| edge.source())
            .next()
    }

    /// Get the simple name of a namespace node.
    fn get_namespace_name(&self, node: NodeIndex) -> Option<&str> {
        if node == self.root {
            return None;
        }
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|edge| match edge.weight() {
                NamespaceEdge::Contains(name) => name.as_str(),
            })
            .next()
    }

    /// Get the full namespace path for a node.
    fn get_namespace_path(&self, node: NodeIndex) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = node;

        while current != self.root {
            if let Some(name) = self.get_namespace_name(current) {
                path.push(name.to_string());
            }
            match self.find_parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        path.reverse();
        path
    }

    /// Whether a node can hold sub-entries: it has children or was declared a
    /// package.
    pub fn is_package(&self, node: NodeIndex) -> bool {
        self.graph.edges(node).next().is_some()
            || self.graph.node_weight(node).is_some_and(|data| data.package)
    }

    /// Whether a node or any descendant holds an entry.
    pub fn is_live(&self, node: NodeIndex) -> bool {
        self.graph
            .node_weight(node)
            .is_some_and(NamespaceData::is_defined)
            || self
                .graph
                .edges(node)
                .any(|edge| self.is_live(edge.target()))
    }

    /// Paths of every defined node, sorted.
    pub fn defined_paths(&self) -> Vec<Vec<String>> {
        let mut paths: Vec<Vec<String>> = self
            .graph
            .node_indices()
            .filter(|&node| node != self.root)
            .filter(|&node| self.graph[node].is_defined())
            .map(|node| self.get_namespace_path(node))
            .collect();
        paths.sort();
        paths
    }
}
