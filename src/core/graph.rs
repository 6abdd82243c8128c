//! Target graph - name-resolved dependency edges between targets.
//!
//! The package description links targets by name. The graph resolves every
//! name once, when the manifest is loaded; traversal afterwards only deals in
//! [`TargetId`]s.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::manifest::Product;
use crate::core::target::Target;

/// Position of a target in its manifest's target list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(usize);

impl TargetId {
    /// Index into the manifest's target list.
    pub fn index(self) -> usize {
        self.0
    }

    fn node(self) -> NodeIndex {
        NodeIndex::new(self.0)
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node the closure walk can start from or pass through.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Product(&'a Product),
    Target(TargetId),
}

/// Directed graph of target dependencies.
#[derive(Debug, Clone, Default)]
pub struct TargetGraph {
    /// Edge from a target to each target it depends on
    graph: DiGraph<TargetId, ()>,

    /// Map from target name to id
    index: HashMap<String, TargetId>,
}

impl TargetGraph {
    /// Build the graph for a list of targets.
    ///
    /// Returns the name of the first duplicated target on failure.
    pub fn build(targets: &[Target]) -> Result<Self, String> {
        let mut graph = DiGraph::with_capacity(targets.len(), targets.len());
        let mut index = HashMap::with_capacity(targets.len());

        for (i, target) in targets.iter().enumerate() {
            let id = TargetId(i);
            if index.insert(target.name.clone(), id).is_some() {
                return Err(target.name.clone());
            }
            graph.add_node(id);
        }

        for (i, target) in targets.iter().enumerate() {
            let from = TargetId(i).node();
            for dep_name in target.dependency_names() {
                match index.get(dep_name) {
                    Some(to) => {
                        if !graph.contains_edge(from, to.node()) {
                            graph.add_edge(from, to.node(), ());
                        }
                    }
                    None => {
                        tracing::debug!(
                            "target `{}`: dependency `{}` is not a target of this package",
                            target.name,
                            dep_name
                        );
                    }
                }
            }
        }

        Ok(TargetGraph { graph, index })
    }

    /// Look up a target id by name.
    pub fn id(&self, name: &str) -> Option<TargetId> {
        self.index.get(name).copied()
    }

    /// Direct dependencies of a target, in declaration order.
    pub fn dependencies(&self, id: TargetId) -> Vec<TargetId> {
        // petgraph walks outgoing edges newest first.
        let mut deps: Vec<TargetId> = self
            .graph
            .neighbors(id.node())
            .map(|n| self.graph[n])
            .collect();
        deps.reverse();
        deps
    }

    /// Check whether any dependency cycle exists.
    pub fn has_cycles(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Collect every target reachable from `roots`, each at most once, in
    /// depth-first preorder.
    pub fn closure<'a>(&self, roots: impl IntoIterator<Item = Node<'a>>) -> Vec<TargetId> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        for root in roots {
            self.visit(root, &mut visited, &mut order);
        }
        order
    }

    fn visit(&self, node: Node<'_>, visited: &mut HashSet<TargetId>, order: &mut Vec<TargetId>) {
        match node {
            Node::Product(product) => {
                for name in &product.targets {
                    match self.id(name) {
                        Some(id) => self.visit(Node::Target(id), visited, order),
                        None => tracing::debug!(
                            "product `{}`: target `{}` is not declared",
                            product.name,
                            name
                        ),
                    }
                }
            }
            Node::Target(id) => {
                if !visited.insert(id) {
                    return;
                }
                order.push(id);
                for dep in self.dependencies(id) {
                    self.visit(Node::Target(dep), visited, order);
                }
            }
        }
    }
}
