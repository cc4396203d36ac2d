//! Dependency ordering library for multi-project solution graphs.
//!
//! This crate provides a directed dependency graph keyed by caller-supplied
//! node keys (project identifiers, package names, ...). It is built for one
//! job: producing a total, deterministic order over a set of projects such
//! that every project appears after everything it depends on.
//!
//! # Features
//!
//! - Nodes keyed directly by your own key type
//! - Dependent → dependency edges with duplicate and self-edge filtering
//! - Deterministic dependency ordering using Kahn's algorithm
//! - Cycle enumeration for diagnostics
//! - Optional serde serialization for diagnostics export
//!
//! # Example
//!
//! ```
//! use solution_graph::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node("app");
//! graph.add_node("core");
//! graph.add_node("util");
//!
//! // app depends on core, core depends on util
//! graph.depend_on(&"app", &"core").unwrap();
//! graph.depend_on(&"core", &"util").unwrap();
//!
//! let order = graph.dependency_order().unwrap();
//! assert_eq!(order, vec!["util", "core", "app"]);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(unused_results)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Display;
use std::hash::Hash;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Error types for graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// An edge endpoint was not registered as a node.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// The graph contains a dependency cycle.
    #[error("dependency cycle detected: {0}")]
    CycleDetected(String),
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// A node and its edges, stored by index into the node arena.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
struct Node<K> {
    key: K,
    // Indices of nodes this node depends on.
    depends_on: Vec<usize>,
    // Indices of nodes that depend on this node.
    dependents: Vec<usize>,
}

/// Directed dependency graph over caller-supplied keys.
///
/// Nodes keep their insertion order, which makes every traversal in this
/// crate deterministic: two graphs built from the same sequence of calls
/// produce identical orderings.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DependencyGraph<K> {
    nodes: Vec<Node<K>>,
    index: HashMap<K, usize>,
    edge_count: usize,
}

impl<K> Default for DependencyGraph<K>
where
    K: Clone + Eq + Hash + Display,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> DependencyGraph<K>
where
    K: Clone + Eq + Hash + Display,
{
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            edge_count: 0,
        }
    }

    /// Create a new empty graph with room for `capacity` nodes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            edge_count: 0,
        }
    }

    /// Add a node to the graph.
    ///
    /// Returns `true` if the node was inserted, `false` if the key was
    /// already present (the existing node and its edges are kept).
    pub fn add_node(&mut self, key: K) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        let slot = self.nodes.len();
        self.nodes.push(Node {
            key: key.clone(),
            depends_on: Vec::new(),
            dependents: Vec::new(),
        });
        let _ = self.index.insert(key, slot);
        true
    }

    /// Record that `dependent` depends on `dependency`.
    ///
    /// In [`dependency_order`](Self::dependency_order), `dependency` will be
    /// placed before `dependent`. Duplicate edges are ignored, and an edge
    /// from a node to itself is a no-op: a self-reference carries no
    /// ordering information.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if either key has not been added.
    pub fn depend_on(&mut self, dependent: &K, dependency: &K) -> GraphResult<()> {
        let from = self.slot_of(dependent)?;
        let to = self.slot_of(dependency)?;
        if from == to {
            return Ok(());
        }
        if self.nodes[from].depends_on.contains(&to) {
            return Ok(());
        }
        self.nodes[from].depends_on.push(to);
        self.nodes[to].dependents.push(from);
        self.edge_count += 1;
        Ok(())
    }

    /// Check whether a key is present in the graph.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Iterate over all node keys in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &K> {
        self.nodes.iter().map(|node| &node.key)
    }

    /// Direct dependencies of a node, in the order their edges were added.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if the key has not been added.
    pub fn dependencies_of(&self, key: &K) -> GraphResult<Vec<&K>> {
        let slot = self.slot_of(key)?;
        Ok(self.nodes[slot]
            .depends_on
            .iter()
            .map(|&dep| &self.nodes[dep].key)
            .collect())
    }

    /// Direct dependents of a node, in the order their edges were added.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownNode`] if the key has not been added.
    pub fn dependents_of(&self, key: &K) -> GraphResult<Vec<&K>> {
        let slot = self.slot_of(key)?;
        Ok(self.nodes[slot]
            .dependents
            .iter()
            .map(|&dep| &self.nodes[dep].key)
            .collect())
    }

    /// Compute a dependency order over all nodes using Kahn's algorithm.
    ///
    /// The result is a total order in which every node appears after all of
    /// its dependencies. Ties are broken by insertion order, so the result
    /// is stable: nodes without edges keep their insertion order, and the
    /// same graph always yields the same sequence.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CycleDetected`] if the graph contains a cycle;
    /// the message names one cycle path.
    pub fn dependency_order(&self) -> GraphResult<Vec<K>> {
        let mut remaining: Vec<usize> = self.nodes.iter().map(|n| n.depends_on.len()).collect();

        let mut queue: VecDeque<usize> = (0..self.nodes.len())
            .filter(|&slot| remaining[slot] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(slot) = queue.pop_front() {
            order.push(self.nodes[slot].key.clone());

            for &dependent in &self.nodes[slot].dependents {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        if order.len() == self.nodes.len() {
            Ok(order)
        } else {
            let path = self
                .find_cycles()
                .into_iter()
                .next()
                .map_or_else(|| "<unresolved>".to_string(), |cycle| format_cycle(&cycle));
            Err(GraphError::CycleDetected(path))
        }
    }

    /// Find all dependency cycles in the graph.
    ///
    /// Each cycle is reported as the sequence of keys along its path,
    /// starting at the first node of the cycle encountered by the search.
    /// An acyclic graph yields an empty vector.
    #[must_use]
    pub fn find_cycles(&self) -> Vec<Vec<K>> {
        let mut cycles = Vec::new();
        let mut visited = HashSet::new();
        let mut on_stack = HashSet::new();
        let mut path = Vec::new();

        for slot in 0..self.nodes.len() {
            if !visited.contains(&slot) {
                self.cycle_dfs(slot, &mut visited, &mut on_stack, &mut path, &mut cycles);
            }
        }

        cycles
    }

    fn cycle_dfs(
        &self,
        slot: usize,
        visited: &mut HashSet<usize>,
        on_stack: &mut HashSet<usize>,
        path: &mut Vec<usize>,
        cycles: &mut Vec<Vec<K>>,
    ) {
        let _ = visited.insert(slot);
        let _ = on_stack.insert(slot);
        path.push(slot);

        for &dep in &self.nodes[slot].depends_on {
            if !visited.contains(&dep) {
                self.cycle_dfs(dep, visited, on_stack, path, cycles);
            } else if on_stack.contains(&dep) {
                if let Some(start) = path.iter().position(|&s| s == dep) {
                    cycles.push(
                        path[start..]
                            .iter()
                            .map(|&s| self.nodes[s].key.clone())
                            .collect(),
                    );
                }
            }
        }

        let _ = path.pop();
        let _ = on_stack.remove(&slot);
    }

    fn slot_of(&self, key: &K) -> GraphResult<usize> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(key.to_string()))
    }
}

/// Render a cycle as `a -> b -> a` for error messages.
fn format_cycle<K: Display>(cycle: &[K]) -> String {
    let mut rendered: Vec<String> = cycle.iter().map(ToString::to_string).collect();
    if let Some(first) = rendered.first().cloned() {
        rendered.push(first);
    }
    rendered.join(" -> ")
}
