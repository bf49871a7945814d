use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::error::CatalogError;

/// General-purpose immutable directed graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectedGraph<T: Eq + Hash> {
    adjacency: HashMap<T, HashSet<T>>,
}

impl<T: Eq + Hash + Clone> DirectedGraph<T> {
    /// Builds a graph from the given nodes and edges.
    ///
    /// Fails if any edge endpoint is not one of the given nodes.
    pub fn new(
        nodes: impl IntoIterator<Item = T>,
        edges: impl IntoIterator<Item = (T, T)>,
    ) -> Result<DirectedGraph<T>, CatalogError> {
        let mut adjacency: HashMap<T, HashSet<T>> =
            nodes.into_iter().map(|node| (node, HashSet::new())).collect();

        for (from_node, to_node) in edges {
            if !adjacency.contains_key(&to_node) {
                return Err(CatalogError::EdgeOutsideGraph);
            }
            match adjacency.get_mut(&from_node) {
                Some(neighbors) => {
                    neighbors.insert(to_node);
                }
                None => return Err(CatalogError::EdgeOutsideGraph),
            }
        }

        Ok(DirectedGraph { adjacency })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.adjacency.keys()
    }

    pub fn contains_node(&self, node: &T) -> bool {
        self.adjacency.contains_key(node)
    }

    pub fn edges(&self) -> impl Iterator<Item = (&T, &T)> {
        self.adjacency
            .iter()
            .flat_map(|(from_node, neighbors)| neighbors.iter().map(move |to| (from_node, to)))
    }

    /// All neighbors of the given node (including the node itself if a
    /// self-cycle exists). Fails if the node is not in the graph.
    pub fn neighbors(&self, node: &T) -> Result<&HashSet<T>, CatalogError> {
        self.adjacency.get(node).ok_or(CatalogError::NodeNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors() {
        let graph =
            DirectedGraph::new(["a", "b", "c"], [("a", "b"), ("a", "c"), ("b", "c")]).unwrap();
        assert_eq!(
            graph.neighbors(&"a").unwrap(),
            &HashSet::from(["b", "c"])
        );
        assert_eq!(graph.neighbors(&"c").unwrap(), &HashSet::new());
    }

    #[test]
    fn test_self_cycle() {
        let graph = DirectedGraph::new(["a"], [("a", "a")]).unwrap();
        assert!(graph.neighbors(&"a").unwrap().contains(&"a"));
    }

    #[test]
    fn test_rejects_unknown_endpoints() {
        assert!(DirectedGraph::new(["a"], [("a", "b")]).is_err());
        assert!(DirectedGraph::new(["b"], [("a", "b")]).is_err());
    }

    #[test]
    fn test_edges() {
        let graph = DirectedGraph::new(["a", "b"], [("a", "b")]).unwrap();
        let edges: Vec<_> = graph.edges().collect();
        assert_eq!(edges, vec![(&"a", &"b")]);
    }
}
