//! Cluster construction from pairwise duplicate relationships.
//!
//! # Overview
//!
//! The similarity oracle produces a map from each image to the images it
//! resembles. That map is directional and may be incomplete: `a -> [b]` can
//! appear without `b -> [a]`, and `a -> [b]`, `b -> [c]` never mentions the
//! pair `(a, c)` even though all three belong together. Treating every
//! reported pair as an undirected edge and taking connected components
//! repairs both: symmetry comes for free, and transitive chains merge into
//! a single cluster.
//!
//! Components with fewer than two members are discarded. Every image in a
//! returned cluster therefore has at least one reported duplicate.
//!
//! All containers are ordered (`BTreeMap`/`BTreeSet`), so clusters come out
//! in a stable order regardless of how the input map was assembled: clusters
//! are sorted by their first member, and members within a cluster are sorted
//! by path.
//!
//! # Example
//!
//! ```
//! use imgdedup::duplicates::build_clusters;
//! use imgdedup::similarity::DuplicateMap;
//! use std::path::PathBuf;
//!
//! let mut map = DuplicateMap::new();
//! map.insert(PathBuf::from("/pics/a.jpg"), vec![PathBuf::from("/pics/b.jpg")]);
//! map.insert(PathBuf::from("/pics/b.jpg"), vec![PathBuf::from("/pics/c.jpg")]);
//! map.insert(PathBuf::from("/pics/d.jpg"), vec![]);
//!
//! let (clusters, stats) = build_clusters(&map);
//!
//! // a-b and b-c chain into one cluster; d has no duplicates.
//! assert_eq!(clusters.len(), 1);
//! assert_eq!(clusters[0].members.len(), 3);
//! assert_eq!(stats.clustered_images, 3);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::similarity::DuplicateMap;

/// A connected set of images considered duplicates of one another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Member paths in canonical (lexicographic) order.
    pub members: Vec<PathBuf>,
}

impl Cluster {
    /// Create a cluster from member paths. Members are sorted on entry.
    #[must_use]
    pub fn new(mut members: Vec<PathBuf>) -> Self {
        members.sort();
        Self { members }
    }

    /// Number of images in this cluster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if this cluster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check if a path belongs to this cluster.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.members.iter().any(|member| member == path)
    }
}

/// Undirected graph over image paths.
///
/// Edges are stored symmetrically in both adjacency lists, so inserting
/// `a -> b` is enough to connect the pair in either direction.
#[derive(Debug, Clone, Default)]
pub struct DuplicateGraph {
    adjacency: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
}

impl DuplicateGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from an oracle duplicate map.
    ///
    /// Every `(key, duplicate)` pair becomes an undirected edge. Keys with
    /// empty duplicate lists contribute no edges and no nodes.
    #[must_use]
    pub fn from_map(map: &DuplicateMap) -> Self {
        let mut graph = Self::new();
        for (path, duplicates) in map {
            for duplicate in duplicates {
                graph.add_edge(path, duplicate);
            }
        }
        graph
    }

    /// Insert an undirected edge between two paths.
    ///
    /// Self-referential pairs are ignored: an image listed as its own
    /// duplicate must not create a node or an edge.
    pub fn add_edge(&mut self, a: &Path, b: &Path) {
        if a == b {
            log::trace!("Ignoring self-referential duplicate entry: {}", a.display());
            return;
        }
        self.adjacency
            .entry(a.to_path_buf())
            .or_default()
            .insert(b.to_path_buf());
        self.adjacency
            .entry(b.to_path_buf())
            .or_default()
            .insert(a.to_path_buf());
    }

    /// Number of images with at least one duplicate relationship.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of distinct undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Neighbors of a path, if it is present in the graph.
    #[must_use]
    pub fn neighbors(&self, path: &Path) -> Option<&BTreeSet<PathBuf>> {
        self.adjacency.get(path)
    }

    /// Connected components via iterative depth-first search.
    ///
    /// Runs in O(V + E). Nodes are visited in sorted path order, so each
    /// component surfaces when its lexicographically smallest member is
    /// reached and the result order is deterministic. Members within a
    /// component are sorted.
    #[must_use]
    pub fn connected_components(&self) -> Vec<Vec<PathBuf>> {
        let mut visited: BTreeSet<&Path> = BTreeSet::new();
        let mut components = Vec::new();

        for start in self.adjacency.keys() {
            if visited.contains(start.as_path()) {
                continue;
            }
            visited.insert(start.as_path());

            let mut component = Vec::new();
            let mut stack: Vec<&PathBuf> = vec![start];
            while let Some(node) = stack.pop() {
                component.push(node.clone());
                if let Some(neighbors) = self.adjacency.get(node) {
                    for neighbor in neighbors {
                        if visited.insert(neighbor.as_path()) {
                            stack.push(neighbor);
                        }
                    }
                }
            }

            component.sort();
            components.push(component);
        }

        components
    }
}

/// Statistics from cluster construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterStats {
    /// Images that appear in at least one duplicate relationship
    pub nodes: usize,
    /// Distinct undirected duplicate pairs
    pub edges: usize,
    /// Clusters of two or more images
    pub clusters: usize,
    /// Total images across all clusters
    pub clustered_images: usize,
}

/// Build duplicate clusters from an oracle duplicate map.
///
/// Symmetrizes the map, takes connected components, and keeps every
/// component with two or more members. The returned clusters partition the
/// clustered images: each image appears in exactly one cluster.
///
/// # Returns
///
/// A tuple of:
/// - `Vec<Cluster>` - Clusters sorted by their first member path
/// - `ClusterStats` - Statistics about the clustering operation
#[must_use]
pub fn build_clusters(map: &DuplicateMap) -> (Vec<Cluster>, ClusterStats) {
    let graph = DuplicateGraph::from_map(map);
    let mut stats = ClusterStats {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        ..ClusterStats::default()
    };

    let mut clusters = Vec::new();
    for component in graph.connected_components() {
        if component.len() < 2 {
            continue;
        }
        stats.clustered_images += component.len();
        clusters.push(Cluster::new(component));
    }
    stats.clusters = clusters.len();

    log::debug!(
        "Clustered {} images into {} groups ({} nodes, {} edges)",
        stats.clustered_images,
        stats.clusters,
        stats.nodes,
        stats.edges
    );

    (clusters, stats)
}
