// src/haste/graph.rs

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

/// File dependency graph. An edge `a -> b` means "`a` imports `b`".
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<PathBuf, ()>,
    nodes: HashMap<PathBuf, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, path: &Path) -> NodeIndex {
        if let Some(idx) = self.nodes.get(path) {
            return *idx;
        }
        let idx = self.graph.add_node(path.to_path_buf());
        self.nodes.insert(path.to_path_buf(), idx);
        idx
    }

    pub fn add_file(&mut self, path: &Path) {
        self.node(path);
    }

    pub fn add_dependency(&mut self, from: &Path, to: &Path) {
        let a = self.node(from);
        let b = self.node(to);
        if !self.graph.contains_edge(a, b) {
            self.graph.add_edge(a, b, ());
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.nodes.contains_key(path)
    }

    /// Direct dependencies of `path`, sorted.
    pub fn dependencies_of(&self, path: &Path) -> Vec<PathBuf> {
        self.neighbors(path, Direction::Outgoing)
    }

    /// Files that directly import `path`, sorted.
    pub fn dependents_of(&self, path: &Path) -> Vec<PathBuf> {
        self.neighbors(path, Direction::Incoming)
    }

    fn neighbors(&self, path: &Path, dir: Direction) -> Vec<PathBuf> {
        let Some(idx) = self.nodes.get(path) else {
            return Vec::new();
        };
        let set: BTreeSet<PathBuf> = self
            .graph
            .neighbors_directed(*idx, dir)
            .map(|n| self.graph[n].clone())
            .collect();
        set.into_iter().collect()
    }

    /// Every file that transitively depends on one of `seeds` (the seeds
    /// included), filtered by `keep`.
    ///
    /// Seeds unknown to the graph are ignored. Cycles are tolerated: each
    /// node is visited at most once. The result is sorted.
    pub fn inverse_closure(&self, seeds: &[PathBuf], keep: &dyn Fn(&Path) -> bool) -> Vec<PathBuf> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();

        for seed in seeds {
            if let Some(idx) = self.nodes.get(seed) {
                if visited.insert(*idx) {
                    queue.push_back(*idx);
                }
            }
        }

        let mut matched = BTreeSet::new();
        while let Some(idx) = queue.pop_front() {
            let path = &self.graph[idx];
            if keep(path) {
                matched.insert(path.clone());
            }
            for dependent in self.graph.neighbors_directed(idx, Direction::Incoming) {
                if visited.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }

        matched.into_iter().collect()
    }
}
