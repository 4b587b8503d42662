// Dependency graph construction: import resolution against a path index,
// forward/reverse adjacency, and structural integrity validation.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GraphError, GraphInput, NodeRole, Result};

/// File-level dependency graph over a source tree.
///
/// Invariant: for every edge `a → b` in `adjacency`, `a` appears in
/// `reverse[b]` (and vice versa). [`DependencyGraph::validate`] enforces
/// this; a violation is a builder bug and fatal upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyGraph {
    /// Forward edges: importer → imported in-tree files.
    pub adjacency: BTreeMap<String, Vec<String>>,
    /// Reverse edges: imported → importers.
    pub reverse: BTreeMap<String, Vec<String>>,
    /// Import strings that could not be resolved to an in-tree file,
    /// per importing file. Distinct from external-package imports only in
    /// that the engine cannot tell them apart; both land here.
    pub unresolved: BTreeMap<String, Vec<String>>,
    /// Role classification per file.
    pub roles: BTreeMap<String, NodeRole>,
    #[serde(skip)]
    petgraph: DiGraph<String, ()>,
    #[serde(skip)]
    node_to_index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Build the dependency graph from per-file inputs.
    ///
    /// Each declared import string is resolved against a precomputed path
    /// index; self-imports are dropped, unresolvable imports are recorded in
    /// `unresolved` rather than silently discarded.
    pub fn build(inputs: &[GraphInput]) -> Self {
        let index = PathIndex::new(inputs);

        let mut adjacency: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut reverse: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut unresolved: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut roles: BTreeMap<String, NodeRole> = BTreeMap::new();

        for input in inputs {
            adjacency.entry(input.path.clone()).or_default();
            reverse.entry(input.path.clone()).or_default();
            roles.insert(input.path.clone(), input.role);
        }

        for input in inputs {
            for import in &input.imports {
                match index.resolve(import) {
                    Some(target) if target == input.path => {
                        // Self-import — dropped
                    }
                    Some(target) => {
                        let fwd = adjacency.entry(input.path.clone()).or_default();
                        if !fwd.contains(&target) {
                            fwd.push(target.clone());
                            reverse.entry(target).or_default().push(input.path.clone());
                        }
                    }
                    None => {
                        unresolved
                            .entry(input.path.clone())
                            .or_default()
                            .push(import.clone());
                    }
                }
            }
        }

        // Sorted neighbor lists for deterministic iteration everywhere
        for targets in adjacency.values_mut() {
            targets.sort();
        }
        for sources in reverse.values_mut() {
            sources.sort();
        }

        let (petgraph, node_to_index) = build_petgraph(&adjacency);

        debug!(
            nodes = adjacency.len(),
            edges = adjacency.values().map(Vec::len).sum::<usize>(),
            unresolved = unresolved.values().map(Vec::len).sum::<usize>(),
            "Dependency graph built"
        );

        Self {
            adjacency,
            reverse,
            unresolved,
            roles,
            petgraph,
            node_to_index,
        }
    }

    /// Check adjacency/reverse mutual consistency.
    ///
    /// Returns [`GraphError::Integrity`] on any edge without a matching
    /// mirror entry, or any edge endpoint that is not a known node.
    pub fn validate(&self) -> Result<()> {
        for (source, targets) in &self.adjacency {
            for target in targets {
                let Some(back) = self.reverse.get(target) else {
                    return Err(GraphError::Integrity(format!(
                        "edge {source} -> {target} has no reverse entry for {target}"
                    )));
                };
                if !back.contains(source) {
                    return Err(GraphError::Integrity(format!(
                        "edge {source} -> {target} missing from reverse[{target}]"
                    )));
                }
                if !self.adjacency.contains_key(target) {
                    return Err(GraphError::Integrity(format!(
                        "edge target {target} is not a graph node"
                    )));
                }
            }
        }
        for (target, sources) in &self.reverse {
            for source in sources {
                let forward = self
                    .adjacency
                    .get(source)
                    .is_some_and(|t| t.contains(target));
                if !forward {
                    return Err(GraphError::Integrity(format!(
                        "reverse entry {target} <- {source} has no forward edge"
                    )));
                }
            }
        }
        Ok(())
    }

    /// All node paths in sorted order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.adjacency.keys().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.adjacency.contains_key(path)
    }

    /// Files imported by `path` (forward neighbors), sorted.
    pub fn imports_of(&self, path: &str) -> &[String] {
        self.adjacency.get(path).map_or(&[], Vec::as_slice)
    }

    /// Files importing `path` (reverse neighbors), sorted.
    pub fn importers_of(&self, path: &str) -> &[String] {
        self.reverse.get(path).map_or(&[], Vec::as_slice)
    }

    pub fn in_degree(&self, path: &str) -> usize {
        self.importers_of(path).len()
    }

    pub fn out_degree(&self, path: &str) -> usize {
        self.imports_of(path).len()
    }

    pub fn role(&self, path: &str) -> NodeRole {
        self.roles.get(path).copied().unwrap_or_default()
    }

    /// Count of unresolved import strings for `path`.
    pub fn unresolved_count(&self, path: &str) -> usize {
        self.unresolved.get(path).map_or(0, Vec::len)
    }

    /// The petgraph mirror of this graph, for algorithms that want it.
    pub fn petgraph(&self) -> &DiGraph<String, ()> {
        &self.petgraph
    }

    pub fn node_index(&self, path: &str) -> Option<NodeIndex> {
        self.node_to_index.get(path).copied()
    }
}

fn build_petgraph(
    adjacency: &BTreeMap<String, Vec<String>>,
) -> (DiGraph<String, ()>, HashMap<String, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut node_to_index = HashMap::new();

    // BTreeMap iteration gives sorted insertion order, so NodeIndex
    // assignment is deterministic across runs.
    for path in adjacency.keys() {
        let idx = graph.add_node(path.clone());
        node_to_index.insert(path.clone(), idx);
    }
    for (source, targets) in adjacency {
        let src = node_to_index[source];
        for target in targets {
            if let Some(&tgt) = node_to_index.get(target) {
                graph.add_edge(src, tgt, ());
            }
        }
    }
    (graph, node_to_index)
}

// ── Path index ─────────────────────────────────────────────────────

/// Precomputed lookup from import-string candidates to in-tree paths.
///
/// A candidate key maps to a path only while it stays unambiguous; a key
/// claimed by two files is evicted, so resolution never guesses.
struct PathIndex {
    exact: HashMap<String, String>,
    candidates: HashMap<String, Option<String>>,
}

impl PathIndex {
    fn new(inputs: &[GraphInput]) -> Self {
        let mut exact = HashMap::new();
        let mut candidates: HashMap<String, Option<String>> = HashMap::new();

        let mut insert = |key: String, path: &str| {
            candidates
                .entry(key)
                .and_modify(|slot| {
                    if slot.as_deref() != Some(path) {
                        *slot = None; // ambiguous — evict
                    }
                })
                .or_insert_with(|| Some(path.to_string()));
        };

        for input in inputs {
            let path = input.path.as_str();
            exact.insert(path.to_string(), path.to_string());

            let stem = strip_extension(path);
            insert(stem.to_string(), path);
            insert(stem.replace('/', "."), path);

            if let Some(base) = stem.rsplit('/').next() {
                if base != stem {
                    insert(base.to_string(), path);
                }
            }
        }

        Self { exact, candidates }
    }

    fn resolve(&self, import: &str) -> Option<String> {
        if let Some(path) = self.exact.get(import) {
            return Some(path.clone());
        }
        // Normalize relative prefixes and dotted module syntax
        let trimmed = import
            .trim_start_matches("./")
            .trim_start_matches("../")
            .trim_start_matches('.');
        self.candidates
            .get(trimmed)
            .or_else(|| self.candidates.get(&trimmed.replace('.', "/")))
            .and_then(Clone::clone)
    }
}

fn strip_extension(path: &str) -> &str {
    match path.rfind('.') {
        Some(dot) if path.rfind('/').is_none_or(|slash| dot > slash) => &path[..dot],
        _ => path,
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn input(path: &str, imports: &[&str]) -> GraphInput {
        GraphInput::new(
            path,
            imports.iter().map(ToString::to_string).collect(),
            NodeRole::Regular,
        )
    }

    #[test]
    fn resolves_exact_and_stem_imports() {
        let graph = DependencyGraph::build(&[
            input("src/auth/session.rs", &["src/auth/token.rs"]),
            input("src/auth/token.rs", &[]),
            input("src/main.rs", &["src/auth/session"]),
        ]);

        assert_eq!(
            graph.imports_of("src/auth/session.rs"),
            &["src/auth/token.rs".to_string()]
        );
        assert_eq!(
            graph.imports_of("src/main.rs"),
            &["src/auth/session.rs".to_string()]
        );
        assert_eq!(
            graph.importers_of("src/auth/session.rs"),
            &["src/main.rs".to_string()]
        );
        assert!(graph.unresolved.is_empty());
    }

    #[test]
    fn resolves_dotted_module_imports() {
        let graph = DependencyGraph::build(&[
            input("pkg/auth/session.py", &["pkg.auth.token"]),
            input("pkg/auth/token.py", &[]),
        ]);
        assert_eq!(
            graph.imports_of("pkg/auth/session.py"),
            &["pkg/auth/token.py".to_string()]
        );
    }

    #[test]
    fn records_unresolved_imports() {
        let graph = DependencyGraph::build(&[input("src/main.rs", &["serde", "tokio"])]);
        assert_eq!(graph.unresolved_count("src/main.rs"), 2);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn drops_self_imports() {
        let graph = DependencyGraph::build(&[input("src/a.rs", &["src/a.rs", "src/a"])]);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.unresolved_count("src/a.rs"), 0);
    }

    #[test]
    fn ambiguous_basename_is_not_guessed() {
        let graph = DependencyGraph::build(&[
            input("src/a/util.rs", &[]),
            input("src/b/util.rs", &[]),
            input("src/main.rs", &["util"]),
        ]);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.unresolved_count("src/main.rs"), 1);
    }

    #[test]
    fn unique_basename_resolves() {
        let graph = DependencyGraph::build(&[
            input("src/deep/nested/helper.rs", &[]),
            input("src/main.rs", &["helper"]),
        ]);
        assert_eq!(
            graph.imports_of("src/main.rs"),
            &["src/deep/nested/helper.rs".to_string()]
        );
    }

    #[test]
    fn duplicate_imports_deduplicated() {
        let graph = DependencyGraph::build(&[
            input("src/a.rs", &["src/b.rs", "src/b", "src/b.rs"]),
            input("src/b.rs", &[]),
        ]);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.importers_of("src/b.rs").len(), 1);
    }

    #[test]
    fn validate_passes_on_built_graph() {
        let graph = DependencyGraph::build(&[
            input("src/a.rs", &["src/b.rs"]),
            input("src/b.rs", &["src/c.rs"]),
            input("src/c.rs", &[]),
        ]);
        graph.validate().unwrap();
    }

    #[test]
    fn validate_catches_missing_reverse_entry() {
        let mut graph = DependencyGraph::build(&[
            input("src/a.rs", &["src/b.rs"]),
            input("src/b.rs", &[]),
        ]);
        graph.reverse.get_mut("src/b.rs").unwrap().clear();

        let err = graph.validate().unwrap_err();
        assert!(matches!(err, GraphError::Integrity(_)));
    }

    #[test]
    fn validate_catches_dangling_reverse_entry() {
        let mut graph = DependencyGraph::build(&[input("src/a.rs", &[]), input("src/b.rs", &[])]);
        graph
            .reverse
            .get_mut("src/b.rs")
            .unwrap()
            .push("src/a.rs".to_string());

        let err = graph.validate().unwrap_err();
        assert!(matches!(err, GraphError::Integrity(_)));
    }

    #[test]
    fn petgraph_mirror_matches() {
        let graph = DependencyGraph::build(&[
            input("src/a.rs", &["src/b.rs"]),
            input("src/b.rs", &["src/c.rs"]),
            input("src/c.rs", &[]),
        ]);
        assert_eq!(graph.petgraph().node_count(), 3);
        assert_eq!(graph.petgraph().edge_count(), 2);
        assert!(graph.node_index("src/a.rs").is_some());
        assert!(graph.node_index("missing.rs").is_none());
    }
}
