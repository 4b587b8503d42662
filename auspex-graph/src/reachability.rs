// Reachability metrics: blast radius (reverse BFS), depth from a root set
// with fallback root selection, orphan flags, and Tarjan cycle detection.
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use petgraph::algo::tarjan_scc;
use tracing::debug;

use crate::{DependencyGraph, NodeRole};

// ── Blast radius ───────────────────────────────────────────────────

/// Reverse-BFS reachable-set size per file, excluding the file itself:
/// how many files transitively depend on this one.
pub fn blast_radius(graph: &DependencyGraph) -> BTreeMap<String, usize> {
    graph
        .nodes()
        .map(|path| {
            let mut visited: BTreeSet<&str> = BTreeSet::new();
            let mut queue: VecDeque<&str> = VecDeque::new();
            queue.push_back(path);
            visited.insert(path);

            while let Some(current) = queue.pop_front() {
                for importer in graph.importers_of(current) {
                    if visited.insert(importer) {
                        queue.push_back(importer);
                    }
                }
            }
            (path.to_string(), visited.len() - 1)
        })
        .collect()
}

// ── Depth from roots ───────────────────────────────────────────────

/// BFS depth of every file from the selected root set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthMap {
    /// Hops from the nearest root; `-1` for unreachable files.
    pub depth: BTreeMap<String, i32>,
    /// The root set that was used.
    pub roots: Vec<String>,
    /// False when no root set could be selected; depth is then 0 for every
    /// file and depth-based findings must be skipped.
    pub defined: bool,
}

/// Select BFS roots, then compute forward-BFS depth from them.
///
/// Root fallback chain, applied in order until non-empty:
/// 1. entry-point files
/// 2. package-index files that are both imported and importing
/// 3. files with zero in-degree and non-zero out-degree
/// 4. none — depth 0 everywhere, `defined = false`
pub fn depth_from_roots(graph: &DependencyGraph) -> DepthMap {
    let roots = select_roots(graph);

    if roots.is_empty() {
        return DepthMap {
            depth: graph.nodes().map(|p| (p.to_string(), 0)).collect(),
            roots,
            defined: false,
        };
    }

    let mut depth: BTreeMap<String, i32> = graph.nodes().map(|p| (p.to_string(), -1)).collect();
    let mut queue: VecDeque<(&str, i32)> = VecDeque::new();

    for root in &roots {
        depth.insert(root.clone(), 0);
        queue.push_back((root, 0));
    }

    while let Some((current, d)) = queue.pop_front() {
        for target in graph.imports_of(current) {
            let entry = depth.get_mut(target.as_str());
            if let Some(existing) = entry {
                if *existing < 0 {
                    *existing = d + 1;
                    queue.push_back((target.as_str(), d + 1));
                }
            }
        }
    }

    debug!(roots = roots.len(), "Depth map computed");
    DepthMap {
        depth,
        roots,
        defined: true,
    }
}

fn select_roots(graph: &DependencyGraph) -> Vec<String> {
    let entry_points: Vec<String> = graph
        .nodes()
        .filter(|p| graph.role(p) == NodeRole::EntryPoint)
        .map(ToString::to_string)
        .collect();
    if !entry_points.is_empty() {
        return entry_points;
    }

    let active_indexes: Vec<String> = graph
        .nodes()
        .filter(|p| {
            graph.role(p) == NodeRole::PackageIndex
                && graph.in_degree(p) > 0
                && graph.out_degree(p) > 0
        })
        .map(ToString::to_string)
        .collect();
    if !active_indexes.is_empty() {
        return active_indexes;
    }

    graph
        .nodes()
        .filter(|p| graph.in_degree(p) == 0 && graph.out_degree(p) > 0)
        .map(ToString::to_string)
        .collect()
}

// ── Orphans ────────────────────────────────────────────────────────

/// Orphan flag per file: nothing imports it and its role is neither
/// entry point nor test.
pub fn orphans(graph: &DependencyGraph) -> BTreeMap<String, bool> {
    graph
        .nodes()
        .map(|path| {
            let orphan = graph.in_degree(path) == 0 && !graph.role(path).exempt_from_orphan();
            (path.to_string(), orphan)
        })
        .collect()
}

// ── Cycles ─────────────────────────────────────────────────────────

/// Strongly-connected components with more than one member, each sorted,
/// ordered by their first member for determinism.
pub fn cycles(graph: &DependencyGraph) -> Vec<Vec<String>> {
    let pg = graph.petgraph();
    let mut components: Vec<Vec<String>> = tarjan_scc(pg)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut members: Vec<String> = scc.into_iter().map(|idx| pg[idx].clone()).collect();
            members.sort();
            members
        })
        .collect();
    components.sort();
    components
}

// ── Tests ──────────────────────────────────────────────────────────
