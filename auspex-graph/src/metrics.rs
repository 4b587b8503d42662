// One-shot assembly of every graph measurement into `GraphMetrics`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::centrality::{self, CentralityConfig};
use crate::clones::{CloneConfig, ClonePair, CloneSource, detect_clones};
use crate::community::louvain;
use crate::reachability::{blast_radius, cycles, depth_from_roots, orphans};
use crate::stats::{gini, spectral_gap};
use crate::{DependencyGraph, Result};

/// Tuning knobs for [`analyze`].
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub centrality: CentralityConfig,
    pub clones: CloneConfig,
}

/// The complete graph signal surface, computed once per run from a
/// validated [`DependencyGraph`] and never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphMetrics {
    // Per-file maps
    pub pagerank: BTreeMap<String, f64>,
    pub betweenness: BTreeMap<String, f64>,
    pub in_degree: BTreeMap<String, usize>,
    pub out_degree: BTreeMap<String, usize>,
    pub blast_radius: BTreeMap<String, usize>,
    /// BFS hops from the root set; `-1` for unreachable files.
    pub depth: BTreeMap<String, i32>,
    /// False when no root set could be selected; depth-based findings must
    /// then be skipped.
    pub depth_defined: bool,
    pub community: BTreeMap<String, u32>,
    pub is_orphan: BTreeMap<String, bool>,
    pub unresolved_imports: BTreeMap<String, usize>,

    // Global scalars
    pub modularity: f64,
    pub community_count: usize,
    pub spectral_gap: f64,
    pub centrality_gini: f64,
    pub cycles: Vec<Vec<String>>,
    pub clone_pairs: Vec<ClonePair>,
}

impl GraphMetrics {
    pub fn cycle_count(&self) -> usize {
        self.cycles.len()
    }

    /// Paths participating in any multi-member cycle.
    pub fn files_in_cycles(&self) -> impl Iterator<Item = &str> {
        self.cycles.iter().flatten().map(String::as_str)
    }
}

/// Run every graph algorithm over a validated graph.
///
/// `clone_sources` carries file content only for the clone-detection stage;
/// pass an empty slice to skip clone analysis (content is not retained).
pub fn analyze(
    graph: &DependencyGraph,
    clone_sources: &[CloneSource],
    options: &AnalyzeOptions,
) -> Result<GraphMetrics> {
    graph.validate()?;

    let pagerank = centrality::pagerank(graph, &options.centrality);
    let betweenness = centrality::betweenness(graph);
    let blast = blast_radius(graph);
    let depth_map = depth_from_roots(graph);
    let partition = louvain(graph);
    let orphan_flags = orphans(graph);
    let cycle_list = cycles(graph);

    let pagerank_values: Vec<f64> = pagerank.values().copied().collect();
    let centrality_gini = gini(&pagerank_values);
    let gap = spectral_gap(graph);

    let clone_pairs = if clone_sources.is_empty() {
        Vec::new()
    } else {
        detect_clones(clone_sources, &options.clones)
    };

    let in_degree = graph
        .nodes()
        .map(|p| (p.to_string(), graph.in_degree(p)))
        .collect();
    let out_degree = graph
        .nodes()
        .map(|p| (p.to_string(), graph.out_degree(p)))
        .collect();
    let unresolved_imports = graph
        .nodes()
        .map(|p| (p.to_string(), graph.unresolved_count(p)))
        .collect();

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        communities = partition.community_count,
        cycles = cycle_list.len(),
        clones = clone_pairs.len(),
        "Graph analysis complete"
    );

    Ok(GraphMetrics {
        pagerank,
        betweenness,
        in_degree,
        out_degree,
        blast_radius: blast,
        depth: depth_map.depth,
        depth_defined: depth_map.defined,
        community: partition.assignment,
        is_orphan: orphan_flags,
        unresolved_imports,
        modularity: partition.modularity,
        community_count: partition.community_count,
        spectral_gap: gap,
        centrality_gini,
        cycles: cycle_list,
        clone_pairs,
    })
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphError, GraphInput, NodeRole};

    fn input(path: &str, imports: &[&str], role: NodeRole) -> GraphInput {
        GraphInput::new(
            path,
            imports.iter().map(ToString::to_string).collect(),
            role,
        )
    }

    fn sample_graph() -> DependencyGraph {
        DependencyGraph::build(&[
            input("main.rs", &["core.rs", "util.rs"], NodeRole::EntryPoint),
            input("core.rs", &["util.rs"], NodeRole::Regular),
            input("util.rs", &[], NodeRole::Regular),
            input("stale.rs", &["missing_pkg"], NodeRole::Regular),
        ])
    }

    #[test]
    fn analyze_produces_all_maps() {
        let graph = sample_graph();
        let metrics = analyze(&graph, &[], &AnalyzeOptions::default()).unwrap();

        for map_len in [
            metrics.pagerank.len(),
            metrics.betweenness.len(),
            metrics.in_degree.len(),
            metrics.out_degree.len(),
            metrics.blast_radius.len(),
            metrics.depth.len(),
            metrics.community.len(),
            metrics.is_orphan.len(),
            metrics.unresolved_imports.len(),
        ] {
            assert_eq!(map_len, 4);
        }

        assert!(metrics.depth_defined);
        assert_eq!(metrics.unresolved_imports["stale.rs"], 1);
        assert_eq!(metrics.unresolved_imports["main.rs"], 0);
        let total: f64 = metrics.pagerank.values().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn analyze_rejects_corrupted_graph() {
        let mut graph = sample_graph();
        graph.reverse.get_mut("util.rs").unwrap().clear();
        let err = analyze(&graph, &[], &AnalyzeOptions::default()).unwrap_err();
        assert!(matches!(err, GraphError::Integrity(_)));
    }

    #[test]
    fn analyze_empty_tree() {
        let graph = DependencyGraph::build(&[]);
        let metrics = analyze(&graph, &[], &AnalyzeOptions::default()).unwrap();
        assert!(metrics.pagerank.is_empty());
        assert_eq!(metrics.centrality_gini, 0.0);
        assert_eq!(metrics.cycle_count(), 0);
    }

    #[test]
    fn clone_stage_runs_when_sources_given() {
        let graph = DependencyGraph::build(&[
            input("a.rs", &[], NodeRole::Regular),
            input("b.rs", &[], NodeRole::Regular),
        ]);
        let body = "fn run(x: u32) -> u32 { x + 1 }\n".repeat(20);
        let sources = vec![
            CloneSource {
                path: "a.rs".to_string(),
                content: body.clone(),
                role: NodeRole::Regular,
            },
            CloneSource {
                path: "b.rs".to_string(),
                content: body,
                role: NodeRole::Regular,
            },
        ];
        let metrics = analyze(&graph, &sources, &AnalyzeOptions::default()).unwrap();
        assert_eq!(metrics.clone_pairs.len(), 1);
    }

    #[test]
    fn files_in_cycles_lists_members() {
        let graph = DependencyGraph::build(&[
            input("a.rs", &["b.rs"], NodeRole::Regular),
            input("b.rs", &["a.rs"], NodeRole::Regular),
            input("c.rs", &[], NodeRole::Regular),
        ]);
        let metrics = analyze(&graph, &[], &AnalyzeOptions::default()).unwrap();
        let members: Vec<&str> = metrics.files_in_cycles().collect();
        assert_eq!(members, vec!["a.rs", "b.rs"]);
    }
}
