// Centrality: deterministic PageRank power iteration and Brandes
// betweenness on the directed dependency graph.
//
// Graph algorithms intentionally cast int↔float (precision loss acceptable
// for metrics).
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless
)]

use std::collections::BTreeMap;
use std::collections::VecDeque;

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::DependencyGraph;

/// Tuning knobs for the iterative centrality algorithms.
#[derive(Debug, Clone)]
pub struct CentralityConfig {
    /// `PageRank` damping factor.
    pub damping: f64,
    /// L1-delta convergence bound for `PageRank`.
    pub epsilon: f64,
    /// Iteration cap for `PageRank`.
    pub max_iterations: u32,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            epsilon: 1e-8,
            max_iterations: 100,
        }
    }
}

// ── PageRank ───────────────────────────────────────────────────────

/// Damped power-iteration `PageRank` over the forward import graph.
///
/// Node order is the graph's sorted node list, so results are identical
/// across runs regardless of map iteration order. Dangling-node mass is
/// redistributed uniformly each pass; the returned scores sum to 1 for any
/// non-empty graph.
pub fn pagerank(graph: &DependencyGraph, config: &CentralityConfig) -> BTreeMap<String, f64> {
    let nodes: Vec<&str> = graph.nodes().collect();
    let n = nodes.len();
    if n == 0 {
        return BTreeMap::new();
    }

    let uniform = 1.0 / n as f64;
    let mut rank: Vec<f64> = vec![uniform; n];
    let position: BTreeMap<&str, usize> =
        nodes.iter().enumerate().map(|(i, &p)| (p, i)).collect();

    let mut iterations = 0u32;
    for iter in 0..config.max_iterations {
        iterations = iter + 1;
        let mut next = vec![(1.0 - config.damping) * uniform; n];

        // Dangling mass: nodes with no outgoing edges spread rank uniformly
        let dangling_mass: f64 = nodes
            .iter()
            .enumerate()
            .filter(|(_, p)| graph.out_degree(p) == 0)
            .map(|(i, _)| rank[i])
            .sum();
        let dangling_share = config.damping * dangling_mass * uniform;

        for (i, &path) in nodes.iter().enumerate() {
            let targets = graph.imports_of(path);
            if targets.is_empty() {
                continue;
            }
            let share = config.damping * rank[i] / targets.len() as f64;
            for target in targets {
                next[position[target.as_str()]] += share;
            }
        }
        for value in &mut next {
            *value += dangling_share;
        }

        let delta: f64 = next
            .iter()
            .zip(rank.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        rank = next;
        if delta < config.epsilon {
            break;
        }
    }

    debug!(nodes = n, iterations, "PageRank converged");

    nodes
        .iter()
        .enumerate()
        .map(|(i, &p)| (p.to_string(), rank[i]))
        .collect()
}

// ── Betweenness (Brandes) ──────────────────────────────────────────

/// Brandes' betweenness centrality, treating the dependency graph as
/// directed. Scores are normalized to [0, 1] by the maximum.
pub fn betweenness(graph: &DependencyGraph) -> BTreeMap<String, f64> {
    let pg = graph.petgraph();
    let n = pg.node_count();
    if n == 0 {
        return BTreeMap::new();
    }

    let mut cb = vec![0.0_f64; n];
    let sources: Vec<NodeIndex> = pg.node_indices().collect();

    for &s in &sources {
        let s_idx = s.index();

        let mut stack: Vec<NodeIndex> = Vec::new();
        let mut predecessors: Vec<Vec<NodeIndex>> = vec![vec![]; n];
        let mut sigma = vec![0.0_f64; n];
        sigma[s_idx] = 1.0;
        let mut dist: Vec<i64> = vec![-1; n];
        dist[s_idx] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            let v_idx = v.index();

            for neighbor in pg.neighbors(v) {
                let w_idx = neighbor.index();

                if dist[w_idx] < 0 {
                    dist[w_idx] = dist[v_idx] + 1;
                    queue.push_back(neighbor);
                }
                if dist[w_idx] == dist[v_idx] + 1 {
                    sigma[w_idx] += sigma[v_idx];
                    predecessors[w_idx].push(v);
                }
            }
        }

        // Back-propagation of dependencies
        let mut delta = vec![0.0_f64; n];
        while let Some(w) = stack.pop() {
            let w_idx = w.index();
            for &v in &predecessors[w_idx] {
                let v_idx = v.index();
                let ratio = sigma[v_idx] / sigma[w_idx];
                delta[v_idx] += ratio * (1.0 + delta[w_idx]);
            }
            if w != s {
                cb[w_idx] += delta[w_idx];
            }
        }
    }

    let max_cb = cb.iter().copied().fold(0.0_f64, f64::max);
    pg.node_indices()
        .map(|idx| {
            let score = if max_cb > 0.0 {
                cb[idx.index()] / max_cb
            } else {
                0.0
            };
            (pg[idx].clone(), score)
        })
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphInput, NodeRole};

    fn input(path: &str, imports: &[&str]) -> GraphInput {
        GraphInput::new(
            path,
            imports.iter().map(ToString::to_string).collect(),
            NodeRole::Regular,
        )
    }

    fn chain() -> DependencyGraph {
        DependencyGraph::build(&[
            input("a.rs", &["b.rs"]),
            input("b.rs", &["c.rs"]),
            input("c.rs", &[]),
        ])
    }

    #[test]
    fn pagerank_sums_to_one() {
        let graph = chain();
        let scores = pagerank(&graph, &CentralityConfig::default());
        let total: f64 = scores.values().sum();
        assert!((total - 1.0).abs() < 1e-6, "sum was {total}");
    }

    #[test]
    fn pagerank_sums_to_one_with_dangling_nodes() {
        // b and c are dangling (no outgoing edges)
        let graph = DependencyGraph::build(&[
            input("a.rs", &["b.rs", "c.rs"]),
            input("b.rs", &[]),
            input("c.rs", &[]),
        ]);
        let scores = pagerank(&graph, &CentralityConfig::default());
        let total: f64 = scores.values().sum();
        assert!((total - 1.0).abs() < 1e-6, "sum was {total}");
    }

    #[test]
    fn pagerank_favors_imported_files() {
        // hub.rs is imported by everyone
        let graph = DependencyGraph::build(&[
            input("hub.rs", &[]),
            input("x.rs", &["hub.rs"]),
            input("y.rs", &["hub.rs"]),
            input("z.rs", &["hub.rs"]),
        ]);
        let scores = pagerank(&graph, &CentralityConfig::default());
        assert!(scores["hub.rs"] > scores["x.rs"]);
        assert!(scores["hub.rs"] > scores["z.rs"]);
    }

    #[test]
    fn pagerank_empty_graph() {
        let graph = DependencyGraph::build(&[]);
        assert!(pagerank(&graph, &CentralityConfig::default()).is_empty());
    }

    #[test]
    fn pagerank_is_deterministic() {
        let graph = DependencyGraph::build(&[
            input("a.rs", &["b.rs", "c.rs"]),
            input("b.rs", &["c.rs", "d.rs"]),
            input("c.rs", &["d.rs"]),
            input("d.rs", &["a.rs"]),
        ]);
        let config = CentralityConfig::default();
        let first = pagerank(&graph, &config);
        for _ in 0..5 {
            assert_eq!(first, pagerank(&graph, &config));
        }
    }

    #[test]
    fn betweenness_bridge_scores_highest() {
        // a → b → c: b is on the only a→c shortest path
        let graph = chain();
        let scores = betweenness(&graph);
        assert!(scores["b.rs"] > scores["a.rs"]);
        assert!(scores["b.rs"] > scores["c.rs"]);
        assert!((scores["b.rs"] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn betweenness_zero_for_edgeless_graph() {
        let graph = DependencyGraph::build(&[input("a.rs", &[]), input("b.rs", &[])]);
        let scores = betweenness(&graph);
        assert!(scores.values().all(|&v| v == 0.0));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn pagerank_conservation(edges in proptest::collection::vec((0usize..12, 0usize..12), 0..40)) {
                let mut inputs: Vec<GraphInput> = (0..12)
                    .map(|i| input(&format!("f{i}.rs"), &[]))
                    .collect();
                for (from, to) in edges {
                    if from != to {
                        let target = format!("f{to}.rs");
                        inputs[from].imports.push(target);
                    }
                }
                let graph = DependencyGraph::build(&inputs);
                let scores = pagerank(&graph, &CentralityConfig::default());
                let total: f64 = scores.values().sum();
                prop_assert!((total - 1.0).abs() < 1e-6);
                prop_assert!(scores.values().all(|&v| (0.0..=1.0).contains(&v)));
            }
        }
    }
}
