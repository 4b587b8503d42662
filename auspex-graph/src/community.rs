// Community detection: Louvain-style greedy modularity optimization with
// local moves and aggregation, plus the final modularity score.
//
// Graph algorithms intentionally cast int↔float.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless
)]

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::DependencyGraph;

/// Result of community detection: contiguous community ids per file and the
/// modularity of the final partition.
#[derive(Debug, Clone)]
pub struct CommunityPartition {
    pub assignment: BTreeMap<String, u32>,
    pub modularity: f64,
    pub community_count: usize,
}

/// Undirected weighted adjacency used by the Louvain passes. Directed
/// dependency edges are folded into undirected unit-weight edges.
struct UndirectedAdjacency {
    neighbors: Vec<Vec<(usize, f64)>>,
    node_weight: Vec<f64>,
    total_weight: f64,
}

impl UndirectedAdjacency {
    fn from_graph(graph: &DependencyGraph, nodes: &[&str]) -> Self {
        let position: HashMap<&str, usize> =
            nodes.iter().enumerate().map(|(i, &p)| (p, i)).collect();
        let mut neighbors: Vec<Vec<(usize, f64)>> = vec![Vec::new(); nodes.len()];
        let mut total_weight = 0.0;

        for (i, &path) in nodes.iter().enumerate() {
            for target in graph.imports_of(path) {
                let j = position[target.as_str()];
                neighbors[i].push((j, 1.0));
                neighbors[j].push((i, 1.0));
                total_weight += 1.0;
            }
        }

        let node_weight = neighbors
            .iter()
            .map(|ns| ns.iter().map(|&(_, w)| w).sum())
            .collect();

        Self {
            neighbors,
            node_weight,
            total_weight,
        }
    }

    /// Collapse communities into super-nodes for the next Louvain level.
    /// `community` must already hold contiguous ids in `0..k`.
    fn aggregate(&self, community: &[u32], k: usize) -> Self {
        let mut merged: Vec<HashMap<usize, f64>> = vec![HashMap::new(); k];
        let mut node_weight = vec![0.0; k];

        for (node, ns) in self.neighbors.iter().enumerate() {
            let cu = community[node] as usize;
            for &(neighbor, w) in ns {
                let cv = community[neighbor] as usize;
                // Each undirected edge appears twice in `neighbors`; keep the
                // same convention in the aggregate.
                *merged[cu].entry(cv).or_default() += w;
            }
            node_weight[cu] += self.node_weight[node];
        }

        let neighbors = merged
            .into_iter()
            .map(|m| {
                let mut ns: Vec<(usize, f64)> = m.into_iter().collect();
                ns.sort_by_key(|&(j, _)| j);
                ns
            })
            .collect();

        Self {
            neighbors,
            node_weight,
            total_weight: self.total_weight,
        }
    }
}

/// Louvain community detection over the dependency graph.
///
/// Node processing order is sorted before each pass, so the partition is
/// identical across runs. Edge-free graphs put every file in its own
/// community with modularity 0.
pub fn louvain(graph: &DependencyGraph) -> CommunityPartition {
    let nodes: Vec<&str> = graph.nodes().collect();
    let n = nodes.len();
    if n == 0 {
        return CommunityPartition {
            assignment: BTreeMap::new(),
            modularity: 0.0,
            community_count: 0,
        };
    }

    let adjacency = UndirectedAdjacency::from_graph(graph, &nodes);
    if adjacency.total_weight == 0.0 {
        let assignment = nodes
            .iter()
            .enumerate()
            .map(|(i, &p)| (p.to_string(), i as u32))
            .collect();
        return CommunityPartition {
            assignment,
            modularity: 0.0,
            community_count: n,
        };
    }

    // Multi-level Louvain: local moves, then aggregate, until no level improves.
    let mut level = adjacency;
    let mut membership: Vec<u32> = (0..n as u32).collect();
    let max_levels = 10;

    for _ in 0..max_levels {
        let (community, improved) = local_moves(&level);
        if !improved {
            break;
        }

        // Compact this level's community ids to 0..k in first-encounter
        // order, the same id space the aggregate's super-nodes will use.
        let mut remap: HashMap<u32, u32> = HashMap::new();
        let mut compact = vec![0u32; community.len()];
        for (i, &c) in community.iter().enumerate() {
            let next = remap.len() as u32;
            compact[i] = *remap.entry(c).or_insert(next);
        }
        let k = remap.len();

        // Fold into the running per-file membership
        for m in &mut membership {
            *m = compact[*m as usize];
        }

        if k == level.neighbors.len() {
            break;
        }
        level = level.aggregate(&compact, k);
    }

    // Contiguous final ids
    let mut remap: BTreeMap<u32, u32> = BTreeMap::new();
    for m in &mut membership {
        let next = remap.len() as u32;
        *m = *remap.entry(*m).or_insert(next);
    }
    let community_count = remap.len();

    let assignment: BTreeMap<String, u32> = nodes
        .iter()
        .enumerate()
        .map(|(i, &p)| (p.to_string(), membership[i]))
        .collect();

    let modularity = partition_modularity(graph, &assignment);
    debug!(communities = community_count, modularity, "Louvain complete");

    CommunityPartition {
        assignment,
        modularity,
        community_count,
    }
}

/// One Louvain level: greedy local moves until no move improves modularity.
/// Returns the per-node community and whether any node moved.
fn local_moves(adjacency: &UndirectedAdjacency) -> (Vec<u32>, bool) {
    let n = adjacency.neighbors.len();
    let mut community: Vec<u32> = (0..n as u32).collect();
    let mut comm_totals: Vec<f64> = adjacency.node_weight.clone();
    let m2 = 2.0 * adjacency.total_weight;

    let mut any_moved = false;
    let mut improved = true;
    let mut iterations = 0;
    let max_iterations = 20;

    while improved && iterations < max_iterations {
        improved = false;
        iterations += 1;

        // Sorted order per pass keeps runs deterministic
        for node in 0..n {
            let current = community[node];
            let ki = adjacency.node_weight[node];

            let mut weights_to: BTreeMap<u32, f64> = BTreeMap::new();
            for &(neighbor, w) in &adjacency.neighbors[node] {
                if neighbor != node {
                    *weights_to.entry(community[neighbor]).or_default() += w;
                }
            }

            let ki_in_current = weights_to.get(&current).copied().unwrap_or(0.0);
            let sigma_current = comm_totals[current as usize] - ki;

            let mut best_gain = 0.0_f64;
            let mut best_comm = current;

            for (&target, &ki_in_target) in &weights_to {
                if target == current {
                    continue;
                }
                let sigma_target = comm_totals[target as usize];
                let gain = (ki_in_target - ki_in_current) / m2
                    + ki * (sigma_current - sigma_target) / (m2 * m2) * 2.0;
                if gain > best_gain {
                    best_gain = gain;
                    best_comm = target;
                }
            }

            if best_comm != current {
                comm_totals[current as usize] -= ki;
                comm_totals[best_comm as usize] += ki;
                community[node] = best_comm;
                improved = true;
                any_moved = true;
            }
        }
    }

    (community, any_moved)
}

/// Newman modularity of a partition over the undirected fold of the graph.
pub fn partition_modularity(
    graph: &DependencyGraph,
    assignment: &BTreeMap<String, u32>,
) -> f64 {
    let m: f64 = graph.edge_count() as f64;
    if m == 0.0 {
        return 0.0;
    }
    let m2 = 2.0 * m;

    // Undirected degree = in + out
    let degree = |p: &str| (graph.in_degree(p) + graph.out_degree(p)) as f64;

    let mut intra = 0.0_f64;
    let mut degree_sums: BTreeMap<u32, f64> = BTreeMap::new();

    for path in graph.nodes() {
        if let Some(&c) = assignment.get(path) {
            *degree_sums.entry(c).or_default() += degree(path);
        }
        for target in graph.imports_of(path) {
            if assignment.get(path) == assignment.get(target.as_str()) {
                intra += 1.0;
            }
        }
    }

    let expected: f64 = degree_sums.values().map(|&d| (d / m2).powi(2)).sum();
    2.0 * intra / m2 - expected
}

// ── Tests ──────────────────────────────────────────────────────────
