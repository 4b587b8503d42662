// Global structural statistics: centrality Gini and the spectral gap of
// the normalized adjacency.
//
// Statistical computations intentionally cast int→float.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use crate::DependencyGraph;

// ── Gini coefficient ───────────────────────────────────────────────

/// Gini coefficient over a value vector (typically the pagerank scores):
/// `G = (2·Σ(i·x_i)) / (n·Σx_i) − (n+1)/n`, 1-indexed over ascending values.
///
/// Returns 0 for one or fewer values and for an all-zero vector.
pub fn gini(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len() as f64;
    let total: f64 = sorted.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| (i as f64 + 1.0) * x)
        .sum();

    (2.0 * weighted) / (n * total) - (n + 1.0) / n
}

// ── Spectral gap ───────────────────────────────────────────────────

/// Spectral gap λ1 − λ2 of the degree-normalized undirected adjacency,
/// estimated by power iteration with one deflation step.
///
/// A small gap indicates a graph close to splitting into disconnected
/// pieces. Returns 0 for graphs with fewer than 3 nodes or no edges.
pub fn spectral_gap(graph: &DependencyGraph) -> f64 {
    let nodes: Vec<&str> = graph.nodes().collect();
    let n = nodes.len();
    if n < 3 || graph.edge_count() == 0 {
        return 0.0;
    }

    let position: std::collections::HashMap<&str, usize> =
        nodes.iter().enumerate().map(|(i, &p)| (p, i)).collect();

    // Undirected neighbor lists and degrees
    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, &path) in nodes.iter().enumerate() {
        for target in graph.imports_of(path) {
            let j = position[target.as_str()];
            neighbors[i].push(j);
            neighbors[j].push(i);
        }
    }
    let degree: Vec<f64> = neighbors.iter().map(|ns| ns.len() as f64).collect();

    // Normalized adjacency: A_norm[i][j] = 1 / sqrt(d_i · d_j)
    let apply = |v: &[f64]| -> Vec<f64> {
        let mut out = vec![0.0; n];
        for (i, ns) in neighbors.iter().enumerate() {
            if degree[i] == 0.0 {
                continue;
            }
            for &j in ns {
                if degree[j] > 0.0 {
                    out[i] += v[j] / (degree[i] * degree[j]).sqrt();
                }
            }
        }
        out
    };

    let (lambda1, v1) = power_iterate(&apply, n, None);
    let (lambda2, _) = power_iterate(&apply, n, Some(&v1));

    (lambda1 - lambda2).max(0.0)
}

/// Power iteration for the dominant eigenpair, optionally deflating against
/// a previously found eigenvector.
fn power_iterate(
    apply: &dyn Fn(&[f64]) -> Vec<f64>,
    n: usize,
    deflate: Option<&[f64]>,
) -> (f64, Vec<f64>) {
    // Deterministic non-uniform start so the iterate is not orthogonal to
    // the dominant eigenvector by accident.
    let mut v: Vec<f64> = (0..n).map(|i| 1.0 + (i as f64 % 7.0) * 0.1).collect();
    orthogonalize(&mut v, deflate);
    normalize(&mut v);

    let mut lambda = 0.0;
    for _ in 0..200 {
        let mut next = apply(&v);
        orthogonalize(&mut next, deflate);

        let norm = l2_norm(&next);
        if norm < 1e-12 {
            return (0.0, next);
        }
        for x in &mut next {
            *x /= norm;
        }

        let new_lambda: f64 = {
            let av = apply(&next);
            next.iter().zip(av.iter()).map(|(a, b)| a * b).sum()
        };
        let done = (new_lambda - lambda).abs() < 1e-10;
        lambda = new_lambda;
        v = next;
        if done {
            break;
        }
    }
    (lambda, v)
}

fn orthogonalize(v: &mut [f64], against: Option<&[f64]>) {
    if let Some(u) = against {
        let dot: f64 = v.iter().zip(u.iter()).map(|(a, b)| a * b).sum();
        for (x, &ux) in v.iter_mut().zip(u.iter()) {
            *x -= dot * ux;
        }
    }
}

fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn normalize(v: &mut [f64]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────
