//! Fusion step 6: the health Laplacian.
//!
//! `Δh(f) = raw_risk(f) − mean(raw_risk of structural neighbors)`, where a
//! file's neighborhood is the union of its imports and importers. A large
//! positive Δh marks a file much riskier than everything it touches — a
//! weak link. Files with no neighbors always get Δh = 0.

use std::collections::{BTreeMap, BTreeSet};

use auspex_graph::DependencyGraph;

use crate::field::SignalField;
use crate::signal::Signal;

#[allow(clippy::cast_precision_loss)]
pub fn apply(field: &mut SignalField, graph: &DependencyGraph) {
    let risks: BTreeMap<&str, f64> = field
        .files
        .iter()
        .map(|(path, signals)| (path.as_str(), signals.raw_risk))
        .collect();

    let mut deltas: Vec<(String, f64)> = Vec::with_capacity(field.files.len());
    for path in field.files.keys() {
        let mut neighbors: BTreeSet<&str> = BTreeSet::new();
        for target in graph.imports_of(path) {
            neighbors.insert(target.as_str());
        }
        for source in graph.importers_of(path) {
            neighbors.insert(source.as_str());
        }
        neighbors.remove(path.as_str());

        let neighbor_risks: Vec<f64> = neighbors
            .iter()
            .filter_map(|n| risks.get(n).copied())
            .collect();
        let delta = if neighbor_risks.is_empty() {
            0.0
        } else {
            let mean = neighbor_risks.iter().sum::<f64>() / neighbor_risks.len() as f64;
            risks[path.as_str()] - mean
        };
        deltas.push((path.clone(), delta));
    }
    for (path, delta) in deltas {
        field.set_raw(&path, Signal::DeltaHealth, delta);
    }
}

// ── Tests ──────────────────────────────────────────────────────────
