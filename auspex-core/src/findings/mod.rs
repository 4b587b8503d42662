//! The finding engine.
//!
//! A fixed catalog of declarative patterns is evaluated uniformly against
//! the signal field: tier gating, the hotspot filter, grouping, and ranking
//! all live here, so individual patterns only express their condition and
//! evidence.

mod catalog;
pub mod confidence;

pub use catalog::catalog;

use tracing::{debug, info};

use auspex_graph::DependencyGraph;

use crate::config::AuspexConfig;
use crate::field::{SignalField, Tier};
use crate::signal::Signal;
use crate::slot::{ArchSignals, Blackboard, TemporalSignals};
use crate::types::{Evidence, Finding, FindingKind, FindingScope};

// ── Pattern model ──────────────────────────────────────────────────

/// One candidate detection before grouping. Patterns emit candidates; the
/// engine turns them into findings.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub targets: Vec<String>,
    pub confidence: f64,
    pub evidence: Vec<Evidence>,
    pub suggestion: String,
}

/// A declarative detection pattern. Everything but `eval` is static data,
/// so the engine can gate and filter without running the predicate.
pub struct Pattern {
    pub kind: FindingKind,
    pub scope: FindingScope,
    pub severity: f64,
    pub tier_minimum: Tier,
    pub hotspot_filtered: bool,
    pub eval: fn(&EvalContext<'_>) -> Vec<Candidate>,
}

impl std::fmt::Debug for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pattern")
            .field("kind", &self.kind)
            .field("scope", &self.scope)
            .field("severity", &self.severity)
            .field("tier_minimum", &self.tier_minimum)
            .field("hotspot_filtered", &self.hotspot_filtered)
            .finish_non_exhaustive()
    }
}

/// Read-only view handed to every pattern. Unavailable slots are `None`;
/// patterns skip rather than substitute defaults.
#[derive(Debug)]
pub struct EvalContext<'a> {
    pub field: &'a SignalField,
    pub config: &'a AuspexConfig,
    pub graph: Option<&'a DependencyGraph>,
    pub metrics: Option<&'a auspex_graph::GraphMetrics>,
    pub temporal: Option<&'a TemporalSignals>,
    pub architecture: Option<&'a ArchSignals>,
    /// Median `total_changes` over non-test files; `None` when history is
    /// unavailable or the filter is disabled.
    pub hotspot_median: Option<f64>,
}

impl EvalContext<'_> {
    /// Evidence entry for one file signal, carrying the percentile when one
    /// exists.
    pub fn evidence(&self, path: &str, signal: Signal) -> Evidence {
        Evidence {
            signal,
            value: self.field.raw(path, signal).unwrap_or(0.0),
            percentile: self.field.percentile(path, signal),
        }
    }

    /// True when the candidate file clears the hotspot median (or no median
    /// is computable, in which case the filter cannot apply).
    fn clears_hotspot(&self, path: &str) -> bool {
        let Some(median) = self.hotspot_median else {
            return true;
        };
        self.field
            .raw(path, Signal::TotalChanges)
            .is_some_and(|changes| changes > median)
    }
}

// ── Engine ─────────────────────────────────────────────────────────

/// Evaluate the whole catalog and return ranked findings.
pub fn evaluate(
    field: &SignalField,
    board: &Blackboard,
    config: &AuspexConfig,
) -> Vec<Finding> {
    let hotspot_median = if config.findings.hotspot_filter {
        hotspot_median(field)
    } else {
        None
    };
    let ctx = EvalContext {
        field,
        config,
        graph: board.graph.get(),
        metrics: board.graph_metrics.get(),
        temporal: board.temporal.get(),
        architecture: board.architecture.get(),
        hotspot_median,
    };

    let mut findings = Vec::new();
    for pattern in catalog() {
        if field.tier < pattern.tier_minimum {
            debug!(kind = ?pattern.kind, tier = ?field.tier, "pattern below tier floor");
            continue;
        }
        let mut candidates = (pattern.eval)(&ctx);
        candidates.retain(|c| c.confidence > 0.0);
        if pattern.hotspot_filtered {
            candidates.retain(|c| c.targets.iter().all(|t| ctx.clears_hotspot(t)));
        }
        findings.extend(group(&pattern, candidates, config.findings.group_cap));
    }

    findings.sort_by(|a, b| {
        b.rank()
            .total_cmp(&a.rank())
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.targets.cmp(&b.targets))
    });
    info!(findings = findings.len(), "finding evaluation complete");
    findings
}

/// Median `total_changes` over non-test files.
fn hotspot_median(field: &SignalField) -> Option<f64> {
    let mut changes: Vec<f64> = field
        .files
        .values()
        .filter(|f| !f.role.is_test())
        .filter_map(|f| f.raw.get(&Signal::TotalChanges).copied())
        .collect();
    if changes.is_empty() {
        return None;
    }
    changes.sort_by(f64::total_cmp);
    let mid = changes.len() / 2;
    Some(if changes.len() % 2 == 1 {
        changes[mid]
    } else {
        (changes[mid - 1] + changes[mid]) / 2.0
    })
}

/// Cap same-kind findings at `cap` per kind. Candidates arrive ungrouped;
/// the strongest become standalone findings and any overflow is folded into
/// the last one's target list, so the count never exceeds the cap but no
/// flagged file silently disappears.
fn group(pattern: &Pattern, mut candidates: Vec<Candidate>, cap: usize) -> Vec<Finding> {
    candidates.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.targets.cmp(&b.targets))
    });
    let cap = cap.max(1);
    let overflow: Vec<Candidate> = if candidates.len() > cap {
        candidates.split_off(cap)
    } else {
        Vec::new()
    };
    if !overflow.is_empty() {
        if let Some(last) = candidates.last_mut() {
            for extra in overflow {
                last.targets.extend(extra.targets);
            }
        }
    }
    candidates
        .into_iter()
        .map(|c| Finding {
            kind: pattern.kind,
            scope: pattern.scope,
            severity: pattern.severity,
            confidence: c.confidence,
            targets: c.targets,
            evidence: c.evidence,
            suggestion: c.suggestion,
        })
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────────
