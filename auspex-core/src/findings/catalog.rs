//! The fixed detection catalog.
//!
//! Each pattern is a [`Pattern`] entry: static gating data plus one eval
//! function that emits candidates. Every eval function applies the guard
//! discipline itself — skip on unavailable slots, skip undefined module
//! instability, skip author correlation when history is degenerate — and
//! never substitutes a default for a missing measurement.

use super::confidence::{margin_above, margin_below, margin_over_absolute, mean};
use super::{Candidate, EvalContext, Pattern};
use crate::field::Tier;
use crate::signal::Signal;
use crate::types::{ChurnTrajectory, Evidence, FindingKind, FindingScope, module_of};

// Percentile thresholds
const HUB_CENTRALITY: f64 = 0.9;
const HUB_COGNITIVE: f64 = 0.75;
const OVERLOAD_PCTL: f64 = 0.9;
const BUS_CENTRALITY: f64 = 0.75;
const SILO_ENTROPY: f64 = 0.15;
const SILO_ACTIVITY: f64 = 0.5;
const SPIKE_CV: f64 = 0.8;
const FIX_PCTL: f64 = 0.8;
const REFACTOR_PCTL: f64 = 0.8;
const REFACTOR_ACTIVITY: f64 = 0.7;

// Absolute thresholds
const WEAK_LINK_DELTA: f64 = 0.25;
const DEEP_CHAIN_HOPS: f64 = 6.0;
const STUB_COMPLETENESS: f64 = 0.5;
const SHOTGUN_LIFT: f64 = 3.0;
const SHOTGUN_SUPPORT: u32 = 5;
const FRAGMENT_DISTANCE: f64 = 0.9;
const PAIN_INSTABILITY: f64 = 0.3;
const PAIN_ABSTRACTNESS: f64 = 0.3;
const FOUNDATION_INSTABILITY: f64 = 0.7;
const MODULE_COUPLING_FLOOR: f64 = 4.0;
const GINI_THRESHOLD: f64 = 0.6;
const SPECTRAL_FLOOR: f64 = 0.05;
const LOW_HEALTH: f64 = 0.4;
const SMALL_GRAPH_FLOOR: usize = 10;

/// The full catalog, in registration order.
pub fn catalog() -> Vec<Pattern> {
    vec![
        Pattern {
            kind: FindingKind::RiskHub,
            scope: FindingScope::File,
            severity: 0.9,
            tier_minimum: Tier::Bayesian,
            hotspot_filtered: true,
            eval: risk_hub,
        },
        Pattern {
            kind: FindingKind::WeakLink,
            scope: FindingScope::File,
            severity: 0.8,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: false,
            eval: weak_link,
        },
        Pattern {
            kind: FindingKind::CircularDependency,
            scope: FindingScope::FilePair,
            severity: 0.7,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: false,
            eval: circular_dependency,
        },
        Pattern {
            kind: FindingKind::PhantomImports,
            scope: FindingScope::File,
            severity: 0.5,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: false,
            eval: phantom_imports,
        },
        Pattern {
            kind: FindingKind::OrphanedFile,
            scope: FindingScope::File,
            severity: 0.4,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: false,
            eval: orphaned_file,
        },
        Pattern {
            kind: FindingKind::StructuralClone,
            scope: FindingScope::FilePair,
            severity: 0.6,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: false,
            eval: structural_clone,
        },
        Pattern {
            kind: FindingKind::DeepDependencyChain,
            scope: FindingScope::File,
            severity: 0.5,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: false,
            eval: deep_dependency_chain,
        },
        Pattern {
            kind: FindingKind::CognitiveOverload,
            scope: FindingScope::File,
            severity: 0.6,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: false,
            eval: cognitive_overload,
        },
        Pattern {
            kind: FindingKind::StubImplementation,
            scope: FindingScope::File,
            severity: 0.5,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: false,
            eval: stub_implementation,
        },
        Pattern {
            kind: FindingKind::BusFactorRisk,
            scope: FindingScope::File,
            severity: 0.7,
            tier_minimum: Tier::Bayesian,
            hotspot_filtered: true,
            eval: bus_factor_risk,
        },
        Pattern {
            kind: FindingKind::KnowledgeSilo,
            scope: FindingScope::File,
            severity: 0.5,
            tier_minimum: Tier::Bayesian,
            hotspot_filtered: true,
            eval: knowledge_silo,
        },
        Pattern {
            kind: FindingKind::ChurnSpike,
            scope: FindingScope::File,
            severity: 0.6,
            tier_minimum: Tier::Bayesian,
            hotspot_filtered: false,
            eval: churn_spike,
        },
        Pattern {
            kind: FindingKind::FixHotspot,
            scope: FindingScope::File,
            severity: 0.7,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: true,
            eval: fix_hotspot,
        },
        Pattern {
            kind: FindingKind::RefactorChurn,
            scope: FindingScope::File,
            severity: 0.4,
            tier_minimum: Tier::Bayesian,
            hotspot_filtered: false,
            eval: refactor_churn,
        },
        Pattern {
            kind: FindingKind::ShotgunSurgery,
            scope: FindingScope::FilePair,
            severity: 0.7,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: false,
            eval: shotgun_surgery,
        },
        Pattern {
            kind: FindingKind::AuthorFragmentation,
            scope: FindingScope::FilePair,
            severity: 0.5,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: false,
            eval: author_fragmentation,
        },
        Pattern {
            kind: FindingKind::ZoneOfPain,
            scope: FindingScope::Module,
            severity: 0.7,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: false,
            eval: zone_of_pain,
        },
        Pattern {
            kind: FindingKind::UnstableFoundation,
            scope: FindingScope::Module,
            severity: 0.6,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: false,
            eval: unstable_foundation,
        },
        Pattern {
            kind: FindingKind::LayeringViolation,
            scope: FindingScope::ModulePair,
            severity: 0.8,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: false,
            eval: layering_violation,
        },
        Pattern {
            kind: FindingKind::FragmentedCommunity,
            scope: FindingScope::Module,
            severity: 0.5,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: false,
            eval: fragmented_community,
        },
        Pattern {
            kind: FindingKind::CentralityInequality,
            scope: FindingScope::Codebase,
            severity: 0.5,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: false,
            eval: centrality_inequality,
        },
        Pattern {
            kind: FindingKind::SpectralFragility,
            scope: FindingScope::Codebase,
            severity: 0.5,
            tier_minimum: Tier::Absolute,
            hotspot_filtered: false,
            eval: spectral_fragility,
        },
        Pattern {
            kind: FindingKind::LowHealthModule,
            scope: FindingScope::Module,
            severity: 0.6,
            tier_minimum: Tier::Bayesian,
            hotspot_filtered: false,
            eval: low_health_module,
        },
    ]
}

// ── Shared helpers ─────────────────────────────────────────────────

/// Margin for a "high value is bad" condition, percentile-based above the
/// ABSOLUTE tier, registry-absolute-threshold-based at it. `None` when the
/// signal is missing, below threshold, or has no absolute fallback.
fn high_signal_margin(
    ctx: &EvalContext<'_>,
    path: &str,
    signal: Signal,
    pctl_threshold: f64,
) -> Option<f64> {
    if ctx.field.tier == Tier::Absolute {
        let threshold = signal.meta().absolute_threshold?;
        let value = ctx.field.raw(path, signal)?;
        (value > threshold).then(|| margin_over_absolute(value, threshold))
    } else {
        let pctl = ctx.field.percentile(path, signal)?;
        (pctl >= pctl_threshold).then(|| margin_above(pctl, pctl_threshold))
    }
}

fn file_candidate(
    ctx: &EvalContext<'_>,
    path: &str,
    confidence: f64,
    signals: &[Signal],
    suggestion: String,
) -> Candidate {
    Candidate {
        targets: vec![path.to_string()],
        confidence,
        evidence: signals.iter().map(|&s| ctx.evidence(path, s)).collect(),
        suggestion,
    }
}

// ── File patterns ──────────────────────────────────────────────────

fn risk_hub(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    let mut out = Vec::new();
    for path in ctx.field.files.keys() {
        let Some(centrality) = ctx.field.percentile(path, Signal::PageRank) else {
            continue;
        };
        let Some(cognitive) = ctx.field.percentile(path, Signal::CognitiveLoad) else {
            continue;
        };
        if centrality >= HUB_CENTRALITY && cognitive >= HUB_COGNITIVE {
            let confidence = mean(&[
                margin_above(centrality, HUB_CENTRALITY),
                margin_above(cognitive, HUB_COGNITIVE),
            ]);
            out.push(file_candidate(
                ctx,
                path,
                confidence,
                &[Signal::PageRank, Signal::CognitiveLoad, Signal::TotalChanges],
                "Heavily-imported and hard to follow; split responsibilities before it accretes more".to_string(),
            ));
        }
    }
    out
}

fn weak_link(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (path, signals) in &ctx.field.files {
        let Some(&delta) = signals.raw.get(&Signal::DeltaHealth) else {
            continue;
        };
        if delta > WEAK_LINK_DELTA {
            out.push(file_candidate(
                ctx,
                path,
                margin_over_absolute(delta, WEAK_LINK_DELTA),
                &[Signal::DeltaHealth],
                "Markedly riskier than everything around it; its neighbors inherit the exposure".to_string(),
            ));
        }
    }
    out
}

fn circular_dependency(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    let Some(metrics) = ctx.metrics else {
        return Vec::new();
    };
    metrics
        .cycles
        .iter()
        .map(|members| Candidate {
            targets: members.clone(),
            confidence: 1.0,
            evidence: Vec::new(),
            suggestion: format!(
                "Break the {}-file import cycle; extract the shared interface",
                members.len()
            ),
        })
        .collect()
}

fn phantom_imports(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    let threshold = Signal::UnresolvedImports
        .meta()
        .absolute_threshold
        .unwrap_or(3.0);
    let mut out = Vec::new();
    for (path, signals) in &ctx.field.files {
        let Some(&count) = signals.raw.get(&Signal::UnresolvedImports) else {
            continue;
        };
        if count >= threshold {
            out.push(file_candidate(
                ctx,
                path,
                margin_over_absolute(count, threshold).max(0.25),
                &[Signal::UnresolvedImports],
                "Several imports resolve to nothing in-tree; stale paths or missing files".to_string(),
            ));
        }
    }
    out
}

fn orphaned_file(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    let Some(metrics) = ctx.metrics else {
        return Vec::new();
    };
    metrics
        .is_orphan
        .iter()
        .filter(|&(_, &flag)| flag)
        .map(|(path, _)| {
            file_candidate(
                ctx,
                path,
                1.0,
                &[Signal::InDegree],
                "Nothing imports this file; dead code or a missing wire-up".to_string(),
            )
        })
        .collect()
}

fn structural_clone(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    let Some(metrics) = ctx.metrics else {
        return Vec::new();
    };
    let threshold = ctx.config.graph.clone_ncd_threshold;
    metrics
        .clone_pairs
        .iter()
        .map(|pair| Candidate {
            targets: vec![pair.a.clone(), pair.b.clone()],
            confidence: margin_below(pair.ncd, threshold),
            evidence: Vec::new(),
            suggestion: format!(
                "Near-identical content (NCD {:.2}); extract the shared implementation",
                pair.ncd
            ),
        })
        .collect()
}

fn deep_dependency_chain(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    if !ctx.field.depth_defined {
        return Vec::new();
    }
    let mut out = Vec::new();
    for (path, signals) in &ctx.field.files {
        let Some(&depth) = signals.raw.get(&Signal::Depth) else {
            continue;
        };
        if depth >= DEEP_CHAIN_HOPS {
            out.push(file_candidate(
                ctx,
                path,
                margin_over_absolute(depth, DEEP_CHAIN_HOPS),
                &[Signal::Depth],
                "Long import chain from the entry points; changes ripple through many layers".to_string(),
            ));
        }
    }
    out
}

fn cognitive_overload(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    let mut out = Vec::new();
    for path in ctx.field.files.keys() {
        if let Some(margin) = high_signal_margin(ctx, path, Signal::CognitiveLoad, OVERLOAD_PCTL) {
            out.push(file_candidate(
                ctx,
                path,
                margin,
                &[Signal::CognitiveLoad, Signal::FileSize],
                "Deep nesting and declaration density put this past comfortable reading".to_string(),
            ));
        }
    }
    out
}

fn stub_implementation(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (path, signals) in &ctx.field.files {
        let Some(&completeness) = signals.raw.get(&Signal::Completeness) else {
            continue;
        };
        if completeness < STUB_COMPLETENESS {
            out.push(file_candidate(
                ctx,
                path,
                margin_below(completeness, STUB_COMPLETENESS),
                &[Signal::Completeness],
                "Mostly stubs or placeholders; finish or remove it".to_string(),
            ));
        }
    }
    out
}

fn bus_factor_risk(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    if ctx.temporal.is_none_or(|t| t.solo_author) {
        return Vec::new();
    }
    let mut out = Vec::new();
    for (path, signals) in &ctx.field.files {
        let Some(&bus) = signals.raw.get(&Signal::BusFactor) else {
            continue;
        };
        let Some(centrality) = ctx.field.percentile(path, Signal::PageRank) else {
            continue;
        };
        if bus <= 1.0 && centrality >= BUS_CENTRALITY {
            out.push(file_candidate(
                ctx,
                path,
                margin_above(centrality, BUS_CENTRALITY),
                &[Signal::BusFactor, Signal::PageRank],
                "A central file effectively owned by one person; pair on the next change".to_string(),
            ));
        }
    }
    out
}

fn knowledge_silo(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    if ctx.temporal.is_none_or(|t| t.solo_author) {
        return Vec::new();
    }
    let mut out = Vec::new();
    for path in ctx.field.files.keys() {
        let Some(entropy) = ctx.field.percentile(path, Signal::AuthorEntropy) else {
            continue;
        };
        let Some(activity) = ctx.field.percentile(path, Signal::TotalChanges) else {
            continue;
        };
        if entropy <= SILO_ENTROPY && activity >= SILO_ACTIVITY {
            let confidence = mean(&[
                margin_below(entropy, SILO_ENTROPY),
                margin_above(activity, SILO_ACTIVITY),
            ]);
            out.push(file_candidate(
                ctx,
                path,
                confidence,
                &[Signal::AuthorEntropy, Signal::TotalChanges],
                "Actively changed but by a near-constant author set; knowledge is concentrating".to_string(),
            ));
        }
    }
    out
}

fn churn_spike(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    let Some(temporal) = ctx.temporal else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for path in ctx.field.files.keys() {
        let spiking = matches!(
            temporal.trajectories.get(path),
            Some(ChurnTrajectory::Spike | ChurnTrajectory::Rising)
        );
        let Some(cv) = ctx.field.percentile(path, Signal::ChurnCv) else {
            continue;
        };
        if spiking && cv >= SPIKE_CV {
            out.push(file_candidate(
                ctx,
                path,
                margin_above(cv, SPIKE_CV),
                &[Signal::ChurnCv, Signal::ChurnSlope],
                "Change volume is accelerating and erratic; something here keeps not settling".to_string(),
            ));
        }
    }
    out
}

fn fix_hotspot(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    if ctx.temporal.is_none() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for path in ctx.field.files.keys() {
        if let Some(margin) = high_signal_margin(ctx, path, Signal::FixRatio, FIX_PCTL) {
            out.push(file_candidate(
                ctx,
                path,
                margin,
                &[Signal::FixRatio, Signal::TotalChanges],
                "A disproportionate share of its commits are fixes; the defect source is likely structural".to_string(),
            ));
        }
    }
    out
}

fn refactor_churn(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    if ctx.temporal.is_none() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for path in ctx.field.files.keys() {
        let Some(refactor) = ctx.field.percentile(path, Signal::RefactorRatio) else {
            continue;
        };
        let Some(activity) = ctx.field.percentile(path, Signal::TotalChanges) else {
            continue;
        };
        if refactor >= REFACTOR_PCTL && activity >= REFACTOR_ACTIVITY {
            let confidence = mean(&[
                margin_above(refactor, REFACTOR_PCTL),
                margin_above(activity, REFACTOR_ACTIVITY),
            ]);
            out.push(file_candidate(
                ctx,
                path,
                confidence,
                &[Signal::RefactorRatio, Signal::TotalChanges],
                "Repeatedly refactored without settling; the abstraction may be wrong".to_string(),
            ));
        }
    }
    out
}

// ── Pair patterns ──────────────────────────────────────────────────

fn shotgun_surgery(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    let Some(temporal) = ctx.temporal else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for pair in &temporal.co_changes {
        if pair.lift < SHOTGUN_LIFT || pair.support < SHOTGUN_SUPPORT {
            continue;
        }
        if module_of(&pair.a) == module_of(&pair.b) {
            continue;
        }
        let confidence = mean(&[
            margin_over_absolute(pair.lift, SHOTGUN_LIFT),
            margin_over_absolute(f64::from(pair.support), f64::from(SHOTGUN_SUPPORT)),
        ]);
        out.push(Candidate {
            targets: vec![pair.a.clone(), pair.b.clone()],
            confidence,
            evidence: Vec::new(),
            suggestion: format!(
                "Changed together in {} commits across module boundaries; hidden coupling",
                pair.support
            ),
        });
    }
    out
}

fn author_fragmentation(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    let Some(temporal) = ctx.temporal else {
        return Vec::new();
    };
    if temporal.solo_author {
        return Vec::new();
    }
    let Some(graph) = ctx.graph else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for pair in &temporal.author_distances {
        if pair.distance < FRAGMENT_DISTANCE {
            continue;
        }
        let coupled = graph.imports_of(&pair.a).contains(&pair.b)
            || graph.imports_of(&pair.b).contains(&pair.a);
        if !coupled {
            continue;
        }
        out.push(Candidate {
            targets: vec![pair.a.clone(), pair.b.clone()],
            confidence: margin_above(pair.distance, FRAGMENT_DISTANCE),
            evidence: Vec::new(),
            suggestion:
                "Structurally coupled files maintained by disjoint author sets; coordination gap"
                    .to_string(),
        });
    }
    out
}

// ── Module patterns ────────────────────────────────────────────────

fn module_evidence(value: f64, signal: Signal) -> Evidence {
    Evidence {
        signal,
        value,
        percentile: None,
    }
}

fn zone_of_pain(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    let mut out = Vec::new();
    for name in ctx.field.modules.keys() {
        // Undefined instability or abstractness: the guard, not a default
        let Some(instability) = ctx.field.module_raw(name, Signal::ModuleInstability) else {
            continue;
        };
        let Some(abstractness) = ctx.field.module_raw(name, Signal::ModuleAbstractness) else {
            continue;
        };
        let coupling = ctx
            .field
            .module_raw(name, Signal::ModuleCoupling)
            .unwrap_or(0.0);
        if instability <= PAIN_INSTABILITY
            && abstractness <= PAIN_ABSTRACTNESS
            && coupling >= MODULE_COUPLING_FLOOR
        {
            let confidence = mean(&[
                margin_below(instability, PAIN_INSTABILITY),
                margin_below(abstractness, PAIN_ABSTRACTNESS),
            ]);
            out.push(Candidate {
                targets: vec![name.clone()],
                confidence,
                evidence: vec![
                    module_evidence(instability, Signal::ModuleInstability),
                    module_evidence(abstractness, Signal::ModuleAbstractness),
                ],
                suggestion: "Concrete, stable, and widely depended on; every change here is expensive".to_string(),
            });
        }
    }
    out
}

fn unstable_foundation(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    let mut out = Vec::new();
    for name in ctx.field.modules.keys() {
        let Some(instability) = ctx.field.module_raw(name, Signal::ModuleInstability) else {
            continue;
        };
        let coupling = ctx
            .field
            .module_raw(name, Signal::ModuleCoupling)
            .unwrap_or(0.0);
        if instability >= FOUNDATION_INSTABILITY && coupling >= MODULE_COUPLING_FLOOR {
            let confidence = mean(&[
                margin_above(instability, FOUNDATION_INSTABILITY),
                margin_over_absolute(coupling, MODULE_COUPLING_FLOOR),
            ]);
            out.push(Candidate {
                targets: vec![name.clone()],
                confidence,
                evidence: vec![
                    module_evidence(instability, Signal::ModuleInstability),
                    module_evidence(coupling, Signal::ModuleCoupling),
                ],
                suggestion: "Highly unstable yet heavily wired in; churn here cascades outward"
                    .to_string(),
            });
        }
    }
    out
}

fn layering_violation(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    let Some(architecture) = ctx.architecture else {
        return Vec::new();
    };
    architecture
        .violations
        .iter()
        .map(|v| Candidate {
            targets: vec![v.from_module.clone(), v.to_module.clone()],
            confidence: 1.0,
            evidence: Vec::new(),
            suggestion: format!(
                "{} ({}) reaches up into {} ({}); invert the dependency",
                v.from_module, v.from_layer, v.to_module, v.to_layer
            ),
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn fragmented_community(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    let Some(metrics) = ctx.metrics else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (name, module) in &ctx.field.modules {
        if module.files.len() < 4 {
            continue;
        }
        let mut communities: Vec<u32> = module
            .files
            .iter()
            .filter_map(|path| metrics.community.get(path).copied())
            .collect();
        communities.sort_unstable();
        communities.dedup();
        if communities.len() >= 3 {
            let spread =
                (communities.len() as f64 - 2.0) / (module.files.len() as f64 - 2.0);
            out.push(Candidate {
                targets: vec![name.clone()],
                confidence: spread.clamp(0.0, 1.0),
                evidence: Vec::new(),
                suggestion: format!(
                    "Directory spans {} structural communities; its files pull in different directions",
                    communities.len()
                ),
            });
        }
    }
    out
}

// ── Codebase patterns ──────────────────────────────────────────────

fn centrality_inequality(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    if ctx.field.file_count() < SMALL_GRAPH_FLOOR {
        return Vec::new();
    }
    let Some(gini) = ctx.field.global_raw(Signal::CentralityGini) else {
        return Vec::new();
    };
    if gini < GINI_THRESHOLD {
        return Vec::new();
    }
    vec![Candidate {
        targets: Vec::new(),
        confidence: margin_above(gini, GINI_THRESHOLD),
        evidence: vec![module_evidence(gini, Signal::CentralityGini)],
        suggestion: "Importance is concentrated in very few files; the tree has single points of failure".to_string(),
    }]
}

fn spectral_fragility(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    if ctx.field.file_count() < SMALL_GRAPH_FLOOR {
        return Vec::new();
    }
    if ctx.graph.is_none_or(|g| g.edge_count() == 0) {
        return Vec::new();
    }
    let Some(gap) = ctx.field.global_raw(Signal::SpectralGap) else {
        return Vec::new();
    };
    if gap > SPECTRAL_FLOOR {
        return Vec::new();
    }
    vec![Candidate {
        targets: Vec::new(),
        confidence: margin_below(gap, SPECTRAL_FLOOR),
        evidence: vec![module_evidence(gap, Signal::SpectralGap)],
        suggestion: "The dependency graph is one cut away from splitting; its connectivity hinges on few edges".to_string(),
    }]
}

fn low_health_module(ctx: &EvalContext<'_>) -> Vec<Candidate> {
    let mut out = Vec::new();
    for name in ctx.field.modules.keys() {
        let Some(health) = ctx.field.module_raw(name, Signal::ModuleHealth) else {
            continue;
        };
        if health <= LOW_HEALTH {
            out.push(Candidate {
                targets: vec![name.clone()],
                confidence: margin_below(health, LOW_HEALTH),
                evidence: vec![module_evidence(health, Signal::ModuleHealth)],
                suggestion: "Most files in this module carry high composite risk; schedule a focused cleanup".to_string(),
            });
        }
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────
