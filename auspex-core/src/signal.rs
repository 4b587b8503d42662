//! The closed signal registry.
//!
//! Every measurable quantity is one [`Signal`] variant with fixed static
//! metadata. The registry is an exhaustive match, so "registering" a signal
//! twice is impossible by construction; the single-writer invariant across
//! producers is checked once at orchestrator build time against each
//! variant's declared [`Stage`].

use serde::{Deserialize, Serialize};

/// Pipeline stage that produces a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Graph,
    Temporal,
    Semantic,
    Architecture,
    Fusion,
}

/// Where a signal attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalScope {
    File,
    Module,
    Global,
}

/// Direction of badness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HighIsBad,
    HighIsGood,
    Neutral,
}

/// Static metadata for one signal variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalMeta {
    pub scope: SignalScope,
    pub polarity: Polarity,
    /// Whether percentile normalization applies.
    pub percentile_eligible: bool,
    /// Raw-value threshold used when percentiles are unavailable
    /// (ABSOLUTE tier).
    pub absolute_threshold: Option<f64>,
    pub producer: Stage,
}

/// Every measurable quantity in the signal field. Closed enumeration —
/// adding a measurement means adding a variant and its metadata arm.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    // Graph, per file
    PageRank,
    Betweenness,
    InDegree,
    OutDegree,
    BlastRadius,
    Depth,
    UnresolvedImports,
    // Semantic, per file
    CognitiveLoad,
    Completeness,
    FileSize,
    // Temporal, per file
    TotalChanges,
    ChurnSlope,
    ChurnCv,
    BusFactor,
    AuthorEntropy,
    FixRatio,
    RefactorRatio,
    // Fusion composites, per file
    RiskScore,
    DeltaHealth,
    // Architecture, per module
    ModuleCohesion,
    ModuleCoupling,
    ModuleInstability,
    ModuleAbstractness,
    ModuleMainSeqDistance,
    ModuleBusFactor,
    ModuleTotalChanges,
    ModuleHealth,
    // Global
    Modularity,
    SpectralGap,
    CentralityGini,
    CycleCount,
    WiringQuality,
    GlobalHealth,
}

impl Signal {
    /// All variants, for registry-wide iteration.
    pub const ALL: &'static [Signal] = &[
        Signal::PageRank,
        Signal::Betweenness,
        Signal::InDegree,
        Signal::OutDegree,
        Signal::BlastRadius,
        Signal::Depth,
        Signal::UnresolvedImports,
        Signal::CognitiveLoad,
        Signal::Completeness,
        Signal::FileSize,
        Signal::TotalChanges,
        Signal::ChurnSlope,
        Signal::ChurnCv,
        Signal::BusFactor,
        Signal::AuthorEntropy,
        Signal::FixRatio,
        Signal::RefactorRatio,
        Signal::RiskScore,
        Signal::DeltaHealth,
        Signal::ModuleCohesion,
        Signal::ModuleCoupling,
        Signal::ModuleInstability,
        Signal::ModuleAbstractness,
        Signal::ModuleMainSeqDistance,
        Signal::ModuleBusFactor,
        Signal::ModuleTotalChanges,
        Signal::ModuleHealth,
        Signal::Modularity,
        Signal::SpectralGap,
        Signal::CentralityGini,
        Signal::CycleCount,
        Signal::WiringQuality,
        Signal::GlobalHealth,
    ];

    /// Static metadata for this variant.
    pub fn meta(self) -> &'static SignalMeta {
        use Polarity::{HighIsBad, HighIsGood, Neutral};
        use SignalScope::{File, Global, Module};
        use Stage::{Architecture, Fusion, Graph, Semantic, Temporal};

        macro_rules! meta {
            ($scope:expr, $polarity:expr, $eligible:expr, $abs:expr, $producer:expr) => {{
                static META: SignalMeta = SignalMeta {
                    scope: $scope,
                    polarity: $polarity,
                    percentile_eligible: $eligible,
                    absolute_threshold: $abs,
                    producer: $producer,
                };
                &META
            }};
        }

        match self {
            Self::PageRank => meta!(File, HighIsBad, true, None, Graph),
            Self::Betweenness => meta!(File, HighIsBad, true, None, Graph),
            Self::InDegree => meta!(File, Neutral, true, None, Graph),
            Self::OutDegree => meta!(File, Neutral, true, None, Graph),
            Self::BlastRadius => meta!(File, HighIsBad, true, None, Graph),
            Self::Depth => meta!(File, Neutral, false, None, Graph),
            Self::UnresolvedImports => meta!(File, HighIsBad, false, Some(3.0), Graph),
            Self::CognitiveLoad => meta!(File, HighIsBad, true, Some(50.0), Semantic),
            Self::Completeness => meta!(File, HighIsGood, true, Some(0.5), Semantic),
            Self::FileSize => meta!(File, HighIsBad, true, Some(800.0), Semantic),
            Self::TotalChanges => meta!(File, Neutral, true, None, Temporal),
            Self::ChurnSlope => meta!(File, HighIsBad, true, None, Temporal),
            Self::ChurnCv => meta!(File, HighIsBad, true, None, Temporal),
            Self::BusFactor => meta!(File, Neutral, true, Some(1.0), Temporal),
            Self::AuthorEntropy => meta!(File, Neutral, true, None, Temporal),
            Self::FixRatio => meta!(File, HighIsBad, true, Some(0.5), Temporal),
            Self::RefactorRatio => meta!(File, Neutral, true, None, Temporal),
            Self::RiskScore => meta!(File, HighIsBad, false, None, Fusion),
            Self::DeltaHealth => meta!(File, HighIsBad, false, None, Fusion),
            Self::ModuleCohesion => meta!(Module, HighIsGood, false, None, Architecture),
            Self::ModuleCoupling => meta!(Module, HighIsBad, false, None, Architecture),
            Self::ModuleInstability => meta!(Module, Neutral, false, None, Architecture),
            Self::ModuleAbstractness => meta!(Module, Neutral, false, None, Architecture),
            Self::ModuleMainSeqDistance => meta!(Module, HighIsBad, false, None, Fusion),
            Self::ModuleBusFactor => meta!(Module, Neutral, false, None, Fusion),
            Self::ModuleTotalChanges => meta!(Module, Neutral, false, None, Fusion),
            Self::ModuleHealth => meta!(Module, HighIsGood, false, None, Fusion),
            Self::Modularity => meta!(Global, HighIsGood, false, None, Graph),
            Self::SpectralGap => meta!(Global, HighIsGood, false, None, Graph),
            Self::CentralityGini => meta!(Global, HighIsBad, false, None, Graph),
            Self::CycleCount => meta!(Global, HighIsBad, false, None, Graph),
            Self::WiringQuality => meta!(Global, HighIsGood, false, None, Fusion),
            Self::GlobalHealth => meta!(Global, HighIsGood, false, None, Fusion),
        }
    }

    pub fn scope(self) -> SignalScope {
        self.meta().scope
    }

    pub fn percentile_eligible(self) -> bool {
        self.meta().percentile_eligible
    }

    pub fn polarity(self) -> Polarity {
        self.meta().polarity
    }

    /// Snake-case name, matching the serde representation.
    pub fn name(self) -> &'static str {
        match self {
            Self::PageRank => "page_rank",
            Self::Betweenness => "betweenness",
            Self::InDegree => "in_degree",
            Self::OutDegree => "out_degree",
            Self::BlastRadius => "blast_radius",
            Self::Depth => "depth",
            Self::UnresolvedImports => "unresolved_imports",
            Self::CognitiveLoad => "cognitive_load",
            Self::Completeness => "completeness",
            Self::FileSize => "file_size",
            Self::TotalChanges => "total_changes",
            Self::ChurnSlope => "churn_slope",
            Self::ChurnCv => "churn_cv",
            Self::BusFactor => "bus_factor",
            Self::AuthorEntropy => "author_entropy",
            Self::FixRatio => "fix_ratio",
            Self::RefactorRatio => "refactor_ratio",
            Self::RiskScore => "risk_score",
            Self::DeltaHealth => "delta_health",
            Self::ModuleCohesion => "module_cohesion",
            Self::ModuleCoupling => "module_coupling",
            Self::ModuleInstability => "module_instability",
            Self::ModuleAbstractness => "module_abstractness",
            Self::ModuleMainSeqDistance => "module_main_seq_distance",
            Self::ModuleBusFactor => "module_bus_factor",
            Self::ModuleTotalChanges => "module_total_changes",
            Self::ModuleHealth => "module_health",
            Self::Modularity => "modularity",
            Self::SpectralGap => "spectral_gap",
            Self::CentralityGini => "centrality_gini",
            Self::CycleCount => "cycle_count",
            Self::WiringQuality => "wiring_quality",
            Self::GlobalHealth => "global_health",
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_covers_every_variant_once() {
        let unique: HashSet<Signal> = Signal::ALL.iter().copied().collect();
        assert_eq!(unique.len(), Signal::ALL.len(), "duplicate in Signal::ALL");
    }

    #[test]
    fn percentile_eligibility_restricted_to_file_scope() {
        for &signal in Signal::ALL {
            if signal.percentile_eligible() {
                assert_eq!(
                    signal.scope(),
                    SignalScope::File,
                    "{} is percentile-eligible but not file-scoped",
                    signal.name()
                );
            }
        }
    }

    #[test]
    fn fusion_owns_all_composites() {
        for signal in [
            Signal::RiskScore,
            Signal::DeltaHealth,
            Signal::WiringQuality,
            Signal::GlobalHealth,
            Signal::ModuleHealth,
        ] {
            assert_eq!(signal.meta().producer, Stage::Fusion);
        }
    }

    #[test]
    fn names_are_unique() {
        let names: HashSet<&str> = Signal::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), Signal::ALL.len());
    }

    #[test]
    fn serde_name_matches_name() {
        let json = serde_json::to_string(&Signal::PageRank).unwrap();
        assert_eq!(json, "\"page_rank\"");
        let json = serde_json::to_string(&Signal::ModuleMainSeqDistance).unwrap();
        assert_eq!(json, "\"module_main_seq_distance\"");
    }
}
