use serde::{Deserialize, Serialize};

use crate::error::{AuspexError, ConfigError};

/// Top-level Auspex configuration, matching `auspex.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuspexConfig {
    #[serde(default)]
    pub analysis: AnalysisSection,
    #[serde(default)]
    pub graph: GraphSection,
    #[serde(default)]
    pub fusion: FusionSection,
    #[serde(default)]
    pub findings: FindingsSection,
}

impl AuspexConfig {
    /// Parse from TOML text and validate.
    pub fn from_toml(text: &str) -> crate::error::Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| AuspexError::Config(ConfigError::Parse(e.to_string())))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field invariants (tier ordering, weight sums).
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.analysis.bayesian_floor >= self.analysis.full_floor {
            return Err(ConfigError::Invalid(format!(
                "bayesian_floor ({}) must be below full_floor ({})",
                self.analysis.bayesian_floor, self.analysis.full_floor
            ))
            .into());
        }
        self.fusion.validate()?;
        Ok(())
    }
}

/// Tier floors and normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSection {
    /// File count at which BAYESIAN tier begins (below: ABSOLUTE).
    pub bayesian_floor: usize,
    /// File count at which FULL tier begins.
    pub full_floor: usize,
    /// Shrinkage strength `k` for the BAYESIAN posterior; the prior pull is
    /// `k / (k + N)` toward 0.5.
    pub bayesian_prior_strength: f64,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            bayesian_floor: 15,
            full_floor: 50,
            bayesian_prior_strength: 10.0,
        }
    }
}

/// Graph algorithm knobs, passed down to `auspex-graph`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSection {
    pub pagerank_damping: f64,
    pub pagerank_epsilon: f64,
    pub pagerank_max_iterations: u32,
    /// Pairs with NCD below this are clone candidates.
    pub clone_ncd_threshold: f64,
    /// File count at which the LSH pre-filter activates.
    pub clone_lsh_threshold: usize,
}

impl Default for GraphSection {
    fn default() -> Self {
        Self {
            pagerank_damping: 0.85,
            pagerank_epsilon: 1e-8,
            pagerank_max_iterations: 100,
            clone_ncd_threshold: 0.35,
            clone_lsh_threshold: 1000,
        }
    }
}

impl GraphSection {
    pub fn centrality_config(&self) -> auspex_graph::centrality::CentralityConfig {
        auspex_graph::centrality::CentralityConfig {
            damping: self.pagerank_damping,
            epsilon: self.pagerank_epsilon,
            max_iterations: self.pagerank_max_iterations,
        }
    }

    pub fn clone_config(&self) -> auspex_graph::clones::CloneConfig {
        auspex_graph::clones::CloneConfig {
            ncd_threshold: self.clone_ncd_threshold,
            lsh_file_threshold: self.clone_lsh_threshold,
            ..auspex_graph::clones::CloneConfig::default()
        }
    }
}

/// Composite weight tables.
///
/// These are hand-tuned betas, not validated invariants — they are
/// configurable on purpose. Each table must sum to 1; `validate` enforces
/// it at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionSection {
    /// Pre-normalization raw risk (consumed only by the health Laplacian).
    pub raw_risk: RawRiskWeights,
    /// Percentile-space composite risk score.
    pub risk_score: RiskScoreWeights,
    /// Structural wiring quality.
    pub wiring: WiringWeights,
}

impl Default for FusionSection {
    fn default() -> Self {
        Self {
            raw_risk: RawRiskWeights::default(),
            risk_score: RiskScoreWeights::default(),
            wiring: WiringWeights::default(),
        }
    }
}

impl FusionSection {
    pub fn validate(&self) -> crate::error::Result<()> {
        check_sum("fusion.raw_risk", self.raw_risk.sum())?;
        check_sum("fusion.risk_score", self.risk_score.sum())?;
        check_sum("fusion.wiring", self.wiring.sum())?;
        Ok(())
    }
}

fn check_sum(table: &str, sum: f64) -> crate::error::Result<()> {
    if (sum - 1.0).abs() > 1e-6 {
        return Err(ConfigError::Invalid(format!(
            "{table} weights sum to {sum}, expected 1.0"
        ))
        .into());
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRiskWeights {
    pub centrality: f64,
    pub blast_radius: f64,
    pub cognitive_load: f64,
    pub churn: f64,
    pub bus_factor: f64,
}

impl Default for RawRiskWeights {
    fn default() -> Self {
        Self {
            centrality: 0.30,
            blast_radius: 0.20,
            cognitive_load: 0.20,
            churn: 0.20,
            bus_factor: 0.10,
        }
    }
}

impl RawRiskWeights {
    pub fn sum(&self) -> f64 {
        self.centrality + self.blast_radius + self.cognitive_load + self.churn + self.bus_factor
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScoreWeights {
    pub centrality: f64,
    pub blast_radius: f64,
    pub cognitive_load: f64,
    pub churn: f64,
    pub bus_factor: f64,
    pub fix_ratio: f64,
}

impl Default for RiskScoreWeights {
    fn default() -> Self {
        Self {
            centrality: 0.25,
            blast_radius: 0.15,
            cognitive_load: 0.20,
            churn: 0.20,
            bus_factor: 0.10,
            fix_ratio: 0.10,
        }
    }
}

impl RiskScoreWeights {
    pub fn sum(&self) -> f64 {
        self.centrality
            + self.blast_radius
            + self.cognitive_load
            + self.churn
            + self.bus_factor
            + self.fix_ratio
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WiringWeights {
    pub modularity: f64,
    pub spectral_gap: f64,
    pub cycle_penalty: f64,
    pub orphan_penalty: f64,
}

impl Default for WiringWeights {
    fn default() -> Self {
        Self {
            modularity: 0.40,
            spectral_gap: 0.20,
            cycle_penalty: 0.25,
            orphan_penalty: 0.15,
        }
    }
}

impl WiringWeights {
    pub fn sum(&self) -> f64 {
        self.modularity + self.spectral_gap + self.cycle_penalty + self.orphan_penalty
    }
}

/// Finding engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingsSection {
    /// Cap on grouped findings per finding kind.
    pub group_cap: usize,
    /// Master switch for the hotspot (median-churn) filter.
    pub hotspot_filter: bool,
}

impl Default for FindingsSection {
    fn default() -> Self {
        Self {
            group_cap: 3,
            hotspot_filter: true,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        AuspexConfig::default().validate().unwrap();
    }

    #[test]
    fn default_weight_tables_sum_to_one() {
        assert!((RawRiskWeights::default().sum() - 1.0).abs() < 1e-9);
        assert!((RiskScoreWeights::default().sum() - 1.0).abs() < 1e-9);
        assert!((WiringWeights::default().sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bad_weight_sum_rejected() {
        let mut config = AuspexConfig::default();
        config.fusion.raw_risk.centrality = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_tier_floors_rejected() {
        let mut config = AuspexConfig::default();
        config.analysis.bayesian_floor = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml() {
        let config = AuspexConfig::from_toml(
            r#"
[analysis]
bayesian_floor = 20
full_floor = 80
bayesian_prior_strength = 5.0

[findings]
group_cap = 5
hotspot_filter = false
"#,
        )
        .unwrap();
        assert_eq!(config.analysis.bayesian_floor, 20);
        assert_eq!(config.findings.group_cap, 5);
        assert!(!config.findings.hotspot_filter);
        // Unspecified sections fall back to defaults
        assert!((config.graph.pagerank_damping - 0.85).abs() < 1e-9);
    }

    #[test]
    fn rejects_invalid_toml_syntax() {
        assert!(AuspexConfig::from_toml("not [valid").is_err());
    }
}
