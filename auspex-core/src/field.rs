//! The signal field: the unified container for every raw value, percentile,
//! and composite produced during one analysis run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AnalysisSection;
use crate::error::{AnalyzeError, Result};
use crate::signal::Signal;
use crate::types::FileRole;

// ── Tiers ──────────────────────────────────────────────────────────

/// Statistical tier of a run, decided once from the analyzed file count.
///
/// Derived ordering: `Absolute < Bayesian < Full`, so tier gates can be
/// expressed as `tier >= minimum`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Too few files for meaningful percentiles; only absolute-threshold
    /// detections run.
    Absolute,
    /// Percentiles computed but shrunk toward a 0.5 prior.
    Bayesian,
    /// Full percentile statistics.
    Full,
}

impl Tier {
    /// Classify a run by its analyzed (non-excluded) file count.
    pub fn for_file_count(count: usize, section: &AnalysisSection) -> Self {
        if count < section.bayesian_floor {
            Self::Absolute
        } else if count < section.full_floor {
            Self::Bayesian
        } else {
            Self::Full
        }
    }
}

// ── Per-scope signal containers ────────────────────────────────────

/// Signals attached to one file. Absence from a map means the measurement
/// is unavailable for this file, never zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSignals {
    pub raw: BTreeMap<Signal, f64>,
    /// Inclusive percentiles in (0, 1]; empty at tier ABSOLUTE.
    pub percentiles: BTreeMap<Signal, f64>,
    /// Un-normalized risk blend, consumed only by the health Laplacian.
    pub raw_risk: f64,
    pub role: FileRole,
    pub module: String,
}

/// Signals attached to one module. Undefined measurements (instability when
/// a module has no cross-module edges) are absent from the map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleSignals {
    pub raw: BTreeMap<Signal, f64>,
    /// Member file paths, sorted.
    pub files: Vec<String>,
}

// ── SignalField ────────────────────────────────────────────────────

/// All signals for one analysis run, keyed by file path, module path, and
/// globally. Built up by the fusion chain; immutable once published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalField {
    pub tier: Tier,
    pub files: BTreeMap<String, FileSignals>,
    pub modules: BTreeMap<String, ModuleSignals>,
    pub global: BTreeMap<Signal, f64>,
    /// False when no depth root could be determined; depth-based detections
    /// must skip.
    pub depth_defined: bool,
}

impl SignalField {
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            files: BTreeMap::new(),
            modules: BTreeMap::new(),
            global: BTreeMap::new(),
            depth_defined: true,
        }
    }

    /// Record a raw per-file measurement.
    pub fn set_raw(&mut self, path: &str, signal: Signal, value: f64) {
        self.files
            .entry(path.to_string())
            .or_default()
            .raw
            .insert(signal, value);
    }

    /// Record a per-file percentile. Rejects signals the registry does not
    /// mark percentile-eligible.
    pub fn set_percentile(&mut self, path: &str, signal: Signal, pctl: f64) -> Result<()> {
        if !signal.percentile_eligible() {
            return Err(
                AnalyzeError::NotPercentileEligible(signal.name().to_string()).into(),
            );
        }
        self.files
            .entry(path.to_string())
            .or_default()
            .percentiles
            .insert(signal, pctl);
        Ok(())
    }

    pub fn set_module(&mut self, module: &str, signal: Signal, value: f64) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .raw
            .insert(signal, value);
    }

    pub fn set_global(&mut self, signal: Signal, value: f64) {
        self.global.insert(signal, value);
    }

    pub fn raw(&self, path: &str, signal: Signal) -> Option<f64> {
        self.files.get(path)?.raw.get(&signal).copied()
    }

    pub fn percentile(&self, path: &str, signal: Signal) -> Option<f64> {
        self.files.get(path)?.percentiles.get(&signal).copied()
    }

    pub fn module_raw(&self, module: &str, signal: Signal) -> Option<f64> {
        self.modules.get(module)?.raw.get(&signal).copied()
    }

    pub fn global_raw(&self, signal: Signal) -> Option<f64> {
        self.global.get(&signal).copied()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Log a one-line field summary at debug level.
    pub fn trace_summary(&self) {
        debug!(
            tier = ?self.tier,
            files = self.files.len(),
            modules = self.modules.len(),
            globals = self.global.len(),
            "signal field assembled"
        );
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn section() -> AnalysisSection {
        AnalysisSection::default()
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(Tier::for_file_count(0, &section()), Tier::Absolute);
        assert_eq!(Tier::for_file_count(14, &section()), Tier::Absolute);
        assert_eq!(Tier::for_file_count(15, &section()), Tier::Bayesian);
        assert_eq!(Tier::for_file_count(49, &section()), Tier::Bayesian);
        assert_eq!(Tier::for_file_count(50, &section()), Tier::Full);
        assert_eq!(Tier::for_file_count(5000, &section()), Tier::Full);
    }

    #[test]
    fn tier_ordering_supports_gating() {
        assert!(Tier::Absolute < Tier::Bayesian);
        assert!(Tier::Bayesian < Tier::Full);
        assert!(Tier::Full >= Tier::Bayesian);
    }

    #[test]
    fn percentile_eligibility_enforced() {
        let mut field = SignalField::new(Tier::Full);
        field
            .set_percentile("a.rs", Signal::PageRank, 0.9)
            .unwrap();
        // RiskScore is a composite and never percentile-normalized
        let err = field.set_percentile("a.rs", Signal::RiskScore, 0.9);
        assert!(err.is_err());
    }

    #[test]
    fn absence_is_not_zero() {
        let field = SignalField::new(Tier::Absolute);
        assert_eq!(field.raw("ghost.rs", Signal::PageRank), None);
        assert_eq!(field.global_raw(Signal::Modularity), None);
    }

    #[test]
    fn raw_and_percentile_stored_separately() {
        let mut field = SignalField::new(Tier::Full);
        field.set_raw("a.rs", Signal::Betweenness, 0.42);
        field
            .set_percentile("a.rs", Signal::Betweenness, 0.95)
            .unwrap();
        assert_eq!(field.raw("a.rs", Signal::Betweenness), Some(0.42));
        assert_eq!(field.percentile("a.rs", Signal::Betweenness), Some(0.95));
    }
}
