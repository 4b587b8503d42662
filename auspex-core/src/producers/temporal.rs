//! Temporal signal production from the pre-summarized git history.

use std::collections::BTreeMap;

use tracing::info;

use crate::error::{AnalyzeError, Result};
use crate::orchestrator::{ErrorMode, Producer, ProducerContext};
use crate::signal::Signal;
use crate::slot::{Blackboard, SlotName, SlotValue, TemporalSignals};

/// Maps per-file history measurements into temporal signals. Runs in `Skip`
/// mode: repositories without history degrade, they never fail.
#[derive(Debug)]
pub struct TemporalProducer;

impl Producer for TemporalProducer {
    fn name(&self) -> &'static str {
        "temporal"
    }

    fn requires(&self) -> &[SlotName] {
        &[]
    }

    fn provides(&self) -> &[SlotName] {
        &[SlotName::Temporal]
    }

    fn error_mode(&self) -> ErrorMode {
        ErrorMode::Skip
    }

    fn run(&self, ctx: &ProducerContext<'_>, _board: &Blackboard) -> Result<Vec<SlotValue>> {
        let Some(history) = ctx.inputs.history.as_ref() else {
            return Err(AnalyzeError::Computation("no git history provided".to_string()).into());
        };

        let mut files = BTreeMap::new();
        let mut trajectories = BTreeMap::new();
        for (path, entry) in &history.files {
            let mut signals = BTreeMap::new();
            signals.insert(Signal::TotalChanges, f64::from(entry.total_changes));
            signals.insert(Signal::ChurnSlope, entry.churn_slope);
            signals.insert(Signal::ChurnCv, entry.churn_cv);
            signals.insert(Signal::BusFactor, f64::from(entry.bus_factor));
            signals.insert(Signal::AuthorEntropy, entry.author_entropy);
            signals.insert(Signal::FixRatio, entry.fix_ratio);
            signals.insert(Signal::RefactorRatio, entry.refactor_ratio);
            files.insert(path.clone(), signals);
            trajectories.insert(path.clone(), entry.trajectory);
        }

        info!(
            files = files.len(),
            co_changes = history.co_changes.len(),
            solo_author = history.solo_author(),
            "temporal signals produced"
        );

        Ok(vec![SlotValue::Temporal(TemporalSignals {
            files,
            trajectories,
            co_changes: history.co_changes.clone(),
            author_distances: history.author_distances.clone(),
            solo_author: history.solo_author(),
        })])
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuspexConfig;
    use crate::orchestrator::AnalysisInputs;
    use crate::types::{ChurnTrajectory, FileHistory, GitHistorySummary};

    fn history_entry(changes: u32) -> FileHistory {
        FileHistory {
            total_changes: changes,
            trajectory: ChurnTrajectory::Stable,
            churn_slope: 0.2,
            churn_cv: 0.4,
            bus_factor: 2,
            author_entropy: 1.5,
            fix_ratio: 0.3,
            refactor_ratio: 0.1,
            last_touched: None,
        }
    }

    #[test]
    fn missing_history_errors_for_skip_mode() {
        let inputs = AnalysisInputs::default();
        let config = AuspexConfig::default();
        let ctx = ProducerContext {
            inputs: &inputs,
            config: &config,
        };
        assert!(TemporalProducer.run(&ctx, &Blackboard::default()).is_err());
        assert_eq!(TemporalProducer.error_mode(), ErrorMode::Skip);
    }

    #[test]
    fn history_mapped_to_signals() {
        let mut summary = GitHistorySummary {
            author_count: 3,
            commit_count: 40,
            ..GitHistorySummary::default()
        };
        summary
            .files
            .insert("a.rs".to_string(), history_entry(12));
        let inputs = AnalysisInputs {
            history: Some(summary),
            ..AnalysisInputs::default()
        };
        let config = AuspexConfig::default();
        let ctx = ProducerContext {
            inputs: &inputs,
            config: &config,
        };
        let values = TemporalProducer.run(&ctx, &Blackboard::default()).unwrap();
        let SlotValue::Temporal(temporal) = &values[0] else {
            panic!("expected temporal value");
        };
        assert!(!temporal.solo_author);
        let signals = &temporal.files["a.rs"];
        assert!((signals[&Signal::TotalChanges] - 12.0).abs() < 1e-12);
        assert!((signals[&Signal::BusFactor] - 2.0).abs() < 1e-12);
        assert_eq!(temporal.trajectories["a.rs"], ChurnTrajectory::Stable);
    }
}
