//! The analysis pipeline: wiring, execution, and report assembly.

use chrono::Utc;
use tracing::info;

use crate::config::AuspexConfig;
use crate::error::{AnalyzeError, Result};
use crate::findings;
use crate::orchestrator::{AnalysisInputs, CancelFlag, Orchestrator, ProducerContext};
use crate::producers::standard_producers;
use crate::types::AnalysisReport;

/// One configured analysis pipeline. Build once, run per codebase snapshot.
#[derive(Debug)]
pub struct AuspexPipeline {
    config: AuspexConfig,
    orchestrator: Orchestrator,
}

impl AuspexPipeline {
    /// Validate the configuration and wire the standard producer set.
    pub fn new(config: AuspexConfig) -> Result<Self> {
        config.validate()?;
        let orchestrator = Orchestrator::new(standard_producers())?;
        Ok(Self {
            config,
            orchestrator,
        })
    }

    /// Run the full pipeline. Only integrity and configuration errors (and
    /// cancellation) surface as hard failures; missing upstream data shrinks
    /// the report instead.
    pub fn run(&self, inputs: &AnalysisInputs, cancel: &CancelFlag) -> Result<AnalysisReport> {
        info!(
            files = inputs.files.len(),
            has_history = inputs.history.is_some(),
            has_architecture = inputs.architecture.is_some(),
            "starting analysis run"
        );
        let ctx = ProducerContext {
            inputs,
            config: &self.config,
        };
        let board = self.orchestrator.run(&ctx, cancel)?;
        let field = board
            .field
            .get()
            .cloned()
            .ok_or_else(|| AnalyzeError::Computation("fusion produced no field".to_string()))?;
        let findings = findings::evaluate(&field, &board, &self.config);
        info!(
            tier = ?field.tier,
            findings = findings.len(),
            "analysis run complete"
        );
        Ok(AnalysisReport {
            field,
            findings,
            computed_at: Utc::now(),
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Tier;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use crate::types::{FileRecord, FileRole};

    fn record(path: &str, imports: &[&str], role: FileRole) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            lines: 80,
            functions: 4,
            classes: 0,
            imports: imports.iter().map(ToString::to_string).collect(),
            symbols: vec![],
            max_nesting: 2,
            completeness: 1.0,
            role,
            content: None,
        }
    }

    fn cancel() -> CancelFlag {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn tiny_tree_runs_at_absolute_tier() {
        let pipeline = AuspexPipeline::new(AuspexConfig::default()).unwrap();
        let inputs = AnalysisInputs {
            files: vec![
                record("main.rs", &["lib.rs"], FileRole::EntryPoint),
                record("lib.rs", &["util.rs"], FileRole::Unknown),
                record("util.rs", &[], FileRole::Unknown),
            ],
            ..AnalysisInputs::default()
        };
        let report = pipeline.run(&inputs, &cancel()).unwrap();
        assert_eq!(report.field.tier, Tier::Absolute);
        assert_eq!(report.field.file_count(), 3);
        // No percentiles at ABSOLUTE tier
        assert!(report
            .field
            .files
            .values()
            .all(|f| f.percentiles.is_empty()));
    }

    #[test]
    fn empty_input_yields_empty_report() {
        let pipeline = AuspexPipeline::new(AuspexConfig::default()).unwrap();
        let report = pipeline.run(&AnalysisInputs::default(), &cancel()).unwrap();
        assert_eq!(report.field.file_count(), 0);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn invalid_config_rejected_at_build() {
        let mut config = AuspexConfig::default();
        config.analysis.bayesian_floor = 500;
        assert!(AuspexPipeline::new(config).is_err());
    }

    #[test]
    fn report_serializes() {
        let pipeline = AuspexPipeline::new(AuspexConfig::default()).unwrap();
        let inputs = AnalysisInputs {
            files: vec![record("main.rs", &[], FileRole::EntryPoint)],
            ..AnalysisInputs::default()
        };
        let report = pipeline.run(&inputs, &cancel()).unwrap();
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"tier\":\"absolute\""));
    }
}
