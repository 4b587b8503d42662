//! Semantic signal production from the per-file structural metrics.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::Result;
use crate::orchestrator::{Producer, ProducerContext};
use crate::signal::Signal;
use crate::slot::{Blackboard, SemanticSignals, SlotName, SlotValue};
use crate::types::FileRecord;

/// Derives cognitive load, completeness, and size signals from the scanned
/// file records. Always succeeds: the records are the run's primary input.
#[derive(Debug)]
pub struct SemanticProducer;

impl Producer for SemanticProducer {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn requires(&self) -> &[SlotName] {
        &[]
    }

    fn provides(&self) -> &[SlotName] {
        &[SlotName::Semantic]
    }

    fn run(&self, ctx: &ProducerContext<'_>, _board: &Blackboard) -> Result<Vec<SlotValue>> {
        let mut files = BTreeMap::new();
        for record in &ctx.inputs.files {
            let mut signals = BTreeMap::new();
            signals.insert(Signal::CognitiveLoad, cognitive_load(record));
            signals.insert(Signal::Completeness, record.completeness.clamp(0.0, 1.0));
            signals.insert(Signal::FileSize, f64::from(record.lines));
            files.insert(record.path.clone(), signals);
        }
        debug!(files = files.len(), "semantic signals produced");
        Ok(vec![SlotValue::Semantic(SemanticSignals { files })])
    }
}

/// Structural cognitive-load estimate. Nesting dominates: each level is
/// weighted quadratically, with linear terms for declaration count and size.
#[allow(clippy::cast_lossless)]
fn cognitive_load(record: &FileRecord) -> f64 {
    let nesting = f64::from(record.max_nesting);
    let declarations = f64::from(record.functions + record.classes * 2);
    nesting * nesting + declarations + f64::from(record.lines) / 40.0
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuspexConfig;
    use crate::orchestrator::AnalysisInputs;
    use crate::types::FileRole;

    fn record(path: &str, lines: u32, nesting: u32, functions: u32) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            lines,
            functions,
            classes: 0,
            imports: vec![],
            symbols: vec![],
            max_nesting: nesting,
            completeness: 0.9,
            role: FileRole::Unknown,
            content: None,
        }
    }

    #[test]
    fn deeper_nesting_loads_heavier_than_size() {
        let shallow = record("a.rs", 400, 1, 5);
        let deep = record("b.rs", 100, 6, 5);
        assert!(cognitive_load(&deep) > cognitive_load(&shallow));
    }

    #[test]
    fn produces_one_entry_per_file() {
        let inputs = AnalysisInputs {
            files: vec![record("a.rs", 100, 2, 3), record("b.rs", 50, 1, 1)],
            ..AnalysisInputs::default()
        };
        let config = AuspexConfig::default();
        let ctx = ProducerContext {
            inputs: &inputs,
            config: &config,
        };
        let values = SemanticProducer.run(&ctx, &Blackboard::default()).unwrap();
        let SlotValue::Semantic(semantic) = &values[0] else {
            panic!("expected semantic value");
        };
        assert_eq!(semantic.files.len(), 2);
        assert!((semantic.files["a.rs"][&Signal::FileSize] - 100.0).abs() < 1e-12);
        assert!((semantic.files["a.rs"][&Signal::Completeness] - 0.9).abs() < 1e-12);
    }
}
