//! Module-level architecture signals.
//!
//! Modules are directories. Cohesion, coupling, and instability come from
//! the cross-module edge counts of the dependency graph; an optional
//! external [`ArchitectureSummary`](crate::types::ArchitectureSummary)
//! overrides per-module values and contributes abstractness, layer
//! assignments, and layering violations.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{AnalyzeError, Result};
use crate::orchestrator::{ErrorMode, Producer, ProducerContext};
use crate::slot::{ArchSignals, Blackboard, ModuleArchSignals, SlotName, SlotValue};
use crate::types::module_of;

#[derive(Debug)]
pub struct ArchitectureProducer;

impl Producer for ArchitectureProducer {
    fn name(&self) -> &'static str {
        "architecture"
    }

    fn requires(&self) -> &[SlotName] {
        &[SlotName::Graph]
    }

    fn provides(&self) -> &[SlotName] {
        &[SlotName::Architecture]
    }

    fn error_mode(&self) -> ErrorMode {
        ErrorMode::Skip
    }

    fn run(&self, ctx: &ProducerContext<'_>, board: &Blackboard) -> Result<Vec<SlotValue>> {
        let graph = board.graph.get().ok_or_else(|| {
            AnalyzeError::Computation("graph slot unavailable".to_string())
        })?;

        // Group files by directory, then count internal and cross-module
        // edges per module.
        let mut modules: BTreeMap<String, ModuleArchSignals> = BTreeMap::new();
        for path in graph.nodes() {
            modules
                .entry(module_of(path).to_string())
                .or_default()
                .files
                .push(path.to_string());
        }

        let mut internal: BTreeMap<&str, usize> = BTreeMap::new();
        let mut afferent: BTreeMap<&str, usize> = BTreeMap::new();
        let mut efferent: BTreeMap<&str, usize> = BTreeMap::new();
        for source in graph.nodes() {
            let from = module_of(source);
            for target in graph.imports_of(source) {
                let to = module_of(target);
                if from == to {
                    *internal.entry(from).or_default() += 1;
                } else {
                    *efferent.entry(from).or_default() += 1;
                    *afferent.entry(to).or_default() += 1;
                }
            }
        }

        #[allow(clippy::cast_precision_loss)]
        for (name, module) in &mut modules {
            let inside = internal.get(name.as_str()).copied().unwrap_or(0);
            let ca = afferent.get(name.as_str()).copied().unwrap_or(0);
            let ce = efferent.get(name.as_str()).copied().unwrap_or(0);
            let touching = inside + ca + ce;
            module.cohesion = if touching == 0 {
                1.0
            } else {
                inside as f64 / touching as f64
            };
            module.coupling = (ca + ce) as f64;
            // Instability is undefined without cross-module edges; the gap
            // must propagate, never default to 0.
            module.instability = if ca + ce == 0 {
                None
            } else {
                Some(ce as f64 / (ca + ce) as f64)
            };
        }

        let mut violations = Vec::new();
        if let Some(external) = ctx.inputs.architecture.as_ref() {
            for (name, record) in &external.modules {
                let module = modules.entry(name.clone()).or_default();
                module.cohesion = record.cohesion;
                module.coupling = record.coupling;
                module.instability = record.instability;
                module.abstractness = Some(record.abstractness);
                module.layer = record.layer.clone();
            }
            violations = external.violations.clone();
        }

        debug!(
            modules = modules.len(),
            violations = violations.len(),
            "architecture signals produced"
        );
        Ok(vec![SlotValue::Architecture(ArchSignals {
            modules,
            violations,
        })])
    }
}

// ── Tests ──────────────────────────────────────────────────────────
