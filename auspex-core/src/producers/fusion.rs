//! The fusion stage: folds every available slot into the signal field.

use crate::error::Result;
use crate::fusion::{FusionContext, fuse};
use crate::orchestrator::{Producer, ProducerContext};
use crate::slot::{Blackboard, SlotName, SlotValue};

/// Runs last. Reads whichever wave-1 slots are available; unavailable ones
/// shrink the field instead of failing the run.
#[derive(Debug)]
pub struct FusionProducer;

impl Producer for FusionProducer {
    fn name(&self) -> &'static str {
        "fusion"
    }

    fn requires(&self) -> &[SlotName] {
        &[
            SlotName::Graph,
            SlotName::GraphMetrics,
            SlotName::Temporal,
            SlotName::Semantic,
            SlotName::Architecture,
        ]
    }

    fn provides(&self) -> &[SlotName] {
        &[SlotName::Field]
    }

    fn run_last(&self) -> bool {
        true
    }

    fn run(&self, ctx: &ProducerContext<'_>, board: &Blackboard) -> Result<Vec<SlotValue>> {
        let field = fuse(FusionContext {
            config: ctx.config,
            files: &ctx.inputs.files,
            graph: board.graph.get(),
            metrics: board.graph_metrics.get(),
            temporal: board.temporal.get(),
            semantic: board.semantic.get(),
            architecture: board.architecture.get(),
        })?;
        Ok(vec![SlotValue::Field(field)])
    }
}

// ── Tests ──────────────────────────────────────────────────────────
