//! Blackboard orchestrator.
//!
//! Producers declare the slots they require and provide; the orchestrator
//! validates the wiring once at build time (exactly one writer per slot,
//! no dependency cycles, no unsatisfiable requirement) and then runs the
//! producers in topological order. `run_last` producers are scheduled after
//! every wave-1 producer regardless of their topological position.
//!
//! Failure policy: integrity and configuration errors always halt the run.
//! Other producer failures follow the producer's [`ErrorMode`] — `Fail`
//! halts, `Skip` and `Degrade` record a slot error and continue, so
//! downstream consumers see a resolved-but-unavailable dependency.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::config::AuspexConfig;
use crate::error::{AnalyzeError, AuspexError, ConfigError, IntegrityError, Result};
use crate::slot::{Blackboard, SlotName, SlotValue};
use crate::types::{ArchitectureSummary, FileRecord, GitHistorySummary};

// ── Inputs & context ───────────────────────────────────────────────

/// Everything the out-of-scope collaborators hand us for one run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInputs {
    pub files: Vec<FileRecord>,
    pub history: Option<GitHistorySummary>,
    pub architecture: Option<ArchitectureSummary>,
}

/// Cooperative cancellation flag, checked between producers.
pub type CancelFlag = Arc<AtomicBool>;

/// Read-only context shared by all producers in one run.
#[derive(Debug)]
pub struct ProducerContext<'a> {
    pub inputs: &'a AnalysisInputs,
    pub config: &'a AuspexConfig,
}

// ── Producer trait ─────────────────────────────────────────────────

/// How a producer's failure propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
    /// Halt the run.
    Fail,
    /// Record a slot error and continue; downstream output shrinks.
    Skip,
    /// Like `Skip`, but the producer may have published partial values
    /// before failing.
    Degrade,
}

/// One pipeline stage. Producers are stateless between runs; all state
/// flows through the blackboard.
pub trait Producer: Send + Sync {
    fn name(&self) -> &'static str;
    fn requires(&self) -> &[SlotName];
    fn provides(&self) -> &[SlotName];
    fn run_last(&self) -> bool {
        false
    }
    fn error_mode(&self) -> ErrorMode {
        ErrorMode::Fail
    }
    fn run(&self, ctx: &ProducerContext<'_>, board: &Blackboard) -> Result<Vec<SlotValue>>;
}

// ── Orchestrator ───────────────────────────────────────────────────

pub struct Orchestrator {
    producers: Vec<Box<dyn Producer>>,
    /// Producer indices in execution order.
    schedule: Vec<usize>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let order: Vec<&str> = self
            .schedule
            .iter()
            .map(|&i| self.producers[i].name())
            .collect();
        f.debug_struct("Orchestrator").field("schedule", &order).finish()
    }
}

impl Orchestrator {
    /// Validate the producer set and compute the execution schedule.
    pub fn new(producers: Vec<Box<dyn Producer>>) -> Result<Self> {
        let providers = check_single_writer(&producers)?;
        check_requirements(&producers, &providers)?;
        let schedule = topo_schedule(&producers, &providers)?;
        debug!(producers = producers.len(), "orchestrator wired");
        Ok(Self {
            producers,
            schedule,
        })
    }

    /// Run every producer in schedule order, returning the filled board.
    pub fn run(&self, ctx: &ProducerContext<'_>, cancel: &CancelFlag) -> Result<Blackboard> {
        let mut board = Blackboard::default();
        for &index in &self.schedule {
            if cancel.load(Ordering::Relaxed) {
                return Err(AnalyzeError::Cancelled.into());
            }
            let producer = &self.producers[index];
            debug!(producer = producer.name(), "running producer");
            match producer.run(ctx, &board) {
                Ok(values) => {
                    self.publish_all(&mut board, producer.as_ref(), values)?;
                }
                Err(err) => self.handle_failure(&mut board, producer.as_ref(), err)?,
            }
            if producer.provides().contains(&SlotName::Graph) {
                graph_checkpoint(ctx, &board)?;
            }
        }
        info!(producers = self.schedule.len(), "all producers completed");
        Ok(board)
    }

    fn publish_all(
        &self,
        board: &mut Blackboard,
        producer: &dyn Producer,
        values: Vec<SlotValue>,
    ) -> Result<()> {
        let mut written = Vec::new();
        for value in values {
            let slot = value.slot();
            if !producer.provides().contains(&slot) {
                return Err(IntegrityError::UndeclaredWrite {
                    producer: producer.name().to_string(),
                    slot: slot.to_string(),
                }
                .into());
            }
            board.publish(producer.name(), value)?;
            written.push(slot);
        }
        // Declared slots the producer chose not to fill resolve as errors,
        // so scheduling invariants still hold downstream.
        for &slot in producer.provides() {
            if !written.contains(&slot) {
                board.record_error(producer.name(), slot, "not produced")?;
            }
        }
        Ok(())
    }

    fn handle_failure(
        &self,
        board: &mut Blackboard,
        producer: &dyn Producer,
        err: AuspexError,
    ) -> Result<()> {
        // Integrity and wiring errors are fatal regardless of mode.
        if matches!(err, AuspexError::Integrity(_) | AuspexError::Config(_)) {
            return Err(err);
        }
        match producer.error_mode() {
            ErrorMode::Fail => Err(AnalyzeError::ProducerFailed {
                producer: producer.name().to_string(),
                message: err.to_string(),
            }
            .into()),
            ErrorMode::Skip | ErrorMode::Degrade => {
                warn!(
                    producer = producer.name(),
                    error = %err,
                    "producer degraded, recording slot errors"
                );
                for &slot in producer.provides() {
                    if !board.is_resolved(slot) {
                        board.record_error(producer.name(), slot, &err.to_string())?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Post-graph validation checkpoint: structural consistency plus node↔file
/// correspondence. Failure is an integrity violation, not a degraded run.
fn graph_checkpoint(ctx: &ProducerContext<'_>, board: &Blackboard) -> Result<()> {
    let Some(graph) = board.graph.get() else {
        return Ok(());
    };
    graph.validate()?;
    let nodes = graph.node_count();
    let files = ctx.inputs.files.len();
    if nodes != files {
        return Err(IntegrityError::Checkpoint {
            stage: "graph".to_string(),
            message: format!("graph has {nodes} nodes for {files} input files"),
        }
        .into());
    }
    debug!(nodes, "graph checkpoint passed");
    Ok(())
}

// ── Build-time validation ──────────────────────────────────────────

fn check_single_writer(producers: &[Box<dyn Producer>]) -> Result<BTreeMap<SlotName, usize>> {
    let mut providers: BTreeMap<SlotName, usize> = BTreeMap::new();
    for (index, producer) in producers.iter().enumerate() {
        for &slot in producer.provides() {
            if let Some(&first) = providers.get(&slot) {
                return Err(ConfigError::DuplicateProvider {
                    slot: slot.to_string(),
                    first: producers[first].name().to_string(),
                    second: producer.name().to_string(),
                }
                .into());
            }
            providers.insert(slot, index);
        }
    }
    Ok(providers)
}

fn check_requirements(
    producers: &[Box<dyn Producer>],
    providers: &BTreeMap<SlotName, usize>,
) -> Result<()> {
    for producer in producers {
        for &slot in producer.requires() {
            if !providers.contains_key(&slot) {
                return Err(ConfigError::UnsatisfiedRequire {
                    producer: producer.name().to_string(),
                    slot: slot.to_string(),
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Kahn topological sort over the requires/provides edges, with `run_last`
/// producers appended after every wave-1 producer.
fn topo_schedule(
    producers: &[Box<dyn Producer>],
    providers: &BTreeMap<SlotName, usize>,
) -> Result<Vec<usize>> {
    let n = producers.len();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];
    for (index, producer) in producers.iter().enumerate() {
        for &slot in producer.requires() {
            let provider = providers[&slot];
            if provider != index {
                dependents[provider].push(index);
                in_degree[index] += 1;
            }
        }
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(index) = queue.pop_front() {
        order.push(index);
        for &dependent in &dependents[index] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }
    if order.len() != n {
        let stuck: Vec<&str> = (0..n)
            .filter(|i| !order.contains(i))
            .map(|i| producers[i].name())
            .collect();
        return Err(ConfigError::DependencyCycle(stuck.join(" -> ")).into());
    }

    let (last, first): (Vec<usize>, Vec<usize>) =
        order.into_iter().partition(|&i| producers[i].run_last());
    let mut schedule = first;
    schedule.extend(last);
    Ok(schedule)
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SemanticSignals;

    struct Stub {
        name: &'static str,
        requires: Vec<SlotName>,
        provides: Vec<SlotName>,
        last: bool,
    }

    impl Producer for Stub {
        fn name(&self) -> &'static str {
            self.name
        }
        fn requires(&self) -> &[SlotName] {
            &self.requires
        }
        fn provides(&self) -> &[SlotName] {
            &self.provides
        }
        fn run_last(&self) -> bool {
            self.last
        }
        fn run(
            &self,
            _ctx: &ProducerContext<'_>,
            _board: &Blackboard,
        ) -> Result<Vec<SlotValue>> {
            Ok(vec![])
        }
    }

    fn stub(
        name: &'static str,
        requires: &[SlotName],
        provides: &[SlotName],
    ) -> Box<dyn Producer> {
        Box::new(Stub {
            name,
            requires: requires.to_vec(),
            provides: provides.to_vec(),
            last: false,
        })
    }

    #[test]
    fn duplicate_provider_rejected() {
        let err = Orchestrator::new(vec![
            stub("a", &[], &[SlotName::Semantic]),
            stub("b", &[], &[SlotName::Semantic]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("semantic"));
    }

    #[test]
    fn unsatisfied_require_rejected() {
        let err = Orchestrator::new(vec![stub(
            "a",
            &[SlotName::Graph],
            &[SlotName::Semantic],
        )])
        .unwrap_err();
        assert!(err.to_string().contains("graph"));
    }

    #[test]
    fn schedule_respects_dependencies() {
        let orchestrator = Orchestrator::new(vec![
            stub("metrics", &[SlotName::Graph], &[SlotName::GraphMetrics]),
            stub("graph", &[], &[SlotName::Graph]),
        ])
        .unwrap();
        assert_eq!(orchestrator.schedule, vec![1, 0]);
    }

    #[test]
    fn run_last_scheduled_after_everything() {
        let orchestrator = Orchestrator::new(vec![
            Box::new(Stub {
                name: "fusion",
                requires: vec![],
                provides: vec![SlotName::Field],
                last: true,
            }) as Box<dyn Producer>,
            stub("graph", &[], &[SlotName::Graph]),
            stub("metrics", &[SlotName::Graph], &[SlotName::GraphMetrics]),
        ])
        .unwrap();
        assert_eq!(*orchestrator.schedule.last().unwrap(), 0);
    }

    #[test]
    fn cycle_named_in_error() {
        // a requires graph_metrics (from b), b requires graph (from a)
        let err = Orchestrator::new(vec![
            stub("a", &[SlotName::GraphMetrics], &[SlotName::Graph]),
            stub("b", &[SlotName::Graph], &[SlotName::GraphMetrics]),
        ])
        .unwrap_err();
        let text = err.to_string();
        assert!(text.contains('a') && text.contains('b'), "{text}");
    }

    #[test]
    fn cancellation_checked_between_producers() {
        let orchestrator =
            Orchestrator::new(vec![stub("semantic", &[], &[SlotName::Semantic])]).unwrap();
        let inputs = AnalysisInputs::default();
        let config = AuspexConfig::default();
        let ctx = ProducerContext {
            inputs: &inputs,
            config: &config,
        };
        let cancel: CancelFlag = Arc::new(AtomicBool::new(true));
        let err = orchestrator.run(&ctx, &cancel).unwrap_err();
        assert!(matches!(
            err,
            AuspexError::Analyze(AnalyzeError::Cancelled)
        ));
    }

    #[test]
    fn undeclared_write_is_fatal() {
        struct Rogue;
        impl Producer for Rogue {
            fn name(&self) -> &'static str {
                "rogue"
            }
            fn requires(&self) -> &[SlotName] {
                &[]
            }
            fn provides(&self) -> &[SlotName] {
                &[SlotName::Temporal]
            }
            fn run(
                &self,
                _ctx: &ProducerContext<'_>,
                _board: &Blackboard,
            ) -> Result<Vec<SlotValue>> {
                Ok(vec![SlotValue::Semantic(SemanticSignals::default())])
            }
        }
        let orchestrator = Orchestrator::new(vec![Box::new(Rogue) as Box<dyn Producer>]).unwrap();
        let inputs = AnalysisInputs::default();
        let config = AuspexConfig::default();
        let ctx = ProducerContext {
            inputs: &inputs,
            config: &config,
        };
        let cancel: CancelFlag = Arc::new(AtomicBool::new(false));
        let err = orchestrator.run(&ctx, &cancel).unwrap_err();
        assert!(matches!(err, AuspexError::Integrity(_)));
    }

    #[test]
    fn unfilled_declared_slot_resolves_as_error() {
        let orchestrator =
            Orchestrator::new(vec![stub("semantic", &[], &[SlotName::Semantic])]).unwrap();
        let inputs = AnalysisInputs::default();
        let config = AuspexConfig::default();
        let ctx = ProducerContext {
            inputs: &inputs,
            config: &config,
        };
        let cancel: CancelFlag = Arc::new(AtomicBool::new(false));
        let board = orchestrator.run(&ctx, &cancel).unwrap();
        assert!(board.is_resolved(SlotName::Semantic));
        assert!(!board.is_available(SlotName::Semantic));
    }
}
