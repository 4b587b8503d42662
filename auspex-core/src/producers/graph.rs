//! Graph construction and graph-metric production.

use tracing::info;

use auspex_graph::clones::CloneSource;
use auspex_graph::metrics::{AnalyzeOptions, analyze};
use auspex_graph::{DependencyGraph, GraphInput};

use crate::error::{AnalyzeError, Result};
use crate::orchestrator::{Producer, ProducerContext};
use crate::slot::{Blackboard, SlotName, SlotValue};

/// Builds the dependency graph from the scanned file records.
#[derive(Debug)]
pub struct GraphProducer;

impl Producer for GraphProducer {
    fn name(&self) -> &'static str {
        "graph"
    }

    fn requires(&self) -> &[SlotName] {
        &[]
    }

    fn provides(&self) -> &[SlotName] {
        &[SlotName::Graph]
    }

    fn run(&self, ctx: &ProducerContext<'_>, _board: &Blackboard) -> Result<Vec<SlotValue>> {
        let inputs: Vec<GraphInput> = ctx
            .inputs
            .files
            .iter()
            .map(|record| {
                GraphInput::new(
                    record.path.clone(),
                    record.imports.clone(),
                    record.role.node_role(),
                )
            })
            .collect();
        let graph = DependencyGraph::build(&inputs);
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "dependency graph built"
        );
        Ok(vec![SlotValue::Graph(graph)])
    }
}

/// Runs every graph algorithm over the validated graph.
#[derive(Debug)]
pub struct GraphMetricsProducer;

impl Producer for GraphMetricsProducer {
    fn name(&self) -> &'static str {
        "graph_metrics"
    }

    fn requires(&self) -> &[SlotName] {
        &[SlotName::Graph]
    }

    fn provides(&self) -> &[SlotName] {
        &[SlotName::GraphMetrics]
    }

    fn run(&self, ctx: &ProducerContext<'_>, board: &Blackboard) -> Result<Vec<SlotValue>> {
        let graph = board.graph.get().ok_or_else(|| {
            AnalyzeError::Computation("graph slot unavailable".to_string())
        })?;

        // Content is carried only for clone detection; files without it are
        // simply absent from the candidate set.
        let sources: Vec<CloneSource> = ctx
            .inputs
            .files
            .iter()
            .filter_map(|record| {
                record.content.as_ref().map(|content| CloneSource {
                    path: record.path.clone(),
                    content: content.clone(),
                    role: record.role.node_role(),
                })
            })
            .collect();

        let options = AnalyzeOptions {
            centrality: ctx.config.graph.centrality_config(),
            clones: ctx.config.graph.clone_config(),
        };
        let metrics = analyze(graph, &sources, &options)?;
        Ok(vec![SlotValue::GraphMetrics(metrics)])
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuspexConfig;
    use crate::orchestrator::AnalysisInputs;
    use crate::types::{FileRecord, FileRole};

    fn record(path: &str, imports: &[&str]) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            lines: 100,
            functions: 5,
            classes: 1,
            imports: imports.iter().map(ToString::to_string).collect(),
            symbols: vec![],
            max_nesting: 2,
            completeness: 1.0,
            role: FileRole::Unknown,
            content: None,
        }
    }

    #[test]
    fn graph_producer_builds_from_records() {
        let inputs = AnalysisInputs {
            files: vec![record("a.rs", &["b.rs"]), record("b.rs", &[])],
            ..AnalysisInputs::default()
        };
        let config = AuspexConfig::default();
        let ctx = ProducerContext {
            inputs: &inputs,
            config: &config,
        };
        let values = GraphProducer.run(&ctx, &Blackboard::default()).unwrap();
        let SlotValue::Graph(graph) = &values[0] else {
            panic!("expected graph value");
        };
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn metrics_producer_needs_graph() {
        let inputs = AnalysisInputs::default();
        let config = AuspexConfig::default();
        let ctx = ProducerContext {
            inputs: &inputs,
            config: &config,
        };
        assert!(GraphMetricsProducer
            .run(&ctx, &Blackboard::default())
            .is_err());
    }

    #[test]
    fn metrics_producer_runs_over_published_graph() {
        let inputs = AnalysisInputs {
            files: vec![record("a.rs", &["b.rs"]), record("b.rs", &[])],
            ..AnalysisInputs::default()
        };
        let config = AuspexConfig::default();
        let ctx = ProducerContext {
            inputs: &inputs,
            config: &config,
        };
        let mut board = Blackboard::default();
        let values = GraphProducer.run(&ctx, &board).unwrap();
        for value in values {
            board.publish("graph", value).unwrap();
        }
        let values = GraphMetricsProducer.run(&ctx, &board).unwrap();
        let SlotValue::GraphMetrics(metrics) = &values[0] else {
            panic!("expected metrics value");
        };
        assert_eq!(metrics.pagerank.len(), 2);
    }
}
