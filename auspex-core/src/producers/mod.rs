//! The concrete pipeline stages.
//!
//! Wave 1: graph construction, graph metrics, temporal, semantic, and
//! architecture signals. The fusion producer runs last and folds everything
//! into the [`SignalField`](crate::field::SignalField).

mod architecture;
mod fusion;
mod graph;
mod semantic;
mod temporal;

pub use architecture::ArchitectureProducer;
pub use fusion::FusionProducer;
pub use graph::{GraphMetricsProducer, GraphProducer};
pub use semantic::SemanticProducer;
pub use temporal::TemporalProducer;

use crate::orchestrator::Producer;

/// The standard producer set, in registration (not execution) order.
pub fn standard_producers() -> Vec<Box<dyn Producer>> {
    vec![
        Box::new(GraphProducer),
        Box::new(GraphMetricsProducer),
        Box::new(TemporalProducer),
        Box::new(SemanticProducer),
        Box::new(ArchitectureProducer),
        Box::new(FusionProducer),
    ]
}
