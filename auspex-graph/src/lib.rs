//! Graph engine for Auspex — dependency-graph construction and the graph
//! algorithms that feed the signal field.
//!
//! This crate is deliberately free of orchestration concerns: it consumes
//! plain per-file data ([`GraphInput`]) and produces plain metric maps
//! ([`metrics::GraphMetrics`]). The blackboard, fusion, and finding layers
//! live in `auspex-core`.

pub mod centrality;
pub mod clones;
pub mod community;
pub mod graph;
pub mod metrics;
pub mod reachability;
pub mod stats;

use serde::{Deserialize, Serialize};

pub use graph::DependencyGraph;
pub use metrics::GraphMetrics;

/// Error type for the graph engine.
#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    /// The graph violates a structural invariant (builder bug, always fatal).
    #[error("Graph integrity violation: {0}")]
    Integrity(String),

    /// A referenced node is not part of the graph.
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// Algorithmic or numerical failure during computation.
    #[error("Computation error: {0}")]
    Computation(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;

// ── Node roles ─────────────────────────────────────────────────────

/// Role classification for a file, as provided by the upstream semantic
/// collaborator. Only the distinctions the graph algorithms care about are
/// carried down to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeRole {
    /// Program entry point (main, CLI, server bootstrap).
    EntryPoint,
    /// Test code.
    Test,
    /// Schema/data migration.
    Migration,
    /// Package index file (`mod.rs`, `__init__.py`, `index.ts`).
    PackageIndex,
    /// Everything else.
    #[default]
    Regular,
}

impl NodeRole {
    /// Roles that exempt a zero-in-degree file from orphan flagging.
    pub fn exempt_from_orphan(self) -> bool {
        matches!(self, Self::EntryPoint | Self::Test)
    }

    /// Roles excluded from clone-pair candidacy when present on both sides.
    pub fn exempt_from_clones(self) -> bool {
        matches!(self, Self::Test | Self::Migration)
    }
}

// ── Builder input ──────────────────────────────────────────────────

/// Per-file input to graph construction: the path, its declared import
/// strings, and the role classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphInput {
    pub path: String,
    pub imports: Vec<String>,
    pub role: NodeRole,
}

impl GraphInput {
    pub fn new(path: impl Into<String>, imports: Vec<String>, role: NodeRole) -> Self {
        Self {
            path: path.into(),
            imports,
            role,
        }
    }
}
