//! Auspex core — signal model, blackboard orchestrator, fusion pipeline,
//! and finding engine.
//!
//! The crate consumes plain structured inputs ([`FileRecord`] records plus
//! optional [`GitHistorySummary`] and [`ArchitectureSummary`]) and produces
//! a fused [`SignalField`] and ranked [`Finding`]s. Parsing, git
//! extraction, persistence, and rendering are collaborator concerns and
//! live outside this crate.
//!
//! Entry point: [`AuspexPipeline::run`].

pub mod config;
pub mod error;
pub mod field;
pub mod findings;
pub mod fusion;
pub mod orchestrator;
pub mod pipeline;
pub mod producers;
pub mod signal;
pub mod slot;
pub mod types;

pub use config::AuspexConfig;
pub use error::{AuspexError, Result};
pub use field::{FileSignals, ModuleSignals, SignalField, Tier};
pub use orchestrator::{AnalysisInputs, CancelFlag};
pub use pipeline::AuspexPipeline;
pub use signal::Signal;
pub use types::{
    AnalysisReport, ArchitectureSummary, FileRecord, FileRole, Finding, FindingKind,
    GitHistorySummary,
};
