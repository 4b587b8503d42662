//! Typed blackboard slots.
//!
//! Each intermediate product of the pipeline lives in exactly one slot.
//! Slots are write-once: a second write (value or error) is an integrity
//! violation, enforced here rather than trusted to producer discipline.
//! Consumers never read an unset slot's value; they query availability and
//! shrink their output when a dependency is missing.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use auspex_graph::{DependencyGraph, GraphMetrics};

use crate::error::{IntegrityError, Result};
use crate::field::SignalField;
use crate::signal::Signal;
use crate::types::{AuthorDistance, ChurnTrajectory, CoChangePair, LayeringViolation};

// ── Slot payloads ──────────────────────────────────────────────────

/// Per-file temporal signals plus the sparse pairwise structures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemporalSignals {
    pub files: BTreeMap<String, BTreeMap<Signal, f64>>,
    pub trajectories: BTreeMap<String, ChurnTrajectory>,
    pub co_changes: Vec<CoChangePair>,
    pub author_distances: Vec<AuthorDistance>,
    /// Author-correlation signals are degenerate when true.
    pub solo_author: bool,
}

/// Per-file semantic signals (cognitive load, completeness, size).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticSignals {
    pub files: BTreeMap<String, BTreeMap<Signal, f64>>,
}

/// One module's architecture measurements. `instability` is `None` when the
/// module has no cross-module edges; the gap propagates, never defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleArchSignals {
    pub cohesion: f64,
    pub coupling: f64,
    pub instability: Option<f64>,
    pub abstractness: Option<f64>,
    pub layer: Option<String>,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchSignals {
    pub modules: BTreeMap<String, ModuleArchSignals>,
    pub violations: Vec<LayeringViolation>,
}

// ── Slot<T> ────────────────────────────────────────────────────────

/// A write-once cell with provenance.
#[derive(Debug, Clone, Default)]
pub enum Slot<T> {
    #[default]
    Unset,
    /// The declared producer ran but could not fill the slot.
    Error { reason: String, producer: String },
    Set { value: T, producer: String },
}

impl<T> Slot<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Set { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Set { .. })
    }

    /// Set or errored — the producer has run either way.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    pub fn error_reason(&self) -> Option<&str> {
        match self {
            Self::Error { reason, .. } => Some(reason),
            _ => None,
        }
    }

    fn try_set(&mut self, name: SlotName, producer: &str, value: T) -> Result<()> {
        match self {
            Self::Unset => {
                *self = Self::Set {
                    value,
                    producer: producer.to_string(),
                };
                Ok(())
            }
            Self::Set { producer: first, .. } | Self::Error { producer: first, .. } => {
                Err(IntegrityError::SlotDoubleWrite {
                    slot: name.to_string(),
                    first: first.clone(),
                    second: producer.to_string(),
                }
                .into())
            }
        }
    }

    fn try_error(&mut self, name: SlotName, producer: &str, reason: String) -> Result<()> {
        match self {
            Self::Unset => {
                *self = Self::Error {
                    reason,
                    producer: producer.to_string(),
                };
                Ok(())
            }
            Self::Set { producer: first, .. } | Self::Error { producer: first, .. } => {
                Err(IntegrityError::SlotDoubleWrite {
                    slot: name.to_string(),
                    first: first.clone(),
                    second: producer.to_string(),
                }
                .into())
            }
        }
    }
}

// ── SlotName / SlotValue ───────────────────────────────────────────

/// Address of a blackboard slot, used in producers' requires/provides
/// declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotName {
    Graph,
    GraphMetrics,
    Temporal,
    Semantic,
    Architecture,
    Field,
}

impl SlotName {
    pub const ALL: &'static [SlotName] = &[
        SlotName::Graph,
        SlotName::GraphMetrics,
        SlotName::Temporal,
        SlotName::Semantic,
        SlotName::Architecture,
        SlotName::Field,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::GraphMetrics => "graph_metrics",
            Self::Temporal => "temporal",
            Self::Semantic => "semantic",
            Self::Architecture => "architecture",
            Self::Field => "field",
        }
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A produced value, tagged with its destination slot.
#[derive(Debug, Clone)]
pub enum SlotValue {
    Graph(DependencyGraph),
    GraphMetrics(GraphMetrics),
    Temporal(TemporalSignals),
    Semantic(SemanticSignals),
    Architecture(ArchSignals),
    Field(SignalField),
}

impl SlotValue {
    pub fn slot(&self) -> SlotName {
        match self {
            Self::Graph(_) => SlotName::Graph,
            Self::GraphMetrics(_) => SlotName::GraphMetrics,
            Self::Temporal(_) => SlotName::Temporal,
            Self::Semantic(_) => SlotName::Semantic,
            Self::Architecture(_) => SlotName::Architecture,
            Self::Field(_) => SlotName::Field,
        }
    }
}

// ── Blackboard ─────────────────────────────────────────────────────

/// The shared state producers write into, one typed slot per product.
#[derive(Debug, Default)]
pub struct Blackboard {
    pub graph: Slot<DependencyGraph>,
    pub graph_metrics: Slot<GraphMetrics>,
    pub temporal: Slot<TemporalSignals>,
    pub semantic: Slot<SemanticSignals>,
    pub architecture: Slot<ArchSignals>,
    pub field: Slot<SignalField>,
}

impl Blackboard {
    /// Publish one produced value. Fails on a second write to the same slot.
    pub fn publish(&mut self, producer: &str, value: SlotValue) -> Result<()> {
        match value {
            SlotValue::Graph(v) => self.graph.try_set(SlotName::Graph, producer, v),
            SlotValue::GraphMetrics(v) => {
                self.graph_metrics
                    .try_set(SlotName::GraphMetrics, producer, v)
            }
            SlotValue::Temporal(v) => self.temporal.try_set(SlotName::Temporal, producer, v),
            SlotValue::Semantic(v) => self.semantic.try_set(SlotName::Semantic, producer, v),
            SlotValue::Architecture(v) => {
                self.architecture
                    .try_set(SlotName::Architecture, producer, v)
            }
            SlotValue::Field(v) => self.field.try_set(SlotName::Field, producer, v),
        }
    }

    /// Record a producer's failure against every slot it declared, so
    /// downstream consumers see a resolved-but-unavailable dependency.
    pub fn record_error(&mut self, producer: &str, name: SlotName, reason: &str) -> Result<()> {
        let reason = reason.to_string();
        match name {
            SlotName::Graph => self.graph.try_error(name, producer, reason),
            SlotName::GraphMetrics => self.graph_metrics.try_error(name, producer, reason),
            SlotName::Temporal => self.temporal.try_error(name, producer, reason),
            SlotName::Semantic => self.semantic.try_error(name, producer, reason),
            SlotName::Architecture => self.architecture.try_error(name, producer, reason),
            SlotName::Field => self.field.try_error(name, producer, reason),
        }
    }

    pub fn is_available(&self, name: SlotName) -> bool {
        match name {
            SlotName::Graph => self.graph.is_available(),
            SlotName::GraphMetrics => self.graph_metrics.is_available(),
            SlotName::Temporal => self.temporal.is_available(),
            SlotName::Semantic => self.semantic.is_available(),
            SlotName::Architecture => self.architecture.is_available(),
            SlotName::Field => self.field.is_available(),
        }
    }

    pub fn is_resolved(&self, name: SlotName) -> bool {
        match name {
            SlotName::Graph => self.graph.is_resolved(),
            SlotName::GraphMetrics => self.graph_metrics.is_resolved(),
            SlotName::Temporal => self.temporal.is_resolved(),
            SlotName::Semantic => self.semantic.is_resolved(),
            SlotName::Architecture => self.architecture.is_resolved(),
            SlotName::Field => self.field.is_resolved(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_slot_reads_as_none() {
        let slot: Slot<u32> = Slot::Unset;
        assert_eq!(slot.get(), None);
        assert!(!slot.is_available());
        assert!(!slot.is_resolved());
    }

    #[test]
    fn double_write_rejected() {
        let mut board = Blackboard::default();
        board
            .publish("semantic", SlotValue::Semantic(SemanticSignals::default()))
            .unwrap();
        let err = board
            .publish("rogue", SlotValue::Semantic(SemanticSignals::default()))
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("semantic"), "{text}");
        assert!(text.contains("rogue"), "{text}");
    }

    #[test]
    fn error_then_write_rejected() {
        let mut board = Blackboard::default();
        board
            .record_error("temporal", SlotName::Temporal, "no history")
            .unwrap();
        assert!(board.is_resolved(SlotName::Temporal));
        assert!(!board.is_available(SlotName::Temporal));
        assert!(board
            .publish("temporal", SlotValue::Temporal(TemporalSignals::default()))
            .is_err());
    }

    #[test]
    fn error_reason_surfaced() {
        let mut board = Blackboard::default();
        board
            .record_error("temporal", SlotName::Temporal, "no history provided")
            .unwrap();
        assert_eq!(
            board.temporal.error_reason(),
            Some("no history provided")
        );
    }

    #[test]
    fn slot_value_maps_to_slot_name() {
        assert_eq!(
            SlotValue::Semantic(SemanticSignals::default()).slot(),
            SlotName::Semantic
        );
        assert_eq!(
            SlotValue::Temporal(TemporalSignals::default()).slot(),
            SlotName::Temporal
        );
    }
}
