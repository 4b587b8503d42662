//! Core data model: external input records, finding output, and the
//! identifiers shared across producers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use auspex_graph::NodeRole;

// ── File records (external input) ──────────────────────────────────

/// Role classification for a source file, as produced by the upstream
/// semantic collaborator. Immutable per analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    EntryPoint,
    Test,
    Migration,
    PackageIndex,
    Model,
    Service,
    Utility,
    Config,
    #[default]
    Unknown,
}

impl FileRole {
    /// Collapse to the role distinctions the graph engine cares about.
    pub fn node_role(self) -> NodeRole {
        match self {
            Self::EntryPoint => NodeRole::EntryPoint,
            Self::Test => NodeRole::Test,
            Self::Migration => NodeRole::Migration,
            Self::PackageIndex => NodeRole::PackageIndex,
            _ => NodeRole::Regular,
        }
    }

    pub fn is_test(self) -> bool {
        self == Self::Test
    }
}

/// One scanned source file — the normalized per-file record produced by the
/// out-of-scope parsing collaborator. Immutable per analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub lines: u32,
    pub functions: u32,
    pub classes: u32,
    /// Declared import strings, unresolved.
    pub imports: Vec<String>,
    /// Declared top-level symbol names.
    pub symbols: Vec<String>,
    pub max_nesting: u32,
    /// Implementation-completeness measure in [0, 1] (1 = no stubs).
    pub completeness: f64,
    pub role: FileRole,
    /// Raw content, carried only for the clone-detection stage.
    pub content: Option<String>,
}

impl FileRecord {
    /// The file's module: its directory path ("" for top-level files).
    pub fn module(&self) -> &str {
        module_of(&self.path)
    }
}

/// Directory part of a path ("" for top-level files).
pub fn module_of(path: &str) -> &str {
    path.rfind('/').map_or("", |i| &path[..i])
}

// ── Git history summary (external input) ───────────────────────────

/// Churn trajectory classification over a file's commit history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChurnTrajectory {
    Rising,
    Falling,
    Stable,
    Spike,
    Dormant,
}

impl ChurnTrajectory {
    /// Risk weight of the trajectory shape, used by the raw-risk blend.
    pub fn risk_weight(self) -> f64 {
        match self {
            Self::Rising => 1.0,
            Self::Spike => 0.8,
            Self::Stable => 0.5,
            Self::Falling => 0.3,
            Self::Dormant => 0.1,
        }
    }
}

/// Per-file history measurements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileHistory {
    pub total_changes: u32,
    pub trajectory: ChurnTrajectory,
    /// Monthly churn regression slope.
    pub churn_slope: f64,
    /// Coefficient of variation of per-month churn.
    pub churn_cv: f64,
    /// Minimum authors controlling >80% of changes.
    pub bus_factor: u32,
    /// Shannon entropy of the per-author commit distribution.
    pub author_entropy: f64,
    /// Share of commits classified as fixes.
    pub fix_ratio: f64,
    /// Share of commits classified as refactors.
    pub refactor_ratio: f64,
    pub last_touched: Option<DateTime<Utc>>,
}

/// Co-change association between a file pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoChangePair {
    pub a: String,
    pub b: String,
    /// Association lift: P(a,b) / (P(a)·P(b)).
    pub lift: f64,
    /// P(b changes | a changes).
    pub confidence: f64,
    /// Commits touching both.
    pub support: u32,
}

/// Collaboration distance between the author sets of two files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorDistance {
    pub a: String,
    pub b: String,
    /// 1 − Jaccard overlap of author sets, in [0, 1].
    pub distance: f64,
}

/// Version-control history, pre-summarized by the out-of-scope git
/// collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHistorySummary {
    pub files: BTreeMap<String, FileHistory>,
    pub co_changes: Vec<CoChangePair>,
    pub author_distances: Vec<AuthorDistance>,
    pub author_count: u32,
    pub commit_count: u32,
}

impl GitHistorySummary {
    /// True when author-correlation signals are degenerate (≤1 author).
    pub fn solo_author(&self) -> bool {
        self.author_count <= 1
    }
}

// ── Architecture summary (optional external input) ─────────────────

/// Per-module architecture measurements from the optional external
/// architecture collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleArchRecord {
    pub cohesion: f64,
    pub coupling: f64,
    /// `None` when the module has no cross-module edges (Ca + Ce = 0);
    /// undefined instability must propagate, never default to 0.
    pub instability: Option<f64>,
    pub abstractness: f64,
    pub layer: Option<String>,
}

/// A dependency from a lower layer into a higher one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayeringViolation {
    pub from_module: String,
    pub to_module: String,
    pub from_layer: String,
    pub to_layer: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchitectureSummary {
    pub modules: BTreeMap<String, ModuleArchRecord>,
    pub violations: Vec<LayeringViolation>,
}

// ── Findings (output) ──────────────────────────────────────────────

/// The fixed finding catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    RiskHub,
    WeakLink,
    CircularDependency,
    PhantomImports,
    OrphanedFile,
    StructuralClone,
    DeepDependencyChain,
    CognitiveOverload,
    StubImplementation,
    BusFactorRisk,
    KnowledgeSilo,
    ChurnSpike,
    FixHotspot,
    RefactorChurn,
    ShotgunSurgery,
    AuthorFragmentation,
    ZoneOfPain,
    UnstableFoundation,
    LayeringViolation,
    FragmentedCommunity,
    CentralityInequality,
    SpectralFragility,
    LowHealthModule,
}

/// What a finding points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingScope {
    File,
    FilePair,
    Module,
    ModulePair,
    Codebase,
}

/// One measurement backing a finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub signal: crate::signal::Signal,
    pub value: f64,
    pub percentile: Option<f64>,
}

/// A ranked detection result. Created fresh each run; never mutated after
/// creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub scope: FindingScope,
    /// Base severity constant of the kind, in [0, 1].
    pub severity: f64,
    /// Margin-derived confidence in [0, 1].
    pub confidence: f64,
    /// Target identifiers (file paths, module paths, or empty for codebase
    /// scope).
    pub targets: Vec<String>,
    pub evidence: Vec<Evidence>,
    pub suggestion: String,
}

impl Finding {
    /// Ranking key: severity × confidence.
    pub fn rank(&self) -> f64 {
        self.severity * self.confidence
    }
}

/// The complete output of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub field: crate::field::SignalField,
    pub findings: Vec<Finding>,
    pub computed_at: DateTime<Utc>,
}

// ── Tests ──────────────────────────────────────────────────────────
