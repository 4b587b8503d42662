/// Top-level Auspex error type.
///
/// All fallible operations in `auspex-core` return
/// [`Result<T, AuspexError>`](Result). Each variant wraps a domain-specific
/// error enum, allowing callers to match on the error source without losing
/// type information.
///
/// The taxonomy follows the engine's failure policy: integrity and
/// configuration errors are always fatal (they indicate a builder or wiring
/// bug), while availability gaps never reach this type — producers and
/// finders degrade by shrinking their output instead.
#[derive(thiserror::Error, Debug)]
pub enum AuspexError {
    /// Structural invariant violation (malformed graph, slot double-write).
    /// Always fatal.
    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    /// Orchestrator or settings misconfiguration. Always fatal at startup.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error during signal production or fusion.
    #[error("Analysis error: {0}")]
    Analyze(#[from] AnalyzeError),

    /// Error from the graph engine.
    #[error("Graph engine error: {0}")]
    Graph(#[from] auspex_graph::GraphError),
}

/// Structural invariant violations. These indicate a bug, not a data
/// condition, and halt the run.
#[derive(thiserror::Error, Debug)]
pub enum IntegrityError {
    /// A slot was written twice, or written by an undeclared producer.
    #[error("Slot {slot} already written by {first}, rejected write from {second}")]
    SlotDoubleWrite {
        slot: String,
        first: String,
        second: String,
    },

    /// A producer emitted a value for a slot it never declared.
    #[error("Producer {producer} wrote undeclared slot {slot}")]
    UndeclaredWrite { producer: String, slot: String },

    /// A post-stage validation checkpoint failed.
    #[error("Checkpoint failed after {stage}: {message}")]
    Checkpoint { stage: String, message: String },
}

/// Errors in orchestrator wiring or settings validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Two producers declared the same `provides` slot.
    #[error("Slot {slot} provided by both {first} and {second}")]
    DuplicateProvider {
        slot: String,
        first: String,
        second: String,
    },

    /// The requires/provides graph contains a cycle.
    #[error("Producer dependency cycle: {0}")]
    DependencyCycle(String),

    /// A producer requires a slot nothing provides.
    #[error("Producer {producer} requires slot {slot}, which no producer provides")]
    UnsatisfiedRequire { producer: String, slot: String },

    /// Settings values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors during signal production and fusion.
#[derive(thiserror::Error, Debug)]
pub enum AnalyzeError {
    /// A producer failed in `Fail` error mode.
    #[error("Producer {producer} failed: {message}")]
    ProducerFailed { producer: String, message: String },

    /// A percentile was written for a signal that is not percentile-eligible.
    #[error("Signal {0} is not percentile-eligible")]
    NotPercentileEligible(String),

    /// The run was cancelled at a cooperative checkpoint.
    #[error("Analysis cancelled")]
    Cancelled,

    /// Algorithmic or numerical error during computation.
    #[error("Computation error: {0}")]
    Computation(String),
}

/// Convenience alias for `Result<T, AuspexError>`.
pub type Result<T> = std::result::Result<T, AuspexError>;
