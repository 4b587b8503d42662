//! Signal fusion: the six-step chain that folds every available slot into
//! the final [`SignalField`].
//!
//! The order is load-bearing — the Laplacian reads the raw risk computed in
//! step 2, percentiles must exist before module aggregates, composites read
//! both. The chain is a typestate: each step consumes the previous state
//! and returns the next, so a reordered or skipped step does not compile.
//!
//! ```text
//! Collector::collect -> Collected -> raw_risk -> RawRisked -> normalize
//!   -> Normalized -> module_temporal -> ModuleAggregated -> composites
//!   -> Composited -> laplacian -> SignalField
//! ```

mod collect;
mod composite;
mod laplacian;
mod percentile;

use auspex_graph::{DependencyGraph, GraphMetrics};

use crate::config::AuspexConfig;
use crate::error::Result;
use crate::field::SignalField;
use crate::slot::{ArchSignals, SemanticSignals, TemporalSignals};
use crate::types::FileRecord;

/// Read-only view of everything fusion may consume. Unavailable slots are
/// `None`; fusion shrinks its output instead of substituting defaults.
#[derive(Debug)]
pub struct FusionContext<'a> {
    pub config: &'a AuspexConfig,
    pub files: &'a [FileRecord],
    pub graph: Option<&'a DependencyGraph>,
    pub metrics: Option<&'a GraphMetrics>,
    pub temporal: Option<&'a TemporalSignals>,
    pub semantic: Option<&'a SemanticSignals>,
    pub architecture: Option<&'a ArchSignals>,
}

#[derive(Debug)]
pub struct Collector;

impl Collector {
    /// Step 1: gather every raw measurement into the field skeleton.
    pub fn collect(ctx: FusionContext<'_>) -> Collected<'_> {
        let field = collect::collect(&ctx);
        Collected { field, ctx }
    }
}

#[derive(Debug)]
pub struct Collected<'a> {
    field: SignalField,
    ctx: FusionContext<'a>,
}

impl<'a> Collected<'a> {
    /// Step 2: un-normalized per-file risk blend, consumed only by step 6.
    pub fn raw_risk(mut self) -> RawRisked<'a> {
        composite::raw_risk(&mut self.field, &self.ctx);
        RawRisked {
            field: self.field,
            ctx: self.ctx,
        }
    }
}

#[derive(Debug)]
pub struct RawRisked<'a> {
    field: SignalField,
    ctx: FusionContext<'a>,
}

impl<'a> RawRisked<'a> {
    /// Step 3: inclusive percentiles for every eligible signal. A no-op at
    /// tier ABSOLUTE; BAYESIAN shrinks toward a 0.5 prior.
    pub fn normalize(mut self) -> Result<Normalized<'a>> {
        percentile::apply(
            &mut self.field,
            self.ctx.config.analysis.bayesian_prior_strength,
        )?;
        Ok(Normalized {
            field: self.field,
            ctx: self.ctx,
        })
    }
}

#[derive(Debug)]
pub struct Normalized<'a> {
    field: SignalField,
    ctx: FusionContext<'a>,
}

impl<'a> Normalized<'a> {
    /// Step 4: module aggregates that need percentiles (bus factor among
    /// high-centrality members, churn totals). Empty at tier ABSOLUTE.
    pub fn module_temporal(mut self) -> ModuleAggregated<'a> {
        composite::module_temporal(&mut self.field);
        ModuleAggregated {
            field: self.field,
            ctx: self.ctx,
        }
    }
}

#[derive(Debug)]
pub struct ModuleAggregated<'a> {
    field: SignalField,
    ctx: FusionContext<'a>,
}

impl<'a> ModuleAggregated<'a> {
    /// Step 5: weighted composites (risk score, wiring quality, module and
    /// global health). Undefined inputs propagate as absence.
    pub fn composites(mut self) -> Composited<'a> {
        composite::composites(&mut self.field, &self.ctx);
        Composited {
            field: self.field,
            ctx: self.ctx,
        }
    }
}

#[derive(Debug)]
pub struct Composited<'a> {
    field: SignalField,
    ctx: FusionContext<'a>,
}

impl Composited<'_> {
    /// Step 6: health Laplacian over the structural neighborhood. Isolated
    /// files get Δh = 0.
    pub fn laplacian(mut self) -> SignalField {
        if let Some(graph) = self.ctx.graph {
            laplacian::apply(&mut self.field, graph);
        }
        self.field.trace_summary();
        self.field
    }
}

/// Run the whole chain in order.
pub fn fuse(ctx: FusionContext<'_>) -> Result<SignalField> {
    Ok(Collector::collect(ctx)
        .raw_risk()
        .normalize()?
        .module_temporal()
        .composites()
        .laplacian())
}
