//! Fusion step 1: assemble the field skeleton from available slots.

use super::FusionContext;
use crate::field::{SignalField, Tier};
use crate::signal::Signal;

#[allow(clippy::cast_precision_loss)]
pub fn collect(ctx: &FusionContext<'_>) -> SignalField {
    let tier = Tier::for_file_count(ctx.files.len(), &ctx.config.analysis);
    let mut field = SignalField::new(tier);

    // Skeleton: one entry per scanned file, one module entry per directory.
    for record in ctx.files {
        let entry = field.files.entry(record.path.clone()).or_default();
        entry.role = record.role;
        entry.module = record.module().to_string();
        field
            .modules
            .entry(record.module().to_string())
            .or_default()
            .files
            .push(record.path.clone());
    }
    for module in field.modules.values_mut() {
        module.files.sort();
    }

    if let Some(metrics) = ctx.metrics {
        field.depth_defined = metrics.depth_defined;
        for (path, &value) in &metrics.pagerank {
            field.set_raw(path, Signal::PageRank, value);
        }
        for (path, &value) in &metrics.betweenness {
            field.set_raw(path, Signal::Betweenness, value);
        }
        for (path, &value) in &metrics.in_degree {
            field.set_raw(path, Signal::InDegree, value as f64);
        }
        for (path, &value) in &metrics.out_degree {
            field.set_raw(path, Signal::OutDegree, value as f64);
        }
        for (path, &value) in &metrics.blast_radius {
            field.set_raw(path, Signal::BlastRadius, value as f64);
        }
        for (path, &value) in &metrics.depth {
            field.set_raw(path, Signal::Depth, f64::from(value));
        }
        for (path, &value) in &metrics.unresolved_imports {
            field.set_raw(path, Signal::UnresolvedImports, value as f64);
        }
        field.set_global(Signal::Modularity, metrics.modularity);
        field.set_global(Signal::SpectralGap, metrics.spectral_gap);
        field.set_global(Signal::CentralityGini, metrics.centrality_gini);
        field.set_global(Signal::CycleCount, metrics.cycle_count() as f64);
    }

    if let Some(semantic) = ctx.semantic {
        for (path, signals) in &semantic.files {
            for (&signal, &value) in signals {
                field.set_raw(path, signal, value);
            }
        }
    }

    if let Some(temporal) = ctx.temporal {
        for (path, signals) in &temporal.files {
            // History may mention files outside the scanned tree; those
            // carry no structural signals and are dropped here.
            if !field.files.contains_key(path) {
                continue;
            }
            for (&signal, &value) in signals {
                field.set_raw(path, signal, value);
            }
        }
    }

    if let Some(architecture) = ctx.architecture {
        for (name, module) in &architecture.modules {
            field.set_module(name, Signal::ModuleCohesion, module.cohesion);
            field.set_module(name, Signal::ModuleCoupling, module.coupling);
            if let Some(instability) = module.instability {
                field.set_module(name, Signal::ModuleInstability, instability);
            }
            if let Some(abstractness) = module.abstractness {
                field.set_module(name, Signal::ModuleAbstractness, abstractness);
            }
        }
    }

    field
}

// ── Tests ──────────────────────────────────────────────────────────
