//! Fusion steps 2, 4, and 5: raw risk, module temporal aggregates, and the
//! weighted composites.

use std::collections::BTreeMap;

use super::FusionContext;
use crate::field::{SignalField, Tier};
use crate::signal::Signal;

// ── Step 2: raw risk ───────────────────────────────────────────────

/// Un-normalized weighted risk blend per file. Each structural component is
/// scaled by its run-wide maximum so the blend is comparable across files;
/// missing components contribute zero. Consumed only by the Laplacian.
pub fn raw_risk(field: &mut SignalField, ctx: &FusionContext<'_>) {
    let centrality = max_scaled(field, Signal::PageRank);
    let blast = max_scaled(field, Signal::BlastRadius);
    let cognitive = max_scaled(field, Signal::CognitiveLoad);
    let weights = &ctx.config.fusion.raw_risk;

    for (path, signals) in &mut field.files {
        let churn = ctx
            .temporal
            .and_then(|t| t.trajectories.get(path))
            .map_or(0.0, |t| t.risk_weight());
        let bus = signals
            .raw
            .get(&Signal::BusFactor)
            .map_or(0.0, |&b| if b >= 1.0 { 1.0 / b } else { 0.0 });
        signals.raw_risk = weights.centrality * centrality.get(path).copied().unwrap_or(0.0)
            + weights.blast_radius * blast.get(path).copied().unwrap_or(0.0)
            + weights.cognitive_load * cognitive.get(path).copied().unwrap_or(0.0)
            + weights.churn * churn
            + weights.bus_factor * bus;
    }
}

fn max_scaled(field: &SignalField, signal: Signal) -> BTreeMap<String, f64> {
    let max = field
        .files
        .values()
        .filter_map(|f| f.raw.get(&signal))
        .copied()
        .fold(0.0f64, f64::max);
    if max <= 0.0 {
        return BTreeMap::new();
    }
    field
        .files
        .iter()
        .filter_map(|(path, f)| {
            f.raw.get(&signal).map(|&v| (path.clone(), v / max))
        })
        .collect()
}

// ── Step 4: module temporal aggregates ─────────────────────────────

/// Module bus factor = minimum bus factor among the module's
/// high-centrality files (pagerank percentile >= 0.5), plus churn totals.
/// Requires percentiles, so a no-op at tier ABSOLUTE.
pub fn module_temporal(field: &mut SignalField) {
    if field.tier == Tier::Absolute {
        return;
    }
    let memberships: Vec<(String, Vec<String>)> = field
        .modules
        .iter()
        .map(|(name, m)| (name.clone(), m.files.clone()))
        .collect();

    for (name, files) in memberships {
        let mut min_bus: Option<f64> = None;
        let mut changes_total = 0.0;
        let mut changes_seen = false;
        for path in &files {
            let Some(signals) = field.files.get(path) else {
                continue;
            };
            if let Some(&changes) = signals.raw.get(&Signal::TotalChanges) {
                changes_total += changes;
                changes_seen = true;
            }
            let central = signals
                .percentiles
                .get(&Signal::PageRank)
                .is_some_and(|&p| p >= 0.5);
            if central {
                if let Some(&bus) = signals.raw.get(&Signal::BusFactor) {
                    min_bus = Some(min_bus.map_or(bus, |m: f64| m.min(bus)));
                }
            }
        }
        if let Some(bus) = min_bus {
            field.set_module(&name, Signal::ModuleBusFactor, bus);
        }
        if changes_seen {
            field.set_module(&name, Signal::ModuleTotalChanges, changes_total);
        }
    }
}

// ── Step 5: composites ─────────────────────────────────────────────

/// Percentile-space risk score, wiring quality, main-sequence distance, and
/// the health roll-ups. Undefined inputs propagate as absence.
#[allow(clippy::cast_precision_loss)]
pub fn composites(field: &mut SignalField, ctx: &FusionContext<'_>) {
    if field.tier != Tier::Absolute {
        file_risk_scores(field, ctx);
    }

    if let Some(metrics) = ctx.metrics.filter(|_| !field.files.is_empty()) {
        let n = field.files.len() as f64;
        let in_cycles = metrics.files_in_cycles().count() as f64;
        let orphan_count = metrics.is_orphan.values().filter(|&&o| o).count() as f64;
        let weights = &ctx.config.fusion.wiring;
        let wiring = weights.modularity * metrics.modularity.clamp(0.0, 1.0)
            + weights.spectral_gap * metrics.spectral_gap.clamp(0.0, 1.0)
            + weights.cycle_penalty * (1.0 - (in_cycles / n).min(1.0))
            + weights.orphan_penalty * (1.0 - (orphan_count / n).min(1.0));
        field.set_global(Signal::WiringQuality, wiring);
    }

    main_sequence(field);
    module_health(field);
    global_health(field);
}

fn file_risk_scores(field: &mut SignalField, ctx: &FusionContext<'_>) {
    let weights = &ctx.config.fusion.risk_score;
    let paths: Vec<String> = field.files.keys().cloned().collect();
    for path in paths {
        let mut score = 0.0;
        let mut covered = 0.0;
        let mut component = |pctl: Option<f64>, weight: f64, inverted: bool| {
            if let Some(p) = pctl {
                score += weight * if inverted { 1.0 - p } else { p };
                covered += weight;
            }
        };
        component(field.percentile(&path, Signal::PageRank), weights.centrality, false);
        component(
            field.percentile(&path, Signal::BlastRadius),
            weights.blast_radius,
            false,
        );
        component(
            field.percentile(&path, Signal::CognitiveLoad),
            weights.cognitive_load,
            false,
        );
        component(field.percentile(&path, Signal::TotalChanges), weights.churn, false);
        // Low bus factor is the risk, so the percentile is inverted
        component(field.percentile(&path, Signal::BusFactor), weights.bus_factor, true);
        component(field.percentile(&path, Signal::FixRatio), weights.fix_ratio, false);
        if covered > 0.0 {
            field.set_raw(&path, Signal::RiskScore, score / covered);
        }
    }
}

/// Main-sequence distance |A + I − 1| per module. Undefined instability or
/// abstractness leaves the signal absent.
fn main_sequence(field: &mut SignalField) {
    let modules: Vec<String> = field.modules.keys().cloned().collect();
    for name in modules {
        let instability = field.module_raw(&name, Signal::ModuleInstability);
        let abstractness = field.module_raw(&name, Signal::ModuleAbstractness);
        if let (Some(i), Some(a)) = (instability, abstractness) {
            field.set_module(&name, Signal::ModuleMainSeqDistance, (a + i - 1.0).abs());
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn module_health(field: &mut SignalField) {
    let memberships: Vec<(String, Vec<String>)> = field
        .modules
        .iter()
        .map(|(name, m)| (name.clone(), m.files.clone()))
        .collect();
    for (name, files) in memberships {
        let risks: Vec<f64> = files
            .iter()
            .filter_map(|path| field.raw(path, Signal::RiskScore))
            .collect();
        if risks.is_empty() {
            continue;
        }
        let mean_risk = risks.iter().sum::<f64>() / risks.len() as f64;
        field.set_module(&name, Signal::ModuleHealth, 1.0 - mean_risk);
    }
}

#[allow(clippy::cast_precision_loss)]
fn global_health(field: &mut SignalField) {
    let wiring = field.global_raw(Signal::WiringQuality);
    let risks: Vec<f64> = field
        .files
        .values()
        .filter_map(|f| f.raw.get(&Signal::RiskScore).copied())
        .collect();
    let mean_risk = if risks.is_empty() {
        None
    } else {
        Some(risks.iter().sum::<f64>() / risks.len() as f64)
    };
    let health = match (wiring, mean_risk) {
        (Some(w), Some(r)) => Some(0.5 * w + 0.5 * (1.0 - r)),
        (Some(w), None) => Some(w),
        (None, Some(r)) => Some(1.0 - r),
        (None, None) => None,
    };
    if let Some(h) = health {
        field.set_global(Signal::GlobalHealth, h);
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuspexConfig;

    fn empty_ctx<'a>(config: &'a AuspexConfig) -> FusionContext<'a> {
        FusionContext {
            config,
            files: &[],
            graph: None,
            metrics: None,
            temporal: None,
            semantic: None,
            architecture: None,
        }
    }

    #[test]
    fn raw_risk_zero_when_no_signals() {
        let config = AuspexConfig::default();
        let ctx = empty_ctx(&config);
        let mut field = SignalField::new(Tier::Full);
        field.files.entry("a.rs".to_string()).or_default();
        raw_risk(&mut field, &ctx);
        assert!(field.files["a.rs"].raw_risk.abs() < 1e-12);
    }

    #[test]
    fn raw_risk_orders_by_centrality() {
        let config = AuspexConfig::default();
        let ctx = empty_ctx(&config);
        let mut field = SignalField::new(Tier::Full);
        field.set_raw("hub.rs", Signal::PageRank, 0.8);
        field.set_raw("leaf.rs", Signal::PageRank, 0.1);
        raw_risk(&mut field, &ctx);
        assert!(field.files["hub.rs"].raw_risk > field.files["leaf.rs"].raw_risk);
    }

    #[test]
    fn module_bus_factor_is_min_over_central_files() {
        let mut field = SignalField::new(Tier::Full);
        for (path, pr_pctl, bus) in [
            ("m/a.rs", 0.9, 3.0),
            ("m/b.rs", 0.7, 1.0),
            ("m/c.rs", 0.2, 5.0), // below centrality cut, ignored
        ] {
            field.set_raw(path, Signal::BusFactor, bus);
            field.set_percentile(path, Signal::PageRank, pr_pctl).unwrap();
            field
                .modules
                .entry("m".to_string())
                .or_default()
                .files
                .push(path.to_string());
        }
        module_temporal(&mut field);
        assert_eq!(field.module_raw("m", Signal::ModuleBusFactor), Some(1.0));
    }

    #[test]
    fn module_temporal_skipped_at_absolute_tier() {
        let mut field = SignalField::new(Tier::Absolute);
        field.set_raw("m/a.rs", Signal::TotalChanges, 5.0);
        field
            .modules
            .entry("m".to_string())
            .or_default()
            .files
            .push("m/a.rs".to_string());
        module_temporal(&mut field);
        assert_eq!(field.module_raw("m", Signal::ModuleTotalChanges), None);
    }

    #[test]
    fn main_sequence_propagates_undefined_instability() {
        let mut field = SignalField::new(Tier::Full);
        field.set_module("defined", Signal::ModuleInstability, 0.2);
        field.set_module("defined", Signal::ModuleAbstractness, 0.3);
        field.set_module("undefined", Signal::ModuleAbstractness, 0.3);
        main_sequence(&mut field);
        let d = field
            .module_raw("defined", Signal::ModuleMainSeqDistance)
            .unwrap();
        assert!((d - 0.5).abs() < 1e-12);
        assert_eq!(
            field.module_raw("undefined", Signal::ModuleMainSeqDistance),
            None
        );
    }

    #[test]
    fn risk_score_renormalizes_over_available_components() {
        let config = AuspexConfig::default();
        let ctx = empty_ctx(&config);
        let mut field = SignalField::new(Tier::Full);
        // Only centrality available, at the top percentile
        field.set_percentile("a.rs", Signal::PageRank, 1.0).unwrap();
        composites(&mut field, &ctx);
        let score = field.raw("a.rs", Signal::RiskScore).unwrap();
        assert!((score - 1.0).abs() < 1e-12);
    }
}
