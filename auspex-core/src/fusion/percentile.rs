//! Fusion step 3: inclusive percentile normalization.
//!
//! `pctl(f) = |{g : v(g) <= v(f)}| / N` over the files that carry the
//! signal. Inclusive comparison matters: an exclusive variant shifts every
//! threshold and makes the maximum unreachable. At BAYESIAN tier the
//! percentile is shrunk toward a 0.5 prior with strength `k / (k + N)`.

use crate::error::Result;
use crate::field::{SignalField, Tier};
use crate::signal::Signal;

#[allow(clippy::cast_precision_loss)]
pub fn apply(field: &mut SignalField, prior_strength: f64) -> Result<()> {
    if field.tier == Tier::Absolute {
        return Ok(());
    }
    for &signal in Signal::ALL {
        if !signal.percentile_eligible() {
            continue;
        }
        let carriers: Vec<(String, f64)> = field
            .files
            .iter()
            .filter_map(|(path, signals)| {
                signals.raw.get(&signal).map(|&v| (path.clone(), v))
            })
            .collect();
        let n = carriers.len();
        if n == 0 {
            continue;
        }
        let mut sorted: Vec<f64> = carriers.iter().map(|(_, v)| *v).collect();
        sorted.sort_by(f64::total_cmp);
        for (path, value) in &carriers {
            let at_or_below = sorted.partition_point(|x| *x <= *value);
            let mut pctl = at_or_below as f64 / n as f64;
            if field.tier == Tier::Bayesian {
                pctl = (prior_strength * 0.5 + n as f64 * pctl) / (prior_strength + n as f64);
            }
            field.set_percentile(path, signal, pctl)?;
        }
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn field_with(tier: Tier, values: &[(&str, f64)]) -> SignalField {
        let mut field = SignalField::new(tier);
        for (path, value) in values {
            field.set_raw(path, Signal::PageRank, *value);
        }
        field
    }

    #[test]
    fn absolute_tier_is_a_no_op() {
        let mut field = field_with(Tier::Absolute, &[("a", 1.0), ("b", 2.0)]);
        apply(&mut field, 10.0).unwrap();
        assert!(field.files.values().all(|f| f.percentiles.is_empty()));
    }

    #[test]
    fn inclusive_percentile_bounds() {
        // Minimum is 1/N (the file counts itself), maximum exactly 1.0
        let mut field = field_with(
            Tier::Full,
            &[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)],
        );
        apply(&mut field, 10.0).unwrap();
        assert!((field.percentile("a", Signal::PageRank).unwrap() - 0.25).abs() < 1e-12);
        assert!((field.percentile("d", Signal::PageRank).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ties_share_the_inclusive_count() {
        let mut field = field_with(Tier::Full, &[("a", 5.0), ("b", 5.0), ("c", 1.0)]);
        apply(&mut field, 10.0).unwrap();
        let pa = field.percentile("a", Signal::PageRank).unwrap();
        let pb = field.percentile("b", Signal::PageRank).unwrap();
        assert!((pa - pb).abs() < 1e-12);
        assert!((pa - 1.0).abs() < 1e-12);
    }

    #[test]
    fn bayesian_shrinks_toward_half() {
        let values: Vec<(String, f64)> =
            (0..20).map(|i| (format!("f{i}"), f64::from(i))).collect();
        let refs: Vec<(&str, f64)> = values.iter().map(|(p, v)| (p.as_str(), *v)).collect();
        let mut full = field_with(Tier::Full, &refs);
        let mut shrunk = field_with(Tier::Bayesian, &refs);
        apply(&mut full, 10.0).unwrap();
        apply(&mut shrunk, 10.0).unwrap();
        let top_full = full.percentile("f19", Signal::PageRank).unwrap();
        let top_shrunk = shrunk.percentile("f19", Signal::PageRank).unwrap();
        assert!((top_full - 1.0).abs() < 1e-12);
        // (10*0.5 + 20*1.0) / 30
        assert!((top_shrunk - 25.0 / 30.0).abs() < 1e-12);
        assert!(top_shrunk < top_full);
    }

    proptest::proptest! {
        #[test]
        fn percentiles_stay_in_unit_interval(values in proptest::collection::vec(-1e6f64..1e6, 1..40)) {
            let named: Vec<(String, f64)> = values
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("f{i}"), *v))
                .collect();
            let refs: Vec<(&str, f64)> = named.iter().map(|(p, v)| (p.as_str(), *v)).collect();
            let mut field = field_with(Tier::Full, &refs);
            apply(&mut field, 10.0).unwrap();
            for signals in field.files.values() {
                for &p in signals.percentiles.values() {
                    proptest::prop_assert!(p > 0.0 && p <= 1.0);
                }
            }
        }
    }
}
