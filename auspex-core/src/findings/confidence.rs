//! Margin-based confidence.
//!
//! A finding's confidence is the mean margin of its triggered conditions,
//! never a binary flag: a file barely over a threshold produces a weak
//! finding, one far past it a strong one.

/// Margin for "percentile at or above t", with `t` in (0, 1).
pub fn margin_above(pctl: f64, threshold: f64) -> f64 {
    ((pctl - threshold) / (1.0 - threshold)).clamp(0.0, 1.0)
}

/// Inverted-polarity margin for "percentile at or below t", `t` in (0, 1).
pub fn margin_below(pctl: f64, threshold: f64) -> f64 {
    ((threshold - pctl) / threshold).clamp(0.0, 1.0)
}

/// Margin for an unbounded raw value over an absolute threshold: the
/// relative overshoot, saturating at one threshold-width past it.
pub fn margin_over_absolute(value: f64, threshold: f64) -> f64 {
    ((value - threshold) / threshold).clamp(0.0, 1.0)
}

/// Mean of the triggered-condition margins.
pub fn mean(margins: &[f64]) -> f64 {
    if margins.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = margins.len() as f64;
    margins.iter().sum::<f64>() / n
}

// ── Tests ──────────────────────────────────────────────────────────
