// Structural clone detection via normalized compression distance.
//
// Below `lsh_file_threshold` files, every eligible pair is compared
// directly. At or above it, a MinHash-LSH pre-filter over shingled token
// streams keeps the comparison sub-quadratic; exact NCD runs only on
// bucket-sharing survivors.
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

use std::collections::HashMap;
use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xxhash_rust::xxh64::xxh64;

use crate::NodeRole;

/// Tuning knobs for clone detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneConfig {
    /// Pairs with NCD below this are reported as clones.
    pub ncd_threshold: f64,
    /// File count at which the LSH pre-filter activates.
    pub lsh_file_threshold: usize,
    /// Tokens per shingle.
    pub shingle_size: usize,
    /// LSH bands.
    pub bands: usize,
    /// MinHash rows per band.
    pub rows: usize,
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            ncd_threshold: 0.35,
            lsh_file_threshold: 1000,
            shingle_size: 4,
            bands: 16,
            rows: 8,
        }
    }
}

/// One file's content handed to the clone detector.
#[derive(Debug, Clone)]
pub struct CloneSource {
    pub path: String,
    pub content: String,
    pub role: NodeRole,
}

/// A detected clone pair, `a < b` lexicographically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClonePair {
    pub a: String,
    pub b: String,
    pub ncd: f64,
}

/// Detect structural clone pairs among `sources`.
///
/// Pairs where both sides are test or migration role are excluded from
/// candidacy. Results are sorted by ascending NCD, then path pair.
pub fn detect_clones(sources: &[CloneSource], config: &CloneConfig) -> Vec<ClonePair> {
    let prepared: Vec<Prepared> = sources
        .par_iter()
        .map(|s| {
            let normalized = normalize(&s.content);
            let compressed_len = compressed_len(normalized.as_bytes());
            Prepared {
                path: s.path.as_str(),
                normalized,
                role: s.role,
                compressed_len,
            }
        })
        .collect();

    let candidates: Vec<(usize, usize)> = if prepared.len() >= config.lsh_file_threshold {
        lsh_candidates(&prepared, config)
    } else {
        all_pairs(prepared.len())
    };

    debug!(
        files = prepared.len(),
        candidates = candidates.len(),
        lsh = prepared.len() >= config.lsh_file_threshold,
        "Clone candidate pairs selected"
    );

    let mut pairs: Vec<ClonePair> = candidates
        .into_par_iter()
        .filter(|&(i, j)| {
            !(prepared[i].role.exempt_from_clones() && prepared[j].role.exempt_from_clones())
        })
        .filter_map(|(i, j)| {
            let ncd = ncd(&prepared[i], &prepared[j]);
            (ncd < config.ncd_threshold).then(|| {
                let (a, b) = if prepared[i].path <= prepared[j].path {
                    (prepared[i].path, prepared[j].path)
                } else {
                    (prepared[j].path, prepared[i].path)
                };
                ClonePair {
                    a: a.to_string(),
                    b: b.to_string(),
                    ncd,
                }
            })
        })
        .collect();

    pairs.sort_by(|x, y| {
        x.ncd
            .partial_cmp(&y.ncd)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| x.a.cmp(&y.a))
            .then_with(|| x.b.cmp(&y.b))
    });
    pairs
}

struct Prepared<'a> {
    path: &'a str,
    normalized: String,
    role: NodeRole,
    compressed_len: usize,
}

impl std::fmt::Debug for Prepared<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prepared").field("path", &self.path).finish()
    }
}

// ── Normalization ──────────────────────────────────────────────────

/// Identifier-insensitive token stream: words collapse to `w`, numbers to
/// `0`, whitespace runs to a single space; punctuation is kept. Two files
/// differing only in identifier names normalize to identical streams.
fn normalize(content: &str) -> String {
    let mut out = String::with_capacity(content.len() / 2);
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_alphabetic() || c == '_' {
            while chars
                .peek()
                .is_some_and(|&n| n.is_alphanumeric() || n == '_')
            {
                chars.next();
            }
            out.push('w');
        } else if c.is_ascii_digit() {
            while chars.peek().is_some_and(char::is_ascii_digit) {
                chars.next();
            }
            out.push('0');
        } else if c.is_whitespace() {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
            if !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
    out
}

// ── NCD ────────────────────────────────────────────────────────────

fn compressed_len(bytes: &[u8]) -> usize {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    // Writing to a Vec cannot fail
    let _ = encoder.write_all(bytes);
    encoder.finish().map_or(0, |v| v.len())
}

/// `NCD(a, b) = (C(ab) − min(C(a), C(b))) / max(C(a), C(b))`.
fn ncd(a: &Prepared<'_>, b: &Prepared<'_>) -> f64 {
    let ca = a.compressed_len;
    let cb = b.compressed_len;
    if ca.max(cb) == 0 {
        return 0.0;
    }
    let mut joined = Vec::with_capacity(a.normalized.len() + b.normalized.len());
    joined.extend_from_slice(a.normalized.as_bytes());
    joined.extend_from_slice(b.normalized.as_bytes());
    let cab = compressed_len(&joined);

    (cab.saturating_sub(ca.min(cb))) as f64 / ca.max(cb) as f64
}

// ── LSH pre-filter ─────────────────────────────────────────────────

fn all_pairs(n: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push((i, j));
        }
    }
    pairs
}

/// Candidate pairs sharing at least one LSH bucket.
fn lsh_candidates(prepared: &[Prepared<'_>], config: &CloneConfig) -> Vec<(usize, usize)> {
    let signatures: Vec<Vec<u64>> = prepared
        .par_iter()
        .map(|p| minhash_signature(&p.normalized, config))
        .collect();

    let mut buckets: HashMap<(usize, u64), Vec<usize>> = HashMap::new();
    for (idx, signature) in signatures.iter().enumerate() {
        for band in 0..config.bands {
            let start = band * config.rows;
            let slice = &signature[start..start + config.rows];
            let mut bytes = Vec::with_capacity(config.rows * 8);
            for v in slice {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
            let bucket = xxh64(&bytes, band as u64);
            buckets.entry((band, bucket)).or_default().push(idx);
        }
    }

    let mut pairs: Vec<(usize, usize)> = buckets
        .into_values()
        .filter(|members| members.len() > 1)
        .flat_map(|members| {
            let mut local = Vec::new();
            for (a, &i) in members.iter().enumerate() {
                for &j in &members[a + 1..] {
                    local.push((i.min(j), i.max(j)));
                }
            }
            local
        })
        .collect();
    pairs.sort_unstable();
    pairs.dedup();
    pairs
}

fn minhash_signature(normalized: &str, config: &CloneConfig) -> Vec<u64> {
    let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();
    let hashes = config.bands * config.rows;

    let shingles: Vec<u64> = if tokens.len() < config.shingle_size {
        vec![xxh64(normalized.as_bytes(), 0)]
    } else {
        tokens
            .windows(config.shingle_size)
            .map(|w| xxh64(w.join(" ").as_bytes(), 0))
            .collect()
    };

    (0..hashes as u64)
        .map(|seed| {
            shingles
                .iter()
                .map(|&s| xxh64(&s.to_le_bytes(), seed))
                .min()
                .unwrap_or(u64::MAX)
        })
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const LEFT: &str = r#"
fn process_orders(orders: &[Order]) -> Vec<Receipt> {
    let mut receipts = Vec::new();
    for order in orders {
        if order.total > 100 {
            receipts.push(Receipt::discounted(order, 10));
        } else {
            receipts.push(Receipt::standard(order));
        }
    }
    receipts
}
"#;

    // Byte-identical to LEFT except for renamed identifiers
    const RIGHT: &str = r#"
fn handle_invoices(invoices: &[Invoice]) -> Vec<Summary> {
    let mut summaries = Vec::new();
    for invoice in invoices {
        if invoice.amount > 900 {
            summaries.push(Summary::reduced(invoice, 25));
        } else {
            summaries.push(Summary::normal(invoice));
        }
    }
    summaries
}
"#;

    const LICENSE: &str = "// Copyright 2026 Example Corp.\n// Licensed under the MIT license.\n// See LICENSE for details.\n\n";

    fn source(path: &str, content: &str) -> CloneSource {
        CloneSource {
            path: path.to_string(),
            content: content.to_string(),
            role: NodeRole::Regular,
        }
    }

    #[test]
    fn normalization_erases_identifier_names() {
        assert_eq!(normalize(LEFT), normalize(RIGHT));
    }

    #[test]
    fn renamed_identifier_clone_detected() {
        let pairs = detect_clones(
            &[source("a.rs", LEFT), source("b.rs", RIGHT)],
            &CloneConfig::default(),
        );
        assert_eq!(pairs.len(), 1, "renamed clone should be detected");
        assert_eq!(pairs[0].a, "a.rs");
        assert_eq!(pairs[0].b, "b.rs");
        assert!(pairs[0].ncd < 0.35);
    }

    #[test]
    fn shared_license_header_is_not_a_clone() {
        let a = format!("{LICENSE}\nfn alpha() {{ let x = parse(input); emit(x); }}\n");
        let b = format!(
            "{LICENSE}\nstruct Config {{ retries: u32, timeout_ms: u64, verbose: bool, endpoints: Vec<String>, headers: std::collections::HashMap<String, String> }}\n\nimpl Config {{ fn merge(&mut self, other: &Config) {{ self.retries = self.retries.max(other.retries); self.timeout_ms = other.timeout_ms; for e in &other.endpoints {{ if !self.endpoints.contains(e) {{ self.endpoints.push(e.clone()); }} }} }} }}\n"
        );
        let pairs = detect_clones(
            &[source("a.rs", &a), source("b.rs", &b)],
            &CloneConfig::default(),
        );
        assert!(
            pairs.is_empty(),
            "license-header overlap must not flag a clone: {pairs:?}"
        );
    }

    #[test]
    fn test_role_pairs_excluded() {
        let mut a = source("tests/a.rs", LEFT);
        let mut b = source("tests/b.rs", RIGHT);
        a.role = NodeRole::Test;
        b.role = NodeRole::Test;
        let pairs = detect_clones(&[a, b], &CloneConfig::default());
        assert!(pairs.is_empty(), "test/test pairs are not candidates");
    }

    #[test]
    fn mixed_role_pair_still_candidate() {
        let mut a = source("tests/a.rs", LEFT);
        a.role = NodeRole::Test;
        let b = source("src/b.rs", RIGHT);
        let pairs = detect_clones(&[a, b], &CloneConfig::default());
        assert_eq!(pairs.len(), 1, "only both-sides-excluded pairs are skipped");
    }

    #[test]
    fn lsh_prefilter_still_finds_identical_pair() {
        // Force the LSH path with a tiny activation threshold
        let config = CloneConfig {
            lsh_file_threshold: 3,
            ..CloneConfig::default()
        };
        let mut sources = vec![source("a.rs", LEFT), source("b.rs", RIGHT)];
        for i in 0..8 {
            sources.push(source(
                &format!("noise{i}.rs"),
                &format!(
                    "pub const TABLE_{i}: [u16; 4] = [{i}, {}, {}, {}];\n",
                    i * 3,
                    i * 5 + 1,
                    i * 7 + 2
                ),
            ));
        }
        let pairs = detect_clones(&sources, &config);
        assert!(
            pairs.iter().any(|p| p.a == "a.rs" && p.b == "b.rs"),
            "LSH path should surface the clone pair: {pairs:?}"
        );
    }

    #[test]
    fn empty_input() {
        assert!(detect_clones(&[], &CloneConfig::default()).is_empty());
    }

    #[test]
    fn identical_files_have_near_zero_ncd() {
        let pairs = detect_clones(
            &[source("a.rs", LEFT), source("b.rs", LEFT)],
            &CloneConfig::default(),
        );
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].ncd < 0.1, "identical NCD was {}", pairs[0].ncd);
    }
}
