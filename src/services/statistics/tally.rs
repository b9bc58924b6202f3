//! Keyed accumulators used by the statistics engine.
//!
//! Both types insert missing keys with a zero value, so gap-filling a range is
//! just a matter of calling `ensure` for every key in it.

use std::collections::BTreeMap;

/// Renders `sum / count` with two decimals, or `"0.00"` when `count` is zero
pub fn two_decimals(sum: f64, count: u64) -> String {
    if count == 0 {
        return fixed_two(0.0);
    }
    fixed_two(sum / count as f64)
}

/// Formats with two decimals, breaking exact ties away from zero
///
/// `{:.2}` rounds exact ties to even. Everything else already rounds to the
/// nearest representable digits, so `1.005` (stored just below) stays `1.00`.
fn fixed_two(value: f64) -> String {
    // A double sits exactly halfway between two cents only when it is an odd
    // multiple of 1/8 (x.125, x.375, x.625, x.875).
    let eighths = value * 8.0;
    let is_tie = value.abs() < 1e15 && eighths.fract() == 0.0 && eighths % 2.0 != 0.0;
    if !is_tie {
        return format!("{:.2}", value);
    }

    // Exact: an odd multiple of 1/8 times 100 is a multiple of 0.5
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, cents / 100, cents % 100)
}

/// Occurrence counter keyed by an ordered type
#[derive(Debug, Clone)]
pub struct Tally<K> {
    counts: BTreeMap<K, u64>,
}

impl<K: Ord> Default for Tally<K> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }
}

impl<K: Ord> Tally<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: K) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    /// Makes `key` present without changing an existing count
    pub fn ensure(&mut self, key: K) {
        self.counts.entry(key).or_insert(0);
    }

    pub fn into_counts(self) -> BTreeMap<K, u64> {
        self.counts
    }
}

/// Running mean of a stream of values
#[derive(Debug, Clone, Copy, Default)]
pub struct Mean {
    sum: f64,
    count: u64,
}

impl Mean {
    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn render(&self) -> String {
        two_decimals(self.sum, self.count)
    }
}

/// Per-key running means
#[derive(Debug, Clone)]
pub struct MeanBy<K> {
    means: BTreeMap<K, Mean>,
}

impl<K: Ord> Default for MeanBy<K> {
    fn default() -> Self {
        Self {
            means: BTreeMap::new(),
        }
    }
}

impl<K: Ord> MeanBy<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: K, value: f64) {
        self.means.entry(key).or_default().push(value);
    }

    /// Makes `key` present with an empty mean
    pub fn ensure(&mut self, key: K) {
        self.means.entry(key).or_default();
    }

    pub fn into_rendered(self) -> BTreeMap<K, String> {
        self.means
            .into_iter()
            .map(|(key, mean)| (key, mean.render()))
            .collect()
    }
}
