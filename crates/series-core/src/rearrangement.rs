//! Rearrangement theorem: partial sums of a base sequence versus a random
//! permutation of the same terms.
//!
//! An absolutely convergent series sums to the same value under every
//! permutation. A conditionally convergent one carries no such guarantee
//! (Riemann), so the conditional mode only ever reports a caveat.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::Serialize;

use crate::constants::{REARRANGEMENT_GEOMETRIC_BASE, REARRANGEMENT_TERMS};
use crate::sums::{alternating_sign, partial_sums};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RearrangementMode {
    /// a_n = 1.5^-n
    #[default]
    Absolute,
    /// a_n = (-1)^(n+1) / n
    Conditional,
}

impl RearrangementMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RearrangementMode::Absolute => "absolute",
            RearrangementMode::Conditional => "conditional",
        }
    }

    /// Reader-facing caveat for modes without a sum-preservation guarantee.
    pub fn caveat(self) -> Option<&'static str> {
        match self {
            RearrangementMode::Absolute => None,
            RearrangementMode::Conditional => Some(
                "Warning: rearranging a conditionally convergent series may change its sum \
                 or even make it diverge (Riemann rearrangement theorem).",
            ),
        }
    }
}

impl fmt::Display for RearrangementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RearrangementMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "absolute" => Ok(RearrangementMode::Absolute),
            "conditional" => Ok(RearrangementMode::Conditional),
            other => Err(format!(
                "mode must be 'absolute' or 'conditional', got '{other}'"
            )),
        }
    }
}

/// Base terms a_1..a_N for the given mode.
pub fn base_terms(mode: RearrangementMode, terms: usize) -> Vec<f64> {
    (1..=terms)
        .map(|n| match mode {
            RearrangementMode::Absolute => REARRANGEMENT_GEOMETRIC_BASE.powi(-(n as i32)),
            RearrangementMode::Conditional => alternating_sign(n) / n as f64,
        })
        .collect()
}

/// Uniform random permutation of `0..len` (Fisher-Yates, last index down to 1).
pub fn random_permutation(len: usize, rng: &mut impl Rng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    for i in (1..len).rev() {
        let j = rng.random_range(0..=i);
        order.swap(i, j);
    }
    order
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PartialSumRecord {
    pub n: usize,
    pub sum: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RearrangementSeries {
    pub mode: RearrangementMode,
    pub terms: Vec<f64>,
    /// `shuffled[k] == terms[permutation[k]]`
    pub permutation: Vec<usize>,
    pub shuffled: Vec<f64>,
    pub original: Vec<PartialSumRecord>,
    pub rearranged: Vec<PartialSumRecord>,
}

impl RearrangementSeries {
    pub fn original_total(&self) -> f64 {
        self.original.last().map_or(0.0, |r| r.sum)
    }

    pub fn rearranged_total(&self) -> f64 {
        self.rearranged.last().map_or(0.0, |r| r.sum)
    }

    /// |final original sum - final rearranged sum|
    pub fn final_gap(&self) -> f64 {
        (self.original_total() - self.rearranged_total()).abs()
    }
}

fn to_records(sums: Vec<f64>) -> Vec<PartialSumRecord> {
    sums.into_iter()
        .enumerate()
        .map(|(i, sum)| PartialSumRecord { n: i + 1, sum })
        .collect()
}

/// Build base terms, draw a fresh permutation, and accumulate both orderings.
pub fn compute(mode: RearrangementMode, rng: &mut impl Rng) -> RearrangementSeries {
    let terms = base_terms(mode, REARRANGEMENT_TERMS);
    let permutation = random_permutation(terms.len(), rng);
    let shuffled: Vec<f64> = permutation.iter().map(|&i| terms[i]).collect();

    let original = to_records(partial_sums(&terms));
    let rearranged = to_records(partial_sums(&shuffled));

    RearrangementSeries {
        mode,
        terms,
        permutation,
        shuffled,
        original,
        rearranged,
    }
}
