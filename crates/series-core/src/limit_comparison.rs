//! Limit comparison test: a target series a_n measured against the
//! reference p-series b_n = n^-p.
//!
//! Three regimes simulate the three possible limits of a_n / b_n
//! (a positive constant c, zero, infinity). The verdict is a fixed
//! decision table over (regime, reference converges).

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::Serialize;

use crate::constants::{
    EXPONENT_P, INFINITY_PRESET_P, INFINITY_REGIME_GROWTH, LIMIT_COMPARISON_DEFAULT_TERMS,
    NORMAL_REGIME_JITTER, RATIO_C, ZERO_PRESET_P, clamp_terms,
};

/// Which limit a_n / b_n is made to approach.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    /// a_n / b_n → c > 0
    #[default]
    Normal,
    /// a_n / b_n → 0
    Zero,
    /// a_n / b_n → ∞
    Infinity,
}

impl Regime {
    pub const ALL: [Regime; 3] = [Regime::Normal, Regime::Zero, Regime::Infinity];

    pub fn as_str(self) -> &'static str {
        match self {
            Regime::Normal => "normal",
            Regime::Zero => "zero",
            Regime::Infinity => "infinity",
        }
    }

    /// The exponent this regime jumps to when selected, if any.
    pub fn preset_p(self) -> Option<f64> {
        match self {
            Regime::Normal => None,
            Regime::Zero => Some(ZERO_PRESET_P),
            Regime::Infinity => Some(INFINITY_PRESET_P),
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Regime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Regime::Normal),
            "zero" => Ok(Regime::Zero),
            "infinity" | "inf" => Ok(Regime::Infinity),
            other => Err(format!(
                "regime must be 'normal', 'zero' or 'infinity', got '{other}'"
            )),
        }
    }
}

/// Parameters, always held inside their slider ranges.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LimitComparisonParams {
    p: f64,
    c: f64,
    regime: Regime,
    terms: usize,
}

impl Default for LimitComparisonParams {
    fn default() -> Self {
        Self {
            p: EXPONENT_P.default,
            c: RATIO_C.default,
            regime: Regime::Normal,
            terms: LIMIT_COMPARISON_DEFAULT_TERMS,
        }
    }
}

impl LimitComparisonParams {
    pub fn new(p: f64, c: f64, regime: Regime, terms: usize) -> Self {
        Self {
            p: EXPONENT_P.clamp(p),
            c: RATIO_C.clamp(c),
            regime,
            terms: clamp_terms(terms),
        }
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }

    pub fn terms(&self) -> usize {
        self.terms
    }

    pub fn with_p(self, p: f64) -> Self {
        Self {
            p: EXPONENT_P.clamp(p),
            ..self
        }
    }

    pub fn with_c(self, c: f64) -> Self {
        Self {
            c: RATIO_C.clamp(c),
            ..self
        }
    }

    pub fn with_terms(self, terms: usize) -> Self {
        Self {
            terms: clamp_terms(terms),
            ..self
        }
    }

    /// Switch regime, moving p to the regime's illustrative preset.
    pub fn with_regime(self, regime: Regime) -> Self {
        Self {
            regime,
            p: regime.preset_p().unwrap_or(self.p),
            ..self
        }
    }

    /// The p-series Σ n^-p converges iff p > 1.
    pub fn reference_converges(&self) -> bool {
        self.p > 1.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LimitComparisonRecord {
    pub n: usize,
    pub a: f64,
    pub b: f64,
    pub sum_a: f64,
    pub sum_b: f64,
    pub ratio: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LimitComparisonSeries {
    pub params: LimitComparisonParams,
    pub records: Vec<LimitComparisonRecord>,
    pub reference_converges: bool,
}

impl LimitComparisonSeries {
    /// a_N / b_N for the last generated term.
    pub fn last_ratio(&self) -> f64 {
        self.records.last().map_or(0.0, |r| r.ratio)
    }

    pub fn conclusion(&self) -> Conclusion {
        conclude(self.params.regime, self.reference_converges)
    }
}

/// Generate a_n, b_n and their running sums for n = 1..N.
///
/// Only the `normal` regime draws from `rng`; the other regimes are
/// deterministic.
pub fn compute(params: &LimitComparisonParams, rng: &mut impl Rng) -> LimitComparisonSeries {
    let mut records = Vec::with_capacity(params.terms);
    let mut sum_a = 0.0;
    let mut sum_b = 0.0;

    for n in 1..=params.terms {
        let nf = n as f64;
        let b = nf.powf(-params.p);
        let a = match params.regime {
            Regime::Normal => {
                params.c * b + (rng.random::<f64>() - 0.5) * NORMAL_REGIME_JITTER / nf
            }
            Regime::Zero => b / ((nf + 1.0).ln() + 1.0),
            Regime::Infinity => b * nf.powf(INFINITY_REGIME_GROWTH),
        };

        sum_a += a;
        sum_b += b;

        records.push(LimitComparisonRecord {
            n,
            a,
            b,
            sum_a,
            sum_b,
            ratio: a / b,
        });
    }

    LimitComparisonSeries {
        params: *params,
        records,
        reference_converges: params.reference_converges(),
    }
}

/// Outcome of the limit comparison test for the target series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Converges,
    Diverges,
    Inconclusive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Conclusion {
    pub verdict: Verdict,
    pub justification: &'static str,
}

/// The theorem's decision table.
pub fn conclude(regime: Regime, reference_converges: bool) -> Conclusion {
    let (verdict, justification) = match (regime, reference_converges) {
        (Regime::Normal, true) => (
            Verdict::Converges,
            "Both converge: a_n is held down by b_n and cannot escape.",
        ),
        (Regime::Normal, false) => (
            Verdict::Diverges,
            "Both diverge: a_n follows b_n all the way to infinity.",
        ),
        (Regime::Zero, true) => (
            Verdict::Converges,
            "b_n converges and a_n decays even faster, so a_n must converge.",
        ),
        (Regime::Zero, false) => (
            Verdict::Inconclusive,
            "b_n diverges but a_n decays faster; that is not enough to decide a_n.",
        ),
        (Regime::Infinity, false) => (
            Verdict::Diverges,
            "b_n already diverges and a_n is larger still, so a_n must diverge.",
        ),
        (Regime::Infinity, true) => (
            Verdict::Inconclusive,
            "b_n converges but a_n is far larger; no conclusion can be drawn.",
        ),
    };
    Conclusion {
        verdict,
        justification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn test_decision_table() {
        let cases = [
            (Regime::Normal, true, Verdict::Converges),
            (Regime::Normal, false, Verdict::Diverges),
            (Regime::Zero, true, Verdict::Converges),
            (Regime::Zero, false, Verdict::Inconclusive),
            (Regime::Infinity, false, Verdict::Diverges),
            (Regime::Infinity, true, Verdict::Inconclusive),
        ];
        for (regime, converges, expected) in cases {
            assert_eq!(
                conclude(regime, converges).verdict,
                expected,
                "regime={regime}, reference_converges={converges}"
            );
        }
    }

    #[test]
    fn test_infinity_with_harmonic_reference_diverges() {
        let params = LimitComparisonParams::new(1.0, 1.5, Regime::Infinity, 40);
        assert!(!params.reference_converges());
        let series = compute(&params, &mut rng());
        assert_eq!(series.conclusion().verdict, Verdict::Diverges);
    }

    #[test]
    fn test_reference_boundary_p_equals_one_diverges() {
        assert!(!LimitComparisonParams::default().with_p(1.0).reference_converges());
        assert!(LimitComparisonParams::default().with_p(1.1).reference_converges());
    }

    #[test]
    fn test_reference_is_p_series() {
        let params = LimitComparisonParams::new(2.0, 1.0, Regime::Zero, 4);
        let series = compute(&params, &mut rng());
        let b: Vec<f64> = series.records.iter().map(|r| r.b).collect();
        assert_relative_eq!(b[0], 1.0);
        assert_relative_eq!(b[1], 0.25);
        assert_relative_eq!(b[3], 1.0 / 16.0);
    }

    #[test]
    fn test_zero_regime_formula() {
        let params = LimitComparisonParams::new(1.2, 1.0, Regime::Zero, 5);
        let series = compute(&params, &mut rng());
        for r in &series.records {
            let expected = r.b / (((r.n + 1) as f64).ln() + 1.0);
            assert_relative_eq!(r.a, expected, epsilon = 1e-15);
        }
        // ratio shrinks toward zero
        let ratios: Vec<f64> = series.records.iter().map(|r| r.ratio).collect();
        assert!(ratios.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_infinity_regime_ratio_grows() {
        let params = LimitComparisonParams::new(1.0, 1.0, Regime::Infinity, 20);
        let series = compute(&params, &mut rng());
        for r in &series.records {
            assert_relative_eq!(r.ratio, (r.n as f64).powf(0.4), epsilon = 1e-12);
        }
        assert!(series.last_ratio() > series.records[0].ratio);
    }

    #[test]
    fn test_running_sums_accumulate() {
        let params = LimitComparisonParams::new(0.5, 2.0, Regime::Infinity, 10);
        let series = compute(&params, &mut rng());
        let mut sa = 0.0;
        let mut sb = 0.0;
        for r in &series.records {
            sa += r.a;
            sb += r.b;
            assert_relative_eq!(r.sum_a, sa);
            assert_relative_eq!(r.sum_b, sb);
        }
    }

    #[test]
    fn test_normal_regime_ratio_near_c() {
        let params = LimitComparisonParams::new(0.5, 2.0, Regime::Normal, 40);
        let series = compute(&params, &mut rng());
        // jitter is bounded by 0.01 / n in a_n, so the ratio stays within 0.01 * n^(p-1)
        for r in &series.records {
            let slack = 0.01 / (r.n as f64) / r.b;
            assert!((r.ratio - 2.0).abs() <= slack + 1e-12, "n={} ratio={}", r.n, r.ratio);
        }
    }

    #[test]
    fn test_normal_jitter_never_changes_verdict() {
        let params = LimitComparisonParams::new(1.5, 0.7, Regime::Normal, 40);
        for seed in 0..20 {
            let mut rng = SmallRng::seed_from_u64(seed);
            assert_eq!(compute(&params, &mut rng).conclusion().verdict, Verdict::Converges);
        }
    }

    #[test]
    fn test_deterministic_regimes_are_bit_identical() {
        for regime in [Regime::Zero, Regime::Infinity] {
            let params = LimitComparisonParams::new(1.3, 1.0, regime, 40);
            let first = compute(&params, &mut SmallRng::seed_from_u64(1));
            let second = compute(&params, &mut SmallRng::seed_from_u64(999));
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_with_regime_applies_presets() {
        let base = LimitComparisonParams::default().with_p(2.0);
        assert_eq!(base.with_regime(Regime::Infinity).p(), 1.0);
        assert_eq!(base.with_regime(Regime::Zero).p(), 1.2);
        assert_eq!(base.with_regime(Regime::Normal).p(), 2.0);
    }

    #[test]
    fn test_params_clamped() {
        let params = LimitComparisonParams::new(-3.0, 100.0, Regime::Normal, 0);
        assert_eq!(params.p(), 0.2);
        assert_eq!(params.c(), 4.0);
        assert_eq!(params.terms(), 1);
    }

    #[test]
    fn test_regime_parse() {
        assert_eq!("Infinity".parse::<Regime>().unwrap(), Regime::Infinity);
        assert_eq!("zero".parse::<Regime>().unwrap(), Regime::Zero);
        assert!("sideways".parse::<Regime>().is_err());
    }
}
