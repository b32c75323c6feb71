use serde::Serialize;

/// Slack for floating-point comparisons against theoretical bounds.
pub const EPSILON: f64 = 1e-9;

/// Hard cap on generated terms, keeps every chart readable.
pub const MAX_TERMS: usize = 40;

/// Rearrangement always works on this many terms.
pub const REARRANGEMENT_TERMS: usize = 30;

/// Base of the absolutely convergent geometric sequence used for rearrangement.
pub const REARRANGEMENT_GEOMETRIC_BASE: f64 = 1.5;

/// Amplitude of the cosmetic jitter in the limit-comparison `normal` regime.
pub const NORMAL_REGIME_JITTER: f64 = 0.02;

/// Exponent of the extra growth factor in the `infinity` regime: a_n = b_n * n^0.4.
pub const INFINITY_REGIME_GROWTH: f64 = 0.4;

/// Reference exponent preset applied when switching to the `infinity` regime.
pub const INFINITY_PRESET_P: f64 = 1.0;

/// Reference exponent preset applied when switching to the `zero` regime.
pub const ZERO_PRESET_P: f64 = 1.2;

/// A bounded numeric control with a default value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Slider {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl Slider {
    pub const fn new(min: f64, max: f64, step: f64, default: f64) -> Self {
        Self {
            min,
            max,
            step,
            default,
        }
    }

    /// Clamp into `[min, max]`. NaN maps to the default.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.default;
        }
        value.clamp(self.min, self.max)
    }
}

/// Reference exponent p in b_n = n^-p.
pub const EXPONENT_P: Slider = Slider::new(0.2, 2.5, 0.1, 1.0);

/// Limiting ratio c in the `normal` regime.
pub const RATIO_C: Slider = Slider::new(0.1, 4.0, 0.1, 1.5);

/// Ratio ρ for the ratio test.
pub const RATIO_RHO: Slider = Slider::new(0.5, 1.5, 0.01, 0.8);

/// Decay rate r for the alternating series u_n = r^n.
pub const DECAY_R: Slider = Slider::new(0.1, 0.95, 0.01, 0.7);

pub const LIMIT_COMPARISON_DEFAULT_TERMS: usize = 40;
pub const RATIO_TEST_DEFAULT_TERMS: usize = 15;
pub const ALTERNATING_DEFAULT_TERMS: usize = 12;

/// Clamp a requested term count into `1..=MAX_TERMS`.
pub fn clamp_terms(terms: usize) -> usize {
    terms.clamp(1, MAX_TERMS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slider_clamps_to_range() {
        assert_eq!(EXPONENT_P.clamp(0.0), 0.2);
        assert_eq!(EXPONENT_P.clamp(9.0), 2.5);
        assert_eq!(EXPONENT_P.clamp(1.3), 1.3);
    }

    #[test]
    fn test_slider_nan_falls_back_to_default() {
        assert_eq!(RATIO_RHO.clamp(f64::NAN), 0.8);
    }

    #[test]
    fn test_slider_infinity_clamps() {
        assert_eq!(DECAY_R.clamp(f64::INFINITY), 0.95);
        assert_eq!(DECAY_R.clamp(f64::NEG_INFINITY), 0.1);
    }

    #[test]
    fn test_clamp_terms() {
        assert_eq!(clamp_terms(0), 1);
        assert_eq!(clamp_terms(12), 12);
        assert_eq!(clamp_terms(500), MAX_TERMS);
    }

    #[test]
    fn test_defaults_inside_ranges() {
        for s in [EXPONENT_P, RATIO_C, RATIO_RHO, DECAY_R] {
            assert!(s.min <= s.default && s.default <= s.max, "{s:?}");
            assert!(s.step > 0.0);
        }
    }
}
