//! Per-theorem panel state: private parameters plus a memo of the last
//! derived series. Any parameter change produces a new memo key, so the
//! series is recomputed in full on the next read.

use rand::Rng;
use series_core::{
    AlternatingParams, AlternatingSeries, LimitComparisonParams, LimitComparisonSeries, Memo,
    RatioTestParams, RatioTestSeries, RearrangementMode, RearrangementSeries, Regime,
    alternating, limit_comparison, ratio_test, rearrangement,
};

#[derive(Clone, Debug, Default)]
pub struct LimitComparisonPanel {
    params: LimitComparisonParams,
    cache: Memo<LimitComparisonParams, LimitComparisonSeries>,
}

impl LimitComparisonPanel {
    pub fn params(&self) -> &LimitComparisonParams {
        &self.params
    }

    pub fn set_p(&mut self, p: f64) {
        self.params = self.params.with_p(p);
    }

    pub fn set_c(&mut self, c: f64) {
        self.params = self.params.with_c(c);
    }

    pub fn set_terms(&mut self, terms: usize) {
        self.params = self.params.with_terms(terms);
    }

    /// Switching regime also moves p to the regime's preset.
    pub fn set_regime(&mut self, regime: Regime) {
        if regime != self.params.regime() {
            self.params = self.params.with_regime(regime);
        }
    }

    pub fn series(&mut self, rng: &mut impl Rng) -> &LimitComparisonSeries {
        self.cache
            .get_or_compute(self.params, |p| limit_comparison::compute(p, rng))
    }
}

#[derive(Clone, Debug, Default)]
pub struct RatioTestPanel {
    params: RatioTestParams,
    cache: Memo<RatioTestParams, RatioTestSeries>,
}

impl RatioTestPanel {
    pub fn params(&self) -> &RatioTestParams {
        &self.params
    }

    pub fn set_rho(&mut self, rho: f64) {
        self.params = self.params.with_rho(rho);
    }

    pub fn set_terms(&mut self, terms: usize) {
        self.params = self.params.with_terms(terms);
    }

    pub fn series(&mut self) -> &RatioTestSeries {
        self.cache.get_or_compute(self.params, ratio_test::compute)
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlternatingPanel {
    params: AlternatingParams,
    cache: Memo<AlternatingParams, AlternatingSeries>,
}

impl AlternatingPanel {
    pub fn params(&self) -> &AlternatingParams {
        &self.params
    }

    pub fn set_decay(&mut self, decay: f64) {
        self.params = self.params.with_decay(decay);
    }

    pub fn set_terms(&mut self, terms: usize) {
        self.params = self.params.with_terms(terms);
    }

    pub fn series(&mut self) -> &AlternatingSeries {
        self.cache.get_or_compute(self.params, alternating::compute)
    }
}

#[derive(Clone, Debug, Default)]
pub struct RearrangementPanel {
    mode: RearrangementMode,
    /// Bumped by every reshuffle so the memo key changes.
    epoch: u64,
    cache: Memo<(RearrangementMode, u64), RearrangementSeries>,
}

impl RearrangementPanel {
    pub fn mode(&self) -> RearrangementMode {
        self.mode
    }

    pub fn reshuffles(&self) -> u64 {
        self.epoch
    }

    pub fn set_mode(&mut self, mode: RearrangementMode) {
        self.mode = mode;
    }

    /// Request a fresh independent permutation on the next read.
    pub fn reshuffle(&mut self) {
        self.epoch += 1;
    }

    pub fn series(&mut self, rng: &mut impl Rng) -> &RearrangementSeries {
        self.cache
            .get_or_compute((self.mode, self.epoch), |(mode, _)| {
                rearrangement::compute(*mode, rng)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn test_normal_regime_cached_until_params_change() {
        let mut rng = rng();
        let mut panel = LimitComparisonPanel::default();
        let first = panel.series(&mut rng).clone();
        // same params: memo hit, jitter not resampled
        assert_eq!(panel.series(&mut rng), &first);
        panel.set_c(2.0);
        let second = panel.series(&mut rng).clone();
        assert_ne!(first.records[0].a, second.records[0].a);
    }

    #[test]
    fn test_regime_switch_applies_preset_once() {
        let mut panel = LimitComparisonPanel::default();
        panel.set_regime(Regime::Zero);
        assert_eq!(panel.params().p(), 1.2);
        panel.set_p(2.0);
        panel.set_regime(Regime::Zero);
        assert_eq!(panel.params().p(), 2.0);
        panel.set_regime(Regime::Infinity);
        assert_eq!(panel.params().p(), 1.0);
    }

    #[test]
    fn test_reshuffle_draws_new_permutation() {
        let mut rng = rng();
        let mut panel = RearrangementPanel::default();
        let first = panel.series(&mut rng).permutation.clone();
        assert_eq!(panel.series(&mut rng).permutation, first);
        panel.reshuffle();
        assert_ne!(panel.series(&mut rng).permutation, first);
        assert_eq!(panel.reshuffles(), 1);
    }

    #[test]
    fn test_mode_switch_recomputes() {
        let mut rng = rng();
        let mut panel = RearrangementPanel::default();
        assert_eq!(panel.series(&mut rng).mode, RearrangementMode::Absolute);
        panel.set_mode(RearrangementMode::Conditional);
        assert_eq!(panel.series(&mut rng).mode, RearrangementMode::Conditional);
    }

    #[test]
    fn test_ratio_panel_clamps_and_recomputes() {
        let mut panel = RatioTestPanel::default();
        assert_eq!(panel.series().records.len(), 15);
        panel.set_terms(99);
        panel.set_rho(0.5);
        let series = panel.series();
        assert_eq!(series.records.len(), 40);
        assert_eq!(series.records[1].value, 0.5);
    }

    #[test]
    fn test_alternating_panel_defaults() {
        let mut panel = AlternatingPanel::default();
        assert_eq!(panel.params().decay(), 0.7);
        assert_eq!(panel.series().records.len(), 12);
        panel.set_decay(0.5);
        assert!((panel.series().limit - 1.0 / 3.0).abs() < 1e-12);
    }
}
