use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::Serialize;

use crate::panels::{AlternatingPanel, LimitComparisonPanel, RatioTestPanel, RearrangementPanel};
use crate::views::{self, View};

/// The four visualizers, in navigation order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TheoremKind {
    #[default]
    LimitComparison,
    RatioTest,
    AlternatingSeries,
    Rearrangement,
}

impl TheoremKind {
    pub const ALL: [TheoremKind; 4] = [
        TheoremKind::LimitComparison,
        TheoremKind::RatioTest,
        TheoremKind::AlternatingSeries,
        TheoremKind::Rearrangement,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TheoremKind::LimitComparison => "limit-comparison",
            TheoremKind::RatioTest => "ratio-test",
            TheoremKind::AlternatingSeries => "alternating-series",
            TheoremKind::Rearrangement => "rearrangement",
        }
    }

    /// Navigation label.
    pub fn label(self) -> &'static str {
        match self {
            TheoremKind::LimitComparison => "Limit Comparison",
            TheoremKind::RatioTest => "Ratio Test",
            TheoremKind::AlternatingSeries => "Alternating Series",
            TheoremKind::Rearrangement => "Rearrangement",
        }
    }
}

impl fmt::Display for TheoremKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TheoremKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        TheoremKind::ALL
            .into_iter()
            .find(|k| k.as_str() == key || (key == "alternating" && *k == TheoremKind::AlternatingSeries))
            .ok_or_else(|| {
                format!(
                    "unknown theorem '{s}', expected one of: limit-comparison, ratio-test, \
                     alternating-series, rearrangement"
                )
            })
    }
}

/// The active visualizer with its private state.
#[derive(Clone, Debug)]
pub enum Panel {
    LimitComparison(LimitComparisonPanel),
    RatioTest(RatioTestPanel),
    AlternatingSeries(AlternatingPanel),
    Rearrangement(RearrangementPanel),
}

impl Panel {
    /// A panel at its default parameters.
    pub fn fresh(kind: TheoremKind) -> Self {
        match kind {
            TheoremKind::LimitComparison => Panel::LimitComparison(Default::default()),
            TheoremKind::RatioTest => Panel::RatioTest(Default::default()),
            TheoremKind::AlternatingSeries => Panel::AlternatingSeries(Default::default()),
            TheoremKind::Rearrangement => Panel::Rearrangement(Default::default()),
        }
    }

    pub fn kind(&self) -> TheoremKind {
        match self {
            Panel::LimitComparison(_) => TheoremKind::LimitComparison,
            Panel::RatioTest(_) => TheoremKind::RatioTest,
            Panel::AlternatingSeries(_) => TheoremKind::AlternatingSeries,
            Panel::Rearrangement(_) => TheoremKind::Rearrangement,
        }
    }

    pub fn view(&mut self, rng: &mut impl Rng) -> View {
        match self {
            Panel::LimitComparison(p) => views::limit_comparison(p.series(rng)),
            Panel::RatioTest(p) => views::ratio_test(p.series()),
            Panel::AlternatingSeries(p) => views::alternating(p.series()),
            Panel::Rearrangement(p) => {
                let reshuffles = p.reshuffles();
                views::rearrangement(p.series(rng), reshuffles)
            }
        }
    }
}

/// Top-level selector: exactly one panel is active at a time.
#[derive(Clone, Debug)]
pub struct Navigator {
    active: Panel,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(TheoremKind::default())
    }
}

impl Navigator {
    pub fn new(kind: TheoremKind) -> Self {
        Self {
            active: Panel::fresh(kind),
        }
    }

    pub fn active_kind(&self) -> TheoremKind {
        self.active.kind()
    }

    /// Switch visualizer. Selecting a different one discards the old panel,
    /// so returning to it starts from defaults. Re-selecting the active one
    /// keeps its state. Returns true if the panel was replaced.
    pub fn select(&mut self, kind: TheoremKind) -> bool {
        if kind == self.active.kind() {
            return false;
        }
        tracing::debug!(from = %self.active.kind(), to = %kind, "switching visualizer");
        self.active = Panel::fresh(kind);
        true
    }

    pub fn view(&mut self, rng: &mut impl Rng) -> View {
        self.active.view(rng)
    }

    pub fn limit_comparison(&mut self) -> &mut LimitComparisonPanel {
        self.select(TheoremKind::LimitComparison);
        match &mut self.active {
            Panel::LimitComparison(p) => p,
            _ => unreachable!("limit comparison panel was just selected"),
        }
    }

    pub fn ratio_test(&mut self) -> &mut RatioTestPanel {
        self.select(TheoremKind::RatioTest);
        match &mut self.active {
            Panel::RatioTest(p) => p,
            _ => unreachable!("ratio test panel was just selected"),
        }
    }

    pub fn alternating(&mut self) -> &mut AlternatingPanel {
        self.select(TheoremKind::AlternatingSeries);
        match &mut self.active {
            Panel::AlternatingSeries(p) => p,
            _ => unreachable!("alternating panel was just selected"),
        }
    }

    pub fn rearrangement(&mut self) -> &mut RearrangementPanel {
        self.select(TheoremKind::Rearrangement);
        match &mut self.active {
            Panel::Rearrangement(p) => p,
            _ => unreachable!("rearrangement panel was just selected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_default_is_limit_comparison() {
        assert_eq!(Navigator::default().active_kind(), TheoremKind::LimitComparison);
    }

    #[test]
    fn test_switch_away_and_back_resets() {
        let mut nav = Navigator::default();
        nav.ratio_test().set_rho(1.3);
        assert_eq!(nav.ratio_test().params().rho(), 1.3);
        assert!(nav.select(TheoremKind::AlternatingSeries));
        assert!(nav.select(TheoremKind::RatioTest));
        assert_eq!(nav.ratio_test().params().rho(), 0.8);
    }

    #[test]
    fn test_reselect_keeps_state() {
        let mut nav = Navigator::new(TheoremKind::AlternatingSeries);
        nav.alternating().set_decay(0.3);
        assert!(!nav.select(TheoremKind::AlternatingSeries));
        assert_eq!(nav.alternating().params().decay(), 0.3);
    }

    #[test]
    fn test_view_matches_active_panel() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut nav = Navigator::default();
        for kind in TheoremKind::ALL {
            nav.select(kind);
            assert_eq!(nav.view(&mut rng).theorem, kind);
        }
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("ratio_test".parse::<TheoremKind>().unwrap(), TheoremKind::RatioTest);
        assert_eq!(
            "Alternating".parse::<TheoremKind>().unwrap(),
            TheoremKind::AlternatingSeries
        );
        assert_eq!(
            "limit comparison".parse::<TheoremKind>().unwrap(),
            TheoremKind::LimitComparison
        );
        assert!("integral".parse::<TheoremKind>().is_err());
    }

    #[test]
    fn test_kind_roundtrips_display() {
        for kind in TheoremKind::ALL {
            assert_eq!(kind.to_string().parse::<TheoremKind>().unwrap(), kind);
        }
    }
}
