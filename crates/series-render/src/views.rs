//! Assembles what each visualizer shows: theorem statements, controls,
//! the conclusion banner, headline numbers and chart specs.

use serde::Serialize;

use series_core::constants::{DECAY_R, EXPONENT_P, RATIO_C, RATIO_RHO};
use series_core::{
    AlternatingSeries, LimitComparisonSeries, MAX_TERMS, RatioTestSeries, RatioVerdict,
    RearrangementMode, RearrangementSeries, Regime, Slider, Verdict,
};

use crate::chart::{
    AMBER, BLUE, ChartKind, ChartSpec, GREEN, INDIGO, PINK, RED, ROSE, SLATE, SeriesSpec, to_rows,
};
use crate::formula::FormulaBlock;
use crate::navigator::TheoremKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Convergent,
    Divergent,
    Caution,
}

impl Tone {
    pub fn color(self) -> &'static str {
        match self {
            Tone::Convergent => GREEN,
            Tone::Divergent => RED,
            Tone::Caution => AMBER,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConclusionView {
    pub tone: Tone,
    pub headline: String,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlKind {
    Slider {
        min: f64,
        max: f64,
        step: f64,
        value: f64,
    },
    Choice {
        options: Vec<&'static str>,
        value: &'static str,
    },
    Toggle {
        value: bool,
    },
    Action,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Control {
    pub id: &'static str,
    pub label: String,
    #[serde(flatten)]
    pub kind: ControlKind,
}

impl Control {
    fn slider(id: &'static str, label: &str, slider: Slider, value: f64) -> Self {
        Self {
            id,
            label: label.to_string(),
            kind: ControlKind::Slider {
                min: slider.min,
                max: slider.max,
                step: slider.step,
                value,
            },
        }
    }

    fn terms(value: usize) -> Self {
        Self::slider(
            "terms",
            "Number of terms N",
            Slider::new(1.0, MAX_TERMS as f64, 1.0, value as f64),
            value as f64,
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Highlight {
    pub label: String,
    pub value: String,
}

impl Highlight {
    fn new(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct View {
    pub theorem: TheoremKind,
    pub title: String,
    pub statements: Vec<FormulaBlock>,
    pub controls: Vec<Control>,
    pub conclusion: ConclusionView,
    pub highlights: Vec<Highlight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caveat: Option<String>,
    pub charts: Vec<ChartSpec>,
}

/// Status badge: divergence is only "confirmed" when a divergent reference
/// is outgrown by the target.
pub fn limit_comparison_status(regime: Regime, reference_converges: bool) -> &'static str {
    if regime == Regime::Infinity && !reference_converges {
        "divergence confirmed"
    } else {
        "observing"
    }
}

pub fn limit_comparison(series: &LimitComparisonSeries) -> View {
    let params = series.params;
    let regime = params.regime();
    let conclusion = series.conclusion();
    let explosive = regime == Regime::Infinity && !series.reference_converges;

    let (tone, headline) = match conclusion.verdict {
        Verdict::Converges => (Tone::Convergent, "target converges"),
        Verdict::Diverges => (Tone::Divergent, "target diverges"),
        Verdict::Inconclusive => (Tone::Caution, "inconclusive"),
    };

    let mut controls = vec![
        Control {
            id: "regime",
            label: "Limit of a_n / b_n".to_string(),
            kind: ControlKind::Choice {
                options: Regime::ALL.iter().map(|r| r.as_str()).collect(),
                value: regime.as_str(),
            },
        },
        Control::slider("p", "Reference exponent p", EXPONENT_P, params.p()),
    ];
    if regime == Regime::Normal {
        controls.push(Control::slider("c", "Limiting ratio c", RATIO_C, params.c()));
    }
    controls.push(Control::terms(params.terms()));

    let last_ratio = series.last_ratio();
    let ratio_display = if regime == Regime::Infinity {
        format!("{last_ratio:.2} → ∞")
    } else {
        format!("{last_ratio:.3}")
    };

    let reference = if series.reference_converges {
        "converges (p > 1)"
    } else {
        "diverges (p ≤ 1)"
    };

    let terms_chart = ChartSpec::new("terms", "Terms a_n vs b_n", ChartKind::Line)
        .rows(&series.records)
        .series(SeriesSpec::new("an", "a_n (target)", BLUE))
        .series(SeriesSpec::new("bn", "b_n (reference)", RED).dashed());

    let mut ratio_chart = ChartSpec::new("ratio", "Ratio a_n / b_n", ChartKind::Area)
        .rows(&series.records)
        .series(SeriesSpec::new("ratio", "ratio", INDIGO).filled("#e0e7ff"));
    ratio_chart = match regime {
        Regime::Infinity => ratio_chart.y_domain(Some(0.0), None),
        _ => ratio_chart.y_domain(Some(0.0), Some((params.c() * 1.5).max(2.0))),
    };
    if regime == Regime::Normal {
        ratio_chart = ratio_chart.reference_line(params.c(), GREEN, Some("c"));
    }

    let sum_color = if explosive { RED } else { GREEN };
    let sums_title = if explosive {
        "Partial sums S_n (WARNING: explosive growth)"
    } else {
        "Partial sums S_n"
    };
    let sums_chart = ChartSpec::new("partial-sums", sums_title, ChartKind::Area)
        .rows(&series.records)
        .series(SeriesSpec::new("sumAn", "partial sums of a_n", sum_color))
        .series(SeriesSpec::new("sumBn", "partial sums of b_n", SLATE).dashed());

    View {
        theorem: TheoremKind::LimitComparison,
        title: "Theorem 11: Limit Comparison Test".to_string(),
        statements: vec![
            FormulaBlock::display(
                r"\text{If } \lim_{n\to\infty} \frac{a_n}{b_n} = c > 0 \text{, then } \sum a_n \text{ and } \sum b_n \text{ converge or diverge together.}",
            ),
            FormulaBlock::inline(r"b_n = \frac{1}{n^p}"),
            FormulaBlock::inline(r"S_n = \sum_{k=1}^n a_k"),
        ],
        controls,
        conclusion: ConclusionView {
            tone,
            headline: headline.to_string(),
            detail: conclusion.justification.to_string(),
        },
        highlights: vec![
            Highlight::new("reference", reference),
            Highlight::new("latest ratio", ratio_display),
            Highlight::new("status", limit_comparison_status(regime, series.reference_converges)),
        ],
        caveat: None,
        charts: vec![terms_chart, ratio_chart, sums_chart],
    }
}

pub fn ratio_test(series: &RatioTestSeries) -> View {
    let rho = series.params.rho();
    let (tone, detail) = match series.verdict {
        RatioVerdict::AbsolutelyConvergent => (
            Tone::Convergent,
            "The terms shrink geometrically toward 0, so Σ|a_n| converges.",
        ),
        RatioVerdict::Divergent => (
            Tone::Divergent,
            "The terms grow geometrically and cannot tend to 0.",
        ),
        RatioVerdict::Inconclusive => (
            Tone::Caution,
            "With ρ = 1 the ratio test gives no information either way.",
        ),
    };

    let chart = ChartSpec::new("magnitudes", "Term magnitudes |a_n|", ChartKind::Bar)
        .rows(&series.records)
        .series(SeriesSpec::new("val", "|a_n|", tone.color()))
        .reference_line(1.0, "#64748b", Some("threshold 1"));

    View {
        theorem: TheoremKind::RatioTest,
        title: "Theorem 13: Ratio Test".to_string(),
        statements: vec![FormulaBlock::display(
            r"\text{Let } \lim_{n\to\infty} \left| \frac{a_{n+1}}{a_n} \right| = \rho. \text{ (a) } \rho < 1 \text{ converges; (b) } \rho > 1 \text{ diverges; (c) } \rho = 1 \text{ no conclusion.}",
        )],
        controls: vec![
            Control::slider("rho", "Limiting ratio ρ", RATIO_RHO, rho),
            Control::terms(series.params.terms()),
        ],
        conclusion: ConclusionView {
            tone,
            headline: series.verdict.label().to_string(),
            detail: detail.to_string(),
        },
        highlights: vec![Highlight::new("ρ", format!("{rho}"))],
        caveat: None,
        charts: vec![chart],
    }
}

pub fn alternating(series: &AlternatingSeries) -> View {
    let conclusion = match series.first_violation() {
        None => ConclusionView {
            tone: Tone::Convergent,
            headline: "Leibniz bound verified".to_string(),
            detail: format!(
                "|L − S_n| ≤ u_(n+1) holds for every n = 1..{}.",
                series.records.len()
            ),
        },
        Some(r) => ConclusionView {
            tone: Tone::Divergent,
            headline: "Leibniz bound violated".to_string(),
            detail: format!(
                "At n = {} the error {:e} exceeds u_(n+1) = {:e}.",
                r.n, r.error, r.next_magnitude
            ),
        },
    };

    let mut highlights = vec![Highlight::new("limit L", format!("{:.6}", series.limit))];
    if let Some(last) = series.records.last() {
        highlights.push(Highlight::new("final error", format!("{:.3e}", last.error)));
        highlights.push(Highlight::new("bound u_(N+1)", format!("{:.3e}", last.next_magnitude)));
    }

    let trap_chart = ChartSpec::new("trap", "Partial sums S_n and the trap interval", ChartKind::Area)
        .rows(&series.records)
        .series(SeriesSpec::new("trapMax", "trap upper", "#fbcfe8").filled("#fbcfe8"))
        .series(SeriesSpec::new("trapMin", "trap lower", "#ffffff").filled("#ffffff"))
        .series(SeriesSpec::new("sn", "partial sum S_n", PINK))
        .reference_line(series.limit, GREEN, Some("Limit L"));

    let error_chart = ChartSpec::new("error", "Error |L − S_n| vs bound u_(n+1)", ChartKind::Line)
        .rows(&series.records)
        .series(SeriesSpec::new("error", "actual error |R_n|", ROSE))
        .series(SeriesSpec::new("unPlus1", "first omitted term u_(n+1)", SLATE).dashed());

    View {
        theorem: TheoremKind::AlternatingSeries,
        title: "Alternating Series and Error Estimate (Theorems 15 & 16)".to_string(),
        statements: vec![
            FormulaBlock::display(
                r"\sum_{n=1}^{\infty} (-1)^{n+1} u_n \text{ converges if } u_n \ge u_{n+1} \to 0",
            ),
            FormulaBlock::display(r"|R_n| = |L - S_n| \le u_{n+1}"),
            FormulaBlock::inline(r"L = \frac{r}{1+r}"),
        ],
        controls: vec![
            Control::slider("decay", "Decay rate r (terms are r^n)", DECAY_R, series.params.decay()),
            Control::terms(series.params.terms()),
        ],
        conclusion,
        highlights,
        caveat: None,
        charts: vec![trap_chart, error_chart],
    }
}

pub fn rearrangement(series: &RearrangementSeries, reshuffles: u64) -> View {
    let absolute = series.mode == RearrangementMode::Absolute;
    let conclusion = if absolute {
        ConclusionView {
            tone: Tone::Convergent,
            headline: "same limit".to_string(),
            detail: format!(
                "Both orderings head to the same sum; final partial sums differ by {:.2e}.",
                series.final_gap()
            ),
        }
    } else {
        ConclusionView {
            tone: Tone::Caution,
            headline: "no guarantee".to_string(),
            detail: "Only absolute convergence protects the sum from rearrangement.".to_string(),
        }
    };

    let base = if absolute {
        r"a_n = \frac{1}{1.5^n}"
    } else {
        r"a_n = \frac{(-1)^{n+1}}{n}"
    };

    let chart = ChartSpec::new("partial-sums", "Partial sums S_n", ChartKind::Line)
        .series(SeriesSpec::new("sum", "original order", BLUE).with_data(to_rows(&series.original)))
        .series(
            SeriesSpec::new("sum", "rearranged", RED).with_data(to_rows(&series.rearranged)),
        );

    View {
        theorem: TheoremKind::Rearrangement,
        title: "Theorem 17: Rearranging Absolutely Convergent Series".to_string(),
        statements: vec![
            FormulaBlock::display(
                r"\text{If } \sum a_n \text{ converges absolutely, every rearrangement } \sum b_n \text{ converges to the same sum.}",
            ),
            FormulaBlock::inline(base),
        ],
        controls: vec![
            Control {
                id: "absolute",
                label: "Absolutely convergent (1/1.5^n)".to_string(),
                kind: ControlKind::Toggle { value: absolute },
            },
            Control {
                id: "reshuffle",
                label: "Shuffle the terms again".to_string(),
                kind: ControlKind::Action,
            },
        ],
        conclusion,
        highlights: vec![
            Highlight::new("original sum", format!("{:.6}", series.original_total())),
            Highlight::new("rearranged sum", format!("{:.6}", series.rearranged_total())),
            Highlight::new("reshuffles", reshuffles.to_string()),
        ],
        caveat: series.mode.caveat().map(str::to_string),
        charts: vec![chart],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use series_core::{
        AlternatingParams, LimitComparisonParams, RatioTestParams, alternating as alt,
        limit_comparison as lc, ratio_test as rt, rearrangement as re,
    };

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn test_limit_comparison_infinity_badge_and_warning() {
        let params = LimitComparisonParams::new(1.0, 1.5, Regime::Infinity, 40);
        let view = limit_comparison(&lc::compute(&params, &mut rng()));
        assert_eq!(view.conclusion.tone, Tone::Divergent);
        assert_eq!(view.conclusion.headline, "target diverges");
        let status = view.highlights.iter().find(|h| h.label == "status").unwrap();
        assert_eq!(status.value, "divergence confirmed");
        let ratio = view.highlights.iter().find(|h| h.label == "latest ratio").unwrap();
        assert!(ratio.value.ends_with("→ ∞"));
        assert!(view.charts[2].title.contains("WARNING"));
        assert!(view.controls.iter().all(|c| c.id != "c"));
    }

    #[test]
    fn test_limit_comparison_normal_has_reference_line() {
        let params = LimitComparisonParams::new(1.5, 2.0, Regime::Normal, 10);
        let view = limit_comparison(&lc::compute(&params, &mut rng()));
        let ratio = view.charts.iter().find(|c| c.id == "ratio").unwrap();
        assert_eq!(ratio.reference_lines[0].y, 2.0);
        assert_eq!(ratio.y_domain.unwrap().max, Some(3.0));
        assert!(view.controls.iter().any(|c| c.id == "c"));
        assert_eq!(limit_comparison_status(Regime::Normal, false), "observing");
    }

    #[test]
    fn test_limit_comparison_inconclusive_is_caution() {
        let params = LimitComparisonParams::new(0.5, 1.0, Regime::Zero, 10);
        let view = limit_comparison(&lc::compute(&params, &mut rng()));
        assert_eq!(view.conclusion.tone, Tone::Caution);
    }

    #[test]
    fn test_ratio_view_colors_by_verdict() {
        let conv = ratio_test(&rt::compute(&RatioTestParams::new(0.9, 10)));
        assert_eq!(conv.charts[0].series[0].color, GREEN);
        let edge = ratio_test(&rt::compute(&RatioTestParams::new(1.0, 10)));
        assert_eq!(edge.conclusion.tone, Tone::Caution);
        assert_eq!(edge.charts[0].series[0].color, AMBER);
        assert_eq!(edge.charts[0].data.len(), 10);
    }

    #[test]
    fn test_alternating_view_verifies_bound() {
        let view = alternating(&alt::compute(&AlternatingParams::new(0.5, 4)));
        assert_eq!(view.conclusion.headline, "Leibniz bound verified");
        assert_eq!(view.charts[0].reference_lines[0].y, 1.0 / 3.0);
        assert_eq!(view.highlights[0].value, "0.333333");
    }

    #[test]
    fn test_rearrangement_view_caveat_only_when_conditional() {
        let abs = rearrangement(&re::compute(RearrangementMode::Absolute, &mut rng()), 0);
        assert!(abs.caveat.is_none());
        assert_eq!(abs.charts[0].series.len(), 2);
        assert!(abs.charts[0].data.is_empty());

        let cond = rearrangement(&re::compute(RearrangementMode::Conditional, &mut rng()), 3);
        assert!(cond.caveat.is_some());
        assert_eq!(cond.conclusion.tone, Tone::Caution);
        assert_eq!(cond.highlights[2].value, "3");
    }

    #[test]
    fn test_statements_render_without_fallback() {
        let mut rng = rng();
        let views = [
            limit_comparison(&lc::compute(&LimitComparisonParams::default(), &mut rng)),
            ratio_test(&rt::compute(&RatioTestParams::default())),
            alternating(&alt::compute(&AlternatingParams::default())),
            rearrangement(&re::compute(RearrangementMode::Conditional, &mut rng), 0),
        ];
        for view in &views {
            for block in &view.statements {
                assert!(!block.markup.contains("math-fallback"), "{}", block.source);
            }
        }
    }

    #[test]
    fn test_view_serializes() {
        let view = ratio_test(&rt::compute(&RatioTestParams::default()));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["theorem"], "ratio-test");
        assert_eq!(json["controls"][0]["type"], "slider");
        assert_eq!(json["controls"][0]["max"], 1.5);
        assert_eq!(json["conclusion"]["tone"], "convergent");
    }
}
