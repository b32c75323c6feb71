//! Plain-text rendering of a [`View`] for terminals.

use std::fmt::Write as _;

use serde_json::{Map, Value};

use crate::chart::ChartSpec;
use crate::views::View;

/// Render a view as a text report: title, statements, conclusion,
/// highlights, caveat, then one table per chart.
pub fn render_view(view: &View, precision: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", view.title);
    for block in &view.statements {
        let _ = writeln!(out, "  {}", block.text);
    }
    out.push('\n');
    let _ = writeln!(
        out,
        "conclusion: {} ({:?})",
        view.conclusion.headline, view.conclusion.tone
    );
    let _ = writeln!(out, "  {}", view.conclusion.detail);
    for h in &view.highlights {
        let _ = writeln!(out, "{:<16}{}", format!("{}:", h.label), h.value);
    }
    if let Some(caveat) = &view.caveat {
        let _ = writeln!(out, "note: {caveat}");
    }
    for chart in &view.charts {
        out.push('\n');
        out.push_str(&render_chart(chart, precision));
    }
    out
}

/// A chart as a table: the x column, then one column per plotted series.
pub fn render_chart(chart: &ChartSpec, precision: usize) -> String {
    let columns: Vec<(String, &[Map<String, Value>], &str)> = chart
        .series
        .iter()
        .map(|s| {
            let header = if s.data.is_some() {
                s.name.clone()
            } else {
                s.data_key.to_string()
            };
            (header, chart.rows_for(s), s.data_key)
        })
        .collect();

    let x_rows: &[Map<String, Value>] = if !chart.data.is_empty() {
        &chart.data
    } else if let Some((_, rows, _)) = columns.first() {
        rows
    } else {
        &[]
    };

    let width = (precision + 8).max(12);
    let mut out = String::new();
    let _ = writeln!(out, "-- {} --", chart.title);
    let _ = write!(out, "{:>4}", chart.x_key);
    for (header, _, _) in &columns {
        let _ = write!(out, " {header:>width$}");
    }
    out.push('\n');

    for (i, x_row) in x_rows.iter().enumerate() {
        let x = x_row.get(chart.x_key).and_then(Value::as_f64).unwrap_or(i as f64 + 1.0);
        let _ = write!(out, "{x:>4}");
        for (_, rows, key) in &columns {
            let cell = rows
                .get(i)
                .and_then(|r| r.get(*key))
                .and_then(Value::as_f64)
                .map_or_else(|| "-".to_string(), |v| format_cell(v, precision));
            let _ = write!(out, " {cell:>width$}");
        }
        out.push('\n');
    }
    out
}

fn format_cell(v: f64, precision: usize) -> String {
    let magnitude = v.abs();
    if magnitude != 0.0 && !(1e-4..1e6).contains(&magnitude) {
        format!("{v:.prec$e}", prec = precision.min(6))
    } else {
        format!("{v:.precision$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use series_core::{
        AlternatingParams, RatioTestParams, RearrangementMode, alternating, ratio_test,
        rearrangement,
    };

    #[test]
    fn test_ratio_table() {
        let view = views::ratio_test(&ratio_test::compute(&RatioTestParams::new(0.5, 3)));
        let text = render_view(&view, 4);
        assert!(text.contains("== Theorem 13: Ratio Test =="));
        assert!(text.contains("absolutely convergent"));
        assert!(text.contains("0.2500"));
        assert!(text.lines().any(|l| l.trim_start().starts_with('3')));
    }

    #[test]
    fn test_statement_uses_text_rendering() {
        let view = views::alternating(&alternating::compute(&AlternatingParams::default()));
        let text = render_view(&view, 4);
        assert!(text.contains("|R_n|=|L-S_n|≤u_(n+1)"), "{text}");
    }

    #[test]
    fn test_per_series_columns() {
        let mut rng = SmallRng::seed_from_u64(1);
        let view = views::rearrangement(
            &rearrangement::compute(RearrangementMode::Conditional, &mut rng),
            0,
        );
        let text = render_view(&view, 4);
        assert!(text.contains("original order"));
        assert!(text.contains("rearranged"));
        assert!(text.contains("note: Warning"));
        // header + 30 rows in the single chart
        let table_rows = text
            .lines()
            .skip_while(|l| !l.starts_with("-- "))
            .skip(2)
            .count();
        assert_eq!(table_rows, 30);
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(0.5, 3), "0.500");
        assert_eq!(format_cell(0.0, 2), "0.00");
        assert_eq!(format_cell(1.5e-7, 2), "1.50e-7");
    }
}
