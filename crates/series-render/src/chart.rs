//! Declarative chart descriptions handed to the charting surface.
//!
//! A chart is an ordered list of flat numeric records plus descriptors
//! saying which fields to plot and how. No computation happens here.

use serde::Serialize;
use serde_json::{Map, Number, Value};

use series_core::{
    AlternatingRecord, LimitComparisonRecord, PartialSumRecord, RatioTestRecord,
};

pub const GREEN: &str = "#10b981";
pub const RED: &str = "#ef4444";
pub const AMBER: &str = "#f59e0b";
pub const BLUE: &str = "#3b82f6";
pub const INDIGO: &str = "#6366f1";
pub const PINK: &str = "#ec4899";
pub const ROSE: &str = "#f43f5e";
pub const SLATE: &str = "#94a3b8";

/// One row of chart data: `n` plus named numeric fields.
pub trait ChartRecord {
    fn fields(&self) -> Vec<(&'static str, f64)>;
}

impl ChartRecord for LimitComparisonRecord {
    fn fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("n", self.n as f64),
            ("an", self.a),
            ("bn", self.b),
            ("sumAn", self.sum_a),
            ("sumBn", self.sum_b),
            ("ratio", self.ratio),
        ]
    }
}

impl ChartRecord for RatioTestRecord {
    fn fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("n", self.n as f64),
            ("val", self.value),
            ("ratio", self.ratio),
            ("logVal", self.log10_value),
        ]
    }
}

impl ChartRecord for AlternatingRecord {
    fn fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("n", self.n as f64),
            ("un", self.magnitude),
            ("sn", self.partial_sum),
            ("trapMin", self.trap_min),
            ("trapMax", self.trap_max),
            ("unPlus1", self.next_magnitude),
            ("error", self.error),
        ]
    }
}

impl ChartRecord for PartialSumRecord {
    fn fields(&self) -> Vec<(&'static str, f64)> {
        vec![("n", self.n as f64), ("sum", self.sum)]
    }
}

/// Flatten records into JSON objects. Non-finite values become `null`.
pub fn to_rows<R: ChartRecord>(records: &[R]) -> Vec<Map<String, Value>> {
    records
        .iter()
        .map(|r| {
            r.fields()
                .into_iter()
                .map(|(k, v)| {
                    let value = Number::from_f64(v).map_or(Value::Null, Value::Number);
                    (k.to_string(), value)
                })
                .collect()
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Area,
    Bar,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeriesSpec {
    pub data_key: &'static str,
    pub name: String,
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<&'static str>,
    pub dashed: bool,
    /// Draws from this series' own rows rather than the chart's shared data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Map<String, Value>>>,
}

impl SeriesSpec {
    pub fn new(data_key: &'static str, name: impl Into<String>, color: &'static str) -> Self {
        Self {
            data_key,
            name: name.into(),
            color,
            fill: None,
            dashed: false,
            data: None,
        }
    }

    pub fn dashed(mut self) -> Self {
        self.dashed = true;
        self
    }

    pub fn filled(mut self, fill: &'static str) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_data(mut self, rows: Vec<Map<String, Value>>) -> Self {
        self.data = Some(rows);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub y: f64,
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Y-axis bounds; `None` means fit to data.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AxisDomain {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: &'static str,
    pub title: String,
    pub kind: ChartKind,
    pub x_key: &'static str,
    pub data: Vec<Map<String, Value>>,
    pub series: Vec<SeriesSpec>,
    pub reference_lines: Vec<ReferenceLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_domain: Option<AxisDomain>,
}

impl ChartSpec {
    pub fn new(id: &'static str, title: impl Into<String>, kind: ChartKind) -> Self {
        Self {
            id,
            title: title.into(),
            kind,
            x_key: "n",
            data: Vec::new(),
            series: Vec::new(),
            reference_lines: Vec::new(),
            y_domain: None,
        }
    }

    pub fn rows<R: ChartRecord>(mut self, records: &[R]) -> Self {
        self.data = to_rows(records);
        self
    }

    pub fn series(mut self, spec: SeriesSpec) -> Self {
        self.series.push(spec);
        self
    }

    pub fn reference_line(mut self, y: f64, color: &'static str, label: Option<&str>) -> Self {
        self.reference_lines.push(ReferenceLine {
            y,
            color,
            label: label.map(str::to_string),
        });
        self
    }

    pub fn y_domain(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.y_domain = Some(AxisDomain { min, max });
        self
    }

    /// Rows a series plots: its own data if present, else the shared data.
    pub fn rows_for<'a>(&'a self, series: &'a SeriesSpec) -> &'a [Map<String, Value>] {
        series.data.as_deref().unwrap_or(&self.data)
    }
}
