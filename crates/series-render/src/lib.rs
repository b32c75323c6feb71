//! Presentation layer for the series visualizer.
//!
//! Turns `series-core` results into things a front end can draw: formula
//! markup, declarative chart specs, and per-theorem views. Panels hold each
//! visualizer's private parameters; the [`Navigator`] keeps exactly one of
//! them active.

pub mod chart;
pub mod error;
pub mod formula;
pub mod navigator;
pub mod panels;
pub mod text;
pub mod views;

pub use chart::{ChartKind, ChartRecord, ChartSpec, SeriesSpec};
pub use error::{FormulaError, Result};
pub use formula::{FormulaBlock, render_html, render_or_fallback, render_text, render_text_or_fallback};
pub use navigator::{Navigator, Panel, TheoremKind};
pub use panels::{AlternatingPanel, LimitComparisonPanel, RatioTestPanel, RearrangementPanel};
pub use text::render_view;
pub use views::{Tone, View};
