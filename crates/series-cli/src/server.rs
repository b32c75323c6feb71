use std::sync::Arc;

use rand::rngs::SmallRng;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use series_core::{RearrangementMode, Regime};
use series_render::{Navigator, TheoremKind, View, render_html, render_or_fallback, render_text_or_fallback};
use tokio::sync::Mutex;

const DEFAULT_INSTRUCTIONS: &str = "Interactive visualizer for four theorems on infinite series: \
     limit comparison, ratio test, alternating series (Leibniz bound) and rearrangement.\n\n\
     Exactly one visualizer is active. series_select switches to another one and resets it to \
     defaults; re-selecting the active one keeps its parameters. Each engine tool selects its \
     visualizer, applies the given parameters (out-of-range values are clamped to the slider \
     range) and returns the full view: theorem statement, controls, conclusion, headline numbers \
     and chart data. series_view returns the active view without changing anything.";

#[derive(Clone)]
pub struct SeriesServer {
    state: Arc<Mutex<ServerState>>,
    instructions: Arc<str>,
    tool_router: ToolRouter<Self>,
}

struct ServerState {
    navigator: Navigator,
    rng: SmallRng,
}

impl SeriesServer {
    pub fn new(rng: SmallRng, instructions: Option<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServerState {
                navigator: Navigator::default(),
                rng,
            })),
            instructions: instructions.as_deref().unwrap_or(DEFAULT_INSTRUCTIONS).into(),
            tool_router: Self::tool_router(),
        }
    }

    fn view_result(view: &View) -> CallToolResult {
        CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(view).unwrap_or_default(),
        )])
    }
}

fn parse_arg<T>(value: Option<&str>) -> Result<Option<T>, McpError>
where
    T: std::str::FromStr<Err = String>,
{
    value
        .map(|s| s.parse::<T>().map_err(|e| McpError::invalid_params(e, None)))
        .transpose()
}

// --- Tool parameter types ---

#[derive(Debug, Deserialize, JsonSchema)]
struct SelectRequest {
    /// One of: limit-comparison, ratio-test, alternating-series, rearrangement
    theorem: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct LimitComparisonRequest {
    /// Reference exponent p in b_n = 1/n^p (0.2 to 2.5)
    p: Option<f64>,
    /// Target limit c of a_n/b_n in the normal regime (0.1 to 4)
    c: Option<f64>,
    /// Limit regime: "normal", "zero" or "infinity". Switching moves p to the regime's preset.
    regime: Option<String>,
    /// Number of terms (1 to 40)
    terms: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RatioTestRequest {
    /// Limiting ratio rho (0.5 to 1.5)
    rho: Option<f64>,
    /// Number of terms (1 to 40)
    terms: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AlternatingRequest {
    /// Decay rate r of u_n = r^n (0.1 to 0.95)
    decay: Option<f64>,
    /// Number of terms (1 to 40)
    terms: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RearrangementRequest {
    /// Base series: "absolute" (1/1.5^n) or "conditional" (alternating harmonic)
    mode: Option<String>,
    /// Draw a fresh random permutation
    #[serde(default)]
    reshuffle: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct FormulaRequest {
    /// LaTeX-style formula source
    source: String,
    /// Display (block) mode instead of inline
    #[serde(default)]
    display: bool,
}

#[tool_router]
impl SeriesServer {
    #[tool(
        description = "Switch the active visualizer. Switching to a different one discards the old visualizer's parameters; re-selecting the active one keeps them. Returns the new view."
    )]
    async fn series_select(
        &self,
        Parameters(req): Parameters<SelectRequest>,
    ) -> Result<CallToolResult, McpError> {
        let kind: TheoremKind = req
            .theorem
            .parse()
            .map_err(|e: String| McpError::invalid_params(e, None))?;

        let mut state = self.state.lock().await;
        let ServerState { navigator, rng } = &mut *state;
        let replaced = navigator.select(kind);
        let view = navigator.view(rng);

        let result = serde_json::json!({
            "active": kind,
            "label": kind.label(),
            "replaced": replaced,
            "theorems": TheoremKind::ALL
                .iter()
                .map(|k| serde_json::json!({ "id": k, "label": k.label() }))
                .collect::<Vec<_>>(),
            "view": view,
        });
        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&result).unwrap_or_default(),
        )]))
    }

    #[tool(description = "Return the active visualizer's view without changing any parameters.")]
    async fn series_view(&self) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let ServerState { navigator, rng } = &mut *state;
        Ok(Self::view_result(&navigator.view(rng)))
    }

    #[tool(
        description = "Limit comparison test. Compares a target series a_n with the reference b_n = 1/n^p while a_n/b_n approaches c (normal), 0 (zero) or infinity. Omitted parameters keep their current values."
    )]
    async fn series_limit_comparison(
        &self,
        Parameters(req): Parameters<LimitComparisonRequest>,
    ) -> Result<CallToolResult, McpError> {
        let regime = parse_arg::<Regime>(req.regime.as_deref())?;

        let mut state = self.state.lock().await;
        let ServerState { navigator, rng } = &mut *state;
        let panel = navigator.limit_comparison();
        if let Some(regime) = regime {
            panel.set_regime(regime);
        }
        if let Some(p) = req.p {
            panel.set_p(p);
        }
        if let Some(c) = req.c {
            panel.set_c(c);
        }
        if let Some(terms) = req.terms {
            panel.set_terms(terms);
        }
        Ok(Self::view_result(&navigator.view(rng)))
    }

    #[tool(
        description = "Ratio test on the geometric sequence a_n = rho^(n-1). rho < 1 converges absolutely, rho > 1 diverges, rho = 1 is inconclusive."
    )]
    async fn series_ratio_test(
        &self,
        Parameters(req): Parameters<RatioTestRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let ServerState { navigator, rng } = &mut *state;
        let panel = navigator.ratio_test();
        if let Some(rho) = req.rho {
            panel.set_rho(rho);
        }
        if let Some(terms) = req.terms {
            panel.set_terms(terms);
        }
        Ok(Self::view_result(&navigator.view(rng)))
    }

    #[tool(
        description = "Alternating series sum (-1)^(n+1) r^n with its partial sums trapping the limit r/(1+r), and the Leibniz error bound |L - S_n| <= u_(n+1)."
    )]
    async fn series_alternating(
        &self,
        Parameters(req): Parameters<AlternatingRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut state = self.state.lock().await;
        let ServerState { navigator, rng } = &mut *state;
        let panel = navigator.alternating();
        if let Some(decay) = req.decay {
            panel.set_decay(decay);
        }
        if let Some(terms) = req.terms {
            panel.set_terms(terms);
        }
        Ok(Self::view_result(&navigator.view(rng)))
    }

    #[tool(
        description = "Rearrangement: partial sums of a 30-term series in original order and in a random order. Absolutely convergent series keep their sum; the conditional mode carries a warning. Set reshuffle to draw a new permutation."
    )]
    async fn series_rearrangement(
        &self,
        Parameters(req): Parameters<RearrangementRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mode = parse_arg::<RearrangementMode>(req.mode.as_deref())?;

        let mut state = self.state.lock().await;
        let ServerState { navigator, rng } = &mut *state;
        let panel = navigator.rearrangement();
        if let Some(mode) = mode {
            panel.set_mode(mode);
        }
        if req.reshuffle {
            panel.reshuffle();
        }
        Ok(Self::view_result(&navigator.view(rng)))
    }

    #[tool(
        description = "Render a LaTeX-style formula to HTML markup and plain text. Malformed input falls back to the escaped source (the text form is the exact source)."
    )]
    async fn series_render_formula(
        &self,
        Parameters(req): Parameters<FormulaRequest>,
    ) -> Result<CallToolResult, McpError> {
        let result = match render_html(&req.source, req.display) {
            Ok(markup) => serde_json::json!({
                "markup": markup,
                "text": render_text_or_fallback(&req.source),
                "fallback": false,
            }),
            // the parse error is logged by render_or_fallback, never returned
            Err(_) => serde_json::json!({
                "markup": render_or_fallback(&req.source, req.display),
                "text": req.source,
                "fallback": true,
            }),
        };
        Ok(CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&result).unwrap_or_default(),
        )]))
    }
}

#[tool_handler]
impl ServerHandler for SeriesServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(self.instructions.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
