mod config;
mod server;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rmcp::{ServiceExt, transport::stdio};
use series_core::{RearrangementMode, Regime};
use series_render::{Navigator, TheoremKind, View, render_or_fallback, render_text_or_fallback, render_view};

use config::{Config, OutputFormat, load_config};

const MAX_RESHUFFLES: u64 = 1000;

#[derive(Parser)]
#[command(name = "series", about = "Interactive visualizer for infinite-series convergence theorems")]
struct Cli {
    /// TOML config file (defaults to $SERIES_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    /// Seed for the random source used by jitter and shuffles
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Print the view as JSON instead of a text report
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server on stdio transport
    Serve,

    /// Limit comparison test against the reference b_n = 1/n^p
    LimitComparison {
        /// Reference exponent p
        #[arg(long)]
        p: Option<f64>,
        /// Target limit c of a_n/b_n (normal regime only)
        #[arg(long)]
        c: Option<f64>,
        /// Limit regime: normal, zero or infinity
        #[arg(long)]
        regime: Option<Regime>,
        /// Number of terms
        #[arg(long)]
        terms: Option<usize>,
    },

    /// Ratio test on the geometric sequence rho^(n-1)
    RatioTest {
        /// Limiting ratio rho
        #[arg(long)]
        rho: Option<f64>,
        /// Number of terms
        #[arg(long)]
        terms: Option<usize>,
    },

    /// Alternating series with the Leibniz error bound
    Alternating {
        /// Decay rate r of u_n = r^n
        #[arg(long)]
        decay: Option<f64>,
        /// Number of terms
        #[arg(long)]
        terms: Option<usize>,
    },

    /// Original vs. randomly rearranged partial sums
    Rearrangement {
        /// Base series: absolute or conditional
        #[arg(long)]
        mode: Option<RearrangementMode>,
        /// Draw this many extra permutations before showing the last one
        #[arg(
            long,
            default_value_t = 0,
            value_parser = clap::value_parser!(u64).range(0..=MAX_RESHUFFLES)
        )]
        reshuffles: u64,
    },

    /// Render a LaTeX-style formula
    Formula {
        /// Formula source
        source: String,
        /// Display (block) mode instead of inline
        #[arg(long)]
        display: bool,
        /// Plain text instead of HTML markup
        #[arg(long)]
        text: bool,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn make_rng(cli: &Cli, config: &Config) -> SmallRng {
    match cli.seed.or(config.random.seed) {
        Some(seed) => {
            tracing::debug!(seed, "seeded random source");
            SmallRng::seed_from_u64(seed)
        }
        None => SmallRng::from_os_rng(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Serve => cmd_serve(&cli, config).await,
        Commands::LimitComparison {
            p,
            c,
            regime,
            terms,
        } => cmd_limit_comparison(&cli, &config, *p, *c, *regime, *terms),
        Commands::RatioTest { rho, terms } => cmd_ratio_test(&cli, &config, *rho, *terms),
        Commands::Alternating { decay, terms } => cmd_alternating(&cli, &config, *decay, *terms),
        Commands::Rearrangement { mode, reshuffles } => {
            cmd_rearrangement(&cli, &config, *mode, *reshuffles)
        }
        Commands::Formula {
            source,
            display,
            text,
        } => {
            cmd_formula(source, *display, *text);
            Ok(())
        }
    }
}

async fn cmd_serve(cli: &Cli, config: Config) -> Result<()> {
    let rng = make_rng(cli, &config);
    tracing::info!("starting MCP server");

    let server = server::SeriesServer::new(rng, config.server.instructions);
    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;

    tokio::select! {
        res = service.waiting() => {
            res?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted, shutting down");
        }
    }
    Ok(())
}

fn emit(cli: &Cli, config: &Config, view: &View) -> Result<()> {
    if cli.json || config.output.format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(view).context("failed to serialize view")?;
        println!("{json}");
    } else {
        print!("{}", render_view(view, config.output.precision));
    }
    Ok(())
}

fn cmd_limit_comparison(
    cli: &Cli,
    config: &Config,
    p: Option<f64>,
    c: Option<f64>,
    regime: Option<Regime>,
    terms: Option<usize>,
) -> Result<()> {
    let mut rng = make_rng(cli, config);
    let mut nav = Navigator::new(TheoremKind::LimitComparison);
    let panel = nav.limit_comparison();
    // regime first so an explicit --p overrides its preset
    if let Some(regime) = regime {
        panel.set_regime(regime);
    }
    if let Some(p) = p {
        panel.set_p(p);
    }
    if let Some(c) = c {
        panel.set_c(c);
    }
    if let Some(terms) = terms {
        panel.set_terms(terms);
    }
    emit(cli, config, &nav.view(&mut rng))
}

fn cmd_ratio_test(cli: &Cli, config: &Config, rho: Option<f64>, terms: Option<usize>) -> Result<()> {
    let mut rng = make_rng(cli, config);
    let mut nav = Navigator::new(TheoremKind::RatioTest);
    let panel = nav.ratio_test();
    if let Some(rho) = rho {
        panel.set_rho(rho);
    }
    if let Some(terms) = terms {
        panel.set_terms(terms);
    }
    emit(cli, config, &nav.view(&mut rng))
}

fn cmd_alternating(
    cli: &Cli,
    config: &Config,
    decay: Option<f64>,
    terms: Option<usize>,
) -> Result<()> {
    let mut rng = make_rng(cli, config);
    let mut nav = Navigator::new(TheoremKind::AlternatingSeries);
    let panel = nav.alternating();
    if let Some(decay) = decay {
        panel.set_decay(decay);
    }
    if let Some(terms) = terms {
        panel.set_terms(terms);
    }
    emit(cli, config, &nav.view(&mut rng))
}

fn cmd_rearrangement(
    cli: &Cli,
    config: &Config,
    mode: Option<RearrangementMode>,
    reshuffles: u64,
) -> Result<()> {
    let mut rng = make_rng(cli, config);
    let mut nav = Navigator::new(TheoremKind::Rearrangement);
    let panel = nav.rearrangement();
    if let Some(mode) = mode {
        panel.set_mode(mode);
    }
    for _ in 0..reshuffles {
        panel.series(&mut rng);
        panel.reshuffle();
    }
    emit(cli, config, &nav.view(&mut rng))
}

fn cmd_formula(source: &str, display: bool, text: bool) {
    if text {
        println!("{}", render_text_or_fallback(source));
    } else {
        println!("{}", render_or_fallback(source, display));
    }
}
