//! Analytic step-down screen CLI command.
//!
//! Bootstrap-free cross-check of the SPA test: ranks strategies by per-period
//! Sharpe ratio and peels significant leaders off the top.

use anyhow::{Context, Result};
use clap::Args;

use spa_bootstrap::{AnalyticScreen, ScreenResult};

use super::spa_test::OutputFormat;
use crate::loader::load_returns;

/// Arguments for the screen command.
#[derive(Args, Debug, Clone)]
pub struct ScreenArgs {
    /// Return table CSV (key column + one column per strategy)
    #[arg(short, long)]
    pub data: String,

    /// Per-period (not annualized) benchmark Sharpe ratio
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    pub null_sharpe: f64,

    /// Significance level (alpha)
    #[arg(short, long, default_value = "0.05")]
    pub alpha: f64,

    /// Per-period risk-free rate subtracted from every return
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    pub risk_free_rate: f64,

    /// Output format: text, json
    #[arg(long, default_value = "text")]
    pub format: String,
}

pub fn run_screen(args: ScreenArgs) -> Result<()> {
    let format = OutputFormat::parse(&args.format)?;
    let matrix = load_returns(&args.data)?;

    tracing::info!(
        "Screening {} strategies over {} periods",
        matrix.n_strategies(),
        matrix.periods()
    );

    let result = AnalyticScreen::new(args.null_sharpe, args.alpha)
        .with_risk_free_rate(args.risk_free_rate)
        .run(&matrix)
        .context("Step-down screen failed")?;

    match format {
        OutputFormat::Text => println!("{}", format_screen_report(&result, args.alpha)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    Ok(())
}

/// Formats a screen result as a text report.
pub fn format_screen_report(result: &ScreenResult, alpha: f64) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("═══════════════════════════════════════════════════════════════\n");
    output.push_str("                 ANALYTIC STEP-DOWN SCREEN                     \n");
    output.push_str("═══════════════════════════════════════════════════════════════\n");
    output.push('\n');

    output.push_str(&format!("Significance Level:    {:.4}\n", alpha));
    output.push('\n');

    output.push_str("Steps\n");
    output.push_str("───────────────────────────────────────────────────────────────\n");
    output.push_str(&format!(
        "{:<20} {:>4} {:>8} {:>9} {:>4} {:>8} {:>5}\n",
        "Leader", "m", "rho", "max xi", "k", "z crit", "Sig"
    ));
    for step in &result.steps {
        let critical = step
            .critical_value
            .map_or_else(|| "-".to_string(), |z| format!("{z:.4}"));
        output.push_str(&format!(
            "{:<20} {:>4} {:>8.4} {:>9.4} {:>4} {:>8} {:>5}\n",
            step.leader,
            step.subset_size,
            step.mean_correlation,
            step.max_xi,
            step.admitted,
            critical,
            if step.significant { "yes" } else { "no" }
        ));
    }
    output.push('\n');

    if result.significant.is_empty() {
        output.push_str("No strategy is significant at this level.\n");
    } else {
        output.push_str(&format!(
            "Significant strategies: {}\n",
            result.significant.join(", ")
        ));
    }
    output.push_str("═══════════════════════════════════════════════════════════════\n");

    output
}
