#![allow(clippy::format_push_string)]
#![allow(clippy::uninlined_format_args)]

use crate::result::TestResult;

pub struct ReportFormatter;

impl ReportFormatter {
    #[must_use]
    pub fn format(result: &TestResult) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("             SUPERIOR PREDICTIVE ABILITY TEST                  \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        // Setup
        output.push_str("Setup\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("Periods:               {}\n", result.periods));
        output.push_str(&format!("Strategies:            {}\n", result.strategies.len()));
        output.push_str(&format!("Null Sharpe:           {:.4}\n", result.null_sharpe));
        output.push_str(&format!("Replications:          {}\n", result.replications));
        output.push_str(&format!(
            "Mean Block Length:     {:.2}\n",
            result.mean_block_length
        ));
        output.push_str(&format!("Recentering:           {}\n", result.recentering));
        output.push('\n');

        // Test outcome
        output.push_str("Test Outcome\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            "Observed Statistic:    {:.4} ({})\n",
            result.observed_statistic, result.best_strategy
        ));
        output.push_str(&format!("p-value:               {:.4}\n", result.p_value));
        output.push_str(&format!(
            "Threshold ({:.0}%):       {:.4}\n",
            (1.0 - result.significance_level) * 100.0,
            result.significance_threshold
        ));
        let verdict = if result.rejected {
            "REJECTED (a superior strategy exists)"
        } else {
            "NOT REJECTED"
        };
        output.push_str(&format!("Null Hypothesis:       {}\n", verdict));
        output.push('\n');

        // Strategies
        output.push_str("Strategies\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!(
            "{:<20} {:>10} {:>10} {:>10} {:>6}\n",
            "Name", "Sharpe", "Boot SD", "t-stat", "Flag"
        ));
        for s in &result.strategies {
            output.push_str(&format!(
                "{:<20} {:>10.4} {:>10.4} {:>10.4} {:>6}\n",
                truncate(&s.name, 20),
                s.sharpe_ratio,
                s.bootstrap_std_dev,
                s.studentized,
                if s.flagged { "*" } else { "" }
            ));
        }

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");

        if result.flagged_strategies.is_empty() {
            output.push_str("\nNo strategy beats the benchmark after data-snooping correction.\n\n");
        } else {
            output.push_str(&format!(
                "\nSuperior strategies: {}\n\n",
                result.flagged_strategies.join(", ")
            ));
        }

        output
    }
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        name.to_string()
    } else {
        let mut short: String = name.chars().take(width - 1).collect();
        short.push('~');
        short
    }
}
