use clap::{Parser, Subcommand};

mod commands;
mod loader;

use commands::{ConfigArgs, ScreenArgs, TestArgs};

#[derive(Parser)]
#[command(name = "spa")]
#[command(about = "Superior Predictive Ability test for strategy Sharpe ratios", long_about = None)]
struct Cli {
    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bootstrap SPA test on a return table
    Test(TestArgs),
    /// Run the analytic step-down screen on a return table
    Screen(ScreenArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match &cli.log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    match cli.command {
        Commands::Test(args) => {
            commands::run_spa_test(args).await?;
        }
        Commands::Screen(args) => {
            commands::run_screen(args)?;
        }
        Commands::Config(args) => {
            commands::run_show_config(args)?;
        }
    }

    Ok(())
}
