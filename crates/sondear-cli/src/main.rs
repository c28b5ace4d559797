//! Sondear CLI: batch selector-strategy validation.
//!
//! ## Usage
//!
//! ```bash
//! sondear validate strategy.json --url https://shop.example.com
//! sondear validate strategy.json --url https://shop.example.com --json
//! sondear validate strategy.json --url ... --headed --chromium /usr/bin/chromium
//! ```
//!
//! Exits non-zero when the batch fails; the error message carries the
//! failure rate and the top failing selectors.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use sondear::{BrowserSettings, RunnerConfig, StrategyValidator, ValidationReport};
use tracing_subscriber::EnvFilter;

mod error;
use error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "sondear", version, about = "Selector feasibility validation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a strategy document against a live page
    Validate(ValidateArgs),
}

#[derive(Args)]
struct ValidateArgs {
    /// Path to the strategy JSON document
    strategy: PathBuf,

    /// Target page URL
    #[arg(long)]
    url: String,

    /// Print the full report as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Run with a visible browser window
    #[arg(long)]
    headed: bool,

    /// Disable the chromium sandbox (containers/CI)
    #[arg(long)]
    no_sandbox: bool,

    /// Path to a chromium binary
    #[arg(long, env = "SONDEAR_CHROMIUM")]
    chromium: Option<String>,

    /// Page-load timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Tolerated failure rate in percent (0 = any failure fails)
    #[arg(long, default_value_t = 0.0)]
    max_failure_rate: f64,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    match cli.command {
        Commands::Validate(args) => validate(&args, cli.quiet).await,
    }
}

fn init_tracing(cli: &Cli) {
    let default = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn validate(args: &ValidateArgs, quiet: bool) -> CliResult<()> {
    if !(0.0..=100.0).contains(&args.max_failure_rate) {
        return Err(CliError::invalid_argument(
            "--max-failure-rate must be between 0 and 100",
        ));
    }

    let document = std::fs::read_to_string(&args.strategy)?;

    let browser = {
        let mut settings = BrowserSettings::default().with_headless(!args.headed);
        if args.no_sandbox {
            settings = settings.with_no_sandbox();
        }
        if let Some(ref path) = args.chromium {
            settings = settings.with_chromium_path(path);
        }
        settings
    };

    let config = RunnerConfig::new()
        .with_page_load_timeout(Duration::from_secs(args.timeout_secs))
        .with_max_failure_rate(args.max_failure_rate)
        .with_browser(browser);

    let validator = StrategyValidator::launch(config).await?;
    let report = validator.validate(&args.url, &document).await?;
    tracing::debug!(run_id = %report.run_id, "validation run complete");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !quiet {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &ValidationReport) {
    println!(
        "Validated {} selectors: {} passed, {} failed ({:.1}% failure rate)",
        report.total_selectors,
        report.successful_selectors,
        report.failed_selectors,
        report.failure_rate
    );
    for nav in &report.navigations {
        if nav.changed {
            println!("  navigation: {} -> {}", nav.from, nav.to);
        }
    }
    println!("Result: PASS");
}
