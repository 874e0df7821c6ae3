mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::derivatives::{BatchArgs, FxOptionArgs, OptionArgs};
use commands::valuation::WaccArgs;

/// Closed-form option pricing, Greeks and cost of capital
#[derive(Parser)]
#[command(
    name = "bsm",
    version,
    about = "Black-Scholes-Merton option pricing, Greeks and WACC",
    long_about = "Prices European equity options (Black-Scholes-Merton, price plus \
                  Delta/Gamma/Theta/Vega/Rho), European FX calls (Garman-Kohlhagen) and \
                  computes a firm's weighted average cost of capital. Inputs come from \
                  flags, a JSON file (--input) or JSON piped on stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log debug events to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a European equity option and its Greeks
    Option(OptionArgs),
    /// Price a European FX call (Garman-Kohlhagen)
    FxOption(FxOptionArgs),
    /// Price a portfolio of equity options in parallel
    Batch(BatchArgs),
    /// Calculate Weighted Average Cost of Capital
    Wacc(WaccArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(output = ?cli.output, "starting bsm");

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Option(args) => commands::derivatives::run_option(args),
        Commands::FxOption(args) => commands::derivatives::run_fx_option(args),
        Commands::Batch(args) => commands::derivatives::run_batch(args),
        Commands::Wacc(args) => commands::valuation::run_wacc(args),
        Commands::Version => {
            println!("bsm {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
