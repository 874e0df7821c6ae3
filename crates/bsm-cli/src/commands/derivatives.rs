use clap::Args;
use serde_json::Value;
use tracing::{debug, info};

use bsm_core::batch::{self, Position};
use bsm_core::derivatives::fx_options::{self, FxOptionRequest, FxPricingInput};
use bsm_core::derivatives::options::{self, OptionType, PricingInput};

use crate::input;

/// Arguments for equity option pricing
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct OptionArgs {
    /// Current price of the underlying
    #[arg(long)]
    pub spot: Option<f64>,

    /// Strike price
    #[arg(long)]
    pub strike: Option<f64>,

    /// Continuously compounded risk-free rate (0.05 = 5%)
    #[arg(long)]
    pub rate: Option<f64>,

    /// Annualised volatility (0.20 = 20%)
    #[arg(long)]
    pub volatility: Option<f64>,

    /// Calendar days to expiry
    #[arg(long)]
    pub days: Option<f64>,

    /// "call" or "put"
    #[arg(long, default_value = "call")]
    pub option_type: String,

    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_option(args: OptionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let pricing_input: PricingInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_stdin()? {
        request
    } else {
        PricingInput {
            spot: args.spot.ok_or("--spot is required (or provide --input)")?,
            strike: args.strike.ok_or("--strike is required (or provide --input)")?,
            rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            volatility: args
                .volatility
                .ok_or("--volatility is required (or provide --input)")?,
            days_to_expiry: args.days.ok_or("--days is required (or provide --input)")?,
            option_type: args.option_type.parse::<OptionType>()?,
        }
    };
    debug!(?pricing_input, "pricing equity option");
    let result = options::analyse_option(&pricing_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for FX option pricing
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct FxOptionArgs {
    /// Spot exchange rate (domestic units per unit of foreign)
    #[arg(long)]
    pub spot_rate: Option<f64>,

    /// Strike exchange rate
    #[arg(long)]
    pub strike: Option<f64>,

    /// Domestic continuously compounded rate
    #[arg(long)]
    pub domestic_rate: Option<f64>,

    /// Foreign continuously compounded rate
    #[arg(long)]
    pub foreign_rate: Option<f64>,

    /// Annualised volatility of the exchange rate
    #[arg(long)]
    pub volatility: Option<f64>,

    /// Calendar days to expiry
    #[arg(long)]
    pub days: Option<f64>,

    /// Only "call" is priced; "put" is rejected
    #[arg(long, default_value = "call")]
    pub option_type: String,

    /// Currency pair as FOREIGN/DOMESTIC, e.g. EUR/USD
    #[arg(long)]
    pub pair: Option<String>,

    /// Notional in foreign currency units
    #[arg(long)]
    pub notional: Option<f64>,

    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_fx_option(args: FxOptionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: FxOptionRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_stdin()? {
        request
    } else {
        FxOptionRequest {
            option: FxPricingInput {
                spot_rate: args
                    .spot_rate
                    .ok_or("--spot-rate is required (or provide --input)")?,
                strike_price: args.strike.ok_or("--strike is required (or provide --input)")?,
                domestic_rate: args
                    .domestic_rate
                    .ok_or("--domestic-rate is required (or provide --input)")?,
                foreign_rate: args
                    .foreign_rate
                    .ok_or("--foreign-rate is required (or provide --input)")?,
                volatility: args
                    .volatility
                    .ok_or("--volatility is required (or provide --input)")?,
                days_to_expiry: args.days.ok_or("--days is required (or provide --input)")?,
                option_type: args.option_type.parse::<OptionType>()?,
            },
            pair: args.pair,
            notional: args.notional,
        }
    };
    debug!(input = ?request.option, pair = ?request.pair, "pricing FX option");
    let result = fx_options::analyse_fx_option(&request)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for portfolio pricing
#[derive(Args)]
pub struct BatchArgs {
    /// Path to a JSON array of positions
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_batch(args: BatchArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let positions: Vec<Position> = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_stdin()? {
        request
    } else {
        return Err("--input <positions.json> or stdin required for batch pricing".into());
    };
    let result = batch::price_portfolio(&positions);
    info!(
        positions = result.result.positions,
        failed = result.result.failed,
        elapsed_us = result.metadata.computation_time_us,
        "portfolio priced"
    );
    Ok(serde_json::to_value(result)?)
}
