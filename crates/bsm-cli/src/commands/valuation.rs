use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use bsm_core::valuation::wacc::{self, WaccInput};

use crate::input;

/// Arguments for WACC calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct WaccArgs {
    /// Total firm value (debt + equity)
    #[arg(long)]
    pub total_assets: Option<Decimal>,

    /// Market value of debt
    #[arg(long)]
    pub debt: Option<Decimal>,

    /// Pre-tax cost of debt (e.g. 0.09 for 9%)
    #[arg(long)]
    pub cost_of_debt: Option<Decimal>,

    /// Marginal corporate tax rate
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Levered equity beta
    #[arg(long)]
    pub beta: Option<Decimal>,

    /// Expected market return (e.g. 0.10 for 10%)
    #[arg(long, alias = "market-risk-premium")]
    pub market_return: Option<Decimal>,

    /// Risk-free rate (e.g. 0.03 for 3%)
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_wacc(args: WaccArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let wacc_input: WaccInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(request) = input::stdin::read_stdin()? {
        request
    } else {
        WaccInput {
            total_assets: args
                .total_assets
                .ok_or("--total-assets is required (or provide --input)")?,
            debt: args.debt.ok_or("--debt is required (or provide --input)")?,
            pretax_cost_of_debt: args
                .cost_of_debt
                .ok_or("--cost-of-debt is required (or provide --input)")?,
            tax_rate: args
                .tax_rate
                .ok_or("--tax-rate is required (or provide --input)")?,
            equity_beta: args.beta.ok_or("--beta is required (or provide --input)")?,
            market_return: args
                .market_return
                .ok_or("--market-return is required (or provide --input)")?,
            risk_free_rate: args
                .risk_free_rate
                .ok_or("--risk-free-rate is required (or provide --input)")?,
        }
    };
    debug!(?wacc_input, "calculating WACC");
    let result = wacc::calculate_wacc(&wacc_input)?;
    Ok(serde_json::to_value(result)?)
}
