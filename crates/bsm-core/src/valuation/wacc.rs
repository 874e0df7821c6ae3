use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PricingError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::PricingResult;

/// Capital-structure inputs for the Weighted Average Cost of Capital.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaccInput {
    /// Total firm value (debt + equity)
    pub total_assets: Money,
    /// Market value of debt
    pub debt: Money,
    /// Pre-tax cost of debt
    pub pretax_cost_of_debt: Rate,
    /// Marginal corporate tax rate
    pub tax_rate: Rate,
    /// Levered beta of equity
    pub equity_beta: Decimal,
    /// Expected market return. The premium over the risk-free rate is derived
    /// as `market_return - risk_free_rate`.
    #[serde(alias = "market_risk_premium")]
    pub market_return: Rate,
    pub risk_free_rate: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaccOutput {
    /// Weighted average cost of capital as a decimal rate
    pub wacc: Rate,
    /// WACC expressed as a percentage (wacc * 100)
    pub wacc_percent: Decimal,
    /// CAPM cost of equity
    pub cost_of_equity: Rate,
    pub after_tax_cost_of_debt: Rate,
    pub equity_value: Money,
    pub debt_ratio: Rate,
    pub equity_ratio: Rate,
    /// Human-readable form, e.g. "WACC: 11.21%"
    pub display: String,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_wacc_input(input: &WaccInput) -> PricingResult<()> {
    if input.total_assets <= Decimal::ZERO {
        return Err(PricingError::domain(
            "total_assets",
            "Total assets must be positive",
        ));
    }
    if input.debt < Decimal::ZERO {
        return Err(PricingError::domain("debt", "Debt cannot be negative"));
    }
    if input.debt > input.total_assets {
        return Err(PricingError::domain(
            "debt",
            "Debt cannot exceed total assets (equity would be negative)",
        ));
    }
    if input.pretax_cost_of_debt < Decimal::ZERO {
        return Err(PricingError::domain(
            "pretax_cost_of_debt",
            "Cost of debt cannot be negative",
        ));
    }
    if input.tax_rate < Decimal::ZERO || input.tax_rate > Decimal::ONE {
        return Err(PricingError::domain(
            "tax_rate",
            "Tax rate must be between 0 and 1",
        ));
    }
    if input.equity_beta < Decimal::ZERO {
        return Err(PricingError::domain(
            "equity_beta",
            "Beta cannot be negative",
        ));
    }
    Ok(())
}

struct WaccComponents {
    equity_value: Money,
    cost_of_equity: Rate,
    after_tax_cost_of_debt: Rate,
    debt_ratio: Rate,
    equity_ratio: Rate,
    wacc: Rate,
}

/// Decimal overflow surfaces as an error naming the quantity, never a panic.
fn checked(quantity: &str, value: Option<Decimal>) -> PricingResult<Decimal> {
    value.ok_or_else(|| PricingError::NonFiniteResult {
        quantity: quantity.into(),
    })
}

fn wacc_components(input: &WaccInput) -> PricingResult<WaccComponents> {
    // 0 <= debt <= total_assets after validation, so these cannot overflow
    let equity_value = input.total_assets - input.debt;
    let debt_ratio = input.debt / input.total_assets;
    let equity_ratio = equity_value / input.total_assets;

    // CAPM: Ke = Rf + Beta * (Rm - Rf)
    let premium = checked(
        "market_premium",
        input.market_return.checked_sub(input.risk_free_rate),
    )?;
    let cost_of_equity = checked(
        "cost_of_equity",
        input
            .equity_beta
            .checked_mul(premium)
            .and_then(|p| input.risk_free_rate.checked_add(p)),
    )?;
    let after_tax_cost_of_debt = checked(
        "after_tax_cost_of_debt",
        input
            .pretax_cost_of_debt
            .checked_mul(Decimal::ONE - input.tax_rate),
    )?;
    let wacc = checked(
        "wacc",
        after_tax_cost_of_debt
            .checked_mul(debt_ratio)
            .zip(cost_of_equity.checked_mul(equity_ratio))
            .and_then(|(debt_leg, equity_leg)| debt_leg.checked_add(equity_leg)),
    )?;

    Ok(WaccComponents {
        equity_value,
        cost_of_equity,
        after_tax_cost_of_debt,
        debt_ratio,
        equity_ratio,
        wacc,
    })
}

fn to_percent(wacc: Rate) -> PricingResult<Decimal> {
    checked("wacc_percent", wacc.checked_mul(dec!(100))).map(|p| p.normalize())
}

fn display_percent(percent: Decimal) -> String {
    let rounded = percent.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("WACC: {rounded:.2}%")
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// WACC as a percentage (11.205 means 11.205%).
///
/// WACC = Kd * (1 - t) * D/V + (Rf + Beta * (Rm - Rf)) * E/V, with E = V - D.
pub fn compute_wacc(input: &WaccInput) -> PricingResult<Decimal> {
    validate_wacc_input(input)?;
    to_percent(wacc_components(input)?.wacc)
}

/// WACC with its component breakdown, wrapped in the standard envelope.
pub fn calculate_wacc(input: &WaccInput) -> PricingResult<ComputationOutput<WaccOutput>> {
    let start = Instant::now();
    validate_wacc_input(input)?;
    let mut warnings: Vec<String> = Vec::new();

    let c = wacc_components(input)?;
    let wacc_percent = to_percent(c.wacc)?;

    if input.equity_beta > dec!(3.0) {
        warnings.push(format!(
            "High beta ({}): verify market data; betas above 3.0 are unusual",
            input.equity_beta
        ));
    }
    if input.market_return < input.risk_free_rate {
        warnings.push(format!(
            "Market return ({}) is below the risk-free rate ({}): implied equity premium is negative",
            input.market_return, input.risk_free_rate
        ));
    }
    if c.wacc > dec!(0.20) {
        warnings.push(format!(
            "WACC of {} exceeds 20%; appropriate for high-risk situations only",
            c.wacc
        ));
    }

    let output = WaccOutput {
        wacc: c.wacc,
        wacc_percent,
        cost_of_equity: c.cost_of_equity,
        after_tax_cost_of_debt: c.after_tax_cost_of_debt,
        equity_value: c.equity_value,
        debt_ratio: c.debt_ratio,
        equity_ratio: c.equity_ratio,
        display: display_percent(wacc_percent),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "WACC via CAPM cost of equity",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
