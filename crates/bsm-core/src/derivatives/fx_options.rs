use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::derivatives::options::{classify_moneyness, intrinsic_value, OptionType};
use crate::derivatives::terms::{
    ensure_finite, require_finite, require_non_negative, require_positive, time_in_years,
    IntermediateTerms, PricingBoundary,
};
use crate::distribution::norm_cdf;
use crate::error::PricingError;
use crate::types::{with_metadata_f64, ComputationOutput};
use crate::PricingResult;

const ENGINE_NAME: &str = "Garman-Kohlhagen FX engine";

/// Decimal places of the presented FX premium.
pub const FX_PRICE_DECIMALS: i32 = 3;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// FX option on a pair quoted as domestic units per one foreign unit
/// (EUR/USD = 1.1743 means 1 EUR costs 1.1743 USD; USD is domestic).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FxPricingInput {
    pub spot_rate: f64,
    pub strike_price: f64,
    /// Domestic (quote currency) risk-free rate, annualised
    pub domestic_rate: f64,
    /// Foreign (base currency) risk-free rate, annualised; may be negative
    pub foreign_rate: f64,
    pub volatility: f64,
    pub days_to_expiry: f64,
    /// Only calls are priced; a put is rejected rather than silently priced as a call
    #[serde(default = "default_fx_option_type")]
    pub option_type: OptionType,
}

fn default_fx_option_type() -> OptionType {
    OptionType::Call
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FxPriceResult {
    /// Premium in domestic units per foreign unit, rounded to 3 decimal places
    pub price: f64,
    /// Full-precision premium before rounding
    pub unrounded_price: f64,
    /// Absent on the expiry day
    pub terms: Option<IntermediateTerms>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<PricingBoundary>,
}

/// FX option request for the analysis envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxOptionRequest {
    #[serde(flatten)]
    pub option: FxPricingInput,
    /// Currency pair label, e.g. "EUR/USD" (foreign/domestic)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair: Option<String>,
    /// Notional in foreign currency units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notional: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxOptionAnalysis {
    #[serde(flatten)]
    pub pricing: FxPriceResult,
    /// Premium expressed in pips (price * 10,000)
    pub premium_pips: f64,
    /// Premium for the whole notional, in domestic currency
    pub premium_domestic: Option<f64>,
    /// Covered interest parity forward: S * e^((r_d - r_f) * T)
    pub forward_rate: f64,
    pub forward_points_pips: f64,
    pub intrinsic_value: f64,
    pub moneyness: String,
    pub foreign_currency: Option<String>,
    pub domestic_currency: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn validate_fx_input(input: &FxPricingInput) -> PricingResult<()> {
    if input.option_type != OptionType::Call {
        return Err(PricingError::UnsupportedOptionType {
            engine: ENGINE_NAME.into(),
            option_type: input.option_type.to_string(),
        });
    }
    require_positive("spot_rate", input.spot_rate)?;
    require_positive("strike_price", input.strike_price)?;
    require_finite("domestic_rate", input.domestic_rate)?;
    require_finite("foreign_rate", input.foreign_rate)?;
    require_positive("volatility", input.volatility)?;
    require_non_negative("days_to_expiry", input.days_to_expiry)?;
    Ok(())
}

// Cancellation deep out of the money can leave a tiny negative; also maps -0.0 to 0.0
fn floor_at_zero(value: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        0.0
    }
}

fn round_dp(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Parse a currency pair string like "EUR/USD" into (foreign, domestic).
fn parse_pair(pair: &str) -> PricingResult<(String, String)> {
    let parts: Vec<&str> = pair.split('/').collect();
    if parts.len() != 2 || parts.iter().any(|p| p.trim().is_empty()) {
        return Err(PricingError::InvalidDomain {
            field: "pair".into(),
            reason: format!("Expected format 'FOR/DOM', got '{pair}'"),
        });
    }
    Ok((
        parts[0].trim().to_uppercase(),
        parts[1].trim().to_uppercase(),
    ))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Price of a European FX call.
///
/// d1 = (ln(S/K) + (r_d - r_f + sigma^2/2) * T) / (sigma * sqrt(T))
/// C  = e^(-r_d T) * S * N(d1) - e^(-r_f T) * K * N(d2)
///
/// The spot leg is discounted at the domestic rate and the strike leg at the
/// foreign rate. With r_d == r_f this is the textbook Garman-Kohlhagen price.
/// The premium is floored at zero before rounding.
pub fn price_fx_call(input: &FxPricingInput) -> PricingResult<FxPriceResult> {
    validate_fx_input(input)?;

    let s = input.spot_rate;
    let k = input.strike_price;
    let t = time_in_years(input.days_to_expiry);

    if t == 0.0 {
        let intrinsic = intrinsic_value(s, k, OptionType::Call);
        return Ok(FxPriceResult {
            price: round_dp(intrinsic, FX_PRICE_DECIMALS),
            unrounded_price: intrinsic,
            terms: None,
            boundary: Some(PricingBoundary::DegenerateMaturity),
        });
    }

    let terms = IntermediateTerms::compute(
        s,
        k,
        input.domestic_rate - input.foreign_rate,
        input.volatility,
        t,
    );
    let foreign_df = (-input.foreign_rate * t).exp();
    let domestic_df = (-input.domestic_rate * t).exp();
    let call = domestic_df * s * norm_cdf(terms.d1) - foreign_df * k * norm_cdf(terms.d2);
    let call = floor_at_zero(ensure_finite("price", call)?);

    Ok(FxPriceResult {
        price: round_dp(call, FX_PRICE_DECIMALS),
        unrounded_price: call,
        terms: Some(terms),
        boundary: None,
    })
}

/// FX call price plus forward, pip and notional views in the standard envelope.
pub fn analyse_fx_option(
    request: &FxOptionRequest,
) -> PricingResult<ComputationOutput<FxOptionAnalysis>> {
    let start = Instant::now();
    let input = &request.option;
    let pricing = price_fx_call(input)?;

    let (foreign_currency, domestic_currency) = match request.pair.as_deref() {
        Some(pair) => {
            let (f, d) = parse_pair(pair)?;
            (Some(f), Some(d))
        }
        None => (None, None),
    };
    if let Some(notional) = request.notional {
        require_positive("notional", notional)?;
    }

    let s = input.spot_rate;
    let t = time_in_years(input.days_to_expiry);
    let forward_rate = ensure_finite(
        "forward_rate",
        s * ((input.domestic_rate - input.foreign_rate) * t).exp(),
    )?;

    let output = FxOptionAnalysis {
        pricing,
        premium_pips: pricing.unrounded_price * 10_000.0,
        premium_domestic: request.notional.map(|n| n * pricing.unrounded_price),
        forward_rate,
        forward_points_pips: (forward_rate - s) * 10_000.0,
        intrinsic_value: intrinsic_value(s, input.strike_price, OptionType::Call),
        moneyness: classify_moneyness(s, input.strike_price, OptionType::Call),
        foreign_currency,
        domestic_currency,
    };

    let mut warnings = Vec::new();
    if pricing.boundary == Some(PricingBoundary::DegenerateMaturity) {
        warnings.push("Zero days to expiry: priced at intrinsic value".to_string());
    }
    if pricing.price == 0.0 && pricing.unrounded_price > 0.0 {
        warnings.push(format!(
            "Premium {:.8} rounds to zero at {} decimal places; use unrounded_price",
            pricing.unrounded_price, FX_PRICE_DECIMALS
        ));
    }
    let rate_diff_bps = (input.domestic_rate - input.foreign_rate).abs() * 10_000.0;
    if rate_diff_bps > 500.0 {
        warnings.push(format!(
            "Rate differential of {rate_diff_bps:.0} bps exceeds 500 bps"
        ));
    }

    let assumptions = serde_json::json!({
        "model": "Garman-Kohlhagen",
        "d1_convention": "divided by sigma * sqrt(T)",
        "discounting": "spot leg at domestic rate, strike leg at foreign rate",
        "domestic_rate": input.domestic_rate,
        "foreign_rate": input.foreign_rate,
        "volatility": input.volatility,
        "days_to_expiry": input.days_to_expiry,
        "day_count": "days / 365",
        "pair": request.pair,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Garman-Kohlhagen FX call (closed-form)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
