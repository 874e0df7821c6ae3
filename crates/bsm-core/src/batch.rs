//! Parallel pricing over many independent options.
//!
//! Every engine call is a pure function of its input, so positions are
//! priced on the rayon pool with no coordination. Results come back in input
//! order, and a row that fails validation is reported in place without
//! failing the rest of the batch.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::derivatives::fx_options::{price_fx_call, FxPriceResult, FxPricingInput};
use crate::derivatives::options::{price_and_greeks, PriceResult, PricingInput};
use crate::derivatives::terms::require_finite;
use crate::types::{with_metadata_f64, ComputationOutput};
use crate::PricingResult;

/// Price a batch of equity options in parallel. Output order matches input order.
pub fn price_batch(inputs: &[PricingInput]) -> Vec<PricingResult<PriceResult>> {
    debug!(count = inputs.len(), "pricing equity option batch");
    inputs.par_iter().map(price_and_greeks).collect()
}

/// Price a batch of FX calls in parallel. Output order matches input order.
pub fn price_fx_batch(inputs: &[FxPricingInput]) -> Vec<PricingResult<FxPriceResult>> {
    debug!(count = inputs.len(), "pricing FX option batch");
    inputs.par_iter().map(price_fx_call).collect()
}

// ---------------------------------------------------------------------------
// Portfolio aggregation
// ---------------------------------------------------------------------------

/// An equity option held in some quantity (negative for short positions).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(flatten)]
    pub option: PricingInput,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
}

fn default_quantity() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionResult {
    pub index: usize,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pricing: Option<PriceResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Quantity-weighted sums over every position that priced successfully.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioGreeks {
    pub value: f64,
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
}

impl PortfolioGreeks {
    fn add(mut self, quantity: f64, p: &PriceResult) -> Self {
        self.value += quantity * p.price;
        self.delta += quantity * p.delta;
        self.gamma += quantity * p.gamma;
        self.theta += quantity * p.theta;
        self.vega += quantity * p.vega;
        self.rho += quantity * p.rho;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioOutput {
    pub positions: usize,
    pub priced: usize,
    pub failed: usize,
    pub totals: PortfolioGreeks,
    pub results: Vec<PositionResult>,
}

fn price_position(index: usize, position: &Position) -> PositionResult {
    let priced = require_finite("quantity", position.quantity)
        .and_then(|_| price_and_greeks(&position.option));
    match priced {
        Ok(pricing) => PositionResult {
            index,
            quantity: position.quantity,
            pricing: Some(pricing),
            error: None,
        },
        Err(e) => PositionResult {
            index,
            quantity: position.quantity,
            pricing: None,
            error: Some(e.to_string()),
        },
    }
}

/// Price every position in parallel and aggregate position-weighted Greeks.
pub fn price_portfolio(positions: &[Position]) -> ComputationOutput<PortfolioOutput> {
    let start = Instant::now();

    let results: Vec<PositionResult> = positions
        .par_iter()
        .enumerate()
        .map(|(i, p)| price_position(i, p))
        .collect();

    // Summed sequentially in input order so totals are reproducible bit for bit
    let totals = results
        .iter()
        .filter_map(|r| r.pricing.as_ref().map(|p| (r.quantity, p)))
        .fold(PortfolioGreeks::default(), |acc, (q, p)| acc.add(q, p));

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    let mut warnings = Vec::new();
    if failed > 0 {
        warn!(failed, total = positions.len(), "positions failed validation");
        warnings.push(format!(
            "{failed} of {} positions failed and are excluded from totals",
            positions.len()
        ));
    }

    let output = PortfolioOutput {
        positions: positions.len(),
        priced: results.len() - failed,
        failed,
        totals,
        results,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata_f64(
        "Black-Scholes-Merton portfolio (parallel, per-position closed-form)",
        &serde_json::json!({ "threads": rayon::current_num_threads() }),
        warnings,
        elapsed,
        output,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivatives::options::OptionType;
    use crate::error::PricingError;
    use pretty_assertions::assert_eq;

    fn grid() -> Vec<PricingInput> {
        let mut inputs = Vec::new();
        for (i, strike) in [80.0, 90.0, 100.0, 110.0, 120.0].iter().enumerate() {
            for days in [0.0, 7.0, 30.0, 90.0, 365.0, 730.0] {
                inputs.push(PricingInput {
                    spot: 100.0,
                    strike: *strike,
                    rate: 0.01 * i as f64,
                    volatility: 0.15 + 0.05 * i as f64,
                    days_to_expiry: days,
                    option_type: if i % 2 == 0 {
                        OptionType::Call
                    } else {
                        OptionType::Put
                    },
                });
            }
        }
        inputs
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_engine_types_are_thread_safe() {
        assert_send_sync::<PricingInput>();
        assert_send_sync::<PriceResult>();
        assert_send_sync::<FxPricingInput>();
        assert_send_sync::<FxPriceResult>();
        assert_send_sync::<PricingError>();
    }

    #[test]
    fn test_parallel_matches_sequential_bit_for_bit() {
        let inputs = grid();
        let sequential: Vec<_> = inputs.iter().map(price_and_greeks).collect();
        let parallel = price_batch(&inputs);
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_bad_row_does_not_fail_batch() {
        let mut inputs = grid();
        inputs[3].volatility = 0.0;
        let results = price_batch(&inputs);
        assert_eq!(results.len(), inputs.len());
        assert!(matches!(results[3], Err(PricingError::InvalidDomain { .. })));
        assert!(results
            .iter()
            .enumerate()
            .all(|(i, r)| i == 3 || r.is_ok()));
    }

    #[test]
    fn test_fx_batch_preserves_order() {
        let inputs: Vec<FxPricingInput> = [1.10, 1.15, 1.20]
            .iter()
            .map(|spot| FxPricingInput {
                spot_rate: *spot,
                strike_price: 1.15,
                domestic_rate: 0.0025,
                foreign_rate: -0.00195,
                volatility: 0.12,
                days_to_expiry: 30.0,
                option_type: OptionType::Call,
            })
            .collect();
        let results = price_fx_batch(&inputs);
        let prices: Vec<f64> = results
            .into_iter()
            .map(|r| r.unwrap().unrounded_price)
            .collect();
        assert!(prices[0] < prices[1] && prices[1] < prices[2]);
    }

    #[test]
    fn test_long_short_same_option_nets_to_zero() {
        let option = grid()[10];
        let positions = [
            Position {
                option,
                quantity: 5.0,
            },
            Position {
                option,
                quantity: -5.0,
            },
        ];
        let out = price_portfolio(&positions).result;
        assert_eq!(out.priced, 2);
        assert_eq!(out.totals.delta, 0.0);
        assert_eq!(out.totals.vega, 0.0);
        assert_eq!(out.totals.value, 0.0);
    }

    #[test]
    fn test_portfolio_reports_failures_in_place() {
        let mut bad = grid()[1];
        bad.spot = -1.0;
        let positions = [
            Position {
                option: grid()[2],
                quantity: 1.0,
            },
            Position {
                option: bad,
                quantity: 1.0,
            },
        ];
        let out = price_portfolio(&positions);
        assert_eq!(out.result.failed, 1);
        assert_eq!(out.result.results[1].index, 1);
        assert!(out.result.results[1]
            .error
            .as_deref()
            .unwrap()
            .contains("spot"));
        assert_eq!(
            out.result.totals.value,
            out.result.results[0].pricing.unwrap().price
        );
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_position_quantity_defaults_to_one() {
        let json = r#"{"spot":100,"strike":100,"rate":0.05,"volatility":0.2,
                       "days_to_expiry":30,"option_type":"call"}"#;
        let position: Position = serde_json::from_str(json).unwrap();
        assert_eq!(position.quantity, 1.0);
    }
}
