use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::derivatives::terms::{
    ensure_finite, require_finite, require_non_negative, require_positive, time_in_years,
    IntermediateTerms, PricingBoundary,
};
use crate::distribution::{norm_cdf, norm_pdf};
use crate::error::PricingError;
use crate::types::{with_metadata_f64, ComputationOutput};
use crate::PricingResult;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// European option kind. Labels parse case-insensitively from "call" / "put";
/// anything else is rejected with [`PricingError::InvalidOptionType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }
}

impl FromStr for OptionType {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" => Ok(OptionType::Call),
            "put" => Ok(OptionType::Put),
            _ => Err(PricingError::InvalidOptionType(s.to_string())),
        }
    }
}

impl TryFrom<String> for OptionType {
    type Error = PricingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OptionType> for String {
    fn from(value: OptionType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingInput {
    pub spot: f64,
    pub strike: f64,
    /// Continuously compounded risk-free rate (0.02 = 2%)
    pub rate: f64,
    /// Annualised volatility (0.22 = 22%)
    pub volatility: f64,
    /// Calendar days to expiry; converted with a 365-day year
    pub days_to_expiry: f64,
    pub option_type: OptionType,
}

/// Price and annualised Greeks. Vega and rho are per 1.00 change in
/// volatility / rate, theta per year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceResult {
    pub price: f64,
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<PricingBoundary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionAnalysis {
    #[serde(flatten)]
    pub pricing: PriceResult,
    pub intrinsic_value: f64,
    pub time_value: f64,
    /// Price of the opposite option type implied by put-call parity
    pub put_call_parity_price: f64,
    pub moneyness: String,
    pub breakeven: f64,
    /// Absent on the expiry day, where d1/d2 are undefined
    pub terms: Option<IntermediateTerms>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_pricing_input(input: &PricingInput) -> PricingResult<()> {
    require_positive("spot", input.spot)?;
    require_positive("strike", input.strike)?;
    require_finite("rate", input.rate)?;
    require_positive("volatility", input.volatility)?;
    require_non_negative("days_to_expiry", input.days_to_expiry)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Black-Scholes internals
// ---------------------------------------------------------------------------

fn black_scholes(input: &PricingInput, terms: &IntermediateTerms) -> PriceResult {
    let s = input.spot;
    let k = input.strike;
    let r = input.rate;
    let sigma = input.volatility;
    let t = terms.time_years;
    let sqrt_t = t.sqrt();
    let exp_neg_rt = (-r * t).exp();
    let nd1 = norm_pdf(terms.d1);

    // Shared decay term of theta: -S * sigma * n(d1) / (2 * sqrt(T))
    let theta_decay = -(s * sigma * nd1) / (2.0 * sqrt_t);
    let gamma = nd1 / (s * sigma * sqrt_t);
    let vega = s * sqrt_t * nd1;

    match input.option_type {
        OptionType::Call => {
            let nd2 = norm_cdf(terms.d2);
            PriceResult {
                price: s * norm_cdf(terms.d1) - k * exp_neg_rt * nd2,
                delta: norm_cdf(terms.d1),
                gamma,
                theta: theta_decay - r * k * exp_neg_rt * nd2,
                vega,
                rho: k * t * exp_neg_rt * nd2,
                boundary: None,
            }
        }
        OptionType::Put => {
            let n_neg_d2 = norm_cdf(-terms.d2);
            PriceResult {
                price: k * exp_neg_rt * n_neg_d2 - s * norm_cdf(-terms.d1),
                delta: -norm_cdf(-terms.d1),
                gamma,
                theta: theta_decay + r * k * exp_neg_rt * n_neg_d2,
                vega,
                rho: -k * t * exp_neg_rt * n_neg_d2,
                boundary: None,
            }
        }
    }
}

/// Expiry-day result: intrinsic value, Greeks zeroed and the boundary flagged.
fn expiry_result(input: &PricingInput) -> PriceResult {
    PriceResult {
        price: intrinsic_value(input.spot, input.strike, input.option_type),
        delta: 0.0,
        gamma: 0.0,
        theta: 0.0,
        vega: 0.0,
        rho: 0.0,
        boundary: Some(PricingBoundary::DegenerateMaturity),
    }
}

fn check_finite(result: PriceResult) -> PricingResult<PriceResult> {
    ensure_finite("price", result.price)?;
    ensure_finite("delta", result.delta)?;
    ensure_finite("gamma", result.gamma)?;
    ensure_finite("theta", result.theta)?;
    ensure_finite("vega", result.vega)?;
    ensure_finite("rho", result.rho)?;
    Ok(result)
}

// ---------------------------------------------------------------------------
// Moneyness and intrinsic value helpers
// ---------------------------------------------------------------------------

pub(crate) fn intrinsic_value(s: f64, k: f64, option_type: OptionType) -> f64 {
    match option_type {
        OptionType::Call => (s - k).max(0.0),
        OptionType::Put => (k - s).max(0.0),
    }
}

pub(crate) fn classify_moneyness(s: f64, k: f64, option_type: OptionType) -> String {
    let ratio = s / k;
    // ATM band: within 1% of strike
    let itm = match option_type {
        OptionType::Call => ratio > 1.01,
        OptionType::Put => ratio < 0.99,
    };
    let otm = match option_type {
        OptionType::Call => ratio < 0.99,
        OptionType::Put => ratio > 1.01,
    };
    if itm {
        "ITM".into()
    } else if otm {
        "OTM".into()
    } else {
        "ATM".into()
    }
}

fn breakeven(k: f64, premium: f64, option_type: OptionType) -> f64 {
    match option_type {
        OptionType::Call => k + premium,
        OptionType::Put => k - premium,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// d1, d2 and the year fraction for a validated input. `None` on the expiry
/// day, where sigma * sqrt(t) is zero.
pub fn intermediate_terms(input: &PricingInput) -> PricingResult<Option<IntermediateTerms>> {
    validate_pricing_input(input)?;
    let t = time_in_years(input.days_to_expiry);
    if t == 0.0 {
        return Ok(None);
    }
    Ok(Some(IntermediateTerms::compute(
        input.spot,
        input.strike,
        input.rate,
        input.volatility,
        t,
    )))
}

/// Black-Scholes-Merton price and Greeks for a European equity option.
pub fn price_and_greeks(input: &PricingInput) -> PricingResult<PriceResult> {
    match intermediate_terms(input)? {
        Some(terms) => check_finite(black_scholes(input, &terms)),
        None => Ok(expiry_result(input)),
    }
}

/// Price, Greeks and the usual desk diagnostics, wrapped in the standard envelope.
pub fn analyse_option(input: &PricingInput) -> PricingResult<ComputationOutput<OptionAnalysis>> {
    let start = Instant::now();
    let terms = intermediate_terms(input)?;
    let pricing = price_and_greeks(input)?;

    let s = input.spot;
    let k = input.strike;
    let t = time_in_years(input.days_to_expiry);
    let discounted_strike = k * (-input.rate * t).exp();

    // If we priced a call, parity gives the put: P = C - S + K*e^(-rT), and vice versa
    let parity_price = match input.option_type {
        OptionType::Call => pricing.price - s + discounted_strike,
        OptionType::Put => pricing.price + s - discounted_strike,
    };
    let parity_price = ensure_finite("put_call_parity_price", parity_price)?;

    let iv = intrinsic_value(s, k, input.option_type);
    let output = OptionAnalysis {
        pricing,
        intrinsic_value: iv,
        time_value: pricing.price - iv,
        put_call_parity_price: parity_price,
        moneyness: classify_moneyness(s, k, input.option_type),
        breakeven: breakeven(k, pricing.price, input.option_type),
        terms,
    };

    let mut warnings = Vec::new();
    if pricing.boundary == Some(PricingBoundary::DegenerateMaturity) {
        warnings.push(
            "Zero days to expiry: priced at intrinsic value, Greeks are not defined and reported as 0"
                .to_string(),
        );
    } else if input.days_to_expiry < 1.0 {
        warnings.push(format!(
            "Less than one day to expiry ({} days): gamma and theta are numerically unstable",
            input.days_to_expiry
        ));
    }
    if input.volatility > 2.0 {
        warnings.push(format!(
            "Volatility of {} exceeds 200%; verify the input is annualised and not a percentage",
            input.volatility
        ));
    }
    if pricing.boundary.is_none() && pricing.price < s * 0.001 {
        warnings.push(format!(
            "Deep out-of-the-money: price {:.6} is below 0.1% of spot",
            pricing.price
        ));
    }

    let assumptions = serde_json::json!({
        "model": "Black-Scholes-Merton",
        "option_type": input.option_type.as_str(),
        "risk_free_rate": input.rate,
        "volatility": input.volatility,
        "days_to_expiry": input.days_to_expiry,
        "day_count": "days / 365",
        "greeks": "annualised; vega and rho per 1.00 change",
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Black-Scholes-Merton (closed-form)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn default_call() -> PricingInput {
        PricingInput {
            spot: 100.0,
            strike: 100.0,
            rate: 0.05,
            volatility: 0.20,
            days_to_expiry: 365.0,
            option_type: OptionType::Call,
        }
    }

    fn default_put() -> PricingInput {
        PricingInput {
            option_type: OptionType::Put,
            ..default_call()
        }
    }

    // -----------------------------------------------------------------------
    // Option type parsing
    // -----------------------------------------------------------------------

    #[test]
    fn test_option_type_parses_case_insensitively() {
        assert_eq!("call".parse::<OptionType>(), Ok(OptionType::Call));
        assert_eq!(" PUT ".parse::<OptionType>(), Ok(OptionType::Put));
        assert_eq!("Call".parse::<OptionType>(), Ok(OptionType::Call));
    }

    #[test]
    fn test_invalid_option_type_rejected() {
        assert_eq!(
            "straddle".parse::<OptionType>(),
            Err(PricingError::InvalidOptionType("straddle".into()))
        );
    }

    #[test]
    fn test_invalid_option_type_rejected_by_serde() {
        let json = r#"{"spot":100,"strike":100,"rate":0.05,"volatility":0.2,
                       "days_to_expiry":30,"option_type":"binary"}"#;
        let err = serde_json::from_str::<PricingInput>(json).unwrap_err();
        assert!(err.to_string().contains("Invalid option type"), "{err}");
    }

    #[test]
    fn test_option_type_serialises_lowercase() {
        let json = serde_json::to_string(&default_put()).unwrap();
        assert!(json.contains(r#""option_type":"put""#), "{json}");
    }

    // -----------------------------------------------------------------------
    // Pricing
    // -----------------------------------------------------------------------

    #[test]
    fn test_call_atm_reference_price() {
        // Hull, Options Futures & Other Derivatives: S=K=100, T=1, r=5%, vol=20%
        let result = price_and_greeks(&default_call()).unwrap();
        assert_abs_diff_eq!(result.price, 10.450583572185565, epsilon = 1e-9);
        assert_abs_diff_eq!(result.delta, 0.636830651175619, epsilon = 1e-9);
        assert!(result.boundary.is_none());
    }

    #[test]
    fn test_put_atm_reference_price() {
        let result = price_and_greeks(&default_put()).unwrap();
        assert_abs_diff_eq!(result.price, 5.573526022256971, epsilon = 1e-9);
        assert_abs_diff_eq!(result.delta, -0.363169348824381, epsilon = 1e-9);
    }

    #[test]
    fn test_gamma_and_vega_identical_across_types() {
        let call = price_and_greeks(&default_call()).unwrap();
        let put = price_and_greeks(&default_put()).unwrap();
        assert_eq!(call.gamma, put.gamma);
        assert_eq!(call.vega, put.vega);
    }

    #[test]
    fn test_call_minus_put_delta_is_one() {
        let call = price_and_greeks(&default_call()).unwrap();
        let put = price_and_greeks(&default_put()).unwrap();
        assert_relative_eq!(call.delta - put.delta, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vega_matches_finite_difference() {
        let h = 1e-5;
        let up = PricingInput {
            volatility: 0.20 + h,
            ..default_call()
        };
        let down = PricingInput {
            volatility: 0.20 - h,
            ..default_call()
        };
        let fd = (price_and_greeks(&up).unwrap().price - price_and_greeks(&down).unwrap().price)
            / (2.0 * h);
        let vega = price_and_greeks(&default_call()).unwrap().vega;
        assert_relative_eq!(vega, fd, max_relative = 1e-6);
    }

    #[test]
    fn test_rho_matches_finite_difference() {
        let h = 1e-5;
        for base in [default_call(), default_put()] {
            let up = PricingInput {
                rate: base.rate + h,
                ..base
            };
            let down = PricingInput {
                rate: base.rate - h,
                ..base
            };
            let fd = (price_and_greeks(&up).unwrap().price
                - price_and_greeks(&down).unwrap().price)
                / (2.0 * h);
            let rho = price_and_greeks(&base).unwrap().rho;
            assert_relative_eq!(rho, fd, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_theta_negative_for_atm() {
        let call = price_and_greeks(&default_call()).unwrap();
        let put = price_and_greeks(&default_put()).unwrap();
        assert!(call.theta < 0.0, "Call theta {} should be negative", call.theta);
        assert!(put.theta < 0.0, "Put theta {} should be negative", put.theta);
    }

    // -----------------------------------------------------------------------
    // Boundaries and validation
    // -----------------------------------------------------------------------

    #[test]
    fn test_expiry_day_returns_intrinsic() {
        let input = PricingInput {
            spot: 100.0,
            strike: 90.0,
            days_to_expiry: 0.0,
            ..default_call()
        };
        let result = price_and_greeks(&input).unwrap();
        assert_eq!(result.price, 10.0);
        assert_eq!(result.gamma, 0.0);
        assert_eq!(result.boundary, Some(PricingBoundary::DegenerateMaturity));

        let put = price_and_greeks(&PricingInput {
            option_type: OptionType::Put,
            ..input
        })
        .unwrap();
        assert_eq!(put.price, 0.0);
    }

    #[test]
    fn test_zero_volatility_error() {
        let input = PricingInput {
            volatility: 0.0,
            ..default_call()
        };
        match price_and_greeks(&input).unwrap_err() {
            PricingError::InvalidDomain { field, .. } => assert_eq!(field, "volatility"),
            other => panic!("Expected InvalidDomain, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_days_error() {
        let input = PricingInput {
            days_to_expiry: -1.0,
            ..default_call()
        };
        match price_and_greeks(&input).unwrap_err() {
            PricingError::InvalidDomain { field, .. } => assert_eq!(field, "days_to_expiry"),
            other => panic!("Expected InvalidDomain, got {other:?}"),
        }
    }

    #[test]
    fn test_non_positive_spot_and_strike_errors() {
        for (spot, strike, field) in [(0.0, 100.0, "spot"), (100.0, -5.0, "strike")] {
            let input = PricingInput {
                spot,
                strike,
                ..default_call()
            };
            match price_and_greeks(&input).unwrap_err() {
                PricingError::InvalidDomain { field: f, .. } => assert_eq!(f, field),
                other => panic!("Expected InvalidDomain, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_nan_rate_rejected() {
        let input = PricingInput {
            rate: f64::NAN,
            ..default_call()
        };
        assert!(matches!(
            price_and_greeks(&input),
            Err(PricingError::InvalidDomain { .. })
        ));
    }

    #[test]
    fn test_overflowing_rate_is_non_finite_error() {
        let input = PricingInput {
            rate: -1e6,
            days_to_expiry: 3650.0,
            ..default_call()
        };
        assert!(matches!(
            price_and_greeks(&input),
            Err(PricingError::NonFiniteResult { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Analysis envelope
    // -----------------------------------------------------------------------

    #[test]
    fn test_analysis_parity_price_matches_put() {
        let analysis = analyse_option(&default_call()).unwrap();
        let put = price_and_greeks(&default_put()).unwrap();
        assert_relative_eq!(
            analysis.result.put_call_parity_price,
            put.price,
            max_relative = 1e-10
        );
    }

    #[test]
    fn test_analysis_moneyness_classification() {
        let itm = PricingInput {
            spot: 110.0,
            ..default_call()
        };
        assert_eq!(analyse_option(&itm).unwrap().result.moneyness, "ITM");
        let otm = PricingInput {
            spot: 90.0,
            ..default_call()
        };
        assert_eq!(analyse_option(&otm).unwrap().result.moneyness, "OTM");
        assert_eq!(analyse_option(&default_call()).unwrap().result.moneyness, "ATM");
        let itm_put = PricingInput {
            spot: 90.0,
            ..default_put()
        };
        assert_eq!(analyse_option(&itm_put).unwrap().result.moneyness, "ITM");
    }

    #[test]
    fn test_analysis_time_value_and_breakeven() {
        let input = PricingInput {
            spot: 110.0,
            ..default_call()
        };
        let out = analyse_option(&input).unwrap().result;
        assert_eq!(out.intrinsic_value, 10.0);
        assert_relative_eq!(out.time_value, out.pricing.price - 10.0);
        assert_relative_eq!(out.breakeven, 100.0 + out.pricing.price);
        assert!(out.terms.is_some());
    }

    #[test]
    fn test_analysis_warns_on_expiry_day() {
        let input = PricingInput {
            days_to_expiry: 0.0,
            ..default_call()
        };
        let out = analyse_option(&input).unwrap();
        assert!(out.result.terms.is_none());
        assert!(out.warnings.iter().any(|w| w.contains("Zero days to expiry")));
    }

    #[test]
    fn test_analysis_warns_on_deep_otm() {
        let input = PricingInput {
            spot: 50.0,
            strike: 200.0,
            days_to_expiry: 30.0,
            ..default_call()
        };
        let out = analyse_option(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("Deep out-of-the-money")));
    }

    #[test]
    fn test_metadata_populated() {
        let out = analyse_option(&default_call()).unwrap();
        assert_eq!(out.methodology, "Black-Scholes-Merton (closed-form)");
        assert!(!out.metadata.version.is_empty());
        assert_eq!(out.metadata.precision, "ieee754_f64");
    }
}
