use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::PricingResult;

/// Day-count basis used to turn days-to-expiry into a year fraction.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Standardised moneyness terms of the Black-Scholes formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntermediateTerms {
    pub time_years: f64,
    pub d1: f64,
    pub d2: f64,
}

impl IntermediateTerms {
    /// d1 = (ln(S/K) + (carry + sigma^2/2) * t) / (sigma * sqrt(t)), d2 = d1 - sigma * sqrt(t).
    ///
    /// `carry` is the risk-free rate for equity and the domestic minus foreign
    /// rate for FX. Requires `time_years > 0`; callers handle expiry-day inputs
    /// before reaching this point.
    pub fn compute(
        spot: f64,
        strike: f64,
        carry: f64,
        volatility: f64,
        time_years: f64,
    ) -> Self {
        let sigma_sqrt_t = volatility * time_years.sqrt();
        let d1 = ((spot / strike).ln() + (carry + volatility * volatility / 2.0) * time_years)
            / sigma_sqrt_t;
        let d2 = d1 - sigma_sqrt_t;
        IntermediateTerms { time_years, d1, d2 }
    }

    /// sigma * sqrt(t), recovered exactly as d1 - d2 would give it.
    pub fn sigma_sqrt_t(&self) -> f64 {
        self.d1 - self.d2
    }
}

/// Whether a result sits on a boundary of the model rather than inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingBoundary {
    /// Zero days to expiry: priced at intrinsic value, Greeks reported as zero.
    DegenerateMaturity,
}

pub fn time_in_years(days_to_expiry: f64) -> f64 {
    days_to_expiry / DAYS_PER_YEAR
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

pub(crate) fn require_finite(field: &str, value: f64) -> PricingResult<()> {
    if !value.is_finite() {
        return Err(PricingError::domain(field, "must be a finite number"));
    }
    Ok(())
}

pub(crate) fn require_positive(field: &str, value: f64) -> PricingResult<()> {
    require_finite(field, value)?;
    if value <= 0.0 {
        return Err(PricingError::domain(field, "must be positive"));
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &str, value: f64) -> PricingResult<()> {
    require_finite(field, value)?;
    if value < 0.0 {
        return Err(PricingError::domain(field, "cannot be negative"));
    }
    Ok(())
}

/// Output guard: nothing leaves an engine as NaN or infinity.
pub(crate) fn ensure_finite(quantity: &str, value: f64) -> PricingResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PricingError::NonFiniteResult {
            quantity: quantity.into(),
        })
    }
}
