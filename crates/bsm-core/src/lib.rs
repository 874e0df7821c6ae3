pub mod distribution;
pub mod error;
pub mod types;

#[cfg(feature = "derivatives")]
pub mod derivatives;

#[cfg(feature = "valuation")]
pub mod valuation;

#[cfg(feature = "batch")]
pub mod batch;

pub use error::PricingError;
pub use types::*;

#[cfg(feature = "derivatives")]
pub use derivatives::fx_options::{price_fx_call, FxPriceResult, FxPricingInput};
#[cfg(feature = "derivatives")]
pub use derivatives::options::{price_and_greeks, OptionType, PriceResult, PricingInput};
#[cfg(feature = "derivatives")]
pub use derivatives::terms::{IntermediateTerms, PricingBoundary};
#[cfg(feature = "valuation")]
pub use valuation::wacc::{compute_wacc, WaccInput};

/// Standard result type for all pricing operations
pub type PricingResult<T> = Result<T, PricingError>;
