use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("Invalid domain for {field}: {reason}")]
    InvalidDomain { field: String, reason: String },

    #[error("Invalid option type: '{0}' (expected 'call' or 'put')")]
    InvalidOptionType(String),

    #[error("Unsupported option type: {engine} does not price {option_type} options")]
    UnsupportedOptionType {
        engine: String,
        option_type: String,
    },

    #[error("Non-finite result: {quantity} evaluated to NaN or infinity")]
    NonFiniteResult { quantity: String },
}

impl PricingError {
    pub(crate) fn domain(field: &str, reason: &str) -> Self {
        PricingError::InvalidDomain {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
