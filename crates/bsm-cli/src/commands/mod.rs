pub mod derivatives;
pub mod valuation;
