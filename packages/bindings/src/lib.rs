use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use bsm_core::batch::{self, Position};
use bsm_core::derivatives::fx_options::{self, FxOptionRequest};
use bsm_core::derivatives::options::{self, PricingInput};
use bsm_core::valuation::wacc::{self, WaccInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse<T: DeserializeOwned>(input_json: &str) -> NapiResult<T> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

fn render<T: Serialize>(output: &T) -> NapiResult<String> {
    serde_json::to_string(output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Option pricing
// ---------------------------------------------------------------------------

#[napi]
pub fn price_option(input_json: String) -> NapiResult<String> {
    let input: PricingInput = parse(&input_json)?;
    let output = options::analyse_option(&input).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn price_fx_option(input_json: String) -> NapiResult<String> {
    let input: FxOptionRequest = parse(&input_json)?;
    let output = fx_options::analyse_fx_option(&input).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn price_batch(input_json: String) -> NapiResult<String> {
    let positions: Vec<Position> = parse(&input_json)?;
    render(&batch::price_portfolio(&positions))
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_wacc(input_json: String) -> NapiResult<String> {
    let input: WaccInput = parse(&input_json)?;
    let output = wacc::calculate_wacc(&input).map_err(to_napi_error)?;
    render(&output)
}
