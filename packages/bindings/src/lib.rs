use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[napi]
pub fn generate_schedule(input_json: String) -> NapiResult<String> {
    let input: loan_plan_core::schedule::french::ScheduleInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        loan_plan_core::schedule::french::generate_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Optimiser
// ---------------------------------------------------------------------------

#[napi]
pub fn optimize_plan(input_json: String) -> NapiResult<String> {
    let input: loan_plan_core::optimizer::plan_search::OptimizationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        loan_plan_core::optimizer::plan_search::optimize_plan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
