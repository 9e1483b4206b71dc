use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Pro-forma
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_property(input_json: String) -> NapiResult<String> {
    let input: proforma_core::proforma::simulator::SimulationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        proforma_core::proforma::simulator::simulate_property(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn simulate_company(input_json: String) -> NapiResult<String> {
    let input: proforma_core::proforma::company::CompanyInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = proforma_core::proforma::company::simulate_company_projection(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

#[napi]
pub fn build_amortization(input_json: String) -> NapiResult<String> {
    let input: proforma_core::financing::amortization::AmortizationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        proforma_core::financing::amortization::build_amortization(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_dscr(input_json: String) -> NapiResult<String> {
    let input: proforma_core::financing::calculators::DscrInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        proforma_core::financing::calculators::calculate_dscr(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_debt_yield(input_json: String) -> NapiResult<String> {
    let input: proforma_core::financing::calculators::DebtYieldInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        proforma_core::financing::calculators::calculate_debt_yield(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn financing_sensitivity(input_json: String) -> NapiResult<String> {
    let input: proforma_core::financing::calculators::FinancingSensitivityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = proforma_core::financing::calculators::run_financing_sensitivity(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_prepayment(input_json: String) -> NapiResult<String> {
    let input: proforma_core::financing::prepayment::PrepaymentInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        proforma_core::financing::prepayment::calculate_prepayment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_dcf(input_json: String) -> NapiResult<String> {
    let input: proforma_core::returns::dcf::DcfInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = proforma_core::returns::dcf::calculate_dcf(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_irr_vector(input_json: String) -> NapiResult<String> {
    let input: proforma_core::returns::irr_vector::IrrVectorInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        proforma_core::returns::irr_vector::build_irr_vector(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_equity_multiple(input_json: String) -> NapiResult<String> {
    let input: proforma_core::returns::equity_multiple::EquityMultipleInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = proforma_core::returns::equity_multiple::calculate_equity_multiple(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_exit_valuation(input_json: String) -> NapiResult<String> {
    let input: proforma_core::returns::exit::ExitValuationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        proforma_core::returns::exit::calculate_exit_valuation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_break_even(input_json: String) -> NapiResult<String> {
    let input: proforma_core::returns::break_even::BreakEvenInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        proforma_core::returns::break_even::calculate_break_even(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[napi]
pub fn validate_financial_identities(input_json: String) -> NapiResult<String> {
    let input: proforma_core::validation::identities::IdentityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = proforma_core::validation::identities::validate_financial_identities(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn check_funding_gates(input_json: String) -> NapiResult<String> {
    let input: proforma_core::validation::funding_gates::FundingGateInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = proforma_core::validation::funding_gates::check_funding_gates(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn reconcile_schedule(input_json: String) -> NapiResult<String> {
    let input: proforma_core::validation::schedule::ScheduleReconciliationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        proforma_core::validation::schedule::reconcile_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn check_assumption_consistency(input_json: String) -> NapiResult<String> {
    let input: proforma_core::validation::consistency::ConsistencyInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = proforma_core::validation::consistency::check_assumption_consistency(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn verify_export(input_json: String) -> NapiResult<String> {
    let input: proforma_core::validation::export::ExportVerificationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = proforma_core::validation::export::verify_export(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

#[napi]
pub fn run_independent_verification(input_json: String) -> NapiResult<String> {
    let input: proforma_core::audit::engine::VerificationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        proforma_core::audit::engine::run_independent_verification(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

#[napi]
pub fn consolidate_statements(input_json: String) -> NapiResult<String> {
    let input: proforma_core::portfolio::consolidation::ConsolidationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = proforma_core::portfolio::consolidation::consolidate_statements(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_scenarios(input_json: String) -> NapiResult<String> {
    let input: proforma_core::portfolio::scenario::ScenarioComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        proforma_core::portfolio::scenario::compare_scenarios(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
