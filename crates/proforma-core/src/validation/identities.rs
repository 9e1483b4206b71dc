use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::audit::checks::{
    AuditOpinion, CheckCategory, CheckResult, Severity, SeveritySummary,
};
use crate::proforma::simulator::MonthlyRecord;
use crate::rounding::Tolerance;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::ProformaResult;

/// Figures for one period. Each identity is checked only when every value
/// it needs is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_assets: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_liabilities: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_equity: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noi: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_expense: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depreciation: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_tax: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_income: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_cash_flow: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_payment: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinancing_proceeds: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financing_cash_flow: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beginning_cash: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_cash_flow: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending_cash: Option<Money>,
    #[serde(default)]
    pub tolerance: Tolerance,
}

impl IdentityInput {
    /// Every identity populated from one simulator month.
    pub fn from_record(record: &MonthlyRecord, beginning_cash: Money) -> Self {
        Self {
            total_assets: Some(record.total_assets),
            total_liabilities: Some(record.debt_outstanding),
            total_equity: Some(record.total_equity),
            noi: Some(record.noi),
            interest_expense: Some(record.interest_expense),
            depreciation: Some(record.depreciation),
            income_tax: Some(record.income_tax),
            net_income: Some(record.net_income),
            operating_cash_flow: Some(record.operating_cash_flow),
            principal_payment: Some(record.principal_payment),
            refinancing_proceeds: Some(record.refinancing_proceeds),
            financing_cash_flow: Some(record.financing_cash_flow),
            beginning_cash: Some(beginning_cash),
            net_cash_flow: Some(record.cash_flow),
            ending_cash: Some(record.ending_cash),
            tolerance: Tolerance::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityReport {
    pub checks: Vec<CheckResult>,
    pub summary: SeveritySummary,
    pub opinion: AuditOpinion,
}

/// Check the accounting identities a period's statements must satisfy.
pub fn validate_financial_identities(
    input: &IdentityInput,
) -> ProformaResult<ComputationOutput<IdentityReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let tol = &input.tolerance;
    let mut checks = Vec::new();

    if let (Some(assets), Some(liabilities), Some(equity)) =
        (input.total_assets, input.total_liabilities, input.total_equity)
    {
        checks.push(CheckResult::compare(
            "Balance sheet equation",
            CheckCategory::BalanceSheet,
            "Accounting equation",
            "assets = liabilities + equity",
            liabilities + equity,
            assets,
            tol,
            Severity::Critical,
        ));
    }

    if let (Some(ni), Some(dep), Some(ocf)) =
        (input.net_income, input.depreciation, input.operating_cash_flow)
    {
        checks.push(CheckResult::compare(
            "Operating cash flow (indirect method)",
            CheckCategory::CashFlow,
            "ASC 230-10-45-28",
            "net income + depreciation",
            ni + dep,
            ocf,
            tol,
            Severity::Material,
        ));
    }

    if let (Some(noi), Some(interest), Some(dep), Some(tax), Some(ni)) = (
        input.noi,
        input.interest_expense,
        input.depreciation,
        input.income_tax,
        input.net_income,
    ) {
        checks.push(CheckResult::compare(
            "Net income derivation",
            CheckCategory::Profitability,
            "Income statement",
            "NOI − interest − depreciation − tax",
            noi - interest - dep - tax,
            ni,
            tol,
            Severity::Critical,
        ));
    }

    if let (Some(principal), Some(fcf)) = (input.principal_payment, input.financing_cash_flow) {
        let proceeds = input.refinancing_proceeds.unwrap_or_default();
        checks.push(CheckResult::compare(
            "Financing cash flow composition",
            CheckCategory::CashFlow,
            "ASC 230-10-45-15",
            "−principal + refinancing proceeds",
            proceeds - principal,
            fcf,
            tol,
            Severity::Material,
        ));
    }

    if let (Some(begin), Some(change), Some(end)) =
        (input.beginning_cash, input.net_cash_flow, input.ending_cash)
    {
        checks.push(CheckResult::compare(
            "Cash reconciliation",
            CheckCategory::CashFlow,
            "Cash roll-forward",
            "ending = beginning + net change",
            begin + change,
            end,
            tol,
            Severity::Critical,
        ));
    }

    if checks.is_empty() {
        warnings.push("No identity had all of its inputs; nothing checked".into());
    }

    let summary = SeveritySummary::from_checks(&checks);
    let output = IdentityReport {
        opinion: AuditOpinion::from_summary(&summary),
        summary,
        checks,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Financial Identity Validation",
        input,
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proforma::assumptions::fixtures::*;
    use crate::proforma::simulator::build_projection;
    use rust_decimal_macros::dec;

    #[test]
    fn test_simulator_months_satisfy_all_identities() {
        let mut w = Vec::new();
        let p = build_projection(&sample_global(), &sample_property(), &mut w).unwrap();
        let mut beginning = dec!(0);
        for r in &p.records {
            let report = validate_financial_identities(&IdentityInput::from_record(r, beginning))
                .unwrap()
                .result;
            assert_eq!(report.checks.len(), 5);
            assert_eq!(report.opinion, AuditOpinion::Unqualified, "month {}", r.month_index);
            beginning = r.ending_cash;
        }
    }

    #[test]
    fn test_unbalanced_balance_sheet_is_adverse() {
        let input = IdentityInput {
            total_assets: Some(dec!(1000)),
            total_liabilities: Some(dec!(400)),
            total_equity: Some(dec!(500)),
            ..Default::default()
        };
        let report = validate_financial_identities(&input).unwrap().result;
        assert_eq!(report.checks.len(), 1);
        assert_eq!(report.opinion, AuditOpinion::Adverse);
    }

    #[test]
    fn test_operating_cash_flow_mismatch_qualifies() {
        let input = IdentityInput {
            net_income: Some(dec!(1000)),
            depreciation: Some(dec!(200)),
            operating_cash_flow: Some(dec!(1000)),
            ..Default::default()
        };
        let report = validate_financial_identities(&input).unwrap().result;
        assert_eq!(report.opinion, AuditOpinion::Qualified);
    }

    #[test]
    fn test_missing_inputs_skip_checks() {
        let out = validate_financial_identities(&IdentityInput::default()).unwrap();
        assert!(out.result.checks.is_empty());
        assert_eq!(out.result.opinion, AuditOpinion::Unqualified);
        assert_eq!(out.warnings.len(), 1);
    }
}
