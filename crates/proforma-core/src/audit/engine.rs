use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

use crate::error::ProformaError;
use crate::proforma::assumptions::{GlobalAssumptions, PropertyAssumptions};
use crate::proforma::company::{simulate_company, CompanyProjection};
use crate::proforma::simulator::{build_projection, PropertyProjection};
use crate::rounding::Tolerance;
use crate::types::{months_between, with_metadata, ComputationOutput, Money, Rate};
use crate::ProformaResult;

use super::checks::{
    total, AuditOpinion, CheckCategory, CheckResult, EntityReport, Severity, SeveritySummary,
};
use super::independent::{independent_metrics, PropertyActuals, VerificationMetrics};

const NOI_MARGIN_FLOOR: Rate = dec!(0);
const NOI_MARGIN_CEILING: Rate = dec!(0.60);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationInput {
    pub global: GlobalAssumptions,
    pub properties: Vec<PropertyAssumptions>,
    /// Figures from a separately maintained implementation, matched by
    /// property id. A property listed here is checked against these instead
    /// of the built-in independent derivation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_actuals: Option<Vec<PropertyActuals>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub property_reports: Vec<EntityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_report: Option<EntityReport>,
    pub consolidated_report: EntityReport,
    pub summary: SeveritySummary,
    pub opinion: AuditOpinion,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the primary simulator and a second derivation over the same
/// assumptions and audit the agreement at property, company and
/// consolidated level.
pub fn run_independent_verification(
    input: &VerificationInput,
) -> ProformaResult<ComputationOutput<VerificationReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.properties.is_empty() {
        return Err(ProformaError::InsufficientData(
            "Verification requires at least one property".into(),
        ));
    }

    let external: HashMap<&str, &PropertyActuals> = input
        .external_actuals
        .iter()
        .flatten()
        .map(|a| (a.property_id.as_str(), a))
        .collect();
    for id in external.keys() {
        if !input.properties.iter().any(|p| p.id == *id) {
            warnings.push(format!("External actuals for unknown property '{id}' ignored"));
        }
    }

    let tol = Tolerance::audit();
    let mut projections = Vec::with_capacity(input.properties.len());
    let mut verified = Vec::with_capacity(input.properties.len());
    let mut property_reports = Vec::with_capacity(input.properties.len());

    for property in &input.properties {
        let projection = build_projection(&input.global, property, &mut warnings)?;
        let primary = VerificationMetrics::from_projection(&projection);
        let other = match external.get(property.id.as_str()) {
            Some(actuals) => (*actuals).clone(),
            None => independent_metrics(&input.global, property)?,
        };
        let checks = property_checks(&projection, &primary, &other, &tol);
        let report = EntityReport::new(&property.id, checks);
        tracing::debug!(property = %property.id, opinion = %report.opinion, "property verified");

        property_reports.push(report);
        projections.push(projection);
        verified.push(other);
    }

    let company = match &input.global.management_company {
        Some(_) => Some(simulate_company(&input.global, &projections)?),
        None => None,
    };
    let company_report = company.as_ref().map(|c| {
        EntityReport::new(&c.name, company_checks(&input.global, c, &verified, &tol))
    });

    let consolidated_report = EntityReport::new(
        "consolidated",
        consolidated_checks(&input.global, &projections, &verified, company.as_ref(), &tol),
    );

    let mut summary = SeveritySummary::default();
    for report in property_reports
        .iter()
        .chain(company_report.iter())
        .chain(std::iter::once(&consolidated_report))
    {
        summary.merge(&report.summary);
    }
    let opinion = AuditOpinion::from_summary(&summary);
    if opinion == AuditOpinion::Adverse {
        tracing::warn!(critical = summary.critical, "verification opinion is adverse");
    }
    if summary.failed > 0 {
        warnings.push(format!(
            "{} of {} checks failed ({} critical, {} material)",
            summary.failed, summary.total_checks, summary.critical, summary.material
        ));
    }

    let output = VerificationReport {
        property_reports,
        company_report,
        consolidated_report,
        summary,
        opinion,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Independent Cross-Verification (1% / $1 tolerance)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Check batteries
// ---------------------------------------------------------------------------

fn property_checks(
    projection: &PropertyProjection,
    primary: &VerificationMetrics,
    other: &VerificationMetrics,
    tol: &Tolerance,
) -> Vec<CheckResult> {
    use CheckCategory as C;
    use Severity as S;

    let compare =
        |name: &str, category, reference: &str, formula: &str, expected, actual, severity| {
            CheckResult::compare(
                name, category, reference, formula, expected, actual, tol, severity,
            )
        };
    let (p, o) = (&primary.first_month, &other.first_month);

    let mut checks = vec![
        CheckResult::condition(
            "First operating month",
            C::Timing,
            "Operations start date",
            "first month with is_operational",
            primary.first_operating_month == other.first_operating_month,
            S::Critical,
        ),
        compare(
            "First-month room revenue",
            C::Revenue,
            "USALI Rooms",
            "rooms × days × occupancy × ADR",
            p.room_revenue,
            o.room_revenue,
            S::Critical,
        ),
        compare(
            "First-month ancillary revenue",
            C::Revenue,
            "USALI F&B / Other Operated",
            "room revenue × (events + F&B × (1 + catering) + other)",
            p.ancillary_revenue,
            o.ancillary_revenue,
            S::Material,
        ),
        compare(
            "First-month total revenue",
            C::Revenue,
            "USALI Total Revenue",
            "rooms + ancillary",
            p.total_revenue,
            o.total_revenue,
            S::Critical,
        ),
        compare(
            "First-month GOP",
            C::Profitability,
            "USALI Gross Operating Profit",
            "revenue − departmental − undistributed",
            p.gop,
            o.gop,
            S::Critical,
        ),
        compare(
            "First-month NOI",
            C::Profitability,
            "USALI Net Operating Income",
            "GOP − base fee − incentive fee − FF&E",
            p.noi,
            o.noi,
            S::Critical,
        ),
        compare(
            "First-month net income",
            C::Profitability,
            "GAAP Net Income",
            "NOI − interest − depreciation − tax",
            p.net_income,
            o.net_income,
            S::Critical,
        ),
        compare(
            "First-month operating cash flow",
            C::CashFlow,
            "ASC 230 indirect method",
            "net income + depreciation",
            p.operating_cash_flow,
            o.operating_cash_flow,
            S::Material,
        ),
        compare(
            "First-month financing cash flow",
            C::CashFlow,
            "ASC 230 financing",
            "refinancing proceeds − principal",
            p.financing_cash_flow,
            o.financing_cash_flow,
            S::Material,
        ),
        compare(
            "Annual depreciation",
            C::Depreciation,
            "Straight-line, 39-year life",
            "(price × (1 − land) + improvements) / life",
            primary.annual_depreciation,
            other.annual_depreciation,
            S::Material,
        ),
        compare(
            "Monthly debt service",
            C::Debt,
            "Level-payment annuity",
            "P·r(1+r)^n / ((1+r)^n − 1)",
            primary.monthly_debt_service,
            other.monthly_debt_service,
            S::Material,
        ),
        compare(
            "Year 1 revenue",
            C::Revenue,
            "Annual projection",
            "Σ total revenue, model year 1",
            primary.year1_revenue,
            other.year1_revenue,
            S::Material,
        ),
        compare(
            "Year 1 NOI",
            C::Profitability,
            "Annual projection",
            "Σ NOI, model year 1",
            primary.year1_noi,
            other.year1_noi,
            S::Material,
        ),
        compare(
            "Total NOI",
            C::Profitability,
            "Projection horizon",
            "Σ NOI",
            primary.total_noi,
            other.total_noi,
            S::Material,
        ),
    ];

    let cash_sum: Money = projection.records.iter().map(|r| r.cash_flow).sum();
    checks.push(CheckResult::compare(
        "Cumulative cash flow equals ending cash",
        C::CashFlow,
        "Cash reconciliation",
        "Σ monthly cash flow = final ending cash",
        cash_sum,
        primary.ending_cash,
        &Tolerance::cents(),
        S::Critical,
    ));
    checks.push(CheckResult::compare(
        "Pre-operations revenue is zero",
        C::Timing,
        "Revenue recognition",
        "Σ revenue before operations start = 0",
        Decimal::ZERO,
        primary.pre_operations_revenue,
        &Tolerance::cents(),
        S::Critical,
    ));

    let margin = if primary.total_revenue.is_zero() {
        Decimal::ZERO
    } else {
        primary.total_noi / primary.total_revenue
    };
    checks.push(CheckResult::range(
        "NOI margin reasonableness",
        C::Reasonableness,
        "Industry range",
        "Σ NOI / Σ revenue within [0%, 60%]",
        margin,
        NOI_MARGIN_FLOOR,
        NOI_MARGIN_CEILING,
        S::Warning,
    ));

    checks
}

fn company_checks(
    global: &GlobalAssumptions,
    company: &CompanyProjection,
    verified: &[VerificationMetrics],
    tol: &Tolerance,
) -> Vec<CheckResult> {
    let (deferred_fees, expected_fees) = split_fees(verified, company_ops_month(global));
    let early_revenue: Money = company
        .months
        .iter()
        .filter(|m| !m.is_operational)
        .map(|m| m.fee_revenue)
        .sum();
    let cash_sum: Money = company.months.iter().map(|m| m.cash_flow).sum();

    vec![
        CheckResult::compare(
            "Management fee revenue",
            CheckCategory::Revenue,
            "Management agreement",
            "Σ base + incentive fees from properties after company operations start",
            expected_fees,
            company.total_fee_revenue,
            tol,
            Severity::Critical,
        ),
        CheckResult::compare(
            "No revenue before company operations",
            CheckCategory::Timing,
            "Revenue recognition",
            "Σ fee revenue before operations start = 0",
            Decimal::ZERO,
            early_revenue,
            &Tolerance::cents(),
            Severity::Critical,
        ),
        CheckResult::compare(
            "Company cumulative cash identity",
            CheckCategory::CashFlow,
            "Cash reconciliation",
            "Σ monthly cash flow = ending cash",
            cash_sum,
            company.ending_cash,
            &Tolerance::cents(),
            Severity::Critical,
        ),
        CheckResult::compare(
            "Fees deferred before company operations",
            CheckCategory::Intercompany,
            "Intercompany linkage",
            "Σ property fees before company operations start = unrecognised fees",
            deferred_fees,
            company.total_unrecognized_fees,
            tol,
            Severity::Material,
        ),
    ]
}

fn company_ops_month(global: &GlobalAssumptions) -> i64 {
    global
        .management_company
        .as_ref()
        .map(|c| months_between(global.model_start_date, c.operations_start_date))
        .unwrap_or(0)
}

/// Fees owed to the management company, split into (before, from) the month
/// its operations start.
fn split_fees(verified: &[VerificationMetrics], ops_month: i64) -> (Money, Money) {
    verified
        .iter()
        .flat_map(|v| v.monthly_fees.iter().enumerate())
        .fold((Decimal::ZERO, Decimal::ZERO), |(before, after), (m, fee)| {
            if (m as i64) < ops_month {
                (before + *fee, after)
            } else {
                (before, after + *fee)
            }
        })
}

fn consolidated_checks(
    global: &GlobalAssumptions,
    projections: &[PropertyProjection],
    verified: &[VerificationMetrics],
    company: Option<&CompanyProjection>,
    tol: &Tolerance,
) -> Vec<CheckResult> {
    let (assets, claims) = projections
        .iter()
        .filter_map(|p| p.records.last())
        .fold((Decimal::ZERO, Decimal::ZERO), |(a, c), r| {
            (a + r.total_assets, c + r.debt_outstanding + r.total_equity)
        });

    let mut checks = vec![
        CheckResult::compare(
            "Portfolio revenue",
            CheckCategory::Revenue,
            "Consolidation",
            "Σ property revenue",
            total(projections, |p| p.summary.total_revenue),
            total(verified, |v| v.total_revenue),
            tol,
            Severity::Critical,
        ),
        CheckResult::compare(
            "Portfolio NOI",
            CheckCategory::Profitability,
            "Consolidation",
            "Σ property NOI",
            total(projections, |p| p.summary.total_noi),
            total(verified, |v| v.total_noi),
            tol,
            Severity::Critical,
        ),
        CheckResult::compare(
            "Portfolio net income",
            CheckCategory::Profitability,
            "Consolidation",
            "Σ property net income",
            total(projections, |p| p.summary.total_net_income),
            total(verified, |v| v.total_net_income),
            tol,
            Severity::Critical,
        ),
        CheckResult::compare(
            "Consolidated balance sheet balances",
            CheckCategory::BalanceSheet,
            "Accounting equation",
            "assets = liabilities + equity at horizon end",
            claims,
            assets,
            &Tolerance::cents(),
            Severity::Critical,
        ),
    ];

    if let Some(c) = company {
        let ops_month = company_ops_month(global);
        let (_, owed) = split_fees(verified, ops_month);
        let fees_paid: Money = projections
            .iter()
            .flat_map(|p| p.records.iter().enumerate())
            .filter(|(m, _)| *m as i64 >= ops_month)
            .map(|(_, r)| r.management_fees())
            .sum();
        checks.push(CheckResult::compare(
            "Intercompany fee elimination",
            CheckCategory::Intercompany,
            "ASC 810 eliminations",
            "min(fees expensed, fees recognised) = independently recomputed fees",
            owed,
            fees_paid.min(c.total_fee_revenue),
            tol,
            Severity::Material,
        ));
    }

    checks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proforma::assumptions::fixtures::*;
    use crate::proforma::assumptions::ManagementCompanyAssumptions;
    use pretty_assertions::assert_eq;

    fn input() -> VerificationInput {
        VerificationInput {
            global: sample_global(),
            properties: vec![sample_property()],
            external_actuals: None,
        }
    }

    #[test]
    fn test_reference_portfolio_is_unqualified() {
        let report = run_independent_verification(&input()).unwrap().result;
        let failed: Vec<&str> = report
            .property_reports
            .iter()
            .flat_map(|r| r.findings())
            .map(|c| c.name.as_str())
            .collect();
        assert!(failed.is_empty(), "failed: {failed:?}");
        assert_eq!(report.opinion, AuditOpinion::Unqualified);
        assert!(report.company_report.is_none());
    }

    #[test]
    fn test_with_company() {
        let mut i = input();
        i.global.management_company = Some(ManagementCompanyAssumptions {
            name: "Hillside Hospitality".into(),
            funding_date: date(2026, 1, 1),
            operations_start_date: date(2026, 1, 1),
            funding_amount: dec!(250000),
            monthly_overhead: dec!(10000),
        });
        let report = run_independent_verification(&i).unwrap().result;
        let company = report.company_report.unwrap();
        assert_eq!(company.opinion, AuditOpinion::Unqualified);
        assert_eq!(report.opinion, AuditOpinion::Unqualified);
    }

    fn with_late_company() -> VerificationInput {
        let mut i = input();
        i.global.management_company = Some(ManagementCompanyAssumptions {
            name: "Hillside Hospitality".into(),
            funding_date: date(2026, 1, 1),
            operations_start_date: date(2026, 7, 1),
            funding_amount: dec!(250000),
            monthly_overhead: dec!(10000),
        });
        i
    }

    fn company_fixture(
        i: &VerificationInput,
    ) -> (Vec<PropertyProjection>, Vec<VerificationMetrics>, CompanyProjection) {
        let mut w = Vec::new();
        let projections: Vec<PropertyProjection> = i
            .properties
            .iter()
            .map(|p| build_projection(&i.global, p, &mut w).unwrap())
            .collect();
        let verified: Vec<VerificationMetrics> = i
            .properties
            .iter()
            .map(|p| independent_metrics(&i.global, p).unwrap())
            .collect();
        let company = simulate_company(&i.global, &projections).unwrap();
        (projections, verified, company)
    }

    fn check<'a>(checks: &'a [CheckResult], name: &str) -> &'a CheckResult {
        checks.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn test_late_company_defers_fees_and_passes() {
        let i = with_late_company();
        let (projections, verified, company) = company_fixture(&i);
        assert!(company.total_unrecognized_fees > Decimal::ZERO);
        let tol = Tolerance::audit();

        let checks = company_checks(&i.global, &company, &verified, &tol);
        assert!(check(&checks, "Fees deferred before company operations").passed);
        let checks =
            consolidated_checks(&i.global, &projections, &verified, Some(&company), &tol);
        assert!(check(&checks, "Intercompany fee elimination").passed);
    }

    #[test]
    fn test_misstated_deferred_fees_fail() {
        let i = with_late_company();
        let (_, verified, mut company) = company_fixture(&i);
        company.total_unrecognized_fees *= dec!(1.10);
        let checks = company_checks(&i.global, &company, &verified, &Tolerance::audit());
        let deferred = check(&checks, "Fees deferred before company operations");
        assert!(!deferred.passed);
        assert_eq!(deferred.severity, Severity::Material);
    }

    #[test]
    fn test_misstated_fee_stream_fails_elimination() {
        let i = with_late_company();
        let (projections, mut verified, company) = company_fixture(&i);
        for fee in verified[0].monthly_fees.iter_mut() {
            *fee *= dec!(1.05);
        }
        let checks = consolidated_checks(
            &i.global,
            &projections,
            &verified,
            Some(&company),
            &Tolerance::audit(),
        );
        assert!(!check(&checks, "Intercompany fee elimination").passed);

        let (projections, verified, mut company) = company_fixture(&i);
        company.total_fee_revenue *= dec!(0.90);
        let checks = consolidated_checks(
            &i.global,
            &projections,
            &verified,
            Some(&company),
            &Tolerance::audit(),
        );
        assert!(!check(&checks, "Intercompany fee elimination").passed);
    }

    #[test]
    fn test_perturbed_material_metric_qualifies() {
        let mut actual = independent_metrics(&sample_global(), &sample_property()).unwrap();
        actual.annual_depreciation *= dec!(1.05);
        let mut i = input();
        i.external_actuals = Some(vec![actual]);
        let report = run_independent_verification(&i).unwrap().result;
        assert_eq!(report.property_reports[0].opinion, AuditOpinion::Qualified);
        assert_eq!(report.opinion, AuditOpinion::Qualified);
    }

    #[test]
    fn test_perturbed_critical_metric_is_adverse() {
        let mut actual = independent_metrics(&sample_global(), &sample_property()).unwrap();
        actual.first_month.noi *= dec!(0.9);
        let mut i = input();
        i.external_actuals = Some(vec![actual]);
        let report = run_independent_verification(&i).unwrap();
        assert_eq!(report.result.opinion, AuditOpinion::Adverse);
        assert!(!report.warnings.is_empty());
    }

    #[test]
    fn test_empty_portfolio_rejected() {
        let mut i = input();
        i.properties.clear();
        assert!(run_independent_verification(&i).is_err());
    }
}
