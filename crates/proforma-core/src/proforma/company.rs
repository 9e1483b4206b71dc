use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ProformaError;
use crate::rounding::round;
use crate::types::{month_start, months_between, with_metadata, ComputationOutput, Money};
use crate::ProformaResult;

use super::assumptions::{GlobalAssumptions, ManagementCompanyAssumptions, PropertyAssumptions};
use super::simulator::{build_projection, PropertyProjection};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyInput {
    pub global: GlobalAssumptions,
    pub properties: Vec<PropertyAssumptions>,
}

/// One month of the management company's books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyMonth {
    pub month_index: u32,
    pub date: NaiveDate,
    pub is_funded: bool,
    pub is_operational: bool,
    /// Base fees recognised this month
    pub fee_base: Money,
    /// Incentive fees recognised this month
    pub fee_incentive: Money,
    pub fee_revenue: Money,
    /// Fees paid by properties before the company began operating
    pub unrecognized_fees: Money,
    pub overhead: Money,
    pub net_income: Money,
    pub funding_inflow: Money,
    pub cash_flow: Money,
    pub ending_cash: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProjection {
    pub name: String,
    pub months: Vec<CompanyMonth>,
    pub total_fee_revenue: Money,
    pub total_unrecognized_fees: Money,
    pub total_overhead: Money,
    pub total_net_income: Money,
    pub ending_cash: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyRunOutput {
    pub properties: Vec<PropertyProjection>,
    pub company: CompanyProjection,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project every property, then the management company that earns their fees.
pub fn simulate_company_projection(
    input: &CompanyInput,
) -> ProformaResult<ComputationOutput<CompanyRunOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let company = input
        .global
        .management_company
        .as_ref()
        .ok_or_else(|| ProformaError::InvalidInput {
            field: "global.management_company".into(),
            reason: "A management company must be configured".into(),
        })?;

    if input.properties.is_empty() {
        warnings.push("No properties supplied; company earns no fees".into());
    }

    let properties = input
        .properties
        .iter()
        .map(|p| build_projection(&input.global, p, &mut warnings))
        .collect::<ProformaResult<Vec<_>>>()?;

    let projection = project_company(&input.global, company, &properties)?;
    if projection.total_unrecognized_fees > Decimal::ZERO {
        warnings.push(format!(
            "{} of property fees fall before the company begins operating and are not recognised",
            projection.total_unrecognized_fees
        ));
    }

    let output = CompanyRunOutput {
        properties,
        company: projection,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Management Company Projection (fee income less escalating overhead)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Management company monthly books from already-projected properties.
/// Returns `InvalidInput` when no company is configured.
pub fn simulate_company(
    global: &GlobalAssumptions,
    properties: &[PropertyProjection],
) -> ProformaResult<CompanyProjection> {
    let company = global
        .management_company
        .as_ref()
        .ok_or_else(|| ProformaError::InvalidInput {
            field: "management_company".into(),
            reason: "No management company configured".into(),
        })?;
    project_company(global, company, properties)
}

fn project_company(
    global: &GlobalAssumptions,
    company: &ManagementCompanyAssumptions,
    properties: &[PropertyProjection],
) -> ProformaResult<CompanyProjection> {
    let policy = &global.rounding;
    let funding_offset = months_between(global.model_start_date, company.funding_date);
    let ops_offset = months_between(global.model_start_date, company.operations_start_date);

    let mut months = Vec::with_capacity(global.projection_months() as usize);
    let mut ending_cash = Decimal::ZERO;

    for m in 0..global.projection_months() {
        let month = i64::from(m);
        let is_funded = month >= funding_offset;
        let is_operational = month >= ops_offset;

        let (paid_base, paid_incentive) = properties
            .iter()
            .filter_map(|p| p.records.get(m as usize))
            .fold((Decimal::ZERO, Decimal::ZERO), |(b, i), r| {
                (b + r.fee_base, i + r.fee_incentive)
            });

        let (fee_base, fee_incentive, unrecognized_fees) = if is_operational {
            (paid_base, paid_incentive, Decimal::ZERO)
        } else {
            (Decimal::ZERO, Decimal::ZERO, paid_base + paid_incentive)
        };
        let fee_revenue = fee_base + fee_incentive;

        let overhead = if is_operational {
            let years = (month - ops_offset) / 12;
            let mut escalated = company.monthly_overhead;
            for _ in 0..years {
                escalated *= Decimal::ONE + global.fixed_cost_escalation_rate;
            }
            round(escalated, policy)
        } else {
            Decimal::ZERO
        };

        let net_income = fee_revenue - overhead;
        let funding_inflow = if month == funding_offset.max(0) && is_funded {
            round(company.funding_amount, policy)
        } else {
            Decimal::ZERO
        };
        let cash_flow = net_income + funding_inflow;
        ending_cash += cash_flow;

        months.push(CompanyMonth {
            month_index: m,
            date: month_start(global.model_start_date, m)?,
            is_funded,
            is_operational,
            fee_base,
            fee_incentive,
            fee_revenue,
            unrecognized_fees,
            overhead,
            net_income,
            funding_inflow,
            cash_flow,
            ending_cash,
        });
    }

    tracing::debug!(company = %company.name, ending_cash = %ending_cash, "company projected");

    Ok(CompanyProjection {
        name: company.name.clone(),
        total_fee_revenue: months.iter().map(|m| m.fee_revenue).sum(),
        total_unrecognized_fees: months.iter().map(|m| m.unrecognized_fees).sum(),
        total_overhead: months.iter().map(|m| m.overhead).sum(),
        total_net_income: months.iter().map(|m| m.net_income).sum(),
        ending_cash,
        months,
    })
}
