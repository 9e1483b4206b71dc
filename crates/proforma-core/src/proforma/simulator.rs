use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::error::ProformaError;
use crate::financing::amortization::{AmortizationRow, LoanTerms};
use crate::rounding::{round, RoundingPolicy};
use crate::types::{month_start, months_between, with_metadata, ComputationOutput, Money, Rate};
use crate::ProformaResult;

use super::annual::{annualize, AnnualSummary};
use super::assumptions::{ExpenseCategory, GlobalAssumptions, PropertyAssumptions, RevenueBase};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationInput {
    pub global: GlobalAssumptions,
    pub property: PropertyAssumptions,
}

/// One property-month of the pro-forma.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    pub month_index: u32,
    pub date: NaiveDate,
    pub is_acquired: bool,
    pub is_operational: bool,

    pub occupancy: Rate,
    pub adr: Money,
    pub available_room_nights: Decimal,
    pub rooms_sold: Decimal,

    pub revenue_rooms: Money,
    pub revenue_events: Money,
    pub revenue_fb: Money,
    pub revenue_other: Money,
    pub revenue_total: Money,

    pub expenses: BTreeMap<ExpenseCategory, Money>,
    pub expenses_total: Money,
    pub gop: Money,
    pub fee_base: Money,
    pub fee_incentive: Money,
    pub ffe_reserve: Money,
    pub noi: Money,

    pub interest_expense: Money,
    pub principal_payment: Money,
    pub debt_payment: Money,
    pub refinancing_proceeds: Money,

    pub depreciation: Money,
    pub accumulated_depreciation: Money,
    pub taxable_income: Money,
    pub income_tax: Money,
    pub net_income: Money,

    pub operating_cash_flow: Money,
    pub financing_cash_flow: Money,
    pub cash_flow: Money,
    pub ending_cash: Money,

    /// Cost less accumulated depreciation, once acquired
    pub property_value: Money,
    pub debt_outstanding: Money,
    pub total_assets: Money,
    pub total_equity: Money,
}

impl MonthlyRecord {
    pub fn ancillary_revenue(&self) -> Money {
        self.revenue_events + self.revenue_fb + self.revenue_other
    }

    pub fn management_fees(&self) -> Money {
        self.fee_base + self.fee_incentive
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub months: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquisition_month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_operating_month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refinance_month: Option<u32>,
    pub initial_loan: Money,
    /// Cost less acquisition debt: the equity the sponsor contributes
    pub paid_in_equity: Money,
    pub total_revenue: Money,
    pub total_noi: Money,
    pub total_net_income: Money,
    pub total_cash_flow: Money,
    pub total_refinancing_proceeds: Money,
    pub ending_cash: Money,
    pub ending_debt: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyProjection {
    pub property_id: String,
    pub property_name: String,
    pub records: Vec<MonthlyRecord>,
    pub annual: Vec<AnnualSummary>,
    pub summary: ProjectionSummary,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project one property month by month over the global horizon.
pub fn simulate_property(
    input: &SimulationInput,
) -> ProformaResult<ComputationOutput<PropertyProjection>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let projection = build_projection(&input.global, &input.property, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly Hospitality Pro-Forma (accrual basis, straight-line depreciation)",
        input,
        warnings,
        elapsed,
        projection,
    ))
}

/// Monthly records plus annual roll-up and summary, without the envelope.
pub fn build_projection(
    global: &GlobalAssumptions,
    property: &PropertyAssumptions,
    warnings: &mut Vec<String>,
) -> ProformaResult<PropertyProjection> {
    let records = project_months(global, property, warnings)?;
    let annual = annualize(&records);
    let summary = summarize(global, property, &records);

    tracing::debug!(
        property = %property.id,
        months = records.len(),
        ending_cash = %summary.ending_cash,
        "property projected"
    );

    Ok(PropertyProjection {
        property_id: property.id.clone(),
        property_name: property.name.clone(),
        records,
        annual,
        summary,
    })
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// An amortization schedule and the model month of its first payment.
struct ActiveLoan {
    rows: Vec<AmortizationRow>,
    first_month: i64,
}

impl ActiveLoan {
    fn new(terms: LoanTerms, first_month: i64, policy: &RoundingPolicy) -> Self {
        Self {
            rows: terms.schedule(policy),
            first_month,
        }
    }

    fn row(&self, month: i64) -> Option<&AmortizationRow> {
        let k = month - self.first_month;
        if k < 0 {
            return None;
        }
        self.rows.get(k as usize)
    }

    /// Balance owed before the payment due in `month`.
    fn opening_balance(&self, month: i64) -> Money {
        match self.row(month) {
            Some(row) => row.beginning_balance,
            None if month < self.first_month => {
                self.rows.first().map(|r| r.beginning_balance).unwrap_or_default()
            }
            None => Decimal::ZERO,
        }
    }
}

fn validate(global: &GlobalAssumptions, property: &PropertyAssumptions) -> ProformaResult<()> {
    if global.projection_years == 0 {
        return Err(ProformaError::InvalidInput {
            field: "projection_years".into(),
            reason: "Projection horizon must be at least 1 year".into(),
        });
    }
    if global.depreciation_years == 0 {
        return Err(ProformaError::InvalidInput {
            field: "depreciation_years".into(),
            reason: "Depreciation life must be at least 1 year".into(),
        });
    }
    if global.days_per_month <= Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "days_per_month".into(),
            reason: "Days per month must be positive".into(),
        });
    }
    if property.land_value_pct < Decimal::ZERO || property.land_value_pct > Decimal::ONE {
        return Err(ProformaError::InvalidInput {
            field: "land_value_pct".into(),
            reason: "Land share must be between 0 and 1".into(),
        });
    }
    Ok(())
}

/// ADR after `operating_years` completed years of growth.
pub(crate) fn grown_adr(start_adr: Money, growth: Rate, operating_years: i64) -> Money {
    let mut adr = start_adr;
    for _ in 0..operating_years {
        adr *= Decimal::ONE + growth;
    }
    adr
}

/// Stepped occupancy `months_since_ops` months into operations.
pub(crate) fn ramped_occupancy(property: &PropertyAssumptions, months_since_ops: i64) -> Rate {
    let steps = if property.occupancy_ramp_months == 0 {
        0
    } else {
        months_since_ops / i64::from(property.occupancy_ramp_months)
    };
    (property.start_occupancy + property.occupancy_ramp_step * Decimal::from(steps))
        .min(property.max_occupancy)
}

fn project_months(
    global: &GlobalAssumptions,
    property: &PropertyAssumptions,
    warnings: &mut Vec<String>,
) -> ProformaResult<Vec<MonthlyRecord>> {
    validate(global, property)?;

    let policy = &global.rounding;
    let horizon = global.projection_months();
    let ops_offset = months_between(global.model_start_date, property.operations_start_date);
    let acq_offset = months_between(global.model_start_date, property.acquisition_date);

    if ops_offset < acq_offset {
        warnings.push(format!(
            "{}: operations start before acquisition; revenue is recognised from operations start",
            property.id
        ));
    }
    if ops_offset >= i64::from(horizon) {
        warnings.push(format!(
            "{}: operations start after the projection horizon; no revenue projected",
            property.id
        ));
    }

    let total_cost = round(property.total_cost(), policy);
    let basis = round(property.depreciable_basis(), policy);
    let monthly_depreciation = round(
        basis / Decimal::from(global.depreciation_years * 12),
        policy,
    );

    let initial_debt = property.resolved_debt(global);
    let mut loan = initial_debt.map(|d| {
        ActiveLoan::new(
            LoanTerms::new(d.loan_amount, d.interest_rate, d.amortization_years * 12),
            acq_offset,
            policy,
        )
    });

    let refinance = property.refinance();
    let refi_offset = refinance.map(|r| months_between(global.model_start_date, r.date));
    if let Some(refi_month) = refi_offset {
        if refi_month <= acq_offset {
            warnings.push(format!(
                "{}: refinance date is not after acquisition; refinance ignored",
                property.id
            ));
        } else if refi_month >= i64::from(horizon) {
            warnings.push(format!(
                "{}: refinance date falls outside the projection horizon",
                property.id
            ));
        }
    }

    // Acquired before the model starts: carry depreciation already taken.
    let mut accumulated_depreciation = if acq_offset < 0 {
        (monthly_depreciation * Decimal::from(-acq_offset)).min(basis)
    } else {
        Decimal::ZERO
    };
    let mut paid_in_equity: Option<Money> = None;
    let mut retained_earnings = Decimal::ZERO;
    let mut ending_cash = Decimal::ZERO;

    let mut records = Vec::with_capacity(horizon as usize);

    for m in 0..horizon {
        let month = i64::from(m);
        let date = month_start(global.model_start_date, m)?;
        let is_acquired = month >= acq_offset;
        let is_operational = month >= ops_offset;

        // --- Revenue ---------------------------------------------------
        let (occupancy, adr, rooms_sold) = if is_operational {
            let since_ops = month - ops_offset;
            let occ = ramped_occupancy(property, since_ops);
            let adr = grown_adr(property.start_adr, property.adr_growth_rate, since_ops / 12);
            let available = Decimal::from(property.room_count) * global.days_per_month;
            (occ, adr, available * occ)
        } else {
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
        };
        let available_room_nights = if is_operational {
            Decimal::from(property.room_count) * global.days_per_month
        } else {
            Decimal::ZERO
        };

        let shares = &property.revenue_shares;
        let revenue_rooms = round(rooms_sold * adr, policy);
        let revenue_events = round(revenue_rooms * shares.events_pct, policy);
        let revenue_fb = round(
            revenue_rooms * shares.fb_pct * (Decimal::ONE + shares.catering_boost_pct),
            policy,
        );
        let revenue_other = round(revenue_rooms * shares.other_pct, policy);
        let revenue_total = revenue_rooms + revenue_events + revenue_fb + revenue_other;

        // --- Operating expenses ---------------------------------------
        let mut expenses = BTreeMap::new();
        for category in ExpenseCategory::ALL {
            let base = match category.base() {
                RevenueBase::Rooms => revenue_rooms,
                RevenueBase::FoodBeverage => revenue_fb,
                RevenueBase::Events => revenue_events,
                RevenueBase::Other => revenue_other,
                RevenueBase::Total => revenue_total,
            };
            expenses.insert(category, round(base * category.rate(&property.cost_rates), policy));
        }
        let expenses_total: Money = expenses.values().copied().sum();

        let gop = revenue_total - expenses_total;
        let fee_base = round(revenue_total * global.base_management_fee_rate, policy);
        let fee_incentive = round(
            (gop * global.incentive_management_fee_rate).max(Decimal::ZERO),
            policy,
        );
        let ffe_reserve = round(revenue_total * property.ffe_reserve_rate, policy);
        let noi = gop - fee_base - fee_incentive - ffe_reserve;

        // --- Debt service ---------------------------------------------
        let (interest_expense, principal_payment, mut debt_outstanding) = match &loan {
            Some(active) if is_acquired => match active.row(month) {
                Some(row) => (row.interest, row.principal, row.ending_balance),
                None => (Decimal::ZERO, Decimal::ZERO, active.opening_balance(month)),
            },
            _ => (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
        };
        let debt_payment = interest_expense + principal_payment;

        let mut refinancing_proceeds = Decimal::ZERO;
        if let (Some(terms), Some(refi_month)) = (refinance, refi_offset) {
            if month == refi_month && is_acquired && refi_month > acq_offset {
                let appraised = if terms.appraisal_cap_rate > Decimal::ZERO {
                    noi * Decimal::from(12) / terms.appraisal_cap_rate
                } else {
                    Decimal::ZERO
                };
                let new_loan = round(appraised * terms.ltv, policy);
                if new_loan > debt_outstanding {
                    refinancing_proceeds = new_loan - debt_outstanding;
                    debt_outstanding = new_loan;
                    loan = Some(ActiveLoan::new(
                        LoanTerms::new(
                            new_loan,
                            terms.interest_rate,
                            terms.amortization_years * 12,
                        ),
                        month + 1,
                        policy,
                    ));
                } else {
                    tracing::warn!(property = %property.id, month = m, "refinance skipped");
                    warnings.push(format!(
                        "{}: refinance in month {m} skipped; new loan {new_loan} does not exceed balance {debt_outstanding}",
                        property.id
                    ));
                }
            }
        }

        // --- Depreciation, tax, income --------------------------------
        let depreciation = if is_acquired {
            monthly_depreciation.min(basis - accumulated_depreciation)
        } else {
            Decimal::ZERO
        };
        accumulated_depreciation += depreciation;

        let taxable_income = noi - interest_expense - depreciation;
        let income_tax = round(taxable_income.max(Decimal::ZERO) * property.tax_rate, policy);
        let net_income = taxable_income - income_tax;

        // --- Cash flow --------------------------------------------------
        let operating_cash_flow = net_income + depreciation;
        let financing_cash_flow = refinancing_proceeds - principal_payment;
        let cash_flow = noi - debt_payment - income_tax + refinancing_proceeds;
        ending_cash += cash_flow;
        retained_earnings += net_income;

        // --- Balance sheet ----------------------------------------------
        let property_value = if is_acquired {
            if paid_in_equity.is_none() {
                let opening_debt = loan
                    .as_ref()
                    .map(|l| l.opening_balance(month))
                    .unwrap_or_default();
                let opening_book = total_cost - (accumulated_depreciation - depreciation);
                paid_in_equity = Some(opening_book - opening_debt);
            }
            total_cost - accumulated_depreciation
        } else {
            Decimal::ZERO
        };
        let total_assets = ending_cash + property_value;
        let total_equity = paid_in_equity.unwrap_or_default() + retained_earnings;

        records.push(MonthlyRecord {
            month_index: m,
            date,
            is_acquired,
            is_operational,
            occupancy,
            adr: round(adr, policy),
            available_room_nights,
            rooms_sold,
            revenue_rooms,
            revenue_events,
            revenue_fb,
            revenue_other,
            revenue_total,
            expenses,
            expenses_total,
            gop,
            fee_base,
            fee_incentive,
            ffe_reserve,
            noi,
            interest_expense,
            principal_payment,
            debt_payment,
            refinancing_proceeds,
            depreciation,
            accumulated_depreciation,
            taxable_income,
            income_tax,
            net_income,
            operating_cash_flow,
            financing_cash_flow,
            cash_flow,
            ending_cash,
            property_value,
            debt_outstanding,
            total_assets,
            total_equity,
        });
    }

    Ok(records)
}

fn summarize(
    global: &GlobalAssumptions,
    property: &PropertyAssumptions,
    records: &[MonthlyRecord],
) -> ProjectionSummary {
    let first_acquired = records.iter().find(|r| r.is_acquired);
    let initial_loan = property
        .resolved_debt(global)
        .map(|d| round(d.loan_amount, &global.rounding))
        .unwrap_or_default();
    let paid_in_equity = first_acquired
        .map(|r| r.total_equity - r.net_income - retained_before(records, r.month_index))
        .unwrap_or_default();

    ProjectionSummary {
        months: records.len() as u32,
        acquisition_month: first_acquired.map(|r| r.month_index),
        first_operating_month: records.iter().find(|r| r.is_operational).map(|r| r.month_index),
        refinance_month: records
            .iter()
            .find(|r| !r.refinancing_proceeds.is_zero())
            .map(|r| r.month_index),
        initial_loan,
        paid_in_equity,
        total_revenue: records.iter().map(|r| r.revenue_total).sum(),
        total_noi: records.iter().map(|r| r.noi).sum(),
        total_net_income: records.iter().map(|r| r.net_income).sum(),
        total_cash_flow: records.iter().map(|r| r.cash_flow).sum(),
        total_refinancing_proceeds: records.iter().map(|r| r.refinancing_proceeds).sum(),
        ending_cash: records.last().map(|r| r.ending_cash).unwrap_or_default(),
        ending_debt: records.last().map(|r| r.debt_outstanding).unwrap_or_default(),
    }
}

fn retained_before(records: &[MonthlyRecord], month_index: u32) -> Money {
    records
        .iter()
        .take_while(|r| r.month_index < month_index)
        .map(|r| r.net_income)
        .sum()
}
