//! A second, separately coded derivation of the figures the audit engine
//! checks. It shares inputs with the simulator but none of its arithmetic:
//! loan balances come from the closed-form annuity identity, ADR from a
//! single power, undistributed costs from one blended rate, and
//! depreciation from a capped cumulative closed form.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ProformaError;
use crate::proforma::assumptions::{CostRates, GlobalAssumptions, PropertyAssumptions};
use crate::proforma::simulator::{MonthlyRecord, PropertyProjection};
use crate::rounding::{round, RoundingPolicy};
use crate::types::{months_between, Money, Rate};
use crate::ProformaResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Figures for the first operating month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthMetrics {
    pub room_revenue: Money,
    pub ancillary_revenue: Money,
    pub total_revenue: Money,
    pub gop: Money,
    pub noi: Money,
    pub net_income: Money,
    pub operating_cash_flow: Money,
    pub financing_cash_flow: Money,
}

/// Everything the audit battery compares for one property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationMetrics {
    pub property_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_operating_month: Option<u32>,
    pub first_month: MonthMetrics,
    /// Depreciation over the first twelve owned months, annualised
    pub annual_depreciation: Money,
    /// Payment in the first month of debt service
    pub monthly_debt_service: Money,
    /// First model year
    pub year1_revenue: Money,
    pub year1_noi: Money,
    pub pre_operations_revenue: Money,
    pub total_revenue: Money,
    pub total_noi: Money,
    pub total_net_income: Money,
    pub total_cash_flow: Money,
    pub ending_cash: Money,
    /// Base + incentive fees per model month
    #[serde(default)]
    pub monthly_fees: Vec<Money>,
}

/// Externally produced figures for a property, in the same shape.
pub type PropertyActuals = VerificationMetrics;

/// The per-month quantities both derivations reduce to metrics.
#[derive(Debug, Clone, Default)]
pub(crate) struct MonthFigures {
    pub is_operational: bool,
    pub is_acquired: bool,
    pub revenue_rooms: Money,
    pub revenue_ancillary: Money,
    pub revenue_total: Money,
    pub gop: Money,
    pub fees: Money,
    pub noi: Money,
    pub interest: Money,
    pub principal: Money,
    pub refinancing_proceeds: Money,
    pub depreciation: Money,
    pub net_income: Money,
    pub cash_flow: Money,
}

impl From<&MonthlyRecord> for MonthFigures {
    fn from(r: &MonthlyRecord) -> Self {
        Self {
            is_operational: r.is_operational,
            is_acquired: r.is_acquired,
            revenue_rooms: r.revenue_rooms,
            revenue_ancillary: r.ancillary_revenue(),
            revenue_total: r.revenue_total,
            gop: r.gop,
            fees: r.management_fees(),
            noi: r.noi,
            interest: r.interest_expense,
            principal: r.principal_payment,
            refinancing_proceeds: r.refinancing_proceeds,
            depreciation: r.depreciation,
            net_income: r.net_income,
            cash_flow: r.cash_flow,
        }
    }
}

impl VerificationMetrics {
    /// Metrics read off the primary simulator's projection.
    pub fn from_projection(projection: &PropertyProjection) -> Self {
        let figures: Vec<MonthFigures> =
            projection.records.iter().map(MonthFigures::from).collect();
        let mut metrics = reduce(&projection.property_id, &figures);
        metrics.ending_cash = projection
            .records
            .last()
            .map(|r| r.ending_cash)
            .unwrap_or_default();
        metrics
    }
}

pub(crate) fn reduce(property_id: &str, months: &[MonthFigures]) -> VerificationMetrics {
    let first_op = months.iter().position(|m| m.is_operational);
    let first = first_op.and_then(|i| months.get(i)).cloned().unwrap_or_default();

    let owned: Vec<&MonthFigures> = months.iter().filter(|m| m.is_acquired).take(12).collect();
    let annual_depreciation = if owned.is_empty() {
        Decimal::ZERO
    } else {
        let sum: Money = owned.iter().map(|m| m.depreciation).sum();
        sum * Decimal::from(12) / Decimal::from(owned.len())
    };
    let monthly_debt_service = months
        .iter()
        .find(|m| m.is_acquired && !(m.interest + m.principal).is_zero())
        .map(|m| m.interest + m.principal)
        .unwrap_or_default();

    let year1: &[MonthFigures] = &months[..months.len().min(12)];
    let total_cash_flow: Money = months.iter().map(|m| m.cash_flow).sum();

    VerificationMetrics {
        property_id: property_id.to_string(),
        first_operating_month: first_op.map(|i| i as u32),
        first_month: MonthMetrics {
            room_revenue: first.revenue_rooms,
            ancillary_revenue: first.revenue_ancillary,
            total_revenue: first.revenue_total,
            gop: first.gop,
            noi: first.noi,
            net_income: first.net_income,
            operating_cash_flow: first.net_income + first.depreciation,
            financing_cash_flow: first.refinancing_proceeds - first.principal,
        },
        annual_depreciation,
        monthly_debt_service,
        year1_revenue: year1.iter().map(|m| m.revenue_total).sum(),
        year1_noi: year1.iter().map(|m| m.noi).sum(),
        pre_operations_revenue: months
            .iter()
            .filter(|m| !m.is_operational)
            .map(|m| m.revenue_total)
            .sum(),
        total_revenue: months.iter().map(|m| m.revenue_total).sum(),
        total_noi: months.iter().map(|m| m.noi).sum(),
        total_net_income: months.iter().map(|m| m.net_income).sum(),
        total_cash_flow,
        ending_cash: total_cash_flow,
        monthly_fees: months.iter().map(|m| m.fees).collect(),
    }
}

// ---------------------------------------------------------------------------
// Closed-form loan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct LoanSegment {
    principal: Money,
    monthly_rate: Rate,
    term: i64,
    first_month: i64,
    payment: Money,
}

impl LoanSegment {
    fn new(
        principal: Money,
        annual_rate: Rate,
        years: u32,
        first_month: i64,
        policy: &RoundingPolicy,
    ) -> Self {
        let r = annual_rate / Decimal::from(12);
        let n = i64::from(years) * 12;
        let payment = if principal.is_zero() || n == 0 {
            Decimal::ZERO
        } else if r.is_zero() {
            principal / Decimal::from(n)
        } else {
            let growth = (Decimal::ONE + r).powi(n);
            principal * r * growth / (growth - Decimal::ONE)
        };
        Self {
            principal,
            monthly_rate: r,
            term: n,
            first_month,
            payment: round(payment, policy),
        }
    }

    /// B_k = P(1+r)^k − PMT((1+r)^k − 1)/r, floored at zero.
    fn balance_after(&self, k: i64) -> Money {
        if k <= 0 {
            return self.principal;
        }
        if k >= self.term {
            return Decimal::ZERO;
        }
        let balance = if self.monthly_rate.is_zero() {
            self.principal - self.payment * Decimal::from(k)
        } else {
            let growth = (Decimal::ONE + self.monthly_rate).powi(k);
            self.principal * growth - self.payment * (growth - Decimal::ONE) / self.monthly_rate
        };
        balance.max(Decimal::ZERO)
    }

    /// (interest, principal) paid in model month `month`.
    fn payment_split(&self, month: i64, policy: &RoundingPolicy) -> (Money, Money) {
        let k = month - self.first_month;
        if k < 0 || k >= self.term {
            return (Decimal::ZERO, Decimal::ZERO);
        }
        let opening = round(self.balance_after(k), policy);
        let interest = round(opening * self.monthly_rate, policy);
        let principal = if k == self.term - 1 {
            opening
        } else {
            (self.payment - interest).max(Decimal::ZERO).min(opening)
        };
        (interest, principal)
    }
}

// ---------------------------------------------------------------------------
// Independent projection
// ---------------------------------------------------------------------------

fn undistributed_rate(rates: &CostRates) -> Rate {
    rates.administrative
        + rates.marketing
        + rates.property_operations
        + rates.utilities
        + rates.insurance
        + rates.property_taxes
        + rates.technology
        + rates.miscellaneous
}

/// Re-derive the audited metrics for one property.
pub fn independent_metrics(
    global: &GlobalAssumptions,
    property: &PropertyAssumptions,
) -> ProformaResult<VerificationMetrics> {
    if global.depreciation_years == 0 || global.projection_years == 0 {
        return Err(ProformaError::InvalidInput {
            field: "global".into(),
            reason: "Projection horizon and depreciation life must be positive".into(),
        });
    }

    let policy = &global.rounding;
    let ops = months_between(global.model_start_date, property.operations_start_date);
    let acq = months_between(global.model_start_date, property.acquisition_date);
    let available = Decimal::from(property.room_count) * global.days_per_month;
    let shares = &property.revenue_shares;
    let rates = &property.cost_rates;
    let blended_undistributed = undistributed_rate(rates);

    let basis = round(property.depreciable_basis(), policy);
    let monthly_dep = round(basis / Decimal::from(global.depreciation_years * 12), policy);
    let accumulated = |owned_months: i64| -> Money {
        if owned_months <= 0 {
            Decimal::ZERO
        } else {
            (monthly_dep * Decimal::from(owned_months)).min(basis)
        }
    };

    let mut loan = property.resolved_debt(global).map(|d| {
        LoanSegment::new(
            round(d.loan_amount, policy),
            d.interest_rate,
            d.amortization_years,
            acq,
            policy,
        )
    });
    let refinance = property
        .refinance()
        .map(|r| (months_between(global.model_start_date, r.date), r));

    let mut months = Vec::with_capacity(global.projection_months() as usize);
    for m in 0..i64::from(global.projection_months()) {
        let is_operational = m >= ops;
        let is_acquired = m >= acq;

        let (occ, adr) = if is_operational {
            let k = m - ops;
            let steps = if property.occupancy_ramp_months > 0 {
                k / i64::from(property.occupancy_ramp_months)
            } else {
                0
            };
            let ramp = property.occupancy_ramp_step * Decimal::from(steps);
            let occ = (property.start_occupancy + ramp).min(property.max_occupancy);
            let adr = property.start_adr * (Decimal::ONE + property.adr_growth_rate).powi(k / 12);
            (occ, adr)
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };

        let rooms = round(available * occ * adr, policy);
        let events = round(rooms * shares.events_pct, policy);
        let fb = round(rooms * shares.fb_pct * (Decimal::ONE + shares.catering_boost_pct), policy);
        let other = round(rooms * shares.other_pct, policy);
        let total = rooms + events + fb + other;

        let departmental = round(rooms * rates.rooms, policy)
            + round(fb * rates.food_beverage, policy)
            + round(events * rates.events, policy)
            + round(other * rates.other_departments, policy);
        let undistributed = round(total * blended_undistributed, policy);
        let gop = total - departmental - undistributed;

        let fees = round(total * global.base_management_fee_rate, policy)
            + round((gop * global.incentive_management_fee_rate).max(Decimal::ZERO), policy);
        let noi = gop - fees - round(total * property.ffe_reserve_rate, policy);

        let (interest, principal) = match (&loan, is_acquired) {
            (Some(seg), true) => seg.payment_split(m, policy),
            _ => (Decimal::ZERO, Decimal::ZERO),
        };

        let mut refinancing_proceeds = Decimal::ZERO;
        if let (Some((refi_month, terms)), Some(seg)) = (refinance, loan) {
            if m == refi_month && is_acquired && refi_month > acq {
                let remaining = round(seg.balance_after(m - seg.first_month + 1), policy);
                let appraised = if terms.appraisal_cap_rate > Decimal::ZERO {
                    noi * Decimal::from(12) / terms.appraisal_cap_rate
                } else {
                    Decimal::ZERO
                };
                let new_loan = round(appraised * terms.ltv, policy);
                if new_loan > remaining {
                    refinancing_proceeds = new_loan - remaining;
                    loan = Some(LoanSegment::new(
                        new_loan,
                        terms.interest_rate,
                        terms.amortization_years,
                        m + 1,
                        policy,
                    ));
                }
            }
        }

        let depreciation = if is_acquired {
            accumulated(m - acq + 1) - accumulated(m - acq)
        } else {
            Decimal::ZERO
        };
        let taxable = noi - interest - depreciation;
        let tax = round(taxable.max(Decimal::ZERO) * property.tax_rate, policy);

        months.push(MonthFigures {
            is_operational,
            is_acquired,
            revenue_rooms: rooms,
            revenue_ancillary: events + fb + other,
            revenue_total: total,
            gop,
            fees,
            noi,
            interest,
            principal,
            refinancing_proceeds,
            depreciation,
            net_income: taxable - tax,
            cash_flow: noi - interest - principal - tax + refinancing_proceeds,
        });
    }

    Ok(reduce(&property.id, &months))
}
