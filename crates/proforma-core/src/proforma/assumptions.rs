use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::rounding::RoundingPolicy;
use crate::types::{Money, Rate};

fn default_days_per_month() -> Decimal {
    dec!(30.5)
}

fn default_depreciation_years() -> u32 {
    39
}

fn default_ffe_reserve_rate() -> Rate {
    dec!(0.04)
}

// ---------------------------------------------------------------------------
// Global assumptions
// ---------------------------------------------------------------------------

/// Debt terms applied to any property whose financing leaves them unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtTerms {
    pub interest_rate: Rate,
    pub amortization_years: u32,
    /// Loan-to-value against purchase price
    pub ltv: Rate,
}

impl Default for DebtTerms {
    fn default() -> Self {
        Self {
            interest_rate: dec!(0.07),
            amortization_years: 25,
            ltv: dec!(0.60),
        }
    }
}

/// The management company that operates the portfolio and earns its fees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagementCompanyAssumptions {
    pub name: String,
    /// Date the company's capital is funded; nothing may operate before it
    pub funding_date: NaiveDate,
    pub operations_start_date: NaiveDate,
    /// Cash contributed on the funding date
    pub funding_amount: Money,
    /// Overhead per month in the first operating year, escalated annually
    pub monthly_overhead: Money,
}

/// Portfolio-wide parameters shared by every property in a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalAssumptions {
    pub model_start_date: NaiveDate,
    pub projection_years: u32,
    pub inflation_rate: Rate,
    /// Annual escalation of fixed overhead
    pub fixed_cost_escalation_rate: Rate,
    /// Base management fee as a share of total revenue
    pub base_management_fee_rate: Rate,
    /// Incentive management fee as a share of GOP (never negative)
    pub incentive_management_fee_rate: Rate,
    #[serde(default)]
    pub default_debt: DebtTerms,
    #[serde(default = "default_days_per_month")]
    pub days_per_month: Decimal,
    #[serde(default = "default_depreciation_years")]
    pub depreciation_years: u32,
    #[serde(default)]
    pub rounding: RoundingPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_company: Option<ManagementCompanyAssumptions>,
}

impl GlobalAssumptions {
    pub fn projection_months(&self) -> u32 {
        self.projection_years * 12
    }
}

// ---------------------------------------------------------------------------
// Property assumptions
// ---------------------------------------------------------------------------

/// Ancillary revenue streams as shares of room revenue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevenueShares {
    pub events_pct: Rate,
    pub fb_pct: Rate,
    /// Uplift applied to F&B for catering sold with events
    #[serde(default)]
    pub catering_boost_pct: Rate,
    pub other_pct: Rate,
}

/// Departmental and undistributed cost rates. Each applies to the revenue
/// base fixed by [`ExpenseCategory::base`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostRates {
    pub rooms: Rate,
    pub food_beverage: Rate,
    pub events: Rate,
    pub other_departments: Rate,
    pub administrative: Rate,
    pub marketing: Rate,
    pub property_operations: Rate,
    pub utilities: Rate,
    pub insurance: Rate,
    pub property_taxes: Rate,
    pub technology: Rate,
    #[serde(default)]
    pub miscellaneous: Rate,
}

/// Revenue line an expense category is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevenueBase {
    Rooms,
    FoodBeverage,
    Events,
    Other,
    Total,
}

/// Operating expense categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Rooms,
    FoodBeverage,
    Events,
    OtherDepartments,
    Administrative,
    Marketing,
    PropertyOperations,
    Utilities,
    Insurance,
    PropertyTaxes,
    Technology,
    Miscellaneous,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 12] = [
        ExpenseCategory::Rooms,
        ExpenseCategory::FoodBeverage,
        ExpenseCategory::Events,
        ExpenseCategory::OtherDepartments,
        ExpenseCategory::Administrative,
        ExpenseCategory::Marketing,
        ExpenseCategory::PropertyOperations,
        ExpenseCategory::Utilities,
        ExpenseCategory::Insurance,
        ExpenseCategory::PropertyTaxes,
        ExpenseCategory::Technology,
        ExpenseCategory::Miscellaneous,
    ];

    /// Departmental costs follow their own department's revenue; every
    /// undistributed cost follows total revenue.
    pub fn base(self) -> RevenueBase {
        match self {
            ExpenseCategory::Rooms => RevenueBase::Rooms,
            ExpenseCategory::FoodBeverage => RevenueBase::FoodBeverage,
            ExpenseCategory::Events => RevenueBase::Events,
            ExpenseCategory::OtherDepartments => RevenueBase::Other,
            ExpenseCategory::Administrative
            | ExpenseCategory::Marketing
            | ExpenseCategory::PropertyOperations
            | ExpenseCategory::Utilities
            | ExpenseCategory::Insurance
            | ExpenseCategory::PropertyTaxes
            | ExpenseCategory::Technology
            | ExpenseCategory::Miscellaneous => RevenueBase::Total,
        }
    }

    pub fn rate(self, rates: &CostRates) -> Rate {
        match self {
            ExpenseCategory::Rooms => rates.rooms,
            ExpenseCategory::FoodBeverage => rates.food_beverage,
            ExpenseCategory::Events => rates.events,
            ExpenseCategory::OtherDepartments => rates.other_departments,
            ExpenseCategory::Administrative => rates.administrative,
            ExpenseCategory::Marketing => rates.marketing,
            ExpenseCategory::PropertyOperations => rates.property_operations,
            ExpenseCategory::Utilities => rates.utilities,
            ExpenseCategory::Insurance => rates.insurance,
            ExpenseCategory::PropertyTaxes => rates.property_taxes,
            ExpenseCategory::Technology => rates.technology,
            ExpenseCategory::Miscellaneous => rates.miscellaneous,
        }
    }
}

/// Cash-out refinance of the acquisition loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceTerms {
    pub date: NaiveDate,
    /// Loan-to-value against the appraised value
    pub ltv: Rate,
    /// Cap rate used to appraise annualised NOI at the refinance month
    pub appraisal_cap_rate: Rate,
    pub interest_rate: Rate,
    pub amortization_years: u32,
}

/// Acquisition debt. Unset terms fall back to [`GlobalAssumptions::default_debt`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancingTerms {
    /// Explicit loan amount; takes precedence over `ltv`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ltv: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amortization_years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinance: Option<RefinanceTerms>,
}

/// Resolved acquisition loan parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDebt {
    pub loan_amount: Money,
    pub interest_rate: Rate,
    pub amortization_years: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitAssumptions {
    pub exit_cap_rate: Rate,
    pub sales_commission_rate: Rate,
    /// Legal, title and transfer costs as a share of the gross sale price
    #[serde(default)]
    pub closing_cost_rate: Rate,
}

/// Everything the simulator needs to project one property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyAssumptions {
    pub id: String,
    pub name: String,
    pub room_count: u32,
    pub start_adr: Money,
    /// Compounded once per completed operating year
    pub adr_growth_rate: Rate,
    pub start_occupancy: Rate,
    pub max_occupancy: Rate,
    /// Occupancy added at each ramp step
    pub occupancy_ramp_step: Rate,
    /// Months between ramp steps (0 disables the ramp)
    pub occupancy_ramp_months: u32,
    pub acquisition_date: NaiveDate,
    pub operations_start_date: NaiveDate,
    pub purchase_price: Money,
    #[serde(default)]
    pub building_improvements: Money,
    /// Share of the purchase price attributed to non-depreciable land
    pub land_value_pct: Rate,
    pub revenue_shares: RevenueShares,
    pub cost_rates: CostRates,
    #[serde(default = "default_ffe_reserve_rate")]
    pub ffe_reserve_rate: Rate,
    pub tax_rate: Rate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financing: Option<FinancingTerms>,
    pub exit: ExitAssumptions,
}

impl PropertyAssumptions {
    /// Purchase price plus improvements.
    pub fn total_cost(&self) -> Money {
        self.purchase_price + self.building_improvements
    }

    /// Building share of the price plus improvements; land is never depreciated.
    pub fn depreciable_basis(&self) -> Money {
        self.purchase_price * (Decimal::ONE - self.land_value_pct) + self.building_improvements
    }

    /// Acquisition loan with global defaults filled in, or `None` when the
    /// property is bought all-cash.
    pub fn resolved_debt(&self, global: &GlobalAssumptions) -> Option<ResolvedDebt> {
        let terms = self.financing.as_ref()?;
        let defaults = &global.default_debt;
        let loan_amount = terms
            .loan_amount
            .unwrap_or_else(|| self.purchase_price * terms.ltv.unwrap_or(defaults.ltv));
        if loan_amount <= Decimal::ZERO {
            return None;
        }
        Some(ResolvedDebt {
            loan_amount,
            interest_rate: terms.interest_rate.unwrap_or(defaults.interest_rate),
            amortization_years: terms
                .amortization_years
                .unwrap_or(defaults.amortization_years),
        })
    }

    pub fn refinance(&self) -> Option<&RefinanceTerms> {
        self.financing.as_ref().and_then(|f| f.refinance.as_ref())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared sample snapshot for unit tests across modules.
    use super::*;

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn sample_global() -> GlobalAssumptions {
        GlobalAssumptions {
            model_start_date: date(2026, 1, 1),
            projection_years: 5,
            inflation_rate: dec!(0.03),
            fixed_cost_escalation_rate: dec!(0.03),
            base_management_fee_rate: dec!(0.05),
            incentive_management_fee_rate: dec!(0.15),
            default_debt: DebtTerms::default(),
            days_per_month: dec!(30.5),
            depreciation_years: 39,
            rounding: RoundingPolicy::default(),
            management_company: None,
        }
    }

    /// 20-key boutique inn acquired Jan 2026, opening Apr 2026 after renovation.
    pub fn sample_property() -> PropertyAssumptions {
        PropertyAssumptions {
            id: "inn-01".into(),
            name: "Hillside Inn".into(),
            room_count: 20,
            start_adr: dec!(300),
            adr_growth_rate: dec!(0.03),
            start_occupancy: dec!(0.55),
            max_occupancy: dec!(0.80),
            occupancy_ramp_step: dec!(0.05),
            occupancy_ramp_months: 6,
            acquisition_date: date(2026, 1, 15),
            operations_start_date: date(2026, 4, 1),
            purchase_price: dec!(4000000),
            building_improvements: dec!(500000),
            land_value_pct: dec!(0.25),
            revenue_shares: RevenueShares {
                events_pct: dec!(0.10),
                fb_pct: dec!(0.20),
                catering_boost_pct: dec!(0.25),
                other_pct: dec!(0.05),
            },
            cost_rates: CostRates {
                rooms: dec!(0.20),
                food_beverage: dec!(0.60),
                events: dec!(0.40),
                other_departments: dec!(0.50),
                administrative: dec!(0.08),
                marketing: dec!(0.05),
                property_operations: dec!(0.04),
                utilities: dec!(0.04),
                insurance: dec!(0.01),
                property_taxes: dec!(0.02),
                technology: dec!(0.01),
                miscellaneous: dec!(0.005),
            },
            ffe_reserve_rate: dec!(0.04),
            tax_rate: dec!(0.25),
            financing: Some(FinancingTerms {
                loan_amount: None,
                ltv: Some(dec!(0.60)),
                interest_rate: Some(dec!(0.065)),
                amortization_years: Some(25),
                refinance: None,
            }),
            exit: ExitAssumptions {
                exit_cap_rate: dec!(0.08),
                sales_commission_rate: dec!(0.02),
                closing_cost_rate: dec!(0.01),
            },
        }
    }
}
