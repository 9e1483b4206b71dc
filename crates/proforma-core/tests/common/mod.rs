#![allow(dead_code)]

use chrono::NaiveDate;
use proforma_core::proforma::assumptions::*;
use proforma_core::rounding::RoundingPolicy;
use rust_decimal_macros::dec;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn global() -> GlobalAssumptions {
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

pub fn global_with_company() -> GlobalAssumptions {
    GlobalAssumptions {
        management_company: Some(ManagementCompanyAssumptions {
            name: "Hillside Hospitality".into(),
            funding_date: date(2026, 1, 1),
            operations_start_date: date(2026, 1, 1),
            funding_amount: dec!(250000),
            monthly_overhead: dec!(10000),
        }),
        ..global()
    }
}

/// 20-key inn bought with 60% leverage, opening after a three-month renovation.
pub fn inn() -> PropertyAssumptions {
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

/// Larger all-cash lodge opening mid-2026.
pub fn lodge() -> PropertyAssumptions {
    PropertyAssumptions {
        id: "lodge-02".into(),
        name: "Ridge Lodge".into(),
        room_count: 40,
        start_adr: dec!(220),
        start_occupancy: dec!(0.60),
        max_occupancy: dec!(0.75),
        acquisition_date: date(2026, 6, 1),
        operations_start_date: date(2026, 7, 1),
        purchase_price: dec!(6000000),
        building_improvements: dec!(0),
        land_value_pct: dec!(0.20),
        financing: None,
        exit: ExitAssumptions {
            exit_cap_rate: dec!(0.075),
            sales_commission_rate: dec!(0.02),
            closing_cost_rate: dec!(0.01),
        },
        ..inn()
    }
}
