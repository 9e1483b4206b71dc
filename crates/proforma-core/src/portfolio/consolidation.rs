use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::proforma::company::CompanyProjection;
use crate::proforma::simulator::PropertyProjection;
use crate::rounding::{within_tolerance, Tolerance};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::ProformaResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One property's statement over the consolidation period. Balance sheet
/// figures are as of the period end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyStatement {
    pub entity: String,
    pub revenue: Money,
    /// Everything between revenue and NOI, management fees included
    pub expenses: Money,
    pub noi: Money,
    pub net_income: Money,
    pub total_assets: Money,
    pub total_liabilities: Money,
    pub total_equity: Money,
    /// Base plus incentive fees paid to the management company
    pub management_fees_paid: Money,
}

impl PropertyStatement {
    /// Whole-horizon statement from a simulated property.
    pub fn from_projection(projection: &PropertyProjection) -> Self {
        let records = &projection.records;
        let revenue: Money = records.iter().map(|r| r.revenue_total).sum();
        let noi: Money = records.iter().map(|r| r.noi).sum();
        let last = records.last();
        Self {
            entity: projection.property_id.clone(),
            revenue,
            expenses: revenue - noi,
            noi,
            net_income: records.iter().map(|r| r.net_income).sum(),
            total_assets: last.map(|r| r.total_assets).unwrap_or_default(),
            total_liabilities: last.map(|r| r.debt_outstanding).unwrap_or_default(),
            total_equity: last.map(|r| r.total_equity).unwrap_or_default(),
            management_fees_paid: records.iter().map(|r| r.management_fees()).sum(),
        }
    }
}

/// The management company's statement over the same period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyStatement {
    pub entity: String,
    /// Fee revenue recognised from the properties
    pub fee_revenue: Money,
    pub expenses: Money,
    pub net_income: Money,
    pub total_assets: Money,
    pub total_liabilities: Money,
    pub total_equity: Money,
}

impl CompanyStatement {
    /// The company holds only cash and carries no debt.
    pub fn from_projection(company: &CompanyProjection) -> Self {
        Self {
            entity: company.name.clone(),
            fee_revenue: company.total_fee_revenue,
            expenses: company.total_overhead,
            net_income: company.total_net_income,
            total_assets: company.ending_cash,
            total_liabilities: Decimal::ZERO,
            total_equity: company.ending_cash,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConsolidationMode {
    PropertiesOnly,
    FullEntity { management_company: CompanyStatement },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationInput {
    pub properties: Vec<PropertyStatement>,
    pub mode: ConsolidationMode,
    #[serde(default)]
    pub tolerance: Tolerance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntercompanyElimination {
    pub fees_paid: Money,
    pub fees_recognised: Money,
    /// min(fees paid, fees recognised)
    pub eliminated: Money,
    pub balanced: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedStatement {
    pub entity_count: usize,
    pub revenue: Money,
    pub expenses: Money,
    pub noi: Money,
    pub net_income: Money,
    pub total_assets: Money,
    pub total_liabilities: Money,
    pub total_equity: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elimination: Option<IntercompanyElimination>,
    pub balance_sheet_balances: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Sum property statements, and in full-entity mode fold in the management
/// company and strip the fees that pass between them.
pub fn consolidate_statements(
    input: &ConsolidationInput,
) -> ProformaResult<ComputationOutput<ConsolidatedStatement>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let tol = &input.tolerance;

    if input.properties.is_empty() {
        warnings.push("No property statements supplied; consolidated totals are zero".into());
    }

    let mut out = ConsolidatedStatement {
        entity_count: input.properties.len(),
        revenue: Decimal::ZERO,
        expenses: Decimal::ZERO,
        noi: Decimal::ZERO,
        net_income: Decimal::ZERO,
        total_assets: Decimal::ZERO,
        total_liabilities: Decimal::ZERO,
        total_equity: Decimal::ZERO,
        elimination: None,
        balance_sheet_balances: false,
    };
    let mut fees_paid = Decimal::ZERO;
    for p in &input.properties {
        out.revenue += p.revenue;
        out.expenses += p.expenses;
        out.noi += p.noi;
        out.net_income += p.net_income;
        out.total_assets += p.total_assets;
        out.total_liabilities += p.total_liabilities;
        out.total_equity += p.total_equity;
        fees_paid += p.management_fees_paid;
    }

    if let ConsolidationMode::FullEntity { management_company: co } = &input.mode {
        out.entity_count += 1;
        out.revenue += co.fee_revenue;
        out.expenses += co.expenses;
        out.noi += co.fee_revenue - co.expenses;
        out.net_income += co.net_income;
        out.total_assets += co.total_assets;
        out.total_liabilities += co.total_liabilities;
        out.total_equity += co.total_equity;

        // Fee revenue and fee expense leave together, so NOI and net
        // income are untouched by the elimination.
        let eliminated = fees_paid.min(co.fee_revenue);
        out.revenue -= eliminated;
        out.expenses -= eliminated;

        let balanced = within_tolerance(co.fee_revenue, fees_paid, tol);
        if !balanced {
            warnings.push(format!(
                "Intercompany fees do not link: properties paid {fees_paid}, {} recognised {}",
                co.entity, co.fee_revenue
            ));
        }
        out.elimination = Some(IntercompanyElimination {
            fees_paid,
            fees_recognised: co.fee_revenue,
            eliminated,
            balanced,
        });
    }

    out.balance_sheet_balances =
        within_tolerance(out.total_assets, out.total_liabilities + out.total_equity, tol);
    if !out.balance_sheet_balances {
        warnings.push(format!(
            "Consolidated balance sheet is out by {}",
            out.total_assets - out.total_liabilities - out.total_equity
        ));
    }

    let methodology = match input.mode {
        ConsolidationMode::PropertiesOnly => "Portfolio Consolidation (properties only)",
        ConsolidationMode::FullEntity { .. } => {
            "Portfolio Consolidation (full entity, intercompany fees eliminated)"
        }
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(methodology, input, warnings, elapsed, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn property(entity: &str, revenue: Money, noi: Money, fees: Money) -> PropertyStatement {
        PropertyStatement {
            entity: entity.into(),
            revenue,
            expenses: revenue - noi,
            noi,
            net_income: noi - dec!(100000),
            total_assets: dec!(5000000),
            total_liabilities: dec!(3000000),
            total_equity: dec!(2000000),
            management_fees_paid: fees,
        }
    }

    fn company(fee_revenue: Money) -> CompanyStatement {
        CompanyStatement {
            entity: "Mgmt Co".into(),
            fee_revenue,
            expenses: dec!(60000),
            net_income: fee_revenue - dec!(60000),
            total_assets: dec!(140000),
            total_liabilities: Decimal::ZERO,
            total_equity: dec!(140000),
        }
    }

    #[test]
    fn test_properties_only_sums() {
        let input = ConsolidationInput {
            properties: vec![
                property("a", dec!(1000000), dec!(300000), dec!(80000)),
                property("b", dec!(2000000), dec!(500000), dec!(120000)),
            ],
            mode: ConsolidationMode::PropertiesOnly,
            tolerance: Tolerance::default(),
        };
        let r = consolidate_statements(&input).unwrap().result;
        assert_eq!(r.entity_count, 2);
        assert_eq!(r.revenue, dec!(3000000));
        assert_eq!(r.noi, dec!(800000));
        assert_eq!(r.net_income, dec!(600000));
        assert!(r.elimination.is_none());
        assert!(r.balance_sheet_balances);
    }

    #[test]
    fn test_full_entity_eliminates_fees() {
        let input = ConsolidationInput {
            properties: vec![
                property("a", dec!(1000000), dec!(300000), dec!(80000)),
                property("b", dec!(2000000), dec!(500000), dec!(120000)),
            ],
            mode: ConsolidationMode::FullEntity {
                management_company: company(dec!(200000)),
            },
            tolerance: Tolerance::default(),
        };
        let r = consolidate_statements(&input).unwrap().result;
        let e = r.elimination.unwrap();
        assert_eq!(e.eliminated, dec!(200000));
        assert!(e.balanced);
        // 3,000,000 + 200,000 - 200,000
        assert_eq!(r.revenue, dec!(3000000));
        // 800,000 + (200,000 - 60,000)
        assert_eq!(r.noi, dec!(940000));
        assert_eq!(r.net_income, dec!(740000));
        assert_eq!(r.entity_count, 3);
    }

    #[test]
    fn test_unlinked_fees_flagged() {
        let input = ConsolidationInput {
            properties: vec![property("a", dec!(1000000), dec!(300000), dec!(80000))],
            mode: ConsolidationMode::FullEntity {
                management_company: company(dec!(50000)),
            },
            tolerance: Tolerance::default(),
        };
        let out = consolidate_statements(&input).unwrap();
        let e = out.result.elimination.unwrap();
        assert_eq!(e.eliminated, dec!(50000));
        assert!(!e.balanced);
        assert_eq!(out.warnings.len(), 1);
    }
}
