mod common;

use common::*;
use proforma_core::portfolio::consolidation::{
    consolidate_statements, CompanyStatement, ConsolidationInput, ConsolidationMode,
    PropertyStatement,
};
use proforma_core::portfolio::scenario::{
    compare_scenarios, Direction, RiskFlag, ScenarioComparisonInput, ScenarioResults,
};
use proforma_core::proforma::company::{simulate_company_projection, CompanyInput};
use proforma_core::proforma::simulator::{simulate_property, SimulationInput};
use proforma_core::rounding::Tolerance;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Consolidation
// ===========================================================================

#[test]
fn test_full_entity_consolidation_of_simulated_portfolio() {
    let run = simulate_company_projection(&CompanyInput {
        global: global_with_company(),
        properties: vec![inn(), lodge()],
    })
    .unwrap()
    .result;

    let properties: Vec<PropertyStatement> = run
        .properties
        .iter()
        .map(PropertyStatement::from_projection)
        .collect();
    let company = CompanyStatement::from_projection(&run.company);
    let property_net_income: Decimal = properties.iter().map(|p| p.net_income).sum();

    let out = consolidate_statements(&ConsolidationInput {
        properties,
        mode: ConsolidationMode::FullEntity {
            management_company: company.clone(),
        },
        tolerance: Tolerance::default(),
    })
    .unwrap();
    let c = &out.result;
    let e = c.elimination.as_ref().unwrap();
    assert!(e.balanced);
    assert_eq!(e.eliminated, company.fee_revenue);
    assert!(c.balance_sheet_balances);
    assert_eq!(c.net_income, property_net_income + company.net_income);
    assert_eq!(c.entity_count, 3);
}

#[test]
fn test_properties_only_has_no_elimination() {
    let statements: Vec<PropertyStatement> = [inn(), lodge()]
        .into_iter()
        .map(|property| {
            let p = simulate_property(&SimulationInput {
                global: global(),
                property,
            })
            .unwrap()
            .result;
            PropertyStatement::from_projection(&p)
        })
        .collect();
    let revenue: Decimal = statements.iter().map(|s| s.revenue).sum();
    let out = consolidate_statements(&ConsolidationInput {
        properties: statements,
        mode: ConsolidationMode::PropertiesOnly,
        tolerance: Tolerance::default(),
    })
    .unwrap()
    .result;
    assert!(out.elimination.is_none());
    assert_eq!(out.revenue, revenue);
    assert_eq!(out.noi, out.revenue - out.expenses);
}

// ===========================================================================
// Scenario comparison
// ===========================================================================

fn scenario(name: &str, adr: Decimal, irr: Decimal) -> ScenarioResults {
    let mut property = inn();
    property.start_adr = adr;
    let p = simulate_property(&SimulationInput {
        global: global(),
        property,
    })
    .unwrap()
    .result;
    ScenarioResults::from_projections(name, &[p], Some(irr), dec!(1.6), dec!(5000000))
}

#[test]
fn test_lower_adr_scenario_worsens() {
    let out = compare_scenarios(&ScenarioComparisonInput {
        baseline: scenario("base", dec!(300), dec!(0.11)),
        alternative: scenario("soft market", dec!(250), dec!(0.085)),
        assumption_changes: vec!["start_adr".into()],
        irr_drop_threshold_bps: dec!(200),
    })
    .unwrap()
    .result;
    assert_eq!(out.direction, Direction::Worsened);
    assert_eq!(out.irr_delta_bps, Some(dec!(-250)));
    assert_eq!(out.yearly.len(), 5);
    assert!(out.yearly.iter().all(|y| y.revenue < Decimal::ZERO));
    assert!(out
        .risk_flags
        .iter()
        .any(|f| matches!(f, RiskFlag::IrrDrop { .. })));
    assert_eq!(out.sensitivity.len(), 1);
    assert_eq!(out.sensitivity[0].irr_delta_bps, dec!(-250));
}
