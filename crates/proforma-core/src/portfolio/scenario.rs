use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::error::ProformaError;
use crate::proforma::simulator::PropertyProjection;
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::ProformaResult;

const BPS: Decimal = dec!(10000);

fn default_irr_drop_bps() -> Decimal {
    dec!(200)
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Portfolio figures for one year of a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearFigures {
    pub year: u32,
    pub revenue: Money,
    pub noi: Money,
    pub net_income: Money,
    /// Year-end cash
    pub cash: Money,
}

/// Headline results of one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResults {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irr: Option<Rate>,
    pub equity_multiple: Multiple,
    pub exit_value: Money,
    pub years: Vec<YearFigures>,
}

impl ScenarioResults {
    /// Sum the annual roll-ups of every property year by year.
    pub fn from_projections(
        name: impl Into<String>,
        projections: &[PropertyProjection],
        irr: Option<Rate>,
        equity_multiple: Multiple,
        exit_value: Money,
    ) -> Self {
        let mut years: BTreeMap<u32, YearFigures> = BTreeMap::new();
        for a in projections.iter().flat_map(|p| &p.annual) {
            let y = years.entry(a.year).or_insert(YearFigures {
                year: a.year,
                revenue: Decimal::ZERO,
                noi: Decimal::ZERO,
                net_income: Decimal::ZERO,
                cash: Decimal::ZERO,
            });
            y.revenue += a.revenue_total;
            y.noi += a.noi;
            y.net_income += a.net_income;
            y.cash += a.ending_cash;
        }
        Self {
            name: name.into(),
            irr,
            equity_multiple,
            exit_value,
            years: years.into_values().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparisonInput {
    pub baseline: ScenarioResults,
    pub alternative: ScenarioResults,
    /// Names of the assumptions changed between the two runs
    #[serde(default)]
    pub assumption_changes: Vec<String>,
    /// IRR fall (bps) that raises a risk flag
    #[serde(default = "default_irr_drop_bps")]
    pub irr_drop_threshold_bps: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Improved,
    Worsened,
    Unchanged,
}

impl Direction {
    /// Moves of 1 bp or less either way count as unchanged.
    pub fn from_bps(delta_bps: Decimal) -> Self {
        if delta_bps > Decimal::ONE {
            Direction::Improved
        } else if delta_bps < -Decimal::ONE {
            Direction::Worsened
        } else {
            Direction::Unchanged
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flag", rename_all = "snake_case")]
pub enum RiskFlag {
    CashNegative { year: u32, cash: Money },
    NoiNegative { year: u32, noi: Money },
    IrrDrop { delta_bps: Decimal },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearDelta {
    pub year: u32,
    pub revenue: Money,
    pub noi: Money,
    pub net_income: Money,
    pub cash: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityAttribution {
    pub assumption: String,
    pub irr_delta_bps: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub baseline: String,
    pub alternative: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irr_delta_bps: Option<Decimal>,
    pub direction: Direction,
    pub equity_multiple_delta: Multiple,
    pub exit_value_delta: Money,
    pub yearly: Vec<YearDelta>,
    pub risk_flags: Vec<RiskFlag>,
    /// IRR delta split evenly across the changed assumptions
    pub sensitivity: Vec<SensitivityAttribution>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compare an alternative scenario against a baseline.
pub fn compare_scenarios(
    input: &ScenarioComparisonInput,
) -> ProformaResult<ComputationOutput<ScenarioComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let base = &input.baseline;
    let alt = &input.alternative;

    if input.irr_drop_threshold_bps < Decimal::ZERO {
        return Err(ProformaError::InvalidInput {
            field: "irr_drop_threshold_bps".into(),
            reason: "Threshold must be non-negative".into(),
        });
    }

    let irr_delta_bps = match (base.irr, alt.irr) {
        (Some(b), Some(a)) => Some(((a - b) * BPS).round_dp(2)),
        _ => {
            warnings.push("IRR undefined for one scenario; direction left unchanged".into());
            None
        }
    };
    let direction = irr_delta_bps.map_or(Direction::Unchanged, Direction::from_bps);

    let baseline_years: BTreeMap<u32, &YearFigures> =
        base.years.iter().map(|y| (y.year, y)).collect();
    let mut yearly = Vec::with_capacity(alt.years.len());
    let mut risk_flags = Vec::new();
    let mut unmatched = 0usize;

    for a in &alt.years {
        let Some(b) = baseline_years.get(&a.year) else {
            unmatched += 1;
            continue;
        };
        yearly.push(YearDelta {
            year: a.year,
            revenue: a.revenue - b.revenue,
            noi: a.noi - b.noi,
            net_income: a.net_income - b.net_income,
            cash: a.cash - b.cash,
        });
        if a.cash < Decimal::ZERO && b.cash >= Decimal::ZERO {
            risk_flags.push(RiskFlag::CashNegative {
                year: a.year,
                cash: a.cash,
            });
        }
        if a.noi < Decimal::ZERO && b.noi >= Decimal::ZERO {
            risk_flags.push(RiskFlag::NoiNegative {
                year: a.year,
                noi: a.noi,
            });
        }
    }
    if unmatched > 0 {
        warnings.push(format!("{unmatched} alternative years have no baseline counterpart"));
    }

    if let Some(delta) = irr_delta_bps {
        if delta < -input.irr_drop_threshold_bps {
            risk_flags.push(RiskFlag::IrrDrop { delta_bps: delta });
        }
    }

    let sensitivity = match irr_delta_bps {
        Some(delta) if !input.assumption_changes.is_empty() => {
            let share = (delta / Decimal::from(input.assumption_changes.len())).round_dp(2);
            input
                .assumption_changes
                .iter()
                .map(|name| SensitivityAttribution {
                    assumption: name.clone(),
                    irr_delta_bps: share,
                })
                .collect()
        }
        _ => Vec::new(),
    };

    if !risk_flags.is_empty() {
        tracing::debug!(
            alternative = %alt.name,
            flags = risk_flags.len(),
            "scenario raised risk flags"
        );
    }

    let output = ScenarioComparison {
        baseline: base.name.clone(),
        alternative: alt.name.clone(),
        irr_delta_bps,
        direction,
        equity_multiple_delta: alt.equity_multiple - base.equity_multiple,
        exit_value_delta: alt.exit_value - base.exit_value,
        yearly,
        risk_flags,
        sensitivity,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Scenario Comparison (alternative vs baseline)",
        input,
        warnings,
        elapsed,
        output,
    ))
}
