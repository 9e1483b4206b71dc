use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::ProformaResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityMultipleInput {
    /// Signed equity cash flows (negative = contribution)
    pub cash_flows: Vec<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquityMultipleOutput {
    pub total_invested: Money,
    pub total_distributions: Money,
    pub net_profit: Money,
    pub equity_multiple: Multiple,
    /// Net profit / invested
    pub profit_margin: Rate,
}

/// Total positive flows over total absolute negative flows. Both ratios are
/// zero when nothing was invested.
pub fn calculate_equity_multiple(
    input: &EquityMultipleInput,
) -> ProformaResult<ComputationOutput<EquityMultipleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let output = equity_multiple(&input.cash_flows);
    if output.total_invested.is_zero() {
        warnings.push("No capital invested; equity multiple reported as zero".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Equity Multiple (distributions / invested capital)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

pub fn equity_multiple(cash_flows: &[Money]) -> EquityMultipleOutput {
    let total_invested: Money = cash_flows
        .iter()
        .filter(|cf| cf.is_sign_negative())
        .map(|cf| cf.abs())
        .sum();
    let total_distributions: Money = cash_flows
        .iter()
        .filter(|cf| cf.is_sign_positive())
        .sum();
    let net_profit = total_distributions - total_invested;

    let (multiple, margin) = if total_invested.is_zero() {
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        (
            total_distributions / total_invested,
            net_profit / total_invested,
        )
    };

    EquityMultipleOutput {
        total_invested,
        total_distributions,
        net_profit,
        equity_multiple: multiple,
        profit_margin: margin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_multiple_and_margin() {
        let out = equity_multiple(&[
            dec!(-1000000),
            dec!(50000),
            dec!(60000),
            dec!(70000),
            dec!(1200000),
        ]);
        assert_eq!(out.total_invested, dec!(1000000));
        assert_eq!(out.total_distributions, dec!(1380000));
        assert_eq!(out.equity_multiple, dec!(1.38));
        assert_eq!(out.profit_margin, dec!(0.38));
    }

    #[test]
    fn test_zero_invested() {
        let out = calculate_equity_multiple(&EquityMultipleInput {
            cash_flows: vec![dec!(100)],
        })
        .unwrap();
        assert_eq!(out.result.equity_multiple, Decimal::ZERO);
        assert_eq!(out.result.profit_margin, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_multiple_contributions() {
        let out = equity_multiple(&[dec!(-500), dec!(-500), dec!(2000)]);
        assert_eq!(out.equity_multiple, dec!(2));
        assert_eq!(out.net_profit, dec!(1000));
    }
}
