use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

use super::simulator::MonthlyRecord;

/// Model-year roll-up of monthly records. Flows are summed; balances are
/// taken from the year's last month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualSummary {
    /// 1-based model year
    pub year: u32,
    pub months: u32,
    pub operating_months: u32,
    pub average_occupancy: Rate,
    pub rooms_sold: rust_decimal::Decimal,
    pub revenue_rooms: Money,
    pub revenue_events: Money,
    pub revenue_fb: Money,
    pub revenue_other: Money,
    pub revenue_total: Money,
    pub expenses_total: Money,
    pub gop: Money,
    pub fee_base: Money,
    pub fee_incentive: Money,
    pub ffe_reserve: Money,
    pub noi: Money,
    pub interest_expense: Money,
    pub principal_payment: Money,
    pub debt_service: Money,
    pub refinancing_proceeds: Money,
    pub depreciation: Money,
    pub income_tax: Money,
    pub net_income: Money,
    pub operating_cash_flow: Money,
    pub financing_cash_flow: Money,
    pub cash_flow: Money,
    pub ending_cash: Money,
    pub ending_debt: Money,
    pub property_value: Money,
}

impl AnnualSummary {
    pub fn management_fees(&self) -> Money {
        self.fee_base + self.fee_incentive
    }
}

/// Group records into consecutive 12-month model years. A trailing partial
/// year is kept as its own row.
pub fn annualize(records: &[MonthlyRecord]) -> Vec<AnnualSummary> {
    records
        .chunks(12)
        .enumerate()
        .filter_map(|(i, chunk)| roll_up(i as u32 + 1, chunk))
        .collect()
}

fn total(chunk: &[MonthlyRecord], field: impl Fn(&MonthlyRecord) -> Money) -> Money {
    chunk.iter().map(field).sum()
}

fn roll_up(year: u32, chunk: &[MonthlyRecord]) -> Option<AnnualSummary> {
    let last = chunk.last()?;

    let operating: Vec<&MonthlyRecord> = chunk.iter().filter(|r| r.is_operational).collect();
    let average_occupancy = if operating.is_empty() {
        Rate::ZERO
    } else {
        operating.iter().map(|r| r.occupancy).sum::<Rate>() / Rate::from(operating.len())
    };

    Some(AnnualSummary {
        year,
        months: chunk.len() as u32,
        operating_months: operating.len() as u32,
        average_occupancy,
        rooms_sold: total(chunk, |r| r.rooms_sold),
        revenue_rooms: total(chunk, |r| r.revenue_rooms),
        revenue_events: total(chunk, |r| r.revenue_events),
        revenue_fb: total(chunk, |r| r.revenue_fb),
        revenue_other: total(chunk, |r| r.revenue_other),
        revenue_total: total(chunk, |r| r.revenue_total),
        expenses_total: total(chunk, |r| r.expenses_total),
        gop: total(chunk, |r| r.gop),
        fee_base: total(chunk, |r| r.fee_base),
        fee_incentive: total(chunk, |r| r.fee_incentive),
        ffe_reserve: total(chunk, |r| r.ffe_reserve),
        noi: total(chunk, |r| r.noi),
        interest_expense: total(chunk, |r| r.interest_expense),
        principal_payment: total(chunk, |r| r.principal_payment),
        debt_service: total(chunk, |r| r.debt_payment),
        refinancing_proceeds: total(chunk, |r| r.refinancing_proceeds),
        depreciation: total(chunk, |r| r.depreciation),
        income_tax: total(chunk, |r| r.income_tax),
        net_income: total(chunk, |r| r.net_income),
        operating_cash_flow: total(chunk, |r| r.operating_cash_flow),
        financing_cash_flow: total(chunk, |r| r.financing_cash_flow),
        cash_flow: total(chunk, |r| r.cash_flow),
        ending_cash: last.ending_cash,
        ending_debt: last.debt_outstanding,
        property_value: last.property_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proforma::assumptions::fixtures::*;
    use crate::proforma::simulator::build_projection;

    #[test]
    fn test_annual_totals_match_monthly() {
        let mut w = Vec::new();
        let p = build_projection(&sample_global(), &sample_property(), &mut w).unwrap();
        let annual = annualize(&p.records);
        assert_eq!(annual.len(), 5);

        let year1: Money = p.records[..12].iter().map(|r| r.noi).sum();
        assert_eq!(annual[0].noi, year1);
        assert_eq!(annual[0].operating_months, 9);
        assert_eq!(annual[4].ending_cash, p.records[59].ending_cash);

        let total: Money = annual.iter().map(|a| a.cash_flow).sum();
        assert_eq!(total, p.records[59].ending_cash);
    }

    #[test]
    fn test_partial_trailing_year() {
        let mut w = Vec::new();
        let p = build_projection(&sample_global(), &sample_property(), &mut w).unwrap();
        let annual = annualize(&p.records[..18]);
        assert_eq!(annual.len(), 2);
        assert_eq!(annual[1].months, 6);
    }

    #[test]
    fn test_empty_records() {
        assert!(annualize(&[]).is_empty());
    }
}
