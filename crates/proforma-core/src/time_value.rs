use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ProformaError;
use crate::types::{Money, Rate};
use crate::ProformaResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;
const MAX_BRACKET_WIDENINGS: u32 = 40;
const MAX_STEP_BACKOFFS: u32 = 60;
const IRR_LOWER_BOUND: Decimal = dec!(-0.99);
const IRR_UPPER_BOUND: Decimal = dec!(10);
const INITIAL_BRACKET: Decimal = dec!(0.5);

/// Net Present Value of a series of cash flows, the first at t = 0.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> ProformaResult<Money> {
    if rate <= dec!(-1) {
        return Err(ProformaError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r).ok_or_else(|| {
                ProformaError::FinancialImpossibility(format!(
                    "NPV discount factor overflows at period {t}"
                ))
            })?;
        }
        let pv = cf.checked_div(discount).ok_or_else(|| ProformaError::DivisionByZero {
            context: format!("NPV discount factor at period {t}"),
        })?;
        result += pv;
    }

    Ok(result)
}

/// Number of sign changes across the non-zero entries of a vector.
pub fn sign_changes(cash_flows: &[Money]) -> usize {
    let mut changes = 0;
    let mut last: Option<bool> = None;
    for cf in cash_flows.iter().filter(|cf| !cf.is_zero()) {
        let positive = cf.is_sign_positive();
        if let Some(prev) = last {
            if prev != positive {
                changes += 1;
            }
        }
        last = Some(positive);
    }
    changes
}

/// Internal Rate of Return: Newton-Raphson from `guess` with steps clamped
/// to [-99%, 1000%], falling back to bisection over an adaptive bracket.
pub fn irr(cash_flows: &[Money], guess: Rate) -> ProformaResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(ProformaError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    if sign_changes(cash_flows) == 0 {
        return Err(ProformaError::FinancialImpossibility(
            "IRR undefined: cash flows never change sign".into(),
        ));
    }

    match newton_irr(cash_flows, guess) {
        Some(rate) => Ok(rate),
        None => bisection_irr(cash_flows),
    }
}

/// NPV and its derivative with respect to the rate, or `None` when a
/// discount factor leaves the range of `Decimal`.
fn npv_and_slope(rate: Rate, cash_flows: &[Money]) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let v = Decimal::ONE.checked_div(one_plus_r)?;
    let mut factor = Decimal::ONE;
    let mut value = Decimal::ZERO;
    let mut slope = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            factor = factor.checked_mul(v)?;
        }
        value = value.checked_add(cf.checked_mul(factor)?)?;
        if t > 0 {
            // d/dr (1+r)^-t = -t (1+r)^-(t+1)
            let weight = Decimal::from(t as i64).checked_mul(factor.checked_mul(v)?)?;
            slope = slope.checked_sub(cf.checked_mul(weight)?)?;
        }
    }

    Some((value, slope))
}

fn newton_irr(cash_flows: &[Money], guess: Rate) -> Option<Rate> {
    let mut rate = guess.clamp(IRR_LOWER_BOUND, IRR_UPPER_BOUND);
    let (mut value, mut slope) = npv_and_slope(rate, cash_flows)?;

    for _ in 0..MAX_IRR_ITERATIONS {
        if value.abs() < CONVERGENCE_THRESHOLD {
            return Some(rate);
        }
        if slope.is_zero() {
            return None;
        }

        let mut next = (rate - value.checked_div(slope)?).clamp(IRR_LOWER_BOUND, IRR_UPPER_BOUND);
        // Back off towards the current rate while the NPV overflows.
        let mut evaluated = npv_and_slope(next, cash_flows);
        let mut backoffs = 0;
        while evaluated.is_none() && backoffs < MAX_STEP_BACKOFFS {
            next = (rate + next) / dec!(2);
            evaluated = npv_and_slope(next, cash_flows);
            backoffs += 1;
        }
        let (next_value, next_slope) = evaluated?;

        if (next - rate).abs() < CONVERGENCE_THRESHOLD {
            // Pinned against a bound is not a root.
            return (next > IRR_LOWER_BOUND && next < IRR_UPPER_BOUND).then_some(next);
        }
        rate = next;
        value = next_value;
        slope = next_slope;
    }

    None
}

fn bisection_irr(cash_flows: &[Money]) -> ProformaResult<Rate> {
    let value_at = |rate: Rate| npv_and_slope(rate, cash_flows).map(|(value, _)| value);
    let failure = |iterations: u32, delta: Decimal| ProformaError::ConvergenceFailure {
        function: "IRR".into(),
        iterations,
        last_delta: delta,
    };

    // Pull each edge towards zero until its NPV is representable.
    let mut lo = -INITIAL_BRACKET;
    let mut lo_value = value_at(lo);
    while lo_value.is_none() && lo < -CONVERGENCE_THRESHOLD {
        lo /= dec!(2);
        lo_value = value_at(lo);
    }
    let mut hi = INITIAL_BRACKET;
    let mut hi_value = value_at(hi);
    while hi_value.is_none() && hi > CONVERGENCE_THRESHOLD {
        hi /= dec!(2);
        hi_value = value_at(hi);
    }
    let (Some(mut f_lo), Some(mut f_hi)) = (lo_value, hi_value) else {
        return Err(failure(0, Decimal::ZERO));
    };

    // Widen until the NPV changes sign; an overflowing edge stays put.
    let mut lo_open = true;
    let mut hi_open = true;
    let mut widenings = 0;
    while !f_lo.is_zero()
        && !f_hi.is_zero()
        && f_lo.is_sign_positive() == f_hi.is_sign_positive()
    {
        if widenings == MAX_BRACKET_WIDENINGS || !(lo_open || hi_open) {
            return Err(failure(widenings, f_lo));
        }
        widenings += 1;
        if lo_open {
            let next = (lo + IRR_LOWER_BOUND) / dec!(2);
            match value_at(next) {
                Some(value) => {
                    lo = next;
                    f_lo = value;
                }
                None => lo_open = false,
            }
        }
        if hi_open {
            let next = (hi * dec!(2)).min(IRR_UPPER_BOUND);
            match value_at(next) {
                Some(value) => {
                    hi = next;
                    f_hi = value;
                }
                None => hi_open = false,
            }
            hi_open = hi_open && hi < IRR_UPPER_BOUND;
        }
    }
    if f_lo.is_zero() {
        return Ok(lo);
    }
    if f_hi.is_zero() {
        return Ok(hi);
    }

    let mut mid = lo;
    let mut f_mid = f_lo;
    for _ in 0..MAX_BISECTION_ITERATIONS {
        mid = (lo + hi) / dec!(2);
        f_mid = match value_at(mid) {
            Some(value) => value,
            None => {
                lo = mid;
                continue;
            }
        };
        if f_mid.abs() < CONVERGENCE_THRESHOLD || (hi - lo) < CONVERGENCE_THRESHOLD {
            return Ok(mid);
        }
        if f_mid.is_sign_positive() == f_lo.is_sign_positive() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Err(failure(
        MAX_BISECTION_ITERATIONS,
        if f_mid.is_zero() { mid } else { f_mid },
    ))
}
