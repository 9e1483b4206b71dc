//! Shared numeric policy: rounding and tolerance comparison.
//!
//! Every monetary figure the simulators emit passes through [`round`] exactly
//! once, and every subtotal is an exact sum of already-rounded parts. That is
//! what keeps the cumulative cash identity exact rather than approximate.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

fn default_decimal_places() -> u32 {
    2
}

/// Decimal precision and midpoint behaviour for monetary output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingPolicy {
    /// Digits kept after the decimal point
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Round half to even ("banker's rounding") instead of half away from zero
    #[serde(default)]
    pub bankers: bool,
}

impl Default for RoundingPolicy {
    fn default() -> Self {
        Self {
            decimal_places: default_decimal_places(),
            bankers: false,
        }
    }
}

impl RoundingPolicy {
    pub fn cents() -> Self {
        Self::default()
    }

    fn strategy(&self) -> RoundingStrategy {
        if self.bankers {
            RoundingStrategy::MidpointNearestEven
        } else {
            RoundingStrategy::MidpointAwayFromZero
        }
    }
}

/// Round `value` under `policy`. Idempotent.
pub fn round(value: Decimal, policy: &RoundingPolicy) -> Decimal {
    value.round_dp_with_strategy(policy.decimal_places, policy.strategy())
}

// ---------------------------------------------------------------------------
// Tolerance
// ---------------------------------------------------------------------------

/// Comparison tolerance: a relative threshold with an absolute floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Maximum |actual - expected| / |expected| (0.01 = 1%)
    pub relative: Rate,
    /// Absolute threshold used when either side is zero, and as a floor otherwise
    pub absolute: Money,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            relative: dec!(0.01),
            absolute: dec!(0.01),
        }
    }
}

impl Tolerance {
    /// Cents-level absolute tolerance for amortization schedule reconciliation.
    pub fn cents() -> Self {
        Self {
            relative: Decimal::ZERO,
            absolute: dec!(0.01),
        }
    }

    /// 1% relative, or $1 absolute when the expected value is zero.
    pub fn audit() -> Self {
        Self {
            relative: dec!(0.01),
            absolute: Decimal::ONE,
        }
    }
}

/// True when `actual` agrees with `expected` under `tol`.
///
/// When either side is zero only the absolute threshold applies; otherwise
/// the relative threshold applies with the absolute threshold as a floor.
pub fn within_tolerance(actual: Decimal, expected: Decimal, tol: &Tolerance) -> bool {
    let diff = (actual - expected).abs();
    if diff <= tol.absolute {
        return true;
    }
    if actual.is_zero() || expected.is_zero() {
        return false;
    }
    diff / expected.abs() <= tol.relative
}

/// Signed variance: actual - expected.
pub fn variance(actual: Decimal, expected: Decimal) -> Decimal {
    actual - expected
}

/// Variance as a fraction of |expected| (0 when expected is zero).
pub fn variance_pct(actual: Decimal, expected: Decimal) -> Rate {
    if expected.is_zero() {
        Decimal::ZERO
    } else {
        (actual - expected) / expected.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_half_away_from_zero() {
        let p = RoundingPolicy::default();
        assert_eq!(round(dec!(2.345), &p), dec!(2.35));
        assert_eq!(round(dec!(-2.345), &p), dec!(-2.35));
    }

    #[test]
    fn test_bankers_rounding() {
        let p = RoundingPolicy {
            decimal_places: 2,
            bankers: true,
        };
        assert_eq!(round(dec!(2.345), &p), dec!(2.34));
        assert_eq!(round(dec!(2.355), &p), dec!(2.36));
    }

    #[test]
    fn test_within_tolerance_relative() {
        let tol = Tolerance::audit();
        assert!(within_tolerance(dec!(1009), dec!(1000), &tol));
        assert!(!within_tolerance(dec!(1011), dec!(1000), &tol));
    }

    #[test]
    fn test_within_tolerance_zero_expected_uses_absolute() {
        let tol = Tolerance::audit();
        assert!(within_tolerance(dec!(0.99), Decimal::ZERO, &tol));
        assert!(!within_tolerance(dec!(1.01), Decimal::ZERO, &tol));
    }

    #[test]
    fn test_cents_tolerance() {
        let tol = Tolerance::cents();
        assert!(within_tolerance(dec!(100.01), dec!(100.00), &tol));
        assert!(!within_tolerance(dec!(100.02), dec!(100.00), &tol));
    }

    #[test]
    fn test_variance_sign() {
        assert_eq!(variance(dec!(90), dec!(100)), dec!(-10));
        assert_eq!(variance_pct(dec!(90), dec!(100)), dec!(-0.1));
        assert_eq!(variance_pct(dec!(5), Decimal::ZERO), Decimal::ZERO);
    }

    proptest! {
        #[test]
        fn rounding_is_idempotent(
            mantissa in -10_000_000_000i64..10_000_000_000i64,
            scale in 0u32..10,
            places in 0u32..6,
            bankers in any::<bool>(),
        ) {
            let x = Decimal::new(mantissa, scale);
            let p = RoundingPolicy { decimal_places: places, bankers };
            let once = round(x, &p);
            prop_assert_eq!(round(once, &p), once);
        }
    }
}
