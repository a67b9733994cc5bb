//! Money helpers
//!
//! All amounts are `Decimal`. Rounding is half-up (away from zero on the
//! midpoint) to two places and is applied by callers at a single point.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places for monetary amounts
pub const MONEY_SCALE: u32 = 2;

/// Largest price, fee or declared value accepted anywhere in pricing
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Largest shipment weight accepted for pricing
pub const MAX_WEIGHT_KG: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// Round a monetary amount half-up to 2 decimal places
///
/// The result always carries scale 2, so `94.4` serializes as `"94.40"`.
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// `value × percent / 100`
#[inline]
pub fn percent_of(value: Decimal, percent: Decimal) -> Decimal {
    value * percent / Decimal::ONE_HUNDRED
}

/// `1 + percent / 100`
#[inline]
pub fn percent_factor(percent: Decimal) -> Decimal {
    Decimal::ONE + percent / Decimal::ONE_HUNDRED
}

/// Returns true if `amount` lies in `[0, MAX_AMOUNT]`
#[inline]
pub fn is_valid_amount(amount: Decimal) -> bool {
    amount >= Decimal::ZERO && amount <= MAX_AMOUNT
}

/// Returns true if `percent` lies in `[0, 100]`
#[inline]
pub fn is_valid_percentage(percent: Decimal) -> bool {
    percent >= Decimal::ZERO && percent <= Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
        assert_eq!(round_money(dec!(1.004)), dec!(1.00));
        assert_eq!(round_money(dec!(127.735)), dec!(127.74));
        assert_eq!(round_money(dec!(-2.345)), dec!(-2.35));
        assert_eq!(round_money(dec!(94.4)).to_string(), "94.40");
    }

    #[test]
    fn test_percent_helpers() {
        assert_eq!(percent_of(dec!(200), dec!(18)), dec!(36));
        assert_eq!(percent_factor(dec!(5)), dec!(1.05));
        assert!(is_valid_percentage(dec!(0)));
        assert!(is_valid_percentage(dec!(100)));
        assert!(!is_valid_percentage(dec!(100.01)));
        assert!(!is_valid_percentage(dec!(-1)));
    }

    #[test]
    fn test_amount_bounds() {
        assert_eq!(MAX_AMOUNT, dec!(1000000000));
        assert_eq!(MAX_WEIGHT_KG, dec!(100000));
        assert!(is_valid_amount(dec!(0)));
        assert!(is_valid_amount(MAX_AMOUNT));
        assert!(!is_valid_amount(MAX_AMOUNT + dec!(0.01)));
        assert!(!is_valid_amount(dec!(-0.01)));
    }
}
