// payout_engine/src/money.rs

//! Fixed-point money helpers. Amounts are `rust_decimal::Decimal` end to end;
//! rounding happens only where a value is displayed or persisted.

use rust_decimal::{Decimal, RoundingStrategy};

/// Minor-unit precision of persisted amounts (cents).
pub const MONEY_SCALE: u32 = 2;

pub const DEFAULT_CURRENCY: &str = "USD";

/// Rounds to cents, half-up (away from zero on the midpoint).
pub fn round_money(value: Decimal) -> Decimal {
  value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `amount * percent / 100`, unrounded.
pub fn percent_of(amount: Decimal, percent: Decimal) -> Decimal {
  amount * percent / Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rounds_half_up_to_cents() {
    assert_eq!(round_money(Decimal::new(1005, 3)), Decimal::new(101, 2)); // 1.005 -> 1.01
    assert_eq!(round_money(Decimal::new(1004, 3)), Decimal::new(100, 2)); // 1.004 -> 1.00
    assert_eq!(round_money(Decimal::new(45, 2)), Decimal::new(45, 2));
  }

  #[test]
  fn percent_of_keeps_full_precision() {
    // 180 * 0.25% = 0.45
    assert_eq!(percent_of(Decimal::from(180), Decimal::new(25, 2)), Decimal::new(45, 2));
    // 0.01 * 0.25% = 0.000025
    assert_eq!(percent_of(Decimal::new(1, 2), Decimal::new(25, 2)), Decimal::new(25, 6));
  }
}
