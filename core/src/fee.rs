// payout_engine/src/fee.rs

//! Processor transfer fee: a percentage of the gross payout plus a flat fee.

use crate::error::PayoutError;
use crate::money::percent_of;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default transfer fee percentage (0.25%).
pub const DEFAULT_FEE_PERCENT: Decimal = Decimal::from_parts(25, 0, 0, false, 2);

/// Default flat fee per transfer (0.25).
pub const DEFAULT_FIXED_FEE: Decimal = Decimal::from_parts(25, 0, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
  /// Percentage of the gross payout, e.g. `0.25` for 0.25%.
  pub fee_percent: Decimal,
  pub fixed_fee: Decimal,
}

impl Default for FeeConfig {
  fn default() -> Self {
    Self {
      fee_percent: DEFAULT_FEE_PERCENT,
      fixed_fee: DEFAULT_FIXED_FEE,
    }
  }
}

/// Fee applied to one gross amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeOutcome {
  pub fee: Decimal,
  /// `max(0, gross - fee)`.
  pub net: Decimal,
  /// Set when `gross - fee` was negative and the net was floored at zero.
  pub clamped: bool,
}

impl FeeConfig {
  pub fn new(fee_percent: Decimal, fixed_fee: Decimal) -> Result<Self, PayoutError> {
    if fee_percent < Decimal::ZERO || fee_percent > Decimal::ONE_HUNDRED {
      return Err(PayoutError::InvalidInput(format!(
        "fee percent must be between 0 and 100, got {}",
        fee_percent
      )));
    }
    if fixed_fee < Decimal::ZERO {
      return Err(PayoutError::InvalidInput(format!(
        "fixed fee must not be negative, got {}",
        fixed_fee
      )));
    }
    Ok(Self { fee_percent, fixed_fee })
  }

  pub fn fee_for(&self, gross: Decimal) -> Decimal {
    percent_of(gross, self.fee_percent) + self.fixed_fee
  }

  pub fn apply(&self, gross: Decimal) -> FeeOutcome {
    let fee = self.fee_for(gross);
    let unclamped = gross - fee;
    if unclamped < Decimal::ZERO {
      FeeOutcome {
        fee,
        net: Decimal::ZERO,
        clamped: true,
      }
    } else {
      FeeOutcome {
        fee,
        net: unclamped,
        clamped: false,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_fee_on_180() {
    let outcome = FeeConfig::default().apply(Decimal::from(180));
    assert_eq!(outcome.fee, Decimal::new(70, 2));
    assert_eq!(outcome.net, Decimal::new(17930, 2));
    assert!(!outcome.clamped);
  }

  #[test]
  fn net_is_floored_at_zero_and_flagged() {
    let outcome = FeeConfig::default().apply(Decimal::new(10, 2));
    assert_eq!(outcome.net, Decimal::ZERO);
    assert!(outcome.clamped);
  }

  #[test]
  fn rejects_negative_configuration() {
    assert!(FeeConfig::new(Decimal::new(-1, 0), Decimal::ZERO).is_err());
    assert!(FeeConfig::new(Decimal::ZERO, Decimal::new(-1, 2)).is_err());
    assert!(FeeConfig::new(Decimal::new(29, 1), Decimal::new(30, 2)).is_ok());
  }
}
