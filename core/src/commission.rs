// payout_engine/src/commission.rs

//! Category → commission percentage lookup.

use crate::error::PayoutError;
use crate::model::CommissionRate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Result of a commission lookup. `found == false` is not an error, but it
/// means the marketplace takes no commission on the item, so callers must
/// surface it to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommissionLookup {
  pub rate: Decimal,
  pub found: bool,
}

/// A snapshot of all configured commission rates, keyed by exact category.
#[derive(Debug, Clone, Default)]
pub struct CommissionSchedule {
  rates: HashMap<String, Decimal>,
}

impl CommissionSchedule {
  /// Builds a schedule, rejecting out-of-range rates and duplicate categories.
  pub fn from_rates(rates: impl IntoIterator<Item = CommissionRate>) -> Result<Self, PayoutError> {
    let mut map = HashMap::new();
    for rate in rates {
      // Re-validate: rows may come from a store that predates the bounds check.
      let rate = CommissionRate::new(&rate.category, rate.rate_percent, rate.updated_at)?;
      if map.insert(rate.category.clone(), rate.rate_percent).is_some() {
        return Err(PayoutError::InvalidInput(format!(
          "more than one commission rate configured for category '{}'",
          rate.category
        )));
      }
    }
    Ok(Self { rates: map })
  }

  /// Case-sensitive exact match on `category`.
  pub fn resolve(&self, category: &str) -> Result<CommissionLookup, PayoutError> {
    if category.is_empty() {
      return Err(PayoutError::InvalidInput("category must not be empty".into()));
    }
    Ok(match self.rates.get(category) {
      Some(rate) => CommissionLookup { rate: *rate, found: true },
      None => CommissionLookup {
        rate: Decimal::ZERO,
        found: false,
      },
    })
  }

  pub fn len(&self) -> usize {
    self.rates.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rates.is_empty()
  }
}
