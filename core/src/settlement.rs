// payout_engine/src/settlement.rs

//! Settlement calculator: order item + commission schedule + fee model →
//! what the seller would be paid right now.

use crate::commission::CommissionSchedule;
use crate::config::SettlementConfig;
use crate::error::PayoutError;
use crate::model::OrderItem;
use crate::money::{percent_of, round_money};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

/// A computed, non-persisted projection of a payout.
///
/// Values are exact; call [`SettlementPreview::rounded`] at the display or
/// persistence boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementPreview {
  pub order_item_id: Uuid,
  pub category: String,
  pub item_total: Decimal,
  pub commission_rate: Decimal,
  /// `false` when no rate is configured for the category and 0% was applied.
  pub commission_found: bool,
  pub commission_amount: Decimal,
  pub gross_payout: Decimal,
  pub processor_fee: Decimal,
  pub net_payout: Decimal,
  /// Set when the fee exceeded the gross payout and the net was floored at zero.
  pub net_clamped: bool,
  pub currency: String,
}

/// Conditions an operator must see before confirming a payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SettlementWarning {
  CommissionRateMissing { category: String },
  NetPayoutClamped { processor_fee: Decimal, gross_payout: Decimal },
}

impl SettlementPreview {
  /// Copy with every money field rounded to cents, half-up.
  pub fn rounded(&self) -> Self {
    Self {
      item_total: round_money(self.item_total),
      commission_amount: round_money(self.commission_amount),
      gross_payout: round_money(self.gross_payout),
      processor_fee: round_money(self.processor_fee),
      net_payout: round_money(self.net_payout),
      ..self.clone()
    }
  }

  pub fn warnings(&self) -> Vec<SettlementWarning> {
    let mut warnings = Vec::new();
    if !self.commission_found {
      warnings.push(SettlementWarning::CommissionRateMissing {
        category: self.category.clone(),
      });
    }
    if self.net_clamped {
      warnings.push(SettlementWarning::NetPayoutClamped {
        processor_fee: round_money(self.processor_fee),
        gross_payout: round_money(self.gross_payout),
      });
    }
    warnings
  }

  /// Net amount that would actually be transferred.
  pub fn transfer_amount(&self) -> Decimal {
    round_money(self.net_payout)
  }
}

/// Pure settlement computation over a commission snapshot and fee config.
#[derive(Debug, Clone, Copy)]
pub struct SettlementCalculator<'a> {
  schedule: &'a CommissionSchedule,
  config: &'a SettlementConfig,
}

impl<'a> SettlementCalculator<'a> {
  pub fn new(schedule: &'a CommissionSchedule, config: &'a SettlementConfig) -> Self {
    Self { schedule, config }
  }

  pub fn preview(&self, item: &OrderItem) -> Result<SettlementPreview, PayoutError> {
    if item.unit_price < Decimal::ZERO {
      return Err(PayoutError::InvalidInput(format!(
        "order item {} has a negative unit price ({})",
        item.id, item.unit_price
      )));
    }
    if item.quantity < 0 {
      return Err(PayoutError::InvalidInput(format!(
        "order item {} has a negative quantity ({})",
        item.id, item.quantity
      )));
    }

    let lookup = self.schedule.resolve(&item.category)?;
    let item_total = item.unit_price * Decimal::from(item.quantity);
    let commission_amount = percent_of(item_total, lookup.rate);
    let gross_payout = item_total - commission_amount;
    let fee = self.config.fee.apply(gross_payout);

    if !lookup.found {
      warn!(order_item_id = %item.id, category = %item.category, "No commission rate configured; applying 0%.");
    }
    if fee.clamped {
      warn!(order_item_id = %item.id, %gross_payout, processor_fee = %fee.fee, "Processor fee exceeds gross payout; net clamped to zero.");
    }

    Ok(SettlementPreview {
      order_item_id: item.id,
      category: item.category.clone(),
      item_total,
      commission_rate: lookup.rate,
      commission_found: lookup.found,
      commission_amount,
      gross_payout,
      processor_fee: fee.fee,
      net_payout: fee.net,
      net_clamped: fee.clamped,
      currency: self.config.currency.clone(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{CommissionRate, FulfillmentStatus};
  use chrono::Utc;

  fn item(category: &str, unit_price: Decimal, quantity: i32) -> OrderItem {
    OrderItem {
      id: Uuid::new_v4(),
      order_id: Uuid::new_v4(),
      buyer_id: Uuid::new_v4(),
      seller_id: Uuid::new_v4(),
      category: category.to_string(),
      unit_price,
      quantity,
      grand_total: unit_price * Decimal::from(quantity.max(0)),
      fulfillment_status: FulfillmentStatus::Shipped,
      seller_paid: false,
      payout_id: None,
    }
  }

  fn schedule() -> CommissionSchedule {
    CommissionSchedule::from_rates(vec![CommissionRate {
      category: "Core Drill Bits".into(),
      rate_percent: Decimal::TEN,
      updated_at: Utc::now(),
    }])
    .unwrap()
  }

  #[test]
  fn commission_and_fee_for_core_drill_bits() {
    let schedule = schedule();
    let config = SettlementConfig::default();
    let preview = SettlementCalculator::new(&schedule, &config)
      .preview(&item("Core Drill Bits", Decimal::new(10000, 2), 2))
      .unwrap();

    assert_eq!(preview.item_total, Decimal::from(200));
    assert_eq!(preview.commission_amount, Decimal::from(20));
    assert_eq!(preview.gross_payout, Decimal::from(180));
    assert_eq!(preview.processor_fee, Decimal::new(70, 2));
    assert_eq!(preview.net_payout, Decimal::new(17930, 2));
    assert!(preview.commission_found);
    assert!(preview.warnings().is_empty());
  }

  #[test]
  fn missing_rate_keeps_gross_equal_to_item_total() {
    let schedule = schedule();
    let config = SettlementConfig::default();
    let preview = SettlementCalculator::new(&schedule, &config)
      .preview(&item("Safety Gloves", Decimal::new(1999, 2), 3))
      .unwrap();

    assert!(!preview.commission_found);
    assert_eq!(preview.commission_amount, Decimal::ZERO);
    assert_eq!(preview.gross_payout, preview.item_total);
    assert_eq!(
      preview.warnings(),
      vec![SettlementWarning::CommissionRateMissing {
        category: "Safety Gloves".into()
      }]
    );
  }

  #[test]
  fn zero_quantity_yields_zero_net_with_clamp_flag() {
    let schedule = schedule();
    let config = SettlementConfig::default();
    let preview = SettlementCalculator::new(&schedule, &config)
      .preview(&item("Core Drill Bits", Decimal::new(4999, 2), 0))
      .unwrap();

    assert_eq!(preview.item_total, Decimal::ZERO);
    assert_eq!(preview.net_payout, Decimal::ZERO);
    assert!(preview.net_clamped);
  }

  #[test]
  fn negative_price_or_quantity_is_rejected() {
    let schedule = schedule();
    let config = SettlementConfig::default();
    let calc = SettlementCalculator::new(&schedule, &config);
    assert!(matches!(
      calc.preview(&item("Core Drill Bits", Decimal::new(-1, 2), 1)),
      Err(PayoutError::InvalidInput(_))
    ));
    assert!(matches!(
      calc.preview(&item("Core Drill Bits", Decimal::ONE, -1)),
      Err(PayoutError::InvalidInput(_))
    ));
  }

  #[test]
  fn rounding_happens_only_in_rounded_copy() {
    let schedule = CommissionSchedule::from_rates(vec![CommissionRate {
      category: "Bits".into(),
      rate_percent: Decimal::new(125, 1), // 12.5%
      updated_at: Utc::now(),
    }])
    .unwrap();
    let config = SettlementConfig::default();
    let preview = SettlementCalculator::new(&schedule, &config)
      .preview(&item("Bits", Decimal::new(333, 2), 3))
      .unwrap();

    // 9.99 * 12.5% = 1.24875 exactly; only the rounded copy shows 1.25
    assert_eq!(preview.commission_amount, Decimal::new(124875, 5));
    assert_eq!(preview.rounded().commission_amount, Decimal::new(125, 2));
  }

  #[test]
  fn net_never_negative_across_small_amounts() {
    let schedule = schedule();
    let config = SettlementConfig::default();
    let calc = SettlementCalculator::new(&schedule, &config);
    for cents in 0..200 {
      for qty in 0..4 {
        let preview = calc.preview(&item("Core Drill Bits", Decimal::new(cents, 2), qty)).unwrap();
        assert!(preview.net_payout >= Decimal::ZERO);
        let unclamped = preview.gross_payout - preview.processor_fee;
        assert_eq!(preview.net_clamped, unclamped < Decimal::ZERO);
      }
    }
  }
}
