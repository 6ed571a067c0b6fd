// payout_engine/src/model.rs

//! Records the settlement core reads and writes.

use crate::error::PayoutError;
use crate::money::round_money;
use crate::ports::TransferReceipt;
use crate::settlement::SettlementPreview;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Fulfillment status of an order item, owned by the order subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
  Pending,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
}

impl FulfillmentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      FulfillmentStatus::Pending => "pending",
      FulfillmentStatus::Processing => "processing",
      FulfillmentStatus::Shipped => "shipped",
      FulfillmentStatus::Delivered => "delivered",
      FulfillmentStatus::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for FulfillmentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for FulfillmentStatus {
  type Err = PayoutError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(FulfillmentStatus::Pending),
      "processing" => Ok(FulfillmentStatus::Processing),
      "shipped" => Ok(FulfillmentStatus::Shipped),
      "delivered" => Ok(FulfillmentStatus::Delivered),
      "cancelled" => Ok(FulfillmentStatus::Cancelled),
      other => Err(PayoutError::InvalidInput(format!("unknown fulfillment status '{}'", other))),
    }
  }
}

/// One line of a customer order; the unit of settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub buyer_id: Uuid,
  pub seller_id: Uuid,
  pub category: String,
  pub unit_price: Decimal,
  pub quantity: i32,
  pub grand_total: Decimal,
  pub fulfillment_status: FulfillmentStatus,
  pub seller_paid: bool,
  pub payout_id: Option<Uuid>,
}

impl OrderItem {
  pub fn is_shipped(&self) -> bool {
    self.fulfillment_status == FulfillmentStatus::Shipped
  }
}

/// Lifecycle of a persisted payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
  Pending,
  Paid,
  Failed,
}

impl PayoutStatus {
  pub const ALL: [PayoutStatus; 3] = [PayoutStatus::Pending, PayoutStatus::Paid, PayoutStatus::Failed];

  pub fn as_str(&self) -> &'static str {
    match self {
      PayoutStatus::Pending => "pending",
      PayoutStatus::Paid => "paid",
      PayoutStatus::Failed => "failed",
    }
  }

  pub fn is_failed(&self) -> bool {
    *self == PayoutStatus::Failed
  }

  /// Only a pending payout can still change, and only by processor confirmation.
  pub fn can_transition_to(&self, next: PayoutStatus) -> bool {
    matches!(
      (self, next),
      (PayoutStatus::Pending, PayoutStatus::Paid) | (PayoutStatus::Pending, PayoutStatus::Failed)
    )
  }
}

impl fmt::Display for PayoutStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PayoutStatus {
  type Err = PayoutError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(PayoutStatus::Pending),
      "paid" => Ok(PayoutStatus::Paid),
      "failed" => Ok(PayoutStatus::Failed),
      other => Err(PayoutError::InvalidInput(format!("unknown payout status '{}'", other))),
    }
  }
}

/// A single money movement to a seller. Amounts are stored rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
  pub id: Uuid,
  pub order_item_id: Uuid,
  pub seller_id: Uuid,
  /// Gross seller entitlement before the processor fee.
  pub amount: Decimal,
  pub fee_amount: Decimal,
  /// What actually moved to the seller.
  pub net_amount: Decimal,
  pub commission_amount: Decimal,
  pub commission_rate: Decimal,
  pub currency: String,
  pub status: PayoutStatus,
  pub transfer_id: Option<String>,
  pub description: String,
  pub created_at: DateTime<Utc>,
  pub status_updated_at: DateTime<Utc>,
}

impl Payout {
  /// Record for a settlement the processor accepted, or for a zero-value
  /// settlement that never needed a transfer (`receipt == None`).
  pub fn settled(
    preview: &SettlementPreview,
    seller_id: Uuid,
    receipt: Option<&TransferReceipt>,
    description: String,
    now: DateTime<Utc>,
  ) -> Self {
    let rounded = preview.rounded();
    let (status, transfer_id, net_amount) = match receipt {
      Some(r) => (r.status, Some(r.transfer_id.clone()), round_money(r.amount)),
      None => (PayoutStatus::Paid, None, rounded.net_payout),
    };
    Self {
      id: Uuid::new_v4(),
      order_item_id: preview.order_item_id,
      seller_id,
      amount: rounded.gross_payout,
      fee_amount: rounded.processor_fee,
      net_amount,
      commission_amount: rounded.commission_amount,
      commission_rate: preview.commission_rate,
      currency: preview.currency.clone(),
      status,
      transfer_id,
      description,
      created_at: now,
      status_updated_at: now,
    }
  }

  /// Audit record for a transfer attempt the processor refused or never received.
  pub fn failed_attempt(preview: &SettlementPreview, seller_id: Uuid, description: String, now: DateTime<Utc>) -> Self {
    let mut payout = Self::settled(preview, seller_id, None, description, now);
    payout.status = PayoutStatus::Failed;
    payout
  }
}

/// Commission configured for one product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRate {
  pub category: String,
  /// Percentage in `0..=100`.
  pub rate_percent: Decimal,
  pub updated_at: DateTime<Utc>,
}

impl CommissionRate {
  pub fn new(category: &str, rate_percent: Decimal, updated_at: DateTime<Utc>) -> Result<Self, PayoutError> {
    if category.is_empty() {
      return Err(PayoutError::InvalidInput("commission category must not be empty".into()));
    }
    if rate_percent < Decimal::ZERO || rate_percent > Decimal::ONE_HUNDRED {
      return Err(PayoutError::InvalidInput(format!(
        "commission rate for '{}' must be between 0 and 100, got {}",
        category, rate_percent
      )));
    }
    Ok(Self {
      category: category.to_string(),
      rate_percent,
      updated_at,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_strings_round_trip_through_from_str() {
    for status in PayoutStatus::ALL {
      assert_eq!(status.as_str().parse::<PayoutStatus>().ok(), Some(status));
    }
    assert!("refunded".parse::<PayoutStatus>().is_err());
    assert!("Shipped".parse::<FulfillmentStatus>().is_err());
  }

  #[test]
  fn only_pending_payouts_change_status() {
    assert!(PayoutStatus::Pending.can_transition_to(PayoutStatus::Paid));
    assert!(PayoutStatus::Pending.can_transition_to(PayoutStatus::Failed));
    assert!(!PayoutStatus::Paid.can_transition_to(PayoutStatus::Failed));
    assert!(!PayoutStatus::Failed.can_transition_to(PayoutStatus::Paid));
    assert!(!PayoutStatus::Paid.can_transition_to(PayoutStatus::Paid));
  }

  #[test]
  fn commission_rate_bounds_are_inclusive() {
    let now = Utc::now();
    assert!(CommissionRate::new("Tools", Decimal::ZERO, now).is_ok());
    assert!(CommissionRate::new("Tools", Decimal::ONE_HUNDRED, now).is_ok());
    assert!(CommissionRate::new("Tools", Decimal::new(10001, 2), now).is_err());
    assert!(CommissionRate::new("Tools", Decimal::new(-1, 0), now).is_err());
    assert!(CommissionRate::new("", Decimal::TEN, now).is_err());
  }
}
