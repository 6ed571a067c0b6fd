// apps/payout_console/src/models/payout.rs

use super::corrupt_column;
use chrono::{DateTime, Utc};
use payout_engine::{Payout, PayoutStatus, StoreError};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Column list shared by every payout query, in `PayoutRow` field order.
pub const PAYOUT_COLUMNS: &str = "id, order_item_id, seller_id, amount, fee_amount, net_amount, commission_amount, \
   commission_rate, currency, status, transfer_id, description, created_at, status_updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct PayoutRow {
  pub id: Uuid,
  pub order_item_id: Uuid,
  pub seller_id: Uuid,
  pub amount: Decimal,
  pub fee_amount: Decimal,
  pub net_amount: Decimal,
  pub commission_amount: Decimal,
  pub commission_rate: Decimal,
  pub currency: String,
  pub status: String,
  pub transfer_id: Option<String>,
  pub description: String,
  pub created_at: DateTime<Utc>,
  pub status_updated_at: DateTime<Utc>,
}

impl TryFrom<PayoutRow> for Payout {
  type Error = StoreError;

  fn try_from(row: PayoutRow) -> Result<Self, Self::Error> {
    let status = row
      .status
      .parse::<PayoutStatus>()
      .map_err(|e| corrupt_column("payouts", "status", e))?;
    Ok(Payout {
      id: row.id,
      order_item_id: row.order_item_id,
      seller_id: row.seller_id,
      amount: row.amount,
      fee_amount: row.fee_amount,
      net_amount: row.net_amount,
      commission_amount: row.commission_amount,
      commission_rate: row.commission_rate,
      currency: row.currency,
      status,
      transfer_id: row.transfer_id,
      description: row.description,
      created_at: row.created_at,
      status_updated_at: row.status_updated_at,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(status: &str) -> PayoutRow {
    let now = Utc::now();
    PayoutRow {
      id: Uuid::new_v4(),
      order_item_id: Uuid::new_v4(),
      seller_id: Uuid::new_v4(),
      amount: Decimal::new(18_000, 2),
      fee_amount: Decimal::new(70, 2),
      net_amount: Decimal::new(17_930, 2),
      commission_amount: Decimal::new(2_000, 2),
      commission_rate: Decimal::TEN,
      currency: "USD".to_string(),
      status: status.to_string(),
      transfer_id: Some("tr_1".to_string()),
      description: "Payout".to_string(),
      created_at: now,
      status_updated_at: now,
    }
  }

  #[test]
  fn converts_known_status() {
    let payout = Payout::try_from(row("pending")).unwrap();
    assert_eq!(payout.status, PayoutStatus::Pending);
    assert_eq!(payout.net_amount, Decimal::new(17_930, 2));
  }

  #[test]
  fn rejects_unknown_status() {
    let err = Payout::try_from(row("settled")).unwrap_err();
    assert!(matches!(err, StoreError::Backend(_)));
  }
}
