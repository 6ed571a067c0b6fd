// apps/payout_console/src/models/order_item.rs

use super::corrupt_column;
use payout_engine::{FulfillmentStatus, OrderItem, StoreError};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
  pub id: Uuid,
  pub order_id: Uuid,
  pub buyer_id: Uuid,
  pub seller_id: Uuid,
  pub category: String,
  pub unit_price: Decimal,
  pub quantity: i32,
  pub grand_total: Decimal,
  pub fulfillment_status: String,
  pub seller_paid: bool,
  pub payout_id: Option<Uuid>,
}

impl TryFrom<OrderItemRow> for OrderItem {
  type Error = StoreError;

  fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
    let fulfillment_status = row
      .fulfillment_status
      .parse::<FulfillmentStatus>()
      .map_err(|e| corrupt_column("order_items", "fulfillment_status", e))?;
    Ok(OrderItem {
      id: row.id,
      order_id: row.order_id,
      buyer_id: row.buyer_id,
      seller_id: row.seller_id,
      category: row.category,
      unit_price: row.unit_price,
      quantity: row.quantity,
      grand_total: row.grand_total,
      fulfillment_status,
      seller_paid: row.seller_paid,
      payout_id: row.payout_id,
    })
  }
}
