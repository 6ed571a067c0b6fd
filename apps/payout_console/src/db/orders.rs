// apps/payout_console/src/db/orders.rs

use super::{store_error, PgStore};
use crate::models::OrderItemRow;
use async_trait::async_trait;
use payout_engine::{OrderItem, OrderItemStore, StoreError};
use uuid::Uuid;

const ORDER_ITEM_COLUMNS: &str = "id, order_id, buyer_id, seller_id, category, unit_price, quantity, grand_total, \
   fulfillment_status, seller_paid, payout_id";

#[async_trait]
impl OrderItemStore for PgStore {
  async fn get_order_item(&self, id: Uuid) -> Result<Option<OrderItem>, StoreError> {
    let row: Option<OrderItemRow> = sqlx::query_as(&format!(
      "SELECT {} FROM order_items WHERE id = $1",
      ORDER_ITEM_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&self.pool)
    .await
    .map_err(|e| store_error("load order item", e))?;
    row.map(OrderItem::try_from).transpose()
  }

  async fn mark_order_item_paid(&self, id: Uuid, payout_id: Uuid) -> Result<bool, StoreError> {
    let result = sqlx::query(
      "UPDATE order_items SET seller_paid = TRUE, payout_id = $2 WHERE id = $1 AND seller_paid = FALSE",
    )
    .bind(id)
    .bind(payout_id)
    .execute(&self.pool)
    .await
    .map_err(|e| store_error("mark order item paid", e))?;
    if result.rows_affected() == 1 {
      return Ok(true);
    }

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM order_items WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| store_error("load order item", e))?;
    match exists {
      Some(_) => Ok(false),
      None => Err(StoreError::NotFound(format!("order item {}", id))),
    }
  }
}
