// apps/payout_console/src/db/payouts.rs

use super::{store_error, PgStore};
use crate::models::payout::PAYOUT_COLUMNS;
use crate::models::PayoutRow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use payout_engine::{Payout, PayoutFilter, PayoutStatus, PayoutStore, StoreError};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

#[async_trait]
impl PayoutStore for PgStore {
  async fn insert_payout(&self, payout: Payout) -> Result<Payout, StoreError> {
    // A second non-failed row for the item trips `payouts_one_active_per_item`.
    let row: PayoutRow = sqlx::query_as(&format!(
      "INSERT INTO payouts ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
       RETURNING {cols}",
      cols = PAYOUT_COLUMNS
    ))
    .bind(payout.id)
    .bind(payout.order_item_id)
    .bind(payout.seller_id)
    .bind(payout.amount)
    .bind(payout.fee_amount)
    .bind(payout.net_amount)
    .bind(payout.commission_amount)
    .bind(payout.commission_rate)
    .bind(&payout.currency)
    .bind(payout.status.as_str())
    .bind(&payout.transfer_id)
    .bind(&payout.description)
    .bind(payout.created_at)
    .bind(payout.status_updated_at)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| store_error("insert payout", e))?;
    row.try_into()
  }

  async fn get_payout(&self, id: Uuid) -> Result<Option<Payout>, StoreError> {
    let row: Option<PayoutRow> = sqlx::query_as(&format!("SELECT {} FROM payouts WHERE id = $1", PAYOUT_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| store_error("load payout", e))?;
    row.map(Payout::try_from).transpose()
  }

  async fn find_active_payout_for_item(&self, order_item_id: Uuid) -> Result<Option<Payout>, StoreError> {
    let row: Option<PayoutRow> = sqlx::query_as(&format!(
      "SELECT {} FROM payouts WHERE order_item_id = $1 AND status <> 'failed'",
      PAYOUT_COLUMNS
    ))
    .bind(order_item_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(|e| store_error("load active payout", e))?;
    row.map(Payout::try_from).transpose()
  }

  async fn get_payout_by_transfer(&self, transfer_id: &str) -> Result<Option<Payout>, StoreError> {
    // A refused transfer can leave a failed audit row with the same id; prefer the live one.
    let row: Option<PayoutRow> = sqlx::query_as(&format!(
      "SELECT {} FROM payouts WHERE transfer_id = $1 ORDER BY (status = 'failed') ASC, created_at DESC LIMIT 1",
      PAYOUT_COLUMNS
    ))
    .bind(transfer_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(|e| store_error("load payout by transfer", e))?;
    row.map(Payout::try_from).transpose()
  }

  async fn list_payouts(&self, filter: &PayoutFilter) -> Result<Vec<Payout>, StoreError> {
    let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM payouts WHERE TRUE", PAYOUT_COLUMNS));
    if let Some(seller_id) = filter.seller_id {
      query.push(" AND seller_id = ").push_bind(seller_id);
    }
    if let Some(status) = filter.status {
      query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(order_item_id) = filter.order_item_id {
      query.push(" AND order_item_id = ").push_bind(order_item_id);
    }
    if let Some(from) = filter.created_from {
      query.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.created_to {
      query.push(" AND created_at < ").push_bind(to);
    }
    query.push(" ORDER BY created_at DESC, id DESC");
    if let Some(limit) = filter.limit {
      query.push(" LIMIT ").push_bind(i64::from(limit));
    }
    query.push(" OFFSET ").push_bind(i64::from(filter.offset));

    let rows: Vec<PayoutRow> = query
      .build_query_as()
      .fetch_all(&self.pool)
      .await
      .map_err(|e| store_error("list payouts", e))?;
    rows.into_iter().map(Payout::try_from).collect()
  }

  async fn update_payout_status(
    &self,
    id: Uuid,
    status: PayoutStatus,
    at: DateTime<Utc>,
  ) -> Result<Option<Payout>, StoreError> {
    let updated: Option<PayoutRow> = if PayoutStatus::Pending.can_transition_to(status) {
      sqlx::query_as(&format!(
        "UPDATE payouts SET status = $2, status_updated_at = $3 WHERE id = $1 AND status = 'pending' RETURNING {}",
        PAYOUT_COLUMNS
      ))
      .bind(id)
      .bind(status.as_str())
      .bind(at)
      .fetch_optional(&self.pool)
      .await
      .map_err(|e| store_error("update payout status", e))?
    } else {
      None
    };

    if let Some(row) = updated {
      return Ok(Some(row.try_into()?));
    }
    match self.get_payout(id).await? {
      None => Ok(None),
      Some(current) => Err(StoreError::Conflict(format!(
        "payout {} cannot move from {} to {}",
        id, current.status, status
      ))),
    }
  }
}
