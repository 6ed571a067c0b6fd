// apps/payout_console/src/db/rates.rs

use super::{store_error, PgStore};
use crate::models::CommissionRateRow;
use async_trait::async_trait;
use payout_engine::{CommissionRate, CommissionRateSource, StoreError};

#[async_trait]
impl CommissionRateSource for PgStore {
  async fn commission_rates(&self) -> Result<Vec<CommissionRate>, StoreError> {
    let rows: Vec<CommissionRateRow> =
      sqlx::query_as("SELECT category, rate_percent, updated_at FROM commission_rates ORDER BY category ASC")
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_error("load commission rates", e))?;
    Ok(rows.into_iter().map(CommissionRate::from).collect())
  }

  async fn upsert_commission_rate(&self, rate: CommissionRate) -> Result<CommissionRate, StoreError> {
    let row: CommissionRateRow = sqlx::query_as(
      "INSERT INTO commission_rates (category, rate_percent, updated_at) VALUES ($1, $2, $3) \
       ON CONFLICT (category) DO UPDATE SET rate_percent = EXCLUDED.rate_percent, updated_at = EXCLUDED.updated_at \
       RETURNING category, rate_percent, updated_at",
    )
    .bind(&rate.category)
    .bind(rate.rate_percent)
    .bind(rate.updated_at)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| store_error("upsert commission rate", e))?;
    Ok(row.into())
  }
}
