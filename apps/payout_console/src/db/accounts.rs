// apps/payout_console/src/db/accounts.rs

use super::{store_error, PgStore};
use crate::models::ConnectedAccountRow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use payout_engine::{AccountStatus, AccountStore, ConnectedAccount, StoreError};
use uuid::Uuid;

const ACCOUNT_COLUMNS: &str = "seller_id, external_account_id, status, status_observed_at, created_at";

#[async_trait]
impl AccountStore for PgStore {
  async fn get_account_by_seller(&self, seller_id: Uuid) -> Result<Option<ConnectedAccount>, StoreError> {
    let row: Option<ConnectedAccountRow> = sqlx::query_as(&format!(
      "SELECT {} FROM connected_accounts WHERE seller_id = $1",
      ACCOUNT_COLUMNS
    ))
    .bind(seller_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(|e| store_error("load connected account", e))?;
    row.map(ConnectedAccount::try_from).transpose()
  }

  async fn get_account_by_external_id(&self, account_id: &str) -> Result<Option<ConnectedAccount>, StoreError> {
    let row: Option<ConnectedAccountRow> = sqlx::query_as(&format!(
      "SELECT {} FROM connected_accounts WHERE external_account_id = $1",
      ACCOUNT_COLUMNS
    ))
    .bind(account_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(|e| store_error("load connected account", e))?;
    row.map(ConnectedAccount::try_from).transpose()
  }

  async fn insert_account(&self, account: ConnectedAccount) -> Result<ConnectedAccount, StoreError> {
    let row: ConnectedAccountRow = sqlx::query_as(&format!(
      "INSERT INTO connected_accounts ({cols}) VALUES ($1, $2, $3, $4, $5) RETURNING {cols}",
      cols = ACCOUNT_COLUMNS
    ))
    .bind(account.seller_id)
    .bind(&account.external_account_id)
    .bind(account.status.as_str())
    .bind(account.status_observed_at)
    .bind(account.created_at)
    .fetch_one(&self.pool)
    .await
    .map_err(|e| store_error("insert connected account", e))?;
    row.try_into()
  }

  async fn update_account_status(
    &self,
    account_id: &str,
    status: AccountStatus,
    observed_at: DateTime<Utc>,
  ) -> Result<bool, StoreError> {
    // Last write wins by observation time, not by arrival order.
    let result = sqlx::query(
      "UPDATE connected_accounts SET status = $2, status_observed_at = $3 \
       WHERE external_account_id = $1 AND status_observed_at <= $3",
    )
    .bind(account_id)
    .bind(status.as_str())
    .bind(observed_at)
    .execute(&self.pool)
    .await
    .map_err(|e| store_error("update connected account status", e))?;
    if result.rows_affected() == 1 {
      return Ok(true);
    }

    match self.get_account_by_external_id(account_id).await? {
      Some(_) => Ok(false),
      None => Err(StoreError::NotFound(format!("connected account {}", account_id))),
    }
  }
}
