// apps/payout_console/src/models/connected_account.rs

use super::corrupt_column;
use chrono::{DateTime, Utc};
use payout_engine::{AccountStatus, ConnectedAccount, StoreError};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ConnectedAccountRow {
  pub seller_id: Uuid,
  pub external_account_id: String,
  pub status: String,
  pub status_observed_at: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
}

impl TryFrom<ConnectedAccountRow> for ConnectedAccount {
  type Error = StoreError;

  fn try_from(row: ConnectedAccountRow) -> Result<Self, Self::Error> {
    let status = row
      .status
      .parse::<AccountStatus>()
      .map_err(|e| corrupt_column("connected_accounts", "status", e))?;
    Ok(ConnectedAccount {
      seller_id: row.seller_id,
      external_account_id: row.external_account_id,
      status,
      status_observed_at: row.status_observed_at,
      created_at: row.created_at,
    })
  }
}
