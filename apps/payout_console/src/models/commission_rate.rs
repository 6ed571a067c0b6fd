// apps/payout_console/src/models/commission_rate.rs

use chrono::{DateTime, Utc};
use payout_engine::CommissionRate;
use rust_decimal::Decimal;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct CommissionRateRow {
  pub category: String,
  pub rate_percent: Decimal,
  pub updated_at: DateTime<Utc>,
}

impl From<CommissionRateRow> for CommissionRate {
  fn from(row: CommissionRateRow) -> Self {
    CommissionRate {
      category: row.category,
      rate_percent: row.rate_percent,
      updated_at: row.updated_at,
    }
  }
}
