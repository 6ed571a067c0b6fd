// apps/payout_console/src/db/mod.rs

//! Postgres implementations of the engine's storage ports.
//!
//! All queries are runtime-checked (`sqlx::query_as` with `FromRow` rows).
//! Idempotency guards live in the schema: the partial unique index on
//! `payouts(order_item_id)` and conditional `UPDATE`s.

mod accounts;
mod orders;
mod payouts;
mod rates;

use payout_engine::StoreError;
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

/// Unique violations become `Conflict`; everything else is a backend failure.
pub(crate) fn store_error(context: &str, err: sqlx::Error) -> StoreError {
  if let sqlx::Error::Database(db_err) = &err {
    if db_err.is_unique_violation() {
      return StoreError::Conflict(format!("{}: {}", context, db_err.message()));
    }
  }
  if matches!(err, sqlx::Error::RowNotFound) {
    return StoreError::NotFound(context.to_string());
  }
  tracing::error!(error = %err, context, "Database operation failed.");
  StoreError::Backend(anyhow::Error::new(err).context(context.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_rows_map_to_not_found() {
    assert!(matches!(
      store_error("load payout", sqlx::Error::RowNotFound),
      StoreError::NotFound(_)
    ));
  }

  #[test]
  fn pool_failures_are_backend_errors() {
    assert!(matches!(
      store_error("load payout", sqlx::Error::PoolTimedOut),
      StoreError::Backend(_)
    ));
  }
}
