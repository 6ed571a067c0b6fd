// apps/payout_console/src/models/mod.rs

//! Database row shapes. Each row converts into the engine's record type;
//! status columns are stored as text and parsed on the way out.

pub mod commission_rate;
pub mod connected_account;
pub mod order_item;
pub mod payout;

pub use commission_rate::CommissionRateRow;
pub use connected_account::ConnectedAccountRow;
pub use order_item::OrderItemRow;
pub use payout::PayoutRow;

use payout_engine::StoreError;

/// A stored status string the engine does not recognise.
pub(crate) fn corrupt_column(table: &str, column: &str, err: impl std::fmt::Display) -> StoreError {
  StoreError::Backend(anyhow::anyhow!("{}.{} holds an unreadable value: {}", table, column, err))
}
