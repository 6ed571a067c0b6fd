// payout_engine/src/ports.rs

//! Boundary contracts the settlement core consumes: the payment processor,
//! the order subsystem, commission configuration, and the stores this core
//! owns (connected accounts and payouts).

use crate::account::{AccountStatus, ConnectedAccount};
use crate::config::SettlementConfig;
use crate::error::{ProcessorError, StoreError};
use crate::ledger::PayoutFilter;
use crate::model::{CommissionRate, OrderItem, Payout, PayoutStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A request to move money to a seller's connected account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
  pub account_id: String,
  pub amount: Decimal,
  pub currency: String,
  /// Repeating a request with the same key must not move money twice.
  pub idempotency_key: String,
  pub description: String,
}

/// What the processor reports for an accepted transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
  pub transfer_id: String,
  pub account_id: String,
  pub amount: Decimal,
  pub currency: String,
  /// `Pending` or `Paid`; a `Failed` receipt is treated as a rejection.
  pub status: PayoutStatus,
  pub idempotency_key: String,
  pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
  /// Creates the seller's account with the processor and returns its opaque id.
  async fn create_connected_account(&self, seller_id: Uuid) -> Result<String, ProcessorError>;

  async fn account_status(&self, account_id: &str) -> Result<AccountStatus, ProcessorError>;

  async fn create_onboarding_link(&self, account_id: &str) -> Result<String, ProcessorError>;

  async fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt, ProcessorError>;

  /// Transfers created at or after `since`, oldest first.
  async fn list_transfers(&self, since: DateTime<Utc>) -> Result<Vec<TransferReceipt>, ProcessorError>;
}

/// Read access to order items plus the single write this core performs.
#[async_trait]
pub trait OrderItemStore: Send + Sync {
  async fn get_order_item(&self, id: Uuid) -> Result<Option<OrderItem>, StoreError>;

  /// Sets `seller_paid = true` and the payout reference, only if the item is
  /// still unpaid. Returns `false` when the item was already marked.
  async fn mark_order_item_paid(&self, id: Uuid, payout_id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait CommissionRateSource: Send + Sync {
  async fn commission_rates(&self) -> Result<Vec<CommissionRate>, StoreError>;

  async fn upsert_commission_rate(&self, rate: CommissionRate) -> Result<CommissionRate, StoreError>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
  async fn get_account_by_seller(&self, seller_id: Uuid) -> Result<Option<ConnectedAccount>, StoreError>;

  async fn get_account_by_external_id(&self, account_id: &str) -> Result<Option<ConnectedAccount>, StoreError>;

  /// Fails with `StoreError::Conflict` if the seller already has an account.
  async fn insert_account(&self, account: ConnectedAccount) -> Result<ConnectedAccount, StoreError>;

  /// Writes `status` only if `observed_at` is not older than the stored
  /// observation. Returns whether the write happened.
  async fn update_account_status(
    &self,
    account_id: &str,
    status: AccountStatus,
    observed_at: DateTime<Utc>,
  ) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait PayoutStore: Send + Sync {
  /// Fails with `StoreError::Conflict` when a non-failed payout already exists
  /// for the same order item and the new record is not `Failed`.
  async fn insert_payout(&self, payout: Payout) -> Result<Payout, StoreError>;

  async fn get_payout(&self, id: Uuid) -> Result<Option<Payout>, StoreError>;

  /// The single non-failed payout for an order item, if any.
  async fn find_active_payout_for_item(&self, order_item_id: Uuid) -> Result<Option<Payout>, StoreError>;

  async fn get_payout_by_transfer(&self, transfer_id: &str) -> Result<Option<Payout>, StoreError>;

  /// Newest first.
  async fn list_payouts(&self, filter: &PayoutFilter) -> Result<Vec<Payout>, StoreError>;

  async fn update_payout_status(
    &self,
    id: Uuid,
    status: PayoutStatus,
    at: DateTime<Utc>,
  ) -> Result<Option<Payout>, StoreError>;
}

/// Everything the settlement services need, shared behind `Arc`s.
#[derive(Clone)]
pub struct PayoutServices {
  pub orders: Arc<dyn OrderItemStore>,
  pub rates: Arc<dyn CommissionRateSource>,
  pub accounts: Arc<dyn AccountStore>,
  pub payouts: Arc<dyn PayoutStore>,
  pub processor: Arc<dyn PaymentProcessor>,
  pub config: Arc<SettlementConfig>,
}

impl std::fmt::Debug for PayoutServices {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PayoutServices").field("config", &self.config).finish_non_exhaustive()
  }
}
