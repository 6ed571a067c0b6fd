// payout_engine/src/store/memory.rs

//! A process-local store implementing every persistence port.
//!
//! All state sits behind one mutex so each guarded write (the unique active
//! payout per order item, the conditional `seller_paid` flip, the
//! last-write-wins account status) is checked and applied atomically.

use crate::account::{AccountStatus, ConnectedAccount};
use crate::error::StoreError;
use crate::ledger::PayoutFilter;
use crate::model::{CommissionRate, OrderItem, Payout, PayoutStatus};
use crate::ports::{AccountStore, CommissionRateSource, OrderItemStore, PayoutStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
  order_items: HashMap<Uuid, OrderItem>,
  rates: HashMap<String, CommissionRate>,
  accounts: HashMap<Uuid, ConnectedAccount>,
  payouts: Vec<Payout>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
  state: Mutex<MemoryState>,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds or replaces an order item.
  pub fn put_order_item(&self, item: OrderItem) {
    self.state.lock().order_items.insert(item.id, item);
  }

  pub fn put_commission_rate(&self, rate: CommissionRate) {
    self.state.lock().rates.insert(rate.category.clone(), rate);
  }

  /// Adds or replaces an account, bypassing the status ordering rule.
  pub fn put_account(&self, account: ConnectedAccount) {
    self.state.lock().accounts.insert(account.seller_id, account);
  }

  pub fn payout_count(&self) -> usize {
    self.state.lock().payouts.len()
  }

  pub fn order_item(&self, id: Uuid) -> Option<OrderItem> {
    self.state.lock().order_items.get(&id).cloned()
  }
}

#[async_trait]
impl OrderItemStore for InMemoryStore {
  async fn get_order_item(&self, id: Uuid) -> Result<Option<OrderItem>, StoreError> {
    Ok(self.order_item(id))
  }

  async fn mark_order_item_paid(&self, id: Uuid, payout_id: Uuid) -> Result<bool, StoreError> {
    let mut state = self.state.lock();
    let item = state
      .order_items
      .get_mut(&id)
      .ok_or_else(|| StoreError::NotFound(format!("order item {}", id)))?;
    if item.seller_paid {
      return Ok(false);
    }
    item.seller_paid = true;
    item.payout_id = Some(payout_id);
    Ok(true)
  }
}

#[async_trait]
impl CommissionRateSource for InMemoryStore {
  async fn commission_rates(&self) -> Result<Vec<CommissionRate>, StoreError> {
    let mut rates: Vec<CommissionRate> = self.state.lock().rates.values().cloned().collect();
    rates.sort_by(|a, b| a.category.cmp(&b.category));
    Ok(rates)
  }

  async fn upsert_commission_rate(&self, rate: CommissionRate) -> Result<CommissionRate, StoreError> {
    self.state.lock().rates.insert(rate.category.clone(), rate.clone());
    Ok(rate)
  }
}

#[async_trait]
impl AccountStore for InMemoryStore {
  async fn get_account_by_seller(&self, seller_id: Uuid) -> Result<Option<ConnectedAccount>, StoreError> {
    Ok(self.state.lock().accounts.get(&seller_id).cloned())
  }

  async fn get_account_by_external_id(&self, account_id: &str) -> Result<Option<ConnectedAccount>, StoreError> {
    Ok(
      self
        .state
        .lock()
        .accounts
        .values()
        .find(|a| a.external_account_id == account_id)
        .cloned(),
    )
  }

  async fn insert_account(&self, account: ConnectedAccount) -> Result<ConnectedAccount, StoreError> {
    let mut state = self.state.lock();
    if state.accounts.contains_key(&account.seller_id) {
      return Err(StoreError::Conflict(format!(
        "seller {} already has a connected account",
        account.seller_id
      )));
    }
    state.accounts.insert(account.seller_id, account.clone());
    Ok(account)
  }

  async fn update_account_status(
    &self,
    account_id: &str,
    status: AccountStatus,
    observed_at: DateTime<Utc>,
  ) -> Result<bool, StoreError> {
    let mut state = self.state.lock();
    let account = state
      .accounts
      .values_mut()
      .find(|a| a.external_account_id == account_id)
      .ok_or_else(|| StoreError::NotFound(format!("connected account {}", account_id)))?;
    if observed_at < account.status_observed_at {
      return Ok(false);
    }
    account.status = status;
    account.status_observed_at = observed_at;
    Ok(true)
  }
}

#[async_trait]
impl PayoutStore for InMemoryStore {
  async fn insert_payout(&self, payout: Payout) -> Result<Payout, StoreError> {
    let mut state = self.state.lock();
    if !payout.status.is_failed()
      && state
        .payouts
        .iter()
        .any(|p| p.order_item_id == payout.order_item_id && !p.status.is_failed())
    {
      return Err(StoreError::Conflict(format!(
        "order item {} already has an active payout",
        payout.order_item_id
      )));
    }
    state.payouts.push(payout.clone());
    Ok(payout)
  }

  async fn get_payout(&self, id: Uuid) -> Result<Option<Payout>, StoreError> {
    Ok(self.state.lock().payouts.iter().find(|p| p.id == id).cloned())
  }

  async fn find_active_payout_for_item(&self, order_item_id: Uuid) -> Result<Option<Payout>, StoreError> {
    Ok(
      self
        .state
        .lock()
        .payouts
        .iter()
        .find(|p| p.order_item_id == order_item_id && !p.status.is_failed())
        .cloned(),
    )
  }

  async fn get_payout_by_transfer(&self, transfer_id: &str) -> Result<Option<Payout>, StoreError> {
    Ok(
      self
        .state
        .lock()
        .payouts
        .iter()
        .filter(|p| p.transfer_id.as_deref() == Some(transfer_id))
        // Live row first, then the newest.
        .min_by_key(|p| (p.status.is_failed(), Reverse(p.created_at)))
        .cloned(),
    )
  }

  async fn list_payouts(&self, filter: &PayoutFilter) -> Result<Vec<Payout>, StoreError> {
    let mut matching: Vec<Payout> = self
      .state
      .lock()
      .payouts
      .iter()
      .filter(|p| filter.matches(p))
      .cloned()
      .collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    let limit = filter.limit.map_or(usize::MAX, |l| l as usize);
    Ok(matching.into_iter().skip(filter.offset as usize).take(limit).collect())
  }

  async fn update_payout_status(
    &self,
    id: Uuid,
    status: PayoutStatus,
    at: DateTime<Utc>,
  ) -> Result<Option<Payout>, StoreError> {
    let mut state = self.state.lock();
    let Some(payout) = state.payouts.iter_mut().find(|p| p.id == id) else {
      return Ok(None);
    };
    if !payout.status.can_transition_to(status) {
      return Err(StoreError::Conflict(format!(
        "payout {} cannot move from {} to {}",
        id, payout.status, status
      )));
    }
    payout.status = status;
    payout.status_updated_at = at;
    Ok(Some(payout.clone()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal::Decimal;

  fn payout(order_item_id: Uuid, status: PayoutStatus) -> Payout {
    let now = Utc::now();
    Payout {
      id: Uuid::new_v4(),
      order_item_id,
      seller_id: Uuid::new_v4(),
      amount: Decimal::TEN,
      fee_amount: Decimal::ZERO,
      net_amount: Decimal::TEN,
      commission_amount: Decimal::ZERO,
      commission_rate: Decimal::ZERO,
      currency: "USD".into(),
      status,
      transfer_id: None,
      description: String::new(),
      created_at: now,
      status_updated_at: now,
    }
  }

  #[tokio::test]
  async fn one_active_payout_per_item_but_failed_attempts_stack() {
    let store = InMemoryStore::new();
    let item = Uuid::new_v4();

    store.insert_payout(payout(item, PayoutStatus::Failed)).await.unwrap();
    store.insert_payout(payout(item, PayoutStatus::Failed)).await.unwrap();
    store.insert_payout(payout(item, PayoutStatus::Pending)).await.unwrap();
    let second = store.insert_payout(payout(item, PayoutStatus::Paid)).await;

    assert!(matches!(second, Err(StoreError::Conflict(_))));
    assert_eq!(store.payout_count(), 3);
    assert_eq!(
      store.find_active_payout_for_item(item).await.unwrap().map(|p| p.status),
      Some(PayoutStatus::Pending)
    );
  }

  #[tokio::test]
  async fn settled_payouts_do_not_change_status() {
    let store = InMemoryStore::new();
    let paid = store
      .insert_payout(payout(Uuid::new_v4(), PayoutStatus::Paid))
      .await
      .unwrap();
    let result = store.update_payout_status(paid.id, PayoutStatus::Failed, Utc::now()).await;
    assert!(matches!(result, Err(StoreError::Conflict(_))));
  }

  #[tokio::test]
  async fn transfer_lookup_prefers_the_live_payout() {
    let store = InMemoryStore::new();
    let item = Uuid::new_v4();
    let mut failed = payout(item, PayoutStatus::Failed);
    failed.transfer_id = Some("tr_shared".into());
    let mut live = payout(item, PayoutStatus::Paid);
    live.transfer_id = Some("tr_shared".into());
    store.insert_payout(failed).await.unwrap();
    let live = store.insert_payout(live).await.unwrap();

    let found = store.get_payout_by_transfer("tr_shared").await.unwrap().unwrap();
    assert_eq!(found.id, live.id);
    assert!(store.get_payout_by_transfer("tr_other").await.unwrap().is_none());
  }
}
