// apps/payout_console/src/services/processor_mock.rs

//! In-process stand-in for the payment processor.
//!
//! Accounts start `pending` and become `ready` once an onboarding link has
//! been issued for them (the simulated seller always finishes onboarding).
//! Transfers are idempotent by key and always settle immediately.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use payout_engine::{AccountStatus, PaymentProcessor, PayoutStatus, ProcessorError, TransferReceipt, TransferRequest};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Default)]
struct SimulatedState {
  accounts: HashMap<String, AccountStatus>,
  transfers: Vec<TransferReceipt>,
}

#[derive(Debug)]
pub struct SimulatedProcessor {
  latency: Duration,
  onboarding_base_url: String,
  state: Mutex<SimulatedState>,
}

impl SimulatedProcessor {
  pub fn new(latency: Duration, onboarding_base_url: impl Into<String>) -> Self {
    Self {
      latency,
      onboarding_base_url: onboarding_base_url.into(),
      state: Mutex::new(SimulatedState::default()),
    }
  }

  async fn network(&self) {
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }
  }
}

/// Amounts whose cents end in `123` modulo 1000 (`1.23`, `11.23`, `21.23`...)
/// are refused, so operators can exercise the failure path.
fn is_refused(amount: Decimal) -> bool {
  let cents = (amount * Decimal::ONE_HUNDRED).trunc();
  cents % Decimal::from(1000) == Decimal::from(123)
}

#[async_trait]
impl PaymentProcessor for SimulatedProcessor {
  #[instrument(name = "SimulatedProcessor::create_connected_account", skip(self))]
  async fn create_connected_account(&self, seller_id: Uuid) -> Result<String, ProcessorError> {
    self.network().await;
    let account_id = format!("acct_sim_{}", seller_id.simple());
    self
      .state
      .lock()
      .await
      .accounts
      .entry(account_id.clone())
      .or_insert(AccountStatus::Pending);
    info!(%account_id, "Simulated connected account created.");
    Ok(account_id)
  }

  async fn account_status(&self, account_id: &str) -> Result<AccountStatus, ProcessorError> {
    self.network().await;
    self
      .state
      .lock()
      .await
      .accounts
      .get(account_id)
      .copied()
      .ok_or_else(|| ProcessorError::Rejected(format!("no such account: {}", account_id)))
  }

  #[instrument(name = "SimulatedProcessor::create_onboarding_link", skip(self))]
  async fn create_onboarding_link(&self, account_id: &str) -> Result<String, ProcessorError> {
    self.network().await;
    let mut state = self.state.lock().await;
    let status = state
      .accounts
      .get_mut(account_id)
      .ok_or_else(|| ProcessorError::Rejected(format!("no such account: {}", account_id)))?;
    if *status == AccountStatus::Pending {
      *status = AccountStatus::Ready;
    }
    Ok(format!(
      "{}/{}?token={}",
      self.onboarding_base_url.trim_end_matches('/'),
      account_id,
      Uuid::new_v4().simple()
    ))
  }

  #[instrument(
    name = "SimulatedProcessor::transfer",
    skip(self, request),
    fields(account_id = %request.account_id, amount = %request.amount, idempotency_key = %request.idempotency_key)
  )]
  async fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt, ProcessorError> {
    if request.amount <= Decimal::ZERO {
      return Err(ProcessorError::Rejected("amount must be greater than zero".to_string()));
    }
    self.network().await;

    let mut state = self.state.lock().await;
    if let Some(existing) = state
      .transfers
      .iter()
      .find(|t| t.idempotency_key == request.idempotency_key)
    {
      info!(transfer_id = %existing.transfer_id, "Replayed transfer for existing idempotency key.");
      return Ok(existing.clone());
    }
    match state.accounts.get(&request.account_id) {
      Some(AccountStatus::Ready) => {}
      Some(other) => {
        return Err(ProcessorError::Rejected(format!(
          "account {} cannot receive transfers (status: {})",
          request.account_id, other
        )))
      }
      None => return Err(ProcessorError::Rejected(format!("no such account: {}", request.account_id))),
    }
    if is_refused(request.amount) {
      info!("Simulated processor refused the transfer.");
      return Err(ProcessorError::Rejected("transfer declined by simulated processor".to_string()));
    }

    let receipt = TransferReceipt {
      transfer_id: format!("tr_sim_{}", Uuid::new_v4().simple()),
      account_id: request.account_id,
      amount: request.amount,
      currency: request.currency,
      status: PayoutStatus::Paid,
      idempotency_key: request.idempotency_key,
      created_at: Utc::now(),
    };
    state.transfers.push(receipt.clone());
    info!(transfer_id = %receipt.transfer_id, "Simulated transfer settled.");
    Ok(receipt)
  }

  async fn list_transfers(&self, since: DateTime<Utc>) -> Result<Vec<TransferReceipt>, ProcessorError> {
    self.network().await;
    Ok(
      self
        .state
        .lock()
        .await
        .transfers
        .iter()
        .filter(|t| t.created_at >= since)
        .cloned()
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn processor() -> SimulatedProcessor {
    SimulatedProcessor::new(Duration::ZERO, "http://localhost:8080/onboarding/")
  }

  fn request(account_id: &str, amount: Decimal, key: &str) -> TransferRequest {
    TransferRequest {
      account_id: account_id.to_string(),
      amount,
      currency: "USD".to_string(),
      idempotency_key: key.to_string(),
      description: "test".to_string(),
    }
  }

  #[tokio::test]
  async fn onboarding_link_readies_the_account() {
    let processor = processor();
    let account_id = processor.create_connected_account(Uuid::new_v4()).await.unwrap();
    assert_eq!(processor.account_status(&account_id).await.unwrap(), AccountStatus::Pending);

    let link = processor.create_onboarding_link(&account_id).await.unwrap();
    assert!(link.starts_with(&format!("http://localhost:8080/onboarding/{}?token=", account_id)));
    assert_eq!(processor.account_status(&account_id).await.unwrap(), AccountStatus::Ready);
  }

  #[tokio::test]
  async fn transfers_are_idempotent_by_key() {
    let processor = processor();
    let account_id = processor.create_connected_account(Uuid::new_v4()).await.unwrap();
    processor.create_onboarding_link(&account_id).await.unwrap();

    let first = processor
      .transfer(request(&account_id, Decimal::new(17_930, 2), "item-1"))
      .await
      .unwrap();
    let second = processor
      .transfer(request(&account_id, Decimal::new(17_930, 2), "item-1"))
      .await
      .unwrap();
    assert_eq!(first.transfer_id, second.transfer_id);
    assert_eq!(processor.list_transfers(first.created_at).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn refuses_pending_accounts_and_test_amounts() {
    let processor = processor();
    let account_id = processor.create_connected_account(Uuid::new_v4()).await.unwrap();
    let pending = processor
      .transfer(request(&account_id, Decimal::TEN, "item-2"))
      .await
      .unwrap_err();
    assert!(matches!(pending, ProcessorError::Rejected(_)));

    processor.create_onboarding_link(&account_id).await.unwrap();
    let refused = processor
      .transfer(request(&account_id, Decimal::new(1_123, 2), "item-3"))
      .await
      .unwrap_err();
    assert!(matches!(refused, ProcessorError::Rejected(_)));
  }
}
