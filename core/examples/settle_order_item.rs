// payout_engine/examples/settle_order_item.rs

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use payout_engine::store::InMemoryStore;
use payout_engine::{
  AccountLifecycle, AccountStatus, CommissionRate, DateRange, FulfillmentStatus, OrderItem, PaymentProcessor,
  PayoutError, PayoutLedger, PayoutOrchestrator, PayoutServices, PayoutStatus, ProcessorError, SettlementConfig,
  TransferReceipt, TransferRequest,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

// 1. A processor stand-in. Accounts become ready as soon as they are queried.
#[derive(Default)]
struct DemoProcessor {
  transfers: Mutex<Vec<TransferReceipt>>,
}

#[async_trait]
impl PaymentProcessor for DemoProcessor {
  async fn create_connected_account(&self, seller_id: Uuid) -> Result<String, ProcessorError> {
    Ok(format!("acct_demo_{}", seller_id.simple()))
  }

  async fn account_status(&self, _account_id: &str) -> Result<AccountStatus, ProcessorError> {
    Ok(AccountStatus::Ready)
  }

  async fn create_onboarding_link(&self, account_id: &str) -> Result<String, ProcessorError> {
    Ok(format!("https://processor.example/onboarding/{}", account_id))
  }

  async fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt, ProcessorError> {
    let mut transfers = self.transfers.lock();
    if let Some(existing) = transfers.iter().find(|t| t.idempotency_key == request.idempotency_key) {
      return Ok(existing.clone());
    }
    let receipt = TransferReceipt {
      transfer_id: format!("tr_demo_{}", transfers.len() + 1),
      account_id: request.account_id,
      amount: request.amount,
      currency: request.currency,
      status: PayoutStatus::Paid,
      idempotency_key: request.idempotency_key,
      created_at: Utc::now(),
    };
    transfers.push(receipt.clone());
    Ok(receipt)
  }

  async fn list_transfers(&self, since: DateTime<Utc>) -> Result<Vec<TransferReceipt>, ProcessorError> {
    Ok(self.transfers.lock().iter().filter(|t| t.created_at >= since).cloned().collect())
  }
}

#[tokio::main]
async fn main() -> Result<(), PayoutError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Settle Order Item Example ---");

  // 2. Wire the services over the in-memory store.
  let store = Arc::new(InMemoryStore::new());
  let services = PayoutServices {
    orders: store.clone(),
    rates: store.clone(),
    accounts: store.clone(),
    payouts: store.clone(),
    processor: Arc::new(DemoProcessor::default()),
    config: Arc::new(SettlementConfig::default()),
  };

  // 3. Seed a commission rate and a shipped order item.
  store.put_commission_rate(CommissionRate::new("Core Drill Bits", Decimal::TEN, Utc::now())?);
  let seller_id = Uuid::new_v4();
  let item = OrderItem {
    id: Uuid::new_v4(),
    order_id: Uuid::new_v4(),
    buyer_id: Uuid::new_v4(),
    seller_id,
    category: "Core Drill Bits".to_string(),
    unit_price: Decimal::new(10_000, 2),
    quantity: 2,
    grand_total: Decimal::new(20_000, 2),
    fulfillment_status: FulfillmentStatus::Shipped,
    seller_paid: false,
    payout_id: None,
  };
  store.put_order_item(item.clone());

  // 4. Onboard the seller.
  let accounts = AccountLifecycle::new(services.clone());
  accounts.ensure_account(seller_id).await?;
  let account = accounts.refresh_status(seller_id).await?;
  info!(status = %account.status, "Seller account refreshed.");

  // 5. Preview, then settle. The second request is rejected as already paid.
  let orchestrator = PayoutOrchestrator::new(services.clone())?;
  let preview = orchestrator.preview_settlement(item.id).await?;
  info!(
    item_total = %preview.item_total,
    commission = %preview.commission_amount,
    fee = %preview.processor_fee,
    net = %preview.net_payout,
    "Settlement preview."
  );

  let payout = orchestrator.request_payout(item.id).await?;
  info!(payout_id = %payout.id, net = %payout.net_amount, transfer_id = ?payout.transfer_id, "Payout settled.");

  match orchestrator.request_payout(item.id).await {
    Err(PayoutError::AlreadyPaid { .. }) => info!("Second request correctly reported as already paid."),
    other => info!(?other, "Unexpected outcome for the second request."),
  }

  // 6. Stats for the last day.
  let now = Utc::now();
  let stats = PayoutLedger::new(services)
    .payout_stats(DateRange::new(now - Duration::days(1), now + Duration::minutes(1))?, None)
    .await?;
  info!(total = %stats.total_amount, count = stats.count, "Payout stats.");

  Ok(())
}
