// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use payout_engine::store::InMemoryStore;
use payout_engine::{
  AccountStatus, CommissionRate, ConnectedAccount, ContextData, FulfillmentStatus, OrderItem, PaymentProcessor,
  PayoutOrchestrator, PayoutServices, PayoutStatus, PipelineControl, PipelineError, ProcessorError, SettlementConfig,
  TransferReceipt, TransferRequest,
};
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

// --- Pipeline engine fixtures ---

#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
  pub skip_optional: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Pipeline engine error: {0}")]
  Engine(String),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<PipelineError> for TestError {
  fn from(pe: PipelineError) -> Self {
    TestError::Engine(pe.to_string())
  }
}

pub fn create_simple_handler(
  step_name: &'static str,
  message_to_append: &'static str,
) -> payout_engine::pipeline::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      tracing::debug!(target: "test_handlers", step = step_name, "executed, counter: {}", guard.counter);
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn create_failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> payout_engine::pipeline::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Handler(error_message.to_string()))
    })
  })
}

// --- Tracing ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Payment processor double ---

#[derive(Debug)]
struct FakeProcessorState {
  next_account: u32,
  next_transfer: u32,
  account_statuses: HashMap<String, AccountStatus>,
  /// Keyed by idempotency key.
  transfers: HashMap<String, TransferReceipt>,
  queued_failures: VecDeque<ProcessorError>,
  transfer_status: PayoutStatus,
  transfer_calls: usize,
}

/// In-process processor: transfers are idempotent per key, failures can be
/// queued, and account statuses are set by the test.
#[derive(Debug)]
pub struct FakeProcessor {
  state: Mutex<FakeProcessorState>,
}

impl Default for FakeProcessor {
  fn default() -> Self {
    Self {
      state: Mutex::new(FakeProcessorState {
        next_account: 0,
        next_transfer: 0,
        account_statuses: HashMap::new(),
        transfers: HashMap::new(),
        queued_failures: VecDeque::new(),
        transfer_status: PayoutStatus::Paid,
        transfer_calls: 0,
      }),
    }
  }
}

impl FakeProcessor {
  pub fn fail_next_transfer(&self, error: ProcessorError) {
    self.state.lock().queued_failures.push_back(error);
  }

  pub fn set_account_status(&self, account_id: &str, status: AccountStatus) {
    self.state.lock().account_statuses.insert(account_id.to_string(), status);
  }

  /// Status reported on new transfers (`Paid` unless changed).
  pub fn set_transfer_status(&self, status: PayoutStatus) {
    self.state.lock().transfer_status = status;
  }

  pub fn transfer_calls(&self) -> usize {
    self.state.lock().transfer_calls
  }

  pub fn distinct_transfers(&self) -> usize {
    self.state.lock().transfers.len()
  }

  /// Records a transfer as if it had been accepted earlier.
  pub fn seed_transfer(&self, receipt: TransferReceipt) {
    self
      .state
      .lock()
      .transfers
      .insert(receipt.idempotency_key.clone(), receipt);
  }
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
  async fn create_connected_account(&self, _seller_id: Uuid) -> Result<String, ProcessorError> {
    let mut state = self.state.lock();
    state.next_account += 1;
    let account_id = format!("acct_test_{}", state.next_account);
    state.account_statuses.insert(account_id.clone(), AccountStatus::Pending);
    Ok(account_id)
  }

  async fn account_status(&self, account_id: &str) -> Result<AccountStatus, ProcessorError> {
    self
      .state
      .lock()
      .account_statuses
      .get(account_id)
      .copied()
      .ok_or_else(|| ProcessorError::Rejected(format!("no such account {}", account_id)))
  }

  async fn create_onboarding_link(&self, account_id: &str) -> Result<String, ProcessorError> {
    Ok(format!("https://processor.test/onboarding/{}", account_id))
  }

  async fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt, ProcessorError> {
    // Yield so concurrent requests interleave around the processor call.
    tokio::task::yield_now().await;
    let mut state = self.state.lock();
    state.transfer_calls += 1;
    if let Some(error) = state.queued_failures.pop_front() {
      return Err(error);
    }
    if let Some(existing) = state.transfers.get(&request.idempotency_key) {
      return Ok(existing.clone());
    }
    state.next_transfer += 1;
    let receipt = TransferReceipt {
      transfer_id: format!("tr_test_{}", state.next_transfer),
      account_id: request.account_id,
      amount: request.amount,
      currency: request.currency,
      status: state.transfer_status,
      idempotency_key: request.idempotency_key.clone(),
      created_at: Utc::now(),
    };
    state.transfers.insert(request.idempotency_key, receipt.clone());
    Ok(receipt)
  }

  async fn list_transfers(&self, since: DateTime<Utc>) -> Result<Vec<TransferReceipt>, ProcessorError> {
    let mut transfers: Vec<TransferReceipt> = self
      .state
      .lock()
      .transfers
      .values()
      .filter(|t| t.created_at >= since)
      .cloned()
      .collect();
    transfers.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(transfers)
  }
}

// --- Settlement harness ---

pub struct Harness {
  pub store: Arc<InMemoryStore>,
  pub processor: Arc<FakeProcessor>,
  pub services: PayoutServices,
}

pub fn harness() -> Harness {
  setup_tracing();
  let store = Arc::new(InMemoryStore::new());
  let processor = Arc::new(FakeProcessor::default());
  let services = PayoutServices {
    orders: store.clone(),
    rates: store.clone(),
    accounts: store.clone(),
    payouts: store.clone(),
    processor: processor.clone(),
    config: Arc::new(SettlementConfig::default()),
  };
  Harness {
    store,
    processor,
    services,
  }
}

pub fn dec(value: &str) -> Decimal {
  value.parse().expect("valid decimal literal")
}

impl Harness {
  pub fn orchestrator(&self) -> PayoutOrchestrator {
    PayoutOrchestrator::new(self.services.clone()).expect("payout pipeline builds")
  }

  pub fn seed_rate(&self, category: &str, percent: &str) {
    self
      .store
      .put_commission_rate(CommissionRate::new(category, dec(percent), Utc::now()).expect("valid rate"));
  }

  pub fn seed_item(&self, category: &str, unit_price: &str, quantity: i32, status: FulfillmentStatus) -> OrderItem {
    let unit_price = dec(unit_price);
    let item = OrderItem {
      id: Uuid::new_v4(),
      order_id: Uuid::new_v4(),
      buyer_id: Uuid::new_v4(),
      seller_id: Uuid::new_v4(),
      category: category.to_string(),
      unit_price,
      quantity,
      grand_total: unit_price * Decimal::from(quantity),
      fulfillment_status: status,
      seller_paid: false,
      payout_id: None,
    };
    self.store.put_order_item(item.clone());
    item
  }

  pub fn seed_account(&self, seller_id: Uuid, status: AccountStatus) -> ConnectedAccount {
    let account_id = format!("acct_seeded_{}", seller_id.simple());
    let mut account = ConnectedAccount::pending(seller_id, account_id.clone(), Utc::now());
    account.status = status;
    self.store.put_account(account.clone());
    self.processor.set_account_status(&account_id, status);
    account
  }

  /// A shipped "Core Drill Bits" item (2 x 100.00 at 10%) whose seller is ready.
  pub fn seed_payable_item(&self) -> OrderItem {
    self.seed_rate("Core Drill Bits", "10");
    let item = self.seed_item("Core Drill Bits", "100.00", 2, FulfillmentStatus::Shipped);
    self.seed_account(item.seller_id, AccountStatus::Ready);
    item
  }
}
