// payout_engine/src/lib.rs

//! Payout Engine: seller payout settlement for a multi-vendor marketplace.
//!
//! Given a shipped order item, the engine computes what the seller is owed
//! (commission by category, processor fee, net), moves that money through a
//! payment processor exactly once, and keeps an auditable payout ledger.
//!
//!  - Settlement previews with exact decimal arithmetic, rounded to cents only
//!    at the display/persistence boundary.
//!  - Connected-account lifecycle with last-write-wins status observations.
//!  - Idempotent payout orchestration built on a named-step pipeline.
//!  - Payout history, period statistics and processor reconciliation.
//!
//! Storage and the processor are reached through the traits in [`ports`];
//! [`store::InMemoryStore`] implements the storage side for tests and demos.

pub mod account;
pub mod commission;
pub mod config;
pub mod error;
pub mod fee;
pub mod ledger;
pub mod model;
pub mod money;
pub mod orchestrator;
pub mod pipeline;
pub mod ports;
pub mod reconcile;
pub mod settlement;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::account::{AccountLifecycle, AccountStatus, ConnectedAccount};
pub use crate::commission::{CommissionLookup, CommissionSchedule};
pub use crate::config::SettlementConfig;
pub use crate::error::{PayoutError, PayoutResult, PipelineError, ProcessorError, StoreError};
pub use crate::fee::{FeeConfig, FeeOutcome};
pub use crate::ledger::{DateRange, PayoutFilter, PayoutLedger, PayoutStats, SellerVolume, StatusBreakdown};
pub use crate::model::{CommissionRate, FulfillmentStatus, OrderItem, Payout, PayoutStatus};
pub use crate::orchestrator::{build_payout_pipeline, PayoutCtxData, PayoutOrchestrator};
pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult, StepDef};
pub use crate::ports::{
  AccountStore, CommissionRateSource, OrderItemStore, PaymentProcessor, PayoutServices, PayoutStore, TransferReceipt,
  TransferRequest,
};
pub use crate::reconcile::{Discrepancy, DiscrepancyKind, ReconciliationReport, Reconciler};
pub use crate::settlement::{SettlementCalculator, SettlementPreview, SettlementWarning};

/*
    Settlement flow:
    1. Build `PayoutServices` from your stores and processor client.
    2. `PayoutOrchestrator::preview_settlement(item)` shows the operator the
       rounded numbers plus any warnings (missing commission rate, clamped net).
    3. `PayoutOrchestrator::request_payout(item)` settles it. `AlreadyPaid`
       is the normal answer for a repeated request.
    4. Processor webhooks feed `AccountLifecycle::apply_external_status` and
       `PayoutOrchestrator::apply_transfer_status`.
    5. `Reconciler::reconcile(since)` repairs accepted-but-unrecorded transfers.
*/
