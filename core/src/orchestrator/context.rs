// payout_engine/src/orchestrator/context.rs

use crate::account::ConnectedAccount;
use crate::error::{PayoutError, PipelineError};
use crate::model::{OrderItem, Payout};
use crate::ports::{PayoutServices, TransferReceipt};
use crate::settlement::SettlementPreview;
use uuid::Uuid;

/// State carried through one `request_payout` run. Each step fills in the
/// field it is named after; later steps read what earlier ones produced.
#[derive(Debug, Clone)]
pub struct PayoutCtxData {
  pub services: PayoutServices,
  pub order_item_id: Uuid,
  pub order_item: Option<OrderItem>,
  pub account: Option<ConnectedAccount>,
  /// Exact (unrounded) preview computed for this attempt.
  pub preview: Option<SettlementPreview>,
  pub receipt: Option<TransferReceipt>,
  pub payout: Option<Payout>,
}

impl PayoutCtxData {
  pub fn new(services: PayoutServices, order_item_id: Uuid) -> Self {
    Self {
      services,
      order_item_id,
      order_item: None,
      account: None,
      preview: None,
      receipt: None,
      payout: None,
    }
  }

  /// The transfer amount of the computed preview; `None` before `compute_settlement`.
  pub fn transfer_amount(&self) -> Option<rust_decimal::Decimal> {
    self.preview.as_ref().map(SettlementPreview::transfer_amount)
  }
}

/// Reads a value an earlier step was supposed to produce.
pub(crate) fn produced<T: Clone>(value: &Option<T>, what: &str) -> Result<T, PayoutError> {
  value
    .clone()
    .ok_or_else(|| PipelineError::Internal(format!("{} was not produced by an earlier step", what)).into())
}
