// payout_engine/src/error.rs
use crate::account::AccountStatus;
use crate::model::{FulfillmentStatus, Payout};
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the step engine itself.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Error in step handler. Source: {source}")]
  Handler {
    #[source]
    source: AnyhowError,
  },

  #[error("Configuration error for step '{step_name}': {message}")]
  ConfigurationError { step_name: String, message: String },

  #[error("Internal pipeline error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for PipelineError {
  fn from(err: AnyhowError) -> Self {
    PipelineError::Handler { source: err }
  }
}

/// Errors from the persistence ports.
#[derive(Debug, Error)]
pub enum StoreError {
  /// A uniqueness guard rejected the write (e.g. a second non-failed payout
  /// for the same order item).
  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Record not found: {0}")]
  NotFound(String),

  #[error("Storage backend failure: {0}")]
  Backend(#[source] AnyhowError),
}

/// Errors from the payment processor port.
#[derive(Debug, Error)]
pub enum ProcessorError {
  /// The processor refused the request; retrying the same request will not help.
  #[error("Processor rejected the request: {0}")]
  Rejected(String),

  /// Network failure, timeout or processor outage; safe to retry.
  #[error("Processor unavailable: {0}")]
  Unavailable(String),

  /// The processor answered with something this engine cannot interpret.
  #[error("Unexpected processor response: {0}")]
  Protocol(String),
}

impl ProcessorError {
  pub fn is_retryable(&self) -> bool {
    matches!(self, ProcessorError::Unavailable(_))
  }
}

/// Errors of the settlement core.
///
/// A missing commission rate is deliberately absent: it is carried as the
/// `commission_found` flag on the settlement preview.
#[derive(Debug, Error)]
pub enum PayoutError {
  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Order item {order_item_id} is not eligible for payout (fulfillment status: {status})")]
  NotEligible {
    order_item_id: Uuid,
    status: FulfillmentStatus,
  },

  #[error("Order item {order_item_id} has already been paid out")]
  AlreadyPaid {
    order_item_id: Uuid,
    existing: Option<Box<Payout>>,
  },

  #[error("Connected account for seller {seller_id} is not ready (status: {status})")]
  AccountNotReady { seller_id: Uuid, status: AccountStatus },

  #[error("Payment processor error (retryable: {retryable}): {message}")]
  Processor { retryable: bool, message: String },

  #[error("Illegal connected-account transition from {from} to {to}")]
  InvalidTransition { from: AccountStatus, to: AccountStatus },

  /// The processor accepted the transfer but the local record could not be
  /// written. Retrying `request_payout` or running reconciliation repairs it.
  #[error("Transfer {transfer_id} for order item {order_item_id} was accepted but not recorded: {source}")]
  TransferNotRecorded {
    order_item_id: Uuid,
    transfer_id: String,
    #[source]
    source: StoreError,
  },

  #[error("Storage error: {0}")]
  Storage(#[from] StoreError),

  #[error("Pipeline error: {0}")]
  Pipeline(#[from] PipelineError),
}

impl From<ProcessorError> for PayoutError {
  fn from(err: ProcessorError) -> Self {
    PayoutError::Processor {
      retryable: err.is_retryable(),
      message: err.to_string(),
    }
  }
}

impl PayoutError {
  /// Whether an explicit, caller-initiated retry of the same request is reasonable.
  pub fn is_retryable(&self) -> bool {
    match self {
      PayoutError::Processor { retryable, .. } => *retryable,
      PayoutError::TransferNotRecorded { .. } => true,
      PayoutError::Storage(StoreError::Backend(_)) => true,
      _ => false,
    }
  }
}

pub type PayoutResult<T, E = PayoutError> = std::result::Result<T, E>;
