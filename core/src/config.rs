// payout_engine/src/config.rs

use crate::fee::FeeConfig;
use crate::money::DEFAULT_CURRENCY;
use serde::{Deserialize, Serialize};

/// Settlement parameters shared by the calculator and the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementConfig {
  pub fee: FeeConfig,
  /// Single settlement currency (ISO code).
  pub currency: String,
}

impl Default for SettlementConfig {
  fn default() -> Self {
    Self {
      fee: FeeConfig::default(),
      currency: DEFAULT_CURRENCY.to_string(),
    }
  }
}
