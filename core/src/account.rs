// payout_engine/src/account.rs

//! Connected-account lifecycle.
//!
//! ```text
//!   none ──create──▶ pending ──verified──▶ ready
//!                      │  ▲                  │
//!                      │  └──re-verification─┘   (external event only)
//!                      └──rejected──▶ failed       (terminal)
//! ```
//!
//! Status is pulled from the processor on demand. Webhook deliveries may
//! arrive at any time; both paths go through the same last-write-wins rule
//! keyed on the observation timestamp, enforced again by the store.

use crate::error::PayoutError;
use crate::ports::PayoutServices;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
  /// No account exists for the seller.
  None,
  /// Account exists, onboarding incomplete.
  Pending,
  /// Onboarding verified; the only state payouts may proceed from.
  Ready,
  /// Rejected; needs manual remediation.
  Failed,
}

impl AccountStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      AccountStatus::None => "none",
      AccountStatus::Pending => "pending",
      AccountStatus::Ready => "ready",
      AccountStatus::Failed => "failed",
    }
  }

  pub fn is_ready(&self) -> bool {
    *self == AccountStatus::Ready
  }

  pub fn can_transition_to(&self, next: AccountStatus) -> bool {
    match (self, next) {
      (AccountStatus::None, AccountStatus::None) => false,
      (current, next) if *current == next => true,
      (AccountStatus::None, AccountStatus::Pending) => true,
      (AccountStatus::Pending, AccountStatus::Ready) | (AccountStatus::Pending, AccountStatus::Failed) => true,
      (AccountStatus::Ready, AccountStatus::Pending) => true,
      _ => false,
    }
  }
}

impl fmt::Display for AccountStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for AccountStatus {
  type Err = PayoutError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "none" => Ok(AccountStatus::None),
      "pending" => Ok(AccountStatus::Pending),
      "ready" => Ok(AccountStatus::Ready),
      "failed" => Ok(AccountStatus::Failed),
      other => Err(PayoutError::InvalidInput(format!("unknown account status '{}'", other))),
    }
  }
}

/// A seller's account with the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedAccount {
  pub seller_id: Uuid,
  pub external_account_id: String,
  pub status: AccountStatus,
  /// When the observation behind `status` was made.
  pub status_observed_at: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
}

/// How a status observation relates to the current account state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
  /// Older than the observation already applied.
  Stale,
  Unchanged,
  Transition { from: AccountStatus, to: AccountStatus },
  Illegal { from: AccountStatus, to: AccountStatus },
}

impl ConnectedAccount {
  pub fn pending(seller_id: Uuid, external_account_id: String, now: DateTime<Utc>) -> Self {
    Self {
      seller_id,
      external_account_id,
      status: AccountStatus::Pending,
      status_observed_at: now,
      created_at: now,
    }
  }

  pub fn observe(&self, status: AccountStatus, observed_at: DateTime<Utc>) -> Observation {
    if observed_at < self.status_observed_at {
      Observation::Stale
    } else if status == self.status {
      Observation::Unchanged
    } else if self.status.can_transition_to(status) {
      Observation::Transition {
        from: self.status,
        to: status,
      }
    } else {
      Observation::Illegal {
        from: self.status,
        to: status,
      }
    }
  }
}

/// Connected-account operations over the account store and the processor.
#[derive(Debug, Clone)]
pub struct AccountLifecycle {
  services: PayoutServices,
}

impl AccountLifecycle {
  pub fn new(services: PayoutServices) -> Self {
    Self { services }
  }

  pub async fn account(&self, seller_id: Uuid) -> Result<Option<ConnectedAccount>, PayoutError> {
    Ok(self.services.accounts.get_account_by_seller(seller_id).await?)
  }

  /// `AccountStatus::None` when the seller has no account yet.
  pub async fn status(&self, seller_id: Uuid) -> Result<AccountStatus, PayoutError> {
    Ok(
      self
        .account(seller_id)
        .await?
        .map(|a| a.status)
        .unwrap_or(AccountStatus::None),
    )
  }

  /// Returns the seller's account, creating it with the processor on first use.
  #[instrument(name = "AccountLifecycle::ensure_account", skip(self), err(Display))]
  pub async fn ensure_account(&self, seller_id: Uuid) -> Result<ConnectedAccount, PayoutError> {
    if let Some(existing) = self.account(seller_id).await? {
      return Ok(existing);
    }

    let external_id = self.services.processor.create_connected_account(seller_id).await?;
    let account = ConnectedAccount::pending(seller_id, external_id, Utc::now());
    match self.services.accounts.insert_account(account).await {
      Ok(created) => {
        info!(%seller_id, account_id = %created.external_account_id, "Connected account created.");
        Ok(created)
      }
      Err(crate::error::StoreError::Conflict(_)) => {
        // A concurrent call won the insert; the account we just created stays unused.
        warn!(%seller_id, "Concurrent connected-account creation; keeping the stored account.");
        self
          .account(seller_id)
          .await?
          .ok_or_else(|| PayoutError::NotFound(format!("connected account for seller {}", seller_id)))
      }
      Err(e) => Err(e.into()),
    }
  }

  /// Pulls the current status from the processor and applies it.
  #[instrument(name = "AccountLifecycle::refresh_status", skip(self), err(Display))]
  pub async fn refresh_status(&self, seller_id: Uuid) -> Result<ConnectedAccount, PayoutError> {
    let account = self
      .account(seller_id)
      .await?
      .ok_or_else(|| PayoutError::NotFound(format!("connected account for seller {}", seller_id)))?;

    let observed = self
      .services
      .processor
      .account_status(&account.external_account_id)
      .await?;

    let observed_at = Utc::now();
    match account.observe(observed, observed_at) {
      Observation::Illegal { from, to } => Err(PayoutError::InvalidTransition { from, to }),
      Observation::Stale => Ok(account),
      Observation::Unchanged | Observation::Transition { .. } => self.write_status(&account, observed, observed_at).await,
    }
  }

  /// Applies a pushed (webhook) status observation. Stale and illegal
  /// observations are ignored; the stored account is returned either way.
  #[instrument(name = "AccountLifecycle::apply_external_status", skip(self), err(Display))]
  pub async fn apply_external_status(
    &self,
    account_id: &str,
    status: AccountStatus,
    observed_at: DateTime<Utc>,
  ) -> Result<ConnectedAccount, PayoutError> {
    let account = self
      .services
      .accounts
      .get_account_by_external_id(account_id)
      .await?
      .ok_or_else(|| PayoutError::NotFound(format!("connected account {}", account_id)))?;

    match account.observe(status, observed_at) {
      Observation::Stale => {
        debug!(account_id, %status, "Ignoring stale account status observation.");
        Ok(account)
      }
      Observation::Illegal { from, to } => {
        warn!(account_id, %from, %to, "Ignoring illegal account status transition.");
        Ok(account)
      }
      Observation::Unchanged | Observation::Transition { .. } => self.write_status(&account, status, observed_at).await,
    }
  }

  /// A fresh onboarding link; only while onboarding is incomplete.
  #[instrument(name = "AccountLifecycle::onboarding_link", skip(self), err(Display))]
  pub async fn onboarding_link(&self, seller_id: Uuid) -> Result<String, PayoutError> {
    let account = self
      .account(seller_id)
      .await?
      .ok_or_else(|| PayoutError::NotFound(format!("connected account for seller {}", seller_id)))?;
    if account.status != AccountStatus::Pending {
      return Err(PayoutError::InvalidTransition {
        from: account.status,
        to: AccountStatus::Pending,
      });
    }
    Ok(
      self
        .services
        .processor
        .create_onboarding_link(&account.external_account_id)
        .await?,
    )
  }

  async fn write_status(
    &self,
    account: &ConnectedAccount,
    status: AccountStatus,
    observed_at: DateTime<Utc>,
  ) -> Result<ConnectedAccount, PayoutError> {
    let written = self
      .services
      .accounts
      .update_account_status(&account.external_account_id, status, observed_at)
      .await?;
    if written && status != account.status {
      info!(seller_id = %account.seller_id, from = %account.status, to = %status, "Connected account status changed.");
    } else if !written {
      debug!(seller_id = %account.seller_id, "A newer observation was stored concurrently.");
    }
    self
      .account(account.seller_id)
      .await?
      .ok_or_else(|| PayoutError::NotFound(format!("connected account for seller {}", account.seller_id)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  #[test]
  fn allowed_transitions() {
    let allowed = [
      (AccountStatus::None, AccountStatus::Pending),
      (AccountStatus::Pending, AccountStatus::Ready),
      (AccountStatus::Pending, AccountStatus::Failed),
      (AccountStatus::Ready, AccountStatus::Pending),
      (AccountStatus::Ready, AccountStatus::Ready),
    ];
    let forbidden = [
      (AccountStatus::None, AccountStatus::Ready),
      (AccountStatus::Ready, AccountStatus::Failed),
      (AccountStatus::Failed, AccountStatus::Pending),
      (AccountStatus::Failed, AccountStatus::Ready),
      (AccountStatus::Pending, AccountStatus::None),
      (AccountStatus::None, AccountStatus::None),
    ];
    for (from, to) in allowed {
      assert!(from.can_transition_to(to), "{} -> {} should be allowed", from, to);
    }
    for (from, to) in forbidden {
      assert!(!from.can_transition_to(to), "{} -> {} should be rejected", from, to);
    }
  }

  #[test]
  fn observations_are_last_write_wins() {
    let now = Utc::now();
    let account = ConnectedAccount::pending(Uuid::new_v4(), "acct_1".into(), now);

    assert_eq!(
      account.observe(AccountStatus::Ready, now - Duration::seconds(5)),
      Observation::Stale
    );
    assert_eq!(
      account.observe(AccountStatus::Ready, now + Duration::seconds(5)),
      Observation::Transition {
        from: AccountStatus::Pending,
        to: AccountStatus::Ready
      }
    );
    assert_eq!(account.observe(AccountStatus::Pending, now), Observation::Unchanged);
  }

  #[test]
  fn failed_is_terminal() {
    let now = Utc::now();
    let mut account = ConnectedAccount::pending(Uuid::new_v4(), "acct_2".into(), now);
    account.status = AccountStatus::Failed;
    assert_eq!(
      account.observe(AccountStatus::Ready, now + Duration::seconds(1)),
      Observation::Illegal {
        from: AccountStatus::Failed,
        to: AccountStatus::Ready
      }
    );
  }
}
