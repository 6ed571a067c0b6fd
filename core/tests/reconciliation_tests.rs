// tests/reconciliation_tests.rs
mod common;

use chrono::{Duration, Utc};
use common::*;
use payout_engine::{DiscrepancyKind, FulfillmentStatus, PayoutStatus, PayoutStore, Reconciler, TransferReceipt};
use serial_test::serial;
use uuid::Uuid;

fn accepted_transfer(transfer_id: &str, idempotency_key: String, amount: &str) -> TransferReceipt {
  TransferReceipt {
    transfer_id: transfer_id.to_string(),
    account_id: "acct_orphan".to_string(),
    amount: dec(amount),
    currency: "USD".to_string(),
    status: PayoutStatus::Paid,
    idempotency_key,
    created_at: Utc::now(),
  }
}

#[tokio::test]
#[serial]
async fn test_orphaned_transfer_is_repaired_exactly_once() {
  let h = harness();
  let item = h.seed_payable_item();
  h.processor
    .seed_transfer(accepted_transfer("tr_orphan", item.id.to_string(), "179.30"));
  let reconciler = Reconciler::new(h.services.clone());
  let since = Utc::now() - Duration::hours(1);

  let first = reconciler.reconcile(since).await.unwrap();
  assert_eq!((first.checked, first.matched, first.repaired), (1, 0, 1));
  assert!(first.unresolved.is_empty());

  let recorded = h.store.get_payout_by_transfer("tr_orphan").await.unwrap().unwrap();
  assert_eq!(recorded.net_amount, dec("179.30"));
  assert_eq!(recorded.order_item_id, item.id);
  let flagged = h.store.order_item(item.id).unwrap();
  assert!(flagged.seller_paid);
  assert_eq!(flagged.payout_id, Some(recorded.id));

  let second = reconciler.reconcile(since).await.unwrap();
  assert_eq!((second.checked, second.matched, second.repaired), (1, 1, 0));
  assert_eq!(h.store.payout_count(), 1);
}

#[tokio::test]
#[serial]
async fn test_settled_payouts_reconcile_as_matched() {
  let h = harness();
  let item = h.seed_payable_item();
  h.orchestrator().request_payout(item.id).await.unwrap();

  let report = Reconciler::new(h.services.clone())
    .reconcile(Utc::now() - Duration::minutes(5))
    .await
    .unwrap();
  assert_eq!((report.checked, report.matched, report.repaired), (1, 1, 0));
}

#[tokio::test]
#[serial]
async fn test_unrepairable_transfers_are_reported() {
  let h = harness();
  let item = h.seed_payable_item();
  let missing_item = Uuid::new_v4();
  h.processor
    .seed_transfer(accepted_transfer("tr_wrong_amount", item.id.to_string(), "150.00"));
  h.processor
    .seed_transfer(accepted_transfer("tr_no_item", missing_item.to_string(), "10.00"));
  h.processor
    .seed_transfer(accepted_transfer("tr_foreign", "manual-adjustment-7".to_string(), "5.00"));

  let report = Reconciler::new(h.services.clone())
    .reconcile(Utc::now() - Duration::hours(1))
    .await
    .unwrap();

  assert_eq!(report.checked, 3);
  assert_eq!(report.repaired, 0);
  assert_eq!(report.unresolved.len(), 3);

  let kind_of = |transfer_id: &str| {
    report
      .unresolved
      .iter()
      .find(|d| d.transfer_id == transfer_id)
      .map(|d| d.kind.clone())
      .unwrap()
  };
  assert_eq!(
    kind_of("tr_wrong_amount"),
    DiscrepancyKind::AmountMismatch {
      expected: dec("179.30"),
      transferred: dec("150.00"),
    }
  );
  assert_eq!(kind_of("tr_no_item"), DiscrepancyKind::OrderItemMissing);
  assert!(matches!(
    kind_of("tr_foreign"),
    DiscrepancyKind::UnknownIdempotencyKey { .. }
  ));
  assert_eq!(h.store.payout_count(), 0);
  assert!(!h.store.order_item(item.id).unwrap().seller_paid);
}

#[tokio::test]
#[serial]
async fn test_unsettleable_item_does_not_block_other_repairs() {
  let h = harness();
  let broken = h.seed_item("", "50.00", 1, FulfillmentStatus::Shipped);
  let item = h.seed_payable_item();
  h.processor
    .seed_transfer(accepted_transfer("tr_bad", broken.id.to_string(), "50.00"));
  h.processor
    .seed_transfer(accepted_transfer("tr_good", item.id.to_string(), "179.30"));

  let report = Reconciler::new(h.services.clone())
    .reconcile(Utc::now() - Duration::hours(1))
    .await
    .expect("reconciliation keeps going past a bad order item");

  assert_eq!((report.checked, report.matched, report.repaired), (2, 0, 1));
  assert_eq!(report.unresolved.len(), 1);
  let discrepancy = &report.unresolved[0];
  assert_eq!(discrepancy.transfer_id, "tr_bad");
  assert_eq!(discrepancy.order_item_id, Some(broken.id));
  assert!(matches!(
    discrepancy.kind,
    DiscrepancyKind::InvalidOrderItem { ref reason } if reason.contains("category")
  ));

  assert!(h.store.order_item(item.id).unwrap().seller_paid);
  assert!(!h.store.order_item(broken.id).unwrap().seller_paid);
  assert_eq!(h.store.payout_count(), 1);
}
