// tests/lifecycle_tests.rs
mod common;

use common::*;
use laundrify::notify::NotificationOutcome;
use laundrify::{LaundrifyError, OrderLifecycle, OrderStatus};
use serial_test::serial;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use uuid::Uuid;

fn lifecycle(store: &Arc<MemoryOrderStore>, notifier: &Arc<RecordingNotifier>) -> OrderLifecycle {
  OrderLifecycle::new(store.clone(), notifier.clone())
}

#[tokio::test]
#[serial]
async fn advances_only_to_the_immediate_successor() {
  setup_tracing();
  let shop = Uuid::new_v4();
  for from in OrderStatus::ALL {
    for to in OrderStatus::ALL {
      let o = order(shop, from);
      let store = Arc::new(MemoryOrderStore::with_orders([o.clone()]));
      let notifier = Arc::new(RecordingNotifier::default());
      let result = lifecycle(&store, &notifier).advance(&o, to).await;

      if from.next() == Some(to) {
        let advanced = result.unwrap();
        assert_eq!(advanced.order.status, to);
        assert_eq!(store.status_of(o.id), Some(to));
      } else {
        assert!(
          matches!(result, Err(LaundrifyError::IllegalTransition { from: f, to: t }) if f == from && t == to),
          "{from} -> {to} should be illegal"
        );
        assert_eq!(store.update_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.status_of(o.id), Some(from));
      }
    }
  }
}

#[tokio::test]
#[serial]
async fn notifies_customer_after_persisting() {
  setup_tracing();
  let o = order(Uuid::new_v4(), OrderStatus::Received);
  let store = Arc::new(MemoryOrderStore::with_orders([o.clone()]));
  let notifier = Arc::new(RecordingNotifier::default());

  let advanced = lifecycle(&store, &notifier)
    .advance(&o, OrderStatus::Processing)
    .await
    .unwrap();

  assert_eq!(advanced.notification, NotificationOutcome::Delivered);
  assert_eq!(*notifier.notified.lock(), vec![(o.id, OrderStatus::Processing)]);
  assert!(!advanced.needs_fulfillment_choice());
  // the caller's copy is untouched
  assert_eq!(o.status, OrderStatus::Received);
}

#[tokio::test]
#[serial]
async fn failed_notification_does_not_roll_back() {
  setup_tracing();
  let o = order(Uuid::new_v4(), OrderStatus::Processing);
  let store = Arc::new(MemoryOrderStore::with_orders([o.clone()]));
  let notifier = Arc::new(RecordingNotifier::default());
  *notifier.fail_with.lock() = Some("function timed out".to_string());

  let advanced = lifecycle(&store, &notifier).advance(&o, OrderStatus::Ready).await.unwrap();

  assert_eq!(store.status_of(o.id), Some(OrderStatus::Ready));
  assert!(matches!(advanced.notification, NotificationOutcome::Failed(ref m) if m.contains("function timed out")));
  assert!(advanced.needs_fulfillment_choice());
}

#[tokio::test]
#[serial]
async fn concurrent_change_is_reported_as_stale() {
  setup_tracing();
  let o = order(Uuid::new_v4(), OrderStatus::Received);
  let store = Arc::new(MemoryOrderStore::with_orders([o.clone()]));
  store.force_status(o.id, OrderStatus::Processing);
  let notifier = Arc::new(RecordingNotifier::default());

  let err = lifecycle(&store, &notifier)
    .advance(&o, OrderStatus::Processing)
    .await
    .unwrap_err();

  assert!(matches!(err, LaundrifyError::StaleOrder { order_id, expected: OrderStatus::Received } if order_id == o.id));
  assert!(err.is_precondition());
  assert!(notifier.notified.lock().is_empty());
}

#[tokio::test]
#[serial]
async fn store_failure_skips_notification() {
  setup_tracing();
  let o = order(Uuid::new_v4(), OrderStatus::Paid);
  let store = Arc::new(MemoryOrderStore::with_orders([o.clone()]));
  *store.fail_updates.lock() = Some("connection reset".to_string());
  let notifier = Arc::new(RecordingNotifier::default());

  let err = lifecycle(&store, &notifier)
    .advance(&o, OrderStatus::Received)
    .await
    .unwrap_err();

  assert!(matches!(err, LaundrifyError::Remote { operation: "update_status", .. }));
  assert_eq!(store.status_of(o.id), Some(OrderStatus::Paid));
  assert!(notifier.notified.lock().is_empty());
}
