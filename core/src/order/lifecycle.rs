// core/src/order/lifecycle.rs

//! Owner-driven status changes.
//!
//! `advance` is a two-step protocol: the status write is committed first, then
//! the customer notification is attempted and its outcome reported alongside
//! the updated order. A failed notification never rolls the status back.

use crate::error::{LaundrifyError, LaundrifyResult};
use crate::notify::{CustomerNotifier, NotificationOutcome};
use crate::order::{Order, OrderStatus};
use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
use crate::store::OrderStore;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub(crate) struct AdvanceCtxData {
  store: Arc<dyn OrderStore>,
  notifier: Arc<dyn CustomerNotifier>,
  order: Order,
  target: OrderStatus,
  notification: NotificationOutcome,
}

/// Result of a successful `advance`.
#[derive(Debug, Clone, PartialEq)]
pub struct Advanced {
  /// The order as persisted, with its new status.
  pub order: Order,
  pub notification: NotificationOutcome,
}

impl Advanced {
  /// Reaching `ready` asks the owner how the laundry gets back to the customer.
  pub fn needs_fulfillment_choice(&self) -> bool {
    self.order.status == OrderStatus::Ready
  }
}

pub struct OrderLifecycle {
  store: Arc<dyn OrderStore>,
  notifier: Arc<dyn CustomerNotifier>,
  pipeline: Pipeline<AdvanceCtxData, LaundrifyError>,
}

impl OrderLifecycle {
  pub fn new(store: Arc<dyn OrderStore>, notifier: Arc<dyn CustomerNotifier>) -> Self {
    Self {
      store,
      notifier,
      pipeline: build_advance_pipeline(),
    }
  }

  /// Moves `order` to `target` if and only if `target` is its immediate successor.
  ///
  /// On any error the caller's order is left as it was; nothing is applied optimistically.
  #[instrument(
    name = "OrderLifecycle::advance",
    skip(self, order),
    fields(order_id = %order.id, from = %order.status, to = %target),
    err(Display)
  )]
  pub async fn advance(&self, order: &Order, target: OrderStatus) -> LaundrifyResult<Advanced> {
    let ctx_data = ContextData::new(AdvanceCtxData {
      store: self.store.clone(),
      notifier: self.notifier.clone(),
      order: order.clone(),
      target,
      notification: NotificationOutcome::NotAttempted,
    });

    match self.pipeline.run(ctx_data.clone()).await? {
      PipelineResult::Completed => {}
      PipelineResult::Stopped => warn!("Advance pipeline stopped early."),
    }

    let guard = ctx_data.read();
    Ok(Advanced {
      order: guard.order.clone(),
      notification: guard.notification.clone(),
    })
  }
}

impl std::fmt::Debug for OrderLifecycle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("OrderLifecycle")
      .field("pipeline", &self.pipeline)
      .finish_non_exhaustive()
  }
}

fn build_advance_pipeline() -> Pipeline<AdvanceCtxData, LaundrifyError> {
  let mut p = Pipeline::<AdvanceCtxData, LaundrifyError>::new(
    "advance_order",
    &[
      ("check_transition", false, None),
      ("persist_status", false, None),
      ("notify_customer", false, None),
    ],
  );

  p.on("check_transition", |ctx: ContextData<AdvanceCtxData>| async move {
    let (from, to) = {
      let guard = ctx.read();
      (guard.order.status, guard.target)
    };
    if !from.can_advance_to(to) {
      return Err(LaundrifyError::IllegalTransition { from, to });
    }
    Ok::<_, LaundrifyError>(PipelineControl::Continue)
  });

  p.on("persist_status", |ctx: ContextData<AdvanceCtxData>| async move {
    let (store, order_id, from, to) = {
      let guard = ctx.read();
      (guard.store.clone(), guard.order.id, guard.order.status, guard.target)
    };

    let matched = store.update_status(order_id, from, to).await?;
    if !matched {
      return Err(LaundrifyError::StaleOrder {
        order_id,
        expected: from,
      });
    }

    ctx.write().order.status = to;
    info!(%order_id, status = %to, "Order status persisted.");
    Ok::<_, LaundrifyError>(PipelineControl::Continue)
  });

  p.on("notify_customer", |ctx: ContextData<AdvanceCtxData>| async move {
    let (notifier, order) = {
      let guard = ctx.read();
      (guard.notifier.clone(), guard.order.clone())
    };

    let outcome = match notifier.notify_status_change(&order).await {
      Ok(()) => NotificationOutcome::Delivered,
      Err(e) => {
        warn!(order_id = %order.id, error = %e, "Customer notification failed.");
        NotificationOutcome::Failed(e.to_string())
      }
    };
    ctx.write().notification = outcome;
    Ok::<_, LaundrifyError>(PipelineControl::Continue)
  });

  p
}
