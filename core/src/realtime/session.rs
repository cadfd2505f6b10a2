// core/src/realtime/session.rs

//! The Orders screen while it is open: at most one live subscription, a full
//! fetch on every (re)focus, and effects dispatched to the owner's device.

use crate::error::{LaundrifyError, LaundrifyResult};
use crate::notify::AlertSink;
use crate::order::{Advanced, FulfillmentRoute, OrderLifecycle, OrderStatus, Partition};
use crate::realtime::reconciler::{Effect, OrdersView};
use crate::realtime::{ChangeFeed, FeedFilter, RealtimeEvent, Subscription};
use crate::store::OrderStore;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub struct LiveOrders {
  store: Arc<dyn OrderStore>,
  feed: Arc<dyn ChangeFeed>,
  alerts: Arc<dyn AlertSink>,
  view: OrdersView,
  subscription: Option<Subscription>,
}

impl LiveOrders {
  pub fn new(
    laundry_id: Uuid,
    store: Arc<dyn OrderStore>,
    feed: Arc<dyn ChangeFeed>,
    alerts: Arc<dyn AlertSink>,
  ) -> Self {
    Self {
      store,
      feed,
      alerts,
      view: OrdersView::new(laundry_id),
      subscription: None,
    }
  }

  pub fn view(&self) -> &OrdersView {
    &self.view
  }

  pub fn is_subscribed(&self) -> bool {
    self.subscription.is_some()
  }

  /// Screen gained focus: subscribe if not already subscribed, then refetch.
  ///
  /// Events missed while unfocused are not replayed; the fetch is what recovers them.
  #[instrument(name = "LiveOrders::focus", skip(self), fields(laundry_id = %self.view.laundry_id()), err(Display))]
  pub async fn focus(&mut self) -> LaundrifyResult<()> {
    if self.subscription.is_none() {
      let filter = FeedFilter::order_updates(self.view.laundry_id());
      self.subscription = Some(self.feed.subscribe(filter).await?);
      info!("Subscribed to order updates.");
    }
    self.refresh().await
  }

  /// Screen lost focus: drop the subscription. In-flight writes are not cancelled.
  pub fn blur(&mut self) {
    if self.subscription.take().is_some() {
      info!(laundry_id = %self.view.laundry_id(), "Unsubscribed from order updates.");
    }
  }

  /// Full fetch of the visible partition. On failure the list is left as it was.
  #[instrument(name = "LiveOrders::refresh", skip(self), fields(partition = self.view.partition().label()), err(Display))]
  pub async fn refresh(&mut self) -> LaundrifyResult<()> {
    let orders = self
      .store
      .list_orders(self.view.laundry_id(), self.view.partition())
      .await?;
    self.view.replace_orders(orders);
    Ok(())
  }

  pub async fn switch_partition(&mut self, partition: Partition) -> LaundrifyResult<()> {
    self.view.switch_partition(partition);
    self.refresh().await
  }

  /// Owner picked how a ready order leaves the shop. Returns the courier link to open, if any.
  pub async fn choose_fulfillment(&mut self, route: FulfillmentRoute) -> LaundrifyResult<Option<&'static str>> {
    let link = self.view.choose_fulfillment(route);
    self.refresh().await?;
    Ok(link)
  }

  /// Advances one listed order and reflects the result locally.
  pub async fn advance(
    &mut self,
    lifecycle: &OrderLifecycle,
    order_id: Uuid,
    target: OrderStatus,
  ) -> LaundrifyResult<Advanced> {
    let order = self
      .view
      .order(order_id)
      .cloned()
      .ok_or_else(|| LaundrifyError::NotFound(format!("order {}", order_id)))?;

    let advanced = lifecycle.advance(&order, target).await?;
    self.view.apply_local_update(&advanced.order);
    if let Err(e) = self.refresh().await {
      warn!(error = %e, "Refetch after status change failed.");
    }
    Ok(advanced)
  }

  /// Waits for the next delivered event and handles it.
  ///
  /// Returns `None` when not subscribed or when the transport closed; in the
  /// latter case the dead subscription is dropped so the next `focus` reopens it.
  pub async fn next_event(&mut self) -> Option<Vec<Effect>> {
    let event = self.subscription.as_mut()?.next().await;
    match event {
      Some(event) => Some(self.handle_event(&event).await),
      None => {
        warn!("Order feed closed.");
        self.subscription = None;
        None
      }
    }
  }

  /// Folds one event into the view and performs the resulting effects.
  pub async fn handle_event(&mut self, event: &RealtimeEvent) -> Vec<Effect> {
    let effects = self.view.apply(event);
    for effect in &effects {
      let result = match effect {
        Effect::PlayAlert => self.alerts.play_alert().await,
        Effect::ShowNotice(notice) => self.alerts.show_notice(notice).await,
      };
      if let Err(e) = result {
        warn!(error = %e, ?effect, "Alert effect failed.");
      }
    }
    effects
  }
}

impl std::fmt::Debug for LiveOrders {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LiveOrders")
      .field("view", &self.view)
      .field("subscribed", &self.subscription.is_some())
      .finish_non_exhaustive()
  }
}
