// src/state.rs
use laundrify::profile::SubaccountGateway;
use laundrify::WebhookProcessor;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub webhooks: Arc<WebhookProcessor>,
  pub subaccounts: Arc<dyn SubaccountGateway>,
}
