// core/src/notify.rs

//! Notification glue: customer updates after a status change, the owner's
//! local alert, and device push-token registration.

use crate::error::LaundrifyResult;
use crate::order::Order;
use crate::store::ProfileStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// What happened to the best-effort customer notification that follows a status write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
  Delivered,
  Failed(String),
  /// The status write did not happen, so nothing was sent.
  NotAttempted,
}

impl NotificationOutcome {
  pub fn is_delivered(&self) -> bool {
    matches!(self, NotificationOutcome::Delivered)
  }
}

/// Relays an order update to the customer-facing system.
#[async_trait]
pub trait CustomerNotifier: Send + Sync {
  async fn notify_status_change(&self, order: &Order) -> LaundrifyResult<()>;
}

/// A modal notice shown to the owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub title: String,
  pub message: String,
}

/// The owner's device: one-shot alert sound and modal notices.
#[async_trait]
pub trait AlertSink: Send + Sync {
  async fn play_alert(&self) -> LaundrifyResult<()>;

  async fn show_notice(&self, notice: &Notice) -> LaundrifyResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
  Granted,
  Denied,
  Undetermined,
}

/// Platform push service: permission prompts and device tokens.
#[async_trait]
pub trait PushRegistrar: Send + Sync {
  fn is_physical_device(&self) -> bool;

  async fn permission_status(&self) -> PermissionStatus;

  async fn request_permission(&self) -> PermissionStatus;

  async fn device_token(&self) -> LaundrifyResult<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushRegistration {
  Registered { token: String },
  PermissionDenied,
  /// Simulators and emulators cannot receive push.
  NotADevice,
}

/// Keeps the shop profile's push token in step with the device.
pub struct NotificationDispatcher {
  registrar: Arc<dyn PushRegistrar>,
  profiles: Arc<dyn ProfileStore>,
}

impl NotificationDispatcher {
  pub fn new(registrar: Arc<dyn PushRegistrar>, profiles: Arc<dyn ProfileStore>) -> Self {
    Self { registrar, profiles }
  }

  /// Requests permission if needed, fetches a token and overwrites the stored one.
  #[instrument(name = "NotificationDispatcher::register", skip(self), err(Display))]
  pub async fn register(&self, laundry_id: Uuid) -> LaundrifyResult<PushRegistration> {
    if !self.registrar.is_physical_device() {
      return Ok(PushRegistration::NotADevice);
    }

    let mut status = self.registrar.permission_status().await;
    if status != PermissionStatus::Granted {
      status = self.registrar.request_permission().await;
    }
    if status != PermissionStatus::Granted {
      info!("Push permission not granted.");
      return Ok(PushRegistration::PermissionDenied);
    }

    let token = self.registrar.device_token().await?;
    self.profiles.set_push_token(laundry_id, Some(&token)).await?;
    info!("Push token registered.");
    Ok(PushRegistration::Registered { token })
  }

  /// Clears the stored token so no pushes are routed to this shop.
  #[instrument(name = "NotificationDispatcher::disable", skip(self), err(Display))]
  pub async fn disable(&self, laundry_id: Uuid) -> LaundrifyResult<()> {
    self.profiles.set_push_token(laundry_id, None).await
  }

  /// Registration attempted in the background on session start; failures are only logged.
  pub async fn register_quietly(&self, laundry_id: Uuid) -> Option<String> {
    match self.register(laundry_id).await {
      Ok(PushRegistration::Registered { token }) => Some(token),
      Ok(_) => None,
      Err(e) => {
        warn!(error = %e, "Push token sync failed.");
        None
      }
    }
  }
}

impl std::fmt::Debug for NotificationDispatcher {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("NotificationDispatcher").finish_non_exhaustive()
  }
}
