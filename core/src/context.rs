// core/src/context.rs

//! Application-wide client state: theme and the signed-in session.

use tokio::sync::watch;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub user_id: Uuid,
  pub access_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSettings {
  pub dark_mode: bool,
  pub session: Option<Session>,
}

/// Holds [`ClientSettings`]; every change goes through [`ClientContext::update`]
/// and is observed by all subscribers.
#[derive(Debug)]
pub struct ClientContext {
  tx: watch::Sender<ClientSettings>,
}

impl Default for ClientContext {
  fn default() -> Self {
    Self::new(ClientSettings::default())
  }
}

impl ClientContext {
  pub fn new(initial: ClientSettings) -> Self {
    let (tx, _rx) = watch::channel(initial);
    Self { tx }
  }

  pub fn current(&self) -> ClientSettings {
    self.tx.borrow().clone()
  }

  /// Applies `change`; subscribers are woken only if the settings actually changed.
  pub fn update(&self, change: impl FnOnce(&mut ClientSettings)) -> bool {
    self.tx.send_if_modified(|settings| {
      let before = settings.clone();
      change(settings);
      *settings != before
    })
  }

  pub fn subscribe(&self) -> watch::Receiver<ClientSettings> {
    self.tx.subscribe()
  }

  pub fn set_dark_mode(&self, dark_mode: bool) -> bool {
    self.update(|s| s.dark_mode = dark_mode)
  }

  pub fn sign_in(&self, session: Session) -> bool {
    self.update(|s| s.session = Some(session))
  }

  pub fn sign_out(&self) -> bool {
    self.update(|s| s.session = None)
  }
}
