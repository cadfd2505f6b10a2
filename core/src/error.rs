// core/src/error.rs
use crate::order::OrderStatus;
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Misconfiguration of a [`crate::pipeline::Pipeline`], detected when it runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
  #[error("Step '{step_name}' is not defined in pipeline '{pipeline}'")]
  StepNotFound { pipeline: &'static str, step_name: String },

  #[error("Handler missing for non-optional step '{step_name}' in pipeline '{pipeline}'")]
  HandlerMissing { pipeline: &'static str, step_name: String },
}

#[derive(Debug, Error)]
pub enum LaundrifyError {
  /// Webhook signature absent or not matching the configured secret.
  #[error("Unauthorized")]
  Unauthorized,

  /// The requested status is not the immediate successor of the current one.
  #[error("Cannot move order from '{from}' to '{to}'")]
  IllegalTransition { from: OrderStatus, to: OrderStatus },

  /// The conditional status write matched no row: the order changed underneath us.
  #[error("Order {order_id} is no longer in status '{expected}'")]
  StaleOrder {
    order_id: uuid::Uuid,
    expected: OrderStatus,
  },

  #[error("Invalid payload: {0}")]
  InvalidPayload(String),

  #[error("{0}")]
  Validation(String),

  #[error("{0} not found")]
  NotFound(String),

  #[error("Remote call '{operation}' failed: {source}")]
  Remote {
    operation: &'static str,
    #[source]
    source: AnyhowError,
  },

  #[error(transparent)]
  Pipeline(#[from] PipelineError),
}

impl LaundrifyError {
  pub fn remote(operation: &'static str, source: impl Into<AnyhowError>) -> Self {
    LaundrifyError::Remote {
      operation,
      source: source.into(),
    }
  }

  /// Precondition failures leave state untouched and are shown to the owner as-is.
  pub fn is_precondition(&self) -> bool {
    matches!(
      self,
      LaundrifyError::IllegalTransition { .. } | LaundrifyError::StaleOrder { .. } | LaundrifyError::Validation(_)
    )
  }
}

pub type LaundrifyResult<T, E = LaundrifyError> = std::result::Result<T, E>;
