// core/src/webhook.rs

//! Payment gateway callback handling: the only path that marks an order paid.
//!
//! One invocation per callback, no state kept between calls. The shared-secret
//! header is checked before the body is even parsed; only a successful
//! `charge.completed` touches the store, with exactly one update keyed by the
//! transaction reference.

use crate::error::{LaundrifyError, LaundrifyResult};
use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
use crate::store::PaymentLedger;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const SIGNATURE_HEADER: &str = "verif-hash";
pub const CHARGE_COMPLETED: &str = "charge.completed";
pub const CHARGE_SUCCESSFUL: &str = "successful";

/// The parts of the gateway's callback body this handler reads.
///
/// Read loosely from any JSON value: a body of an unexpected shape is a valid
/// callback that is simply not a successful charge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatewayEvent {
  pub event: Option<String>,
  pub status: Option<String>,
  pub tx_ref: Option<Value>,
}

impl GatewayEvent {
  /// Fails only when the body is not JSON at all.
  pub fn parse(body: &[u8]) -> LaundrifyResult<Self> {
    let value: Value = serde_json::from_slice(body).map_err(|e| LaundrifyError::InvalidPayload(e.to_string()))?;
    let text = |field: Option<&Value>| field.and_then(Value::as_str).map(str::to_string);
    Ok(Self {
      event: text(value.get("event")),
      status: text(value.pointer("/data/status")),
      tx_ref: value.pointer("/data/tx_ref").cloned(),
    })
  }

  pub fn is_successful_charge(&self) -> bool {
    self.event.as_deref() == Some(CHARGE_COMPLETED) && self.status.as_deref() == Some(CHARGE_SUCCESSFUL)
  }

  /// The order the charge pays for, from `data.tx_ref`.
  pub fn order_id(&self) -> LaundrifyResult<Uuid> {
    match &self.tx_ref {
      Some(Value::String(raw)) => Uuid::parse_str(raw.trim())
        .map_err(|e| LaundrifyError::InvalidPayload(format!("tx_ref '{}' is not an order id: {}", raw, e))),
      Some(other) => Err(LaundrifyError::InvalidPayload(format!("tx_ref {} is not an order id", other))),
      None => Err(LaundrifyError::InvalidPayload("missing data.tx_ref".to_string())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
  /// The order was marked paid and received.
  Applied { order_id: Uuid, rows: u64 },
  /// A valid callback this system does not act on.
  Ignored { event: String },
}

/// HTTP status and JSON body owed to the gateway for a processing result.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookReply {
  pub status: u16,
  pub body: Value,
}

impl WebhookReply {
  /// 200 for applied or ignored callbacks, 401 for a bad signature, 400 for
  /// anything else so the gateway retries.
  pub fn from_result(result: &LaundrifyResult<WebhookOutcome>) -> Self {
    match result {
      Ok(_) => Self {
        status: 200,
        body: json!({ "status": "success" }),
      },
      Err(LaundrifyError::Unauthorized) => Self {
        status: 401,
        body: json!({ "error": "Unauthorized" }),
      },
      Err(e) => Self {
        status: 400,
        body: json!({ "error": e.to_string() }),
      },
    }
  }
}

struct WebhookCtxData {
  ledger: Arc<dyn PaymentLedger>,
  secret: Arc<str>,
  signature: Option<String>,
  body: Vec<u8>,
  event: Option<GatewayEvent>,
  outcome: Option<WebhookOutcome>,
}

/// Compares without short-circuiting on the first differing byte.
fn signatures_match(provided: &str, expected: &str) -> bool {
  let (a, b) = (provided.as_bytes(), expected.as_bytes());
  if a.len() != b.len() {
    return false;
  }
  a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub struct WebhookProcessor {
  ledger: Arc<dyn PaymentLedger>,
  secret: Arc<str>,
  pipeline: Pipeline<WebhookCtxData, LaundrifyError>,
}

impl WebhookProcessor {
  pub fn new(ledger: Arc<dyn PaymentLedger>, secret: impl Into<Arc<str>>) -> Self {
    Self {
      ledger,
      secret: secret.into(),
      pipeline: build_webhook_pipeline(),
    }
  }

  #[instrument(name = "WebhookProcessor::process", skip_all, fields(payload_bytes = body.len()), err(Display))]
  pub async fn process(&self, signature: Option<&str>, body: &[u8]) -> LaundrifyResult<WebhookOutcome> {
    let ctx_data = ContextData::new(WebhookCtxData {
      ledger: self.ledger.clone(),
      secret: self.secret.clone(),
      signature: signature.map(str::to_string),
      body: body.to_vec(),
      event: None,
      outcome: None,
    });

    let run = self.pipeline.run(ctx_data.clone()).await?;
    let outcome = ctx_data.write().outcome.take();
    match (run, outcome) {
      (_, Some(outcome)) => Ok(outcome),
      (PipelineResult::Completed, None) | (PipelineResult::Stopped, None) => Err(LaundrifyError::InvalidPayload(
        "webhook processing ended without an outcome".to_string(),
      )),
    }
  }
}

impl std::fmt::Debug for WebhookProcessor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WebhookProcessor")
      .field("pipeline", &self.pipeline)
      .finish_non_exhaustive()
  }
}

fn build_webhook_pipeline() -> Pipeline<WebhookCtxData, LaundrifyError> {
  let mut p = Pipeline::<WebhookCtxData, LaundrifyError>::new(
    "payment_webhook",
    &[
      ("verify_signature", false, None),
      ("parse_payload", false, None),
      ("route_event", false, None),
      ("mark_order_paid", false, None),
    ],
  );

  p.on("verify_signature", |ctx: ContextData<WebhookCtxData>| async move {
    let authorized = {
      let guard = ctx.read();
      guard
        .signature
        .as_deref()
        .is_some_and(|provided| signatures_match(provided, &guard.secret))
    };
    if !authorized {
      warn!("Webhook signature missing or invalid.");
      return Err(LaundrifyError::Unauthorized);
    }
    Ok::<_, LaundrifyError>(PipelineControl::Continue)
  });

  p.on("parse_payload", |ctx: ContextData<WebhookCtxData>| async move {
    let event = GatewayEvent::parse(&ctx.read().body)?;
    ctx.write().event = Some(event);
    Ok::<_, LaundrifyError>(PipelineControl::Continue)
  });

  p.on("route_event", |ctx: ContextData<WebhookCtxData>| async move {
    let mut guard = ctx.write();
    let ignored = match &guard.event {
      Some(event) if event.is_successful_charge() => None,
      Some(event) => Some(event.event.clone().unwrap_or_default()),
      None => Some(String::new()),
    };
    if let Some(event) = ignored {
      info!(event = %event, "Webhook event ignored.");
      guard.outcome = Some(WebhookOutcome::Ignored { event });
      return Ok(PipelineControl::Stop);
    }
    Ok::<_, LaundrifyError>(PipelineControl::Continue)
  });

  p.on("mark_order_paid", |ctx: ContextData<WebhookCtxData>| async move {
    let (ledger, order_id) = {
      let guard = ctx.read();
      let order_id = match &guard.event {
        Some(event) => event.order_id(),
        None => Err(LaundrifyError::InvalidPayload("payload not parsed".to_string())),
      };
      (guard.ledger.clone(), order_id)
    };
    let order_id = order_id?;

    let rows = ledger.mark_paid(order_id).await?;
    if rows == 0 {
      warn!(%order_id, "Payment confirmed for an unknown order.");
    } else {
      info!(%order_id, "Order marked paid.");
    }
    ctx.write().outcome = Some(WebhookOutcome::Applied { order_id, rows });
    Ok::<_, LaundrifyError>(PipelineControl::Continue)
  });

  p
}
