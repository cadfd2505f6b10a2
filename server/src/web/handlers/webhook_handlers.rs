// src/web/handlers/webhook_handlers.rs

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use laundrify::webhook::{WebhookReply, SIGNATURE_HEADER};
use tracing::{info, instrument};

use crate::state::AppState;

/// Gateway payment callback. The reply status decides whether the gateway retries.
#[instrument(name = "handler::flutterwave_webhook", skip(app_state, req, body), fields(payload_bytes = body.len()))]
pub async fn flutterwave_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> HttpResponse {
  let signature = req.headers().get(SIGNATURE_HEADER).and_then(|h| h.to_str().ok());

  let result = app_state.webhooks.process(signature, &body).await;
  let reply = WebhookReply::from_result(&result);
  info!(status = reply.status, "Webhook handled.");

  let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_REQUEST);
  HttpResponse::build(status).json(reply.body)
}
