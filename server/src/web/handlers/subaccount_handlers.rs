// src/web/handlers/subaccount_handlers.rs

use actix_web::{web, HttpResponse};
use laundrify::profile::SubaccountRequest;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;

#[instrument(name = "handler::create_subaccount", skip(app_state, body))]
pub async fn create_subaccount_handler(
  app_state: web::Data<AppState>,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let request: SubaccountRequest =
    serde_json::from_slice(&body).map_err(|e| AppError::Validation(format!("Invalid request body: {}", e)))?;

  let created = app_state.subaccounts.create_subaccount(&request).await?;
  info!(subaccount_id = %created.subaccount_id, "Subaccount registered for shop.");
  Ok(HttpResponse::Ok().json(created))
}

#[cfg(test)]
mod tests {
  use super::super::test_support::{state, FakeLedger};
  use crate::web::configure_app_routes;
  use actix_web::{test, web, App};
  use serde_json::{json, Value};
  use std::sync::Arc;

  fn request_body() -> Value {
    json!({
      "account_bank": "044",
      "account_number": "0690000031",
      "business_name": "Sparkle Cleaners",
      "business_email": "owner@sparkle.ng"
    })
  }

  #[actix_web::test]
  async fn returns_subaccount_id_on_success() {
    let app = test::init_service(
      App::new()
        .app_data(web::Data::new(state(Arc::new(FakeLedger::default()), true)))
        .configure(configure_app_routes),
    )
    .await;

    let req = test::TestRequest::post()
      .uri("/functions/v1/create-subaccount")
      .set_json(request_body())
      .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "subaccount_id": "RS_044" }));
  }

  #[actix_web::test]
  async fn gateway_refusal_is_bad_request_with_message() {
    let app = test::init_service(
      App::new()
        .app_data(web::Data::new(state(Arc::new(FakeLedger::default()), false)))
        .configure(configure_app_routes),
    )
    .await;

    let req = test::TestRequest::post()
      .uri("/functions/v1/create-subaccount")
      .set_json(request_body())
      .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Flutterwave subaccount creation failed" }));
  }

  #[actix_web::test]
  async fn health_probe_answers_ok() {
    let app = test::init_service(
      App::new()
        .app_data(web::Data::new(state(Arc::new(FakeLedger::default()), true)))
        .configure(configure_app_routes),
    )
    .await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "status": "ok" }));
  }
}
