// src/web/routes.rs

use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Paths mirror the hosted-function names the mobile client and the gateway already call.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.route("/health", web::get().to(health_check_handler)).service(
    web::scope("/functions/v1")
      .route(
        "/flutterwave-webhook",
        web::post().to(crate::web::handlers::webhook_handlers::flutterwave_webhook_handler),
      )
      .route(
        "/create-subaccount",
        web::post().to(crate::web::handlers::subaccount_handlers::create_subaccount_handler),
      ),
  );
}
