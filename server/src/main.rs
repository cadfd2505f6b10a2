// src/main.rs

mod config;
mod db;
mod errors;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::db::PgPaymentLedger;
use crate::services::flutterwave::{FlutterwaveClient, SubaccountTerms};
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use laundrify::WebhookProcessor;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

fn init_tracing() {
  let builder = tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE);
  // LOG_FORMAT=json for log shippers; human-readable otherwise.
  if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
    builder.json().init();
  } else {
    builder.init();
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  init_tracing();
  tracing::info!("Starting Laundrify functions server...");

  let app_config = AppConfig::from_env().map_err(|e| {
    tracing::error!(error = %e, "Failed to load application configuration.");
    std::io::Error::other(e.to_string())
  })?;

  let db_pool = PgPool::connect(&app_config.database_url).await.map_err(|e| {
    tracing::error!(error = %e, "Failed to connect to the database.");
    std::io::Error::other(e.to_string())
  })?;
  tracing::info!("Successfully connected to the database.");

  let ledger = Arc::new(PgPaymentLedger::new(db_pool));
  let flutterwave = FlutterwaveClient::new(
    app_config.flw_api_base.clone(),
    app_config.flw_secret_key.clone(),
    SubaccountTerms {
      country: app_config.subaccount_country.clone(),
      contact_mobile: app_config.subaccount_contact_mobile.clone(),
      split_value: app_config.platform_split,
    },
  );

  let app_state = AppState {
    webhooks: Arc::new(WebhookProcessor::new(ledger, app_config.flw_secret_hash.as_str())),
    subaccounts: Arc::new(flutterwave),
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
