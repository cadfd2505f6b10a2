// src/web/handlers/mod.rs

pub mod subaccount_handlers;
pub mod webhook_handlers;
