//! API layer for CallBill
//!
//! HTTP handlers for call record intake, subscriber bills, and tariff
//! quotes.

#![forbid(unsafe_code)]

pub mod dto;
pub mod handlers;
pub mod state;

use actix_web::web;
use callbill_core::AppError;

pub use dto::ApiResponse;
pub use handlers::{configure_health, configure_phone_bill, configure_phone_call, configure_tariff};
pub use state::AppState;

/// Register all `/api/v1` routes
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(configure_health)
            .configure(configure_phone_call)
            .configure(configure_phone_bill)
            .configure(configure_tariff),
    );
}

/// JSON extractor config answering malformed bodies in the API error format
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!("Rejected JSON body: {}", err);
        AppError::InvalidInput(handlers::phone_call::INVALID_DATA_REQUEST.to_string()).into()
    })
}

/// Query extractor config answering malformed query strings in the API error format
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        AppError::InvalidInput(err.to_string()).into()
    })
}
