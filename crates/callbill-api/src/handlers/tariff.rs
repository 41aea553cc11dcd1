//! Tariff quote handler

use crate::dto::{ApiResponse, QuoteRequest, QuoteResponse};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use callbill_core::AppError;
use tracing::instrument;

/// Price a hypothetical call without touching storage
///
/// POST /api/v1/tariff/quote
#[instrument(skip(state, req))]
pub async fn quote(
    state: web::Data<AppState>,
    req: web::Json<QuoteRequest>,
) -> Result<HttpResponse, AppError> {
    let (start, end) = req.instants()?;
    let quote = state.pricer.quote(start, end)?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(QuoteResponse::new(
        &quote,
        state.pricer.schedule(),
    ))))
}

/// Configure tariff routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/tariff/quote", web::post().to(quote));
}
