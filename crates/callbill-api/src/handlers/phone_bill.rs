//! Bill handlers

use crate::dto::{ApiResponse, BillResponse, PhoneBillQuery, PricedCallResponse};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use callbill_core::{traits::PricedCallRepository, AppError};
use tracing::{debug, instrument};

/// Build, store, and return a subscriber's bill
///
/// GET /api/v1/phone_bill?subscriber=...&period=MM/YYYY
#[instrument(skip(state))]
pub async fn get_phone_bill(
    state: web::Data<AppState>,
    query: web::Query<PhoneBillQuery>,
) -> Result<HttpResponse, AppError> {
    let (subscriber, period) = query.resolve(state.today())?;
    debug!(%subscriber, %period, "Building bill");

    let bill = state.aggregator().run(&subscriber, period).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(BillResponse::from(&bill))))
}

/// Return a stored priced call
///
/// GET /api/v1/phone_bill/calls/{call_identifier}
#[instrument(skip(state))]
pub async fn get_priced_call(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let call_identifier = path.into_inner();

    let call = state
        .priced_calls
        .find_by_call_identifier(call_identifier)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Priced call {} not found", call_identifier)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(PricedCallResponse::from(&call))))
}

/// Configure bill routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/phone_bill")
            .route("", web::get().to(get_phone_bill))
            .route("/calls/{call_identifier}", web::get().to(get_priced_call)),
    );
}
