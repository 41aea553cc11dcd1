//! Call record intake handler

use crate::dto::{ApiResponse, CallRecordRequest, ProcessedResponse};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use callbill_core::{traits::Repository, AppError};
use tracing::{debug, info, instrument, warn};

/// Message for an unreadable or empty request body
pub const INVALID_DATA_REQUEST: &str = "Invalid data request.";

/// Store a batch of call records
///
/// POST /api/v1/phone_call
///
/// Every record is validated before any is stored; records are then saved
/// in request order. A duplicate (call id, type) stops the batch with 409,
/// keeping the records saved before it.
#[instrument(skip(state, body), fields(bytes = body.len()))]
pub async fn create_phone_calls(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let requests: Vec<CallRecordRequest> = serde_json::from_slice(&body).map_err(|e| {
        debug!("Unreadable call record payload: {}", e);
        AppError::InvalidInput(INVALID_DATA_REQUEST.to_string())
    })?;

    if requests.is_empty() {
        return Err(AppError::InvalidInput(INVALID_DATA_REQUEST.to_string()));
    }

    let mut records = Vec::with_capacity(requests.len());
    let mut messages = Vec::new();
    for (index, request) in requests.iter().enumerate() {
        match request.to_call_record() {
            Ok(record) => records.push(record),
            Err(errors) => messages.extend(
                errors
                    .into_iter()
                    .map(|message| format!("Record {}: {}", index, message)),
            ),
        }
    }

    if !messages.is_empty() {
        warn!(rejected = messages.len(), "Call record validation failed");
        return Err(AppError::Validation(messages.join(" ")));
    }

    for record in &records {
        state.records.save(record).await?;
    }

    info!(processed = records.len(), "Call records stored");

    Ok(HttpResponse::Created().json(ApiResponse::with_message(
        ProcessedResponse {
            processed: records.len(),
        },
        "Call records stored.",
    )))
}

/// Configure call record routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/phone_call", web::post().to(create_phone_calls));
}
