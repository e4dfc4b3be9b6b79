//! Batch ingestion handler.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use tracing::{debug, error, info};
use uuid::Uuid;

use ghostflow_protocols::{SecureEvent, StoredEvent};
use ghostflow_store::OrgScope;

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::state::AppState;

/// Hard cap on events per batch.
pub const MAX_BATCH_EVENTS: usize = 100;

/// POST /ingest-events
///
/// Validates, rate-limits, and durably stores one transmitter batch, then
/// fans detection out per org without delaying the 202.
pub async fn ingest_events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, ApiError> {
    state.increment_requests();

    let events_value = body
        .get("events")
        .ok_or_else(|| ApiError::InvalidBatch("events missing".into()))?;
    let events_array = events_value
        .as_array()
        .ok_or_else(|| ApiError::InvalidBatch("events is not an array".into()))?;
    if events_array.len() > MAX_BATCH_EVENTS {
        return Err(ApiError::BatchTooLarge { max: MAX_BATCH_EVENTS });
    }

    let events: Vec<SecureEvent> = serde_json::from_value(events_value.clone())
        .map_err(|e| ApiError::InvalidBatch(e.to_string()))?;

    // Device key: header wins, body fingerprint is the fallback.
    let device_fingerprint = headers
        .get("X-Ghost-Device")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            body.get("deviceFingerprint")
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown-device".to_string());

    if !state.rate_limiter.try_accept(&device_fingerprint, events.len() as u32) {
        return Err(ApiError::RateLimitExceeded(device_fingerprint));
    }

    let batch_id = headers
        .get("X-Ghost-Batch-Id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| body.get("batchId").and_then(|v| v.as_str()).map(str::to_string))
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let accepted = events.len();
    let now = Utc::now();
    let mut orgs: Vec<String> = Vec::new();
    let rows: Vec<StoredEvent> = events
        .into_iter()
        .map(|event| {
            if !orgs.contains(&event.org_id) {
                orgs.push(event.org_id.clone());
            }
            StoredEvent {
                id: Uuid::new_v4(),
                event,
                device_fingerprint: device_fingerprint.clone(),
                batch_id: batch_id.clone(),
                ingested_at: now,
            }
        })
        .collect();

    state
        .store
        .insert_events(&OrgScope::service(), rows)
        .await
        .map_err(|e| ApiError::InsertFailed(e.to_string()))?;
    info!(batch_id = %batch_id, accepted, device = %device_fingerprint, "batch ingested");

    // Fire-and-forget: the 202 never waits on detection.
    for org_id in orgs {
        let detector = state.detector.clone();
        let batch = batch_id.clone();
        tokio::spawn(async move {
            debug!(org_id = %org_id, batch = %batch, "async detection triggered");
            if let Err(err) = detector.detect(&org_id, "ingest").await {
                error!(org_id = %org_id, %err, "pattern detection failed");
            }
        });
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(Envelope::ok(serde_json::json!({
            "accepted": accepted,
            "batchId": batch_id,
        }))),
    ))
}

/// Any non-POST method on the ingest path.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
