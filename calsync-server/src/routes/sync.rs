//! Event sync: Zoho CRM meetings into the Outlook calendar

use axum::{Json, Router, extract::State, routing::post};
use calsync_core::DateRange;
use calsync_provider_outlook::GraphEvent;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::convert::ToOutlook;
use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/sync/events", post(sync_events))
}

/// Optional bounds, `YYYY-MM-DD`. `to` is inclusive.
#[derive(Debug, Default, Deserialize)]
pub struct SyncRequest {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SyncFailure {
    pub index: usize,
    pub title: String,
    pub status: u16,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SyncSummary {
    pub fetched: usize,
    pub created: usize,
    pub failed: Vec<SyncFailure>,
}

/// POST /sync/events - Copy Zoho meetings in range into Outlook
async fn sync_events(
    State(state): State<AppState>,
    body: Option<Json<SyncRequest>>,
) -> Result<Json<SyncSummary>, AppError> {
    let request = body.map(|Json(req)| req).unwrap_or_default();
    let range = match (request.from.as_deref(), request.to.as_deref()) {
        (None, None) => DateRange::upcoming(state.sync.window_days),
        (from, to) => DateRange::from_args(from, to, state.sync.window_days)?,
    };

    let meetings = state.zoho.list_meetings(&range).await?;
    if meetings.is_empty() {
        info!(from = %range.from, to = %range.to, "No Zoho meetings to sync");
        return Ok(Json(SyncSummary {
            fetched: 0,
            created: 0,
            failed: Vec::new(),
        }));
    }

    let events: Vec<GraphEvent> = meetings.iter().map(ToOutlook::to_outlook).collect();
    let outcome = state.outlook.create_events_batched(&events).await?;

    let failed: Vec<SyncFailure> = outcome
        .failed
        .into_iter()
        .map(|failure| {
            let title = meetings
                .get(failure.index)
                .map(|m| m.event_title.clone())
                .unwrap_or_default();
            warn!(
                index = failure.index,
                title = %title,
                status = failure.status,
                error = %failure.error,
                "Meeting not synced"
            );

            SyncFailure {
                index: failure.index,
                title,
                status: failure.status,
                error: failure.error,
            }
        })
        .collect();

    info!(
        fetched = meetings.len(),
        created = outcome.created.len(),
        failed = failed.len(),
        "Event sync finished"
    );

    Ok(Json(SyncSummary {
        fetched: meetings.len(),
        created: outcome.created.len(),
        failed,
    }))
}
