//! Outlook event -> Zoho CRM meeting

use axum::{Json, Router, extract::State, routing::post};
use calsync_core::CalSyncError;
use calsync_provider_outlook::GraphEvent;
use calsync_provider_zoho::Meeting;
use serde::{Deserialize, Serialize};

use crate::convert::ToZoho;
use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/crm/meetings", post(create_meeting))
}

/// Either the id of an event in the user's Outlook calendar, or the event itself.
#[derive(Debug, Deserialize)]
pub struct CreateMeetingRequest {
    pub event_id: Option<String>,
    pub event: Option<GraphEvent>,
}

#[derive(Debug, Serialize)]
pub struct CreatedMeeting {
    pub id: String,
    pub title: String,
}

/// POST /crm/meetings - Record an Outlook event as a Zoho meeting
async fn create_meeting(
    State(state): State<AppState>,
    Json(req): Json<CreateMeetingRequest>,
) -> Result<Json<CreatedMeeting>, AppError> {
    let event = match (req.event_id, req.event) {
        (Some(id), None) => state.outlook.get_event(&id).await?,
        (None, Some(event)) => event,
        _ => {
            let message = "provide exactly one of event_id or event".to_string();
            return Err(CalSyncError::InvalidInput(message).into());
        }
    };

    let meeting: Meeting = event.to_zoho();
    if meeting.start_datetime.is_none() || meeting.end_datetime.is_none() {
        let message = "event has no usable start or end time".to_string();
        return Err(CalSyncError::InvalidInput(message).into());
    }

    let id = state.zoho.create_meeting(&meeting).await?;

    Ok(Json(CreatedMeeting {
        id,
        title: meeting.event_title,
    }))
}
