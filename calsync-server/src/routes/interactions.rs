//! Customer-interaction summary: what the CRM and the mailbox know about one address

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use calsync_core::CalSyncError;
use calsync_provider_outlook::GraphMessage;
use calsync_provider_zoho::{Contact, Deal, Module, Note};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::routes::AppError;
use crate::state::AppState;

/// Recent messages fetched per summary.
const RECENT_EMAIL_LIMIT: u32 = 10;

pub fn router() -> Router<AppState> {
    Router::new().route("/crm/interactions", get(interactions))
}

#[derive(Debug, Deserialize)]
pub struct InteractionQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct EmailSummary {
    pub id: String,
    pub subject: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
    pub preview: Option<String>,
    pub web_link: Option<String>,
}

impl From<GraphMessage> for EmailSummary {
    fn from(message: GraphMessage) -> Self {
        EmailSummary {
            id: message.id,
            subject: message.subject,
            received_at: message.received_date_time,
            preview: message.body_preview,
            web_link: message.web_link,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InteractionSummary {
    pub email: String,
    pub contact: Option<Contact>,
    pub deals: Vec<Deal>,
    pub notes: Vec<Note>,
    pub recent_emails: Vec<EmailSummary>,
    pub email_count: usize,
    pub last_email_at: Option<DateTime<Utc>>,
}

/// GET /crm/interactions?email= - Contact, deals, notes and recent mail for one address
async fn interactions(
    State(state): State<AppState>,
    Query(query): Query<InteractionQuery>,
) -> Result<Json<InteractionSummary>, AppError> {
    let email = query.email.trim().to_string();
    if !email.contains('@') {
        let message = format!("not an email address: {email:?}");
        return Err(CalSyncError::InvalidInput(message).into());
    }

    let (contact, messages) = tokio::try_join!(
        state.zoho.find_contact_by_email(&email),
        state.outlook.recent_messages_from(&email, RECENT_EMAIL_LIMIT),
    )?;

    let (deals, notes) = match &contact {
        Some(contact) => tokio::try_join!(
            state
                .zoho
                .related_records::<Deal>(Module::Contacts, &contact.id, Module::Deals),
            state
                .zoho
                .related_records::<Note>(Module::Contacts, &contact.id, Module::Notes),
        )?,
        None => (Vec::new(), Vec::new()),
    };

    debug!(
        found = contact.is_some(),
        deals = deals.len(),
        notes = notes.len(),
        emails = messages.len(),
        "Interaction summary assembled"
    );

    // messages arrive newest first
    let last_email_at = messages.first().and_then(|m| m.received_date_time);
    let recent_emails: Vec<EmailSummary> =
        messages.into_iter().map(EmailSummary::from).collect();

    Ok(Json(InteractionSummary {
        email,
        contact,
        deals,
        notes,
        email_count: recent_emails.len(),
        recent_emails,
        last_email_at,
    }))
}
