//! Zoho CRM module listings and contact updates

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use calsync_provider_zoho::{Campaign, Contact, Deal, Lead, MAX_PER_PAGE, Module, RecordPage};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::convert::ToZoho;
use crate::routes::AppError;
use crate::routes::tasks::CreatedRecord;
use crate::state::AppState;

const DEFAULT_PER_PAGE: u32 = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/crm/leads", get(list_leads))
        .route("/crm/campaigns", get(list_campaigns))
        .route("/crm/deals", get(list_deals))
        .route("/crm/contacts", get(list_contacts))
        .route("/crm/contacts/{id}", put(update_contact))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageQuery {
    fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }
}

/// Contact fields in snake_case. Any other key is passed to Zoho untouched,
/// so raw field names (`Lead_Source`, custom fields) work too.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateContactRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub title: Option<String>,
    pub account_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

async fn list_module<T: DeserializeOwned>(
    state: &AppState,
    module: Module,
    query: &PageQuery,
) -> Result<Json<RecordPage<T>>, AppError> {
    let page = state.zoho.list_records(module, query.page(), query.per_page()).await?;
    Ok(Json(page))
}

/// GET /crm/leads
async fn list_leads(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<RecordPage<Lead>>, AppError> {
    list_module(&state, Module::Leads, &query).await
}

/// GET /crm/campaigns
async fn list_campaigns(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<RecordPage<Campaign>>, AppError> {
    list_module(&state, Module::Campaigns, &query).await
}

/// GET /crm/deals
async fn list_deals(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<RecordPage<Deal>>, AppError> {
    list_module(&state, Module::Deals, &query).await
}

/// GET /crm/contacts
async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<RecordPage<Contact>>, AppError> {
    list_module(&state, Module::Contacts, &query).await
}

/// PUT /crm/contacts/{id} - Update a contact's fields
async fn update_contact(
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
    Json(req): Json<UpdateContactRequest>,
) -> Result<Json<CreatedRecord>, AppError> {
    let id = state.zoho.update_contact(&contact_id, &req.to_zoho()).await?;
    Ok(Json(CreatedRecord { id }))
}
