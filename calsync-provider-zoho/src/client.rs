use calsync_core::config::ZohoConfig;
use calsync_core::http::read_json_or_default;
use calsync_core::{ApiClient, AuthScheme, CalSyncError, CalSyncResult, DateRange, RetryPolicy};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::types::{
    Contact, ContactUpdate, ListResponse, Meeting, Task, WriteRequest, WriteResponse, WriteResult,
};

pub(crate) const SERVICE: &str = "zoho";

/// Largest page Zoho CRM serves.
pub const MAX_PER_PAGE: u32 = 200;

/// Zoho search serves at most 2000 records, 10 pages of 200.
const MAX_PAGES: u32 = 10;

/// CRM modules calsync reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Leads,
    Campaigns,
    Deals,
    Contacts,
    Events,
    Tasks,
    Notes,
}

impl Module {
    pub fn api_name(self) -> &'static str {
        match self {
            Module::Leads => "Leads",
            Module::Campaigns => "Campaigns",
            Module::Deals => "Deals",
            Module::Contacts => "Contacts",
            Module::Events => "Events",
            Module::Tasks => "Tasks",
            Module::Notes => "Notes",
        }
    }
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.api_name())
    }
}

/// One page of a module listing.
#[derive(Debug, Clone, Serialize)]
pub struct RecordPage<T> {
    pub records: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub more_records: bool,
}

/// Zoho CRM v2 client.
pub struct ZohoClient {
    api: ApiClient,
}

impl ZohoClient {
    pub fn new(config: &ZohoConfig, retry: RetryPolicy) -> CalSyncResult<Self> {
        let api = ApiClient::new(
            SERVICE,
            config.credentials(),
            AuthScheme::ZohoOAuthToken,
            &config.api_base,
            retry,
        )?;
        Ok(ZohoClient { api })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[instrument(skip(self, module), fields(module = %module))]
    pub async fn list_records<T: DeserializeOwned>(
        &self,
        module: Module,
        page: u32,
        per_page: u32,
    ) -> CalSyncResult<RecordPage<T>> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PER_PAGE);
        let query = [("page", page.to_string()), ("per_page", per_page.to_string())];

        let url = self.api.url(module.api_name());
        let response = self
            .api
            .send("zoho.list_records", |http| http.get(&url).query(&query))
            .await?;
        let body: ListResponse<T> = read_json_or_default(SERVICE, response).await?;

        let more_records = body.info.map(|info| info.more_records).unwrap_or(false);
        debug!(count = body.data.len(), more_records, "Fetched Zoho records");

        Ok(RecordPage {
            records: body.data,
            page,
            per_page,
            more_records,
        })
    }

    /// Meetings whose start falls inside `range`, found through the search
    /// endpoint so only the window is read.
    #[instrument(skip_all, fields(from = %range.from, to = %range.to))]
    pub async fn list_meetings(&self, range: &DateRange) -> CalSyncResult<Vec<Meeting>> {
        let criteria = format!(
            "((Start_DateTime:greater_equal:{})and(Start_DateTime:less_than:{}))",
            zoho_datetime(range.from),
            zoho_datetime(range.to),
        );
        let url = self.api.url(&format!("{}/search", Module::Events));
        let mut meetings = Vec::new();

        for page in 1..=MAX_PAGES {
            let query = [
                ("criteria", criteria.clone()),
                ("page", page.to_string()),
                ("per_page", MAX_PER_PAGE.to_string()),
            ];
            let response = self
                .api
                .send("zoho.search_meetings", |http| http.get(&url).query(&query))
                .await?;
            let body: ListResponse<Meeting> = read_json_or_default(SERVICE, response).await?;

            let more_records = body.info.is_some_and(|info| info.more_records);
            meetings.extend(body.data.into_iter().filter(|m| {
                m.start_datetime
                    .is_some_and(|start| range.contains(start.with_timezone(&Utc)))
            }));

            if !more_records {
                debug!(count = meetings.len(), "Zoho meetings in range");
                return Ok(meetings);
            }
        }

        warn!(pages = MAX_PAGES, "Zoho meeting search has more pages than allowed");
        Err(CalSyncError::Truncated {
            service: SERVICE,
            pages: MAX_PAGES,
        })
    }

    /// Insert a meeting, returning its record id.
    #[instrument(skip_all, fields(title = %meeting.event_title))]
    pub async fn create_meeting(&self, meeting: &Meeting) -> CalSyncResult<String> {
        let id = self.insert(Module::Events, meeting).await?;
        info!(id = %id, "Created Zoho meeting");
        Ok(id)
    }

    /// Insert a task, returning its record id.
    #[instrument(skip_all, fields(subject = %task.subject))]
    pub async fn create_task(&self, task: &Task) -> CalSyncResult<String> {
        let id = self.insert(Module::Tasks, task).await?;
        info!(id = %id, "Created Zoho task");
        Ok(id)
    }

    #[instrument(skip(self, update))]
    pub async fn update_contact(
        &self,
        contact_id: &str,
        update: &ContactUpdate,
    ) -> CalSyncResult<String> {
        let contact_id = record_id(contact_id)?;
        if update.is_empty() {
            return Err(CalSyncError::InvalidInput("contact update has no fields".into()));
        }

        let url = self.api.url(&format!("{}/{contact_id}", Module::Contacts));
        let body = WriteRequest { data: [update] };
        let response = self
            .api
            .send("zoho.update_contact", |http| http.put(&url).json(&body))
            .await?;

        let result = first_result(read_json_or_default(SERVICE, response).await?)?;
        Ok(result_id(&result).unwrap_or_else(|| contact_id.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn find_contact_by_email(&self, email: &str) -> CalSyncResult<Option<Contact>> {
        let email = email.trim();
        if email.is_empty() {
            return Err(CalSyncError::InvalidInput("email must not be empty".into()));
        }

        let url = self.api.url("Contacts/search");
        let query = [("email", email)];
        let response = self
            .api
            .send("zoho.find_contact", |http| http.get(&url).query(&query))
            .await?;

        let body: ListResponse<Contact> = read_json_or_default(SERVICE, response).await?;
        Ok(body.data.into_iter().next())
    }

    /// Records of `related` linked to `module/{id}`, e.g. the Notes of a contact.
    #[instrument(skip(self, module, related), fields(module = %module, related = %related))]
    pub async fn related_records<T: DeserializeOwned>(
        &self,
        module: Module,
        id: &str,
        related: Module,
    ) -> CalSyncResult<Vec<T>> {
        let id = record_id(id)?;
        let url = self.api.url(&format!("{module}/{id}/{related}"));
        let response = self
            .api
            .send("zoho.related_records", |http| http.get(&url))
            .await?;

        let body: ListResponse<T> = read_json_or_default(SERVICE, response).await?;
        Ok(body.data)
    }

    async fn insert<T: Serialize>(&self, module: Module, record: &T) -> CalSyncResult<String> {
        let url = self.api.url(module.api_name());
        let body = WriteRequest { data: [record] };
        let response = self
            .api
            .send("zoho.insert", |http| http.post(&url).json(&body))
            .await?;

        let result = first_result(read_json_or_default(SERVICE, response).await?)?;
        result_id(&result)
            .ok_or_else(|| CalSyncError::decode(SERVICE, format!("{module} insert returned no id")))
    }
}

/// Zoho reports per-record failures inside a 2xx body.
fn first_result(response: WriteResponse) -> CalSyncResult<WriteResult> {
    let Some(result) = response.data.into_iter().next() else {
        return Err(CalSyncError::decode(SERVICE, "write response has no data"));
    };

    if result.status.eq_ignore_ascii_case("error") {
        let body = serde_json::to_string(&result).unwrap_or_else(|_| result.message.clone());
        return Err(CalSyncError::upstream(SERVICE, 400, body));
    }
    Ok(result)
}

fn result_id(result: &WriteResult) -> Option<String> {
    result.details.get("id").and_then(|id| match id {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Search criteria take ISO 8601 with an explicit offset.
fn zoho_datetime(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
}

/// Zoho record ids are numeric; anything else never reaches the URL path.
fn record_id(id: &str) -> CalSyncResult<&str> {
    let id = id.trim();
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CalSyncError::InvalidInput(format!("invalid Zoho record id: {id:?}")));
    }
    Ok(id)
}
