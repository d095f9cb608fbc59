use calsync_core::config::OutlookConfig;
use calsync_core::http::read_json;
use calsync_core::{ApiClient, AuthScheme, CalSyncError, CalSyncResult, DateRange, RetryPolicy};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::types::{GraphEvent, GraphMessage, ListResponse};

pub(crate) const SERVICE: &str = "outlook";

/// Graph page size for collection reads.
const PAGE_SIZE: u32 = 100;

/// Upper bound on `@odata.nextLink` pages followed per listing.
const MAX_PAGES: u32 = 20;

/// Lower bound that puts `receivedDateTime` first in message filters.
const RECEIVED_SINCE: &str = "1900-01-01T00:00:00Z";

/// Ask Graph to express every `dateTime` in UTC.
const PREFER_UTC: &str = "outlook.timezone=\"UTC\"";

/// Microsoft Graph client for the signed-in user's calendar and mailbox.
pub struct OutlookClient {
    pub(crate) api: ApiClient,
}

impl OutlookClient {
    pub fn new(config: &OutlookConfig, retry: RetryPolicy) -> CalSyncResult<Self> {
        let api = ApiClient::new(
            SERVICE,
            config.credentials(),
            AuthScheme::Bearer,
            &config.api_base,
            retry,
        )?;
        Ok(OutlookClient { api })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Events (with recurring instances expanded) overlapping `range`.
    #[instrument(skip_all, fields(from = %range.from, to = %range.to))]
    pub async fn list_events(&self, range: &DateRange) -> CalSyncResult<Vec<GraphEvent>> {
        let query = vec![
            ("startDateTime".to_string(), range.from_rfc3339()),
            ("endDateTime".to_string(), range.to_rfc3339()),
            ("$top".to_string(), PAGE_SIZE.to_string()),
        ];

        let events: Vec<GraphEvent> = self
            .collect_pages("outlook.list_events", &self.api.url("me/calendarView"), query)
            .await?;

        debug!(count = events.len(), "Fetched Outlook events");
        Ok(events.into_iter().filter(|e| !e.is_cancelled).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_event(&self, event_id: &str) -> CalSyncResult<GraphEvent> {
        if event_id.trim().is_empty() {
            return Err(CalSyncError::InvalidInput("event_id must not be empty".into()));
        }

        let url = self.resource_url(&["me", "events", event_id])?;
        let response = self
            .api
            .send("outlook.get_event", |http| {
                http.get(url.clone()).header("Prefer", PREFER_UTC)
            })
            .await?;

        read_json(SERVICE, response).await
    }

    /// Most recent messages sent by `email`, newest first.
    #[instrument(skip(self))]
    pub async fn recent_messages_from(
        &self,
        email: &str,
        limit: u32,
    ) -> CalSyncResult<Vec<GraphMessage>> {
        // Graph only honours $orderby when that property leads the $filter
        let filter = format!(
            "receivedDateTime ge {RECEIVED_SINCE} and from/emailAddress/address eq '{}'",
            odata_quote(email)
        );
        let query = vec![
            ("$filter".to_string(), filter),
            ("$orderby".to_string(), "receivedDateTime desc".to_string()),
            ("$top".to_string(), limit.clamp(1, 1000).to_string()),
            (
                "$select".to_string(),
                "subject,from,receivedDateTime,bodyPreview,webLink".to_string(),
            ),
        ];

        let url = self.api.url("me/messages");
        let response = self
            .api
            .send("outlook.recent_messages", |http| http.get(&url).query(&query))
            .await?;

        let page: ListResponse<GraphMessage> = read_json(SERVICE, response).await?;
        Ok(page.value)
    }

    async fn collect_pages<T: DeserializeOwned>(
        &self,
        operation: &str,
        first_url: &str,
        first_query: Vec<(String, String)>,
    ) -> CalSyncResult<Vec<T>> {
        let mut items = Vec::new();
        let mut url = first_url.to_string();
        let mut query = first_query;

        for _ in 0..MAX_PAGES {
            let response = self
                .api
                .send(operation, |http| {
                    http.get(&url).query(&query).header("Prefer", PREFER_UTC)
                })
                .await?;
            let page: ListResponse<T> = read_json(SERVICE, response).await?;
            items.extend(page.value);

            let Some(link) = page.next_link else {
                return Ok(items);
            };
            self.ensure_same_origin(&link)?;
            // nextLink already carries the query string
            url = link;
            query = Vec::new();
        }

        warn!(operation, pages = MAX_PAGES, "Graph listing has more pages than allowed");
        Err(CalSyncError::Truncated {
            service: SERVICE,
            pages: MAX_PAGES,
        })
    }

    /// The bearer token must never leave the configured Graph host.
    fn ensure_same_origin(&self, link: &str) -> CalSyncResult<()> {
        let base =
            Url::parse(self.api.base_url()).map_err(|e| CalSyncError::Config(e.to_string()))?;
        let link_url = Url::parse(link).map_err(|e| CalSyncError::decode(SERVICE, e))?;

        if base.origin() != link_url.origin() {
            return Err(CalSyncError::decode(
                SERVICE,
                format!(
                    "nextLink points outside {}: {}",
                    base.origin().ascii_serialization(),
                    link
                ),
            ));
        }
        Ok(())
    }

    /// API URL with each segment percent-encoded.
    fn resource_url(&self, segments: &[&str]) -> CalSyncResult<Url> {
        let mut url =
            Url::parse(self.api.base_url()).map_err(|e| CalSyncError::Config(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| {
                CalSyncError::Config(format!("{} cannot be a base URL", self.api.base_url()))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Escape a string literal for an OData `$filter`.
fn odata_quote(value: &str) -> String {
    value.replace('\'', "''")
}
