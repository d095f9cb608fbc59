//! Batched event creation through Graph's JSON `$batch` endpoint.

use std::collections::HashMap;
use std::time::Duration;

use calsync_core::http::{parse_retry_after, read_json_or_default};
use calsync_core::CalSyncResult;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::client::{OutlookClient, SERVICE};
use crate::types::{BatchRequest, BatchRequestItem, BatchResponse, BatchResponseItem, GraphEvent};

/// Graph accepts at most 20 sub-requests per `$batch` call.
pub const MAX_BATCH_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedEvent {
    /// Position of the event in the caller's input.
    pub index: usize,
    pub id: String,
    pub web_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub index: usize,
    /// Sub-request status, or the status of the whole `$batch` call when that failed.
    pub status: u16,
    pub error: String,
}

/// Every input index ends up in exactly one of `created` or `failed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub created: Vec<CreatedEvent>,
    pub failed: Vec<BatchFailure>,
}

enum ItemResult {
    Created(CreatedEvent),
    Throttled(usize, Option<Duration>),
    Failed(BatchFailure),
}

impl OutlookClient {
    /// Create `events` in the user's default calendar, 20 per `$batch` call.
    ///
    /// Sub-requests throttled with 429 are resubmitted once, after the longest
    /// `Retry-After` among them, or the retry policy's first backoff step when
    /// none was given. A `$batch` call that fails outright marks its
    /// events failed, unless nothing has been processed yet, in which case the
    /// error is returned.
    #[instrument(skip_all, fields(count = events.len()))]
    pub async fn create_events_batched(
        &self,
        events: &[GraphEvent],
    ) -> CalSyncResult<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        let mut pending: Vec<usize> = (0..events.len()).collect();

        for round in 0..2 {
            let mut throttled = Vec::new();
            let mut wait = Duration::ZERO;

            for chunk in pending.chunks(MAX_BATCH_SIZE) {
                let request = build_batch_request(chunk, events);

                let response = match self.post_batch(&request).await {
                    Ok(response) => response,
                    Err(e) if outcome.created.is_empty() && outcome.failed.is_empty() => {
                        return Err(e);
                    }
                    Err(e) => {
                        warn!(error = %e, size = chunk.len(), "Batch call failed");
                        let status = e.status().unwrap_or(0);
                        outcome.failed.extend(chunk.iter().map(|&index| BatchFailure {
                            index,
                            status,
                            error: e.to_string(),
                        }));
                        continue;
                    }
                };

                for result in absorb_response(chunk, response) {
                    match result {
                        ItemResult::Created(created) => outcome.created.push(created),
                        ItemResult::Failed(failure) => outcome.failed.push(failure),
                        ItemResult::Throttled(index, retry_after) => {
                            wait = wait.max(self.api.retry_policy().delay_for(1, retry_after));
                            throttled.push(index);
                        }
                    }
                }
            }

            if throttled.is_empty() {
                break;
            }

            if round == 0 {
                warn!(
                    count = throttled.len(),
                    wait_ms = wait.as_millis() as u64,
                    "Resubmitting throttled events"
                );
                tokio::time::sleep(wait).await;
                pending = throttled;
            } else {
                outcome.failed.extend(throttled.into_iter().map(|index| BatchFailure {
                    index,
                    status: 429,
                    error: "throttled by Outlook".to_string(),
                }));
            }
        }

        outcome.created.sort_by_key(|c| c.index);
        outcome.failed.sort_by_key(|f| f.index);

        info!(
            created = outcome.created.len(),
            failed = outcome.failed.len(),
            "Batch event creation finished"
        );
        Ok(outcome)
    }

    async fn post_batch(&self, request: &BatchRequest) -> CalSyncResult<BatchResponse> {
        let url = self.api.url("$batch");
        let response = self
            .api
            .send("outlook.batch", |http| http.post(&url).json(request))
            .await?;
        read_json_or_default(SERVICE, response).await
    }
}

/// Sub-request ids are the input indices, so responses can be matched back.
fn build_batch_request(chunk: &[usize], events: &[GraphEvent]) -> BatchRequest {
    let headers = HashMap::from([("Content-Type".to_string(), "application/json".to_string())]);

    BatchRequest {
        requests: chunk
            .iter()
            .map(|&index| BatchRequestItem {
                id: index.to_string(),
                method: "POST".to_string(),
                url: "/me/events".to_string(),
                headers: headers.clone(),
                body: serde_json::to_value(&events[index]).unwrap_or_default(),
            })
            .collect(),
    }
}

fn absorb_response(chunk: &[usize], response: BatchResponse) -> Vec<ItemResult> {
    let mut by_index: HashMap<usize, BatchResponseItem> = response
        .responses
        .into_iter()
        .filter_map(|item| item.id.parse::<usize>().ok().map(|index| (index, item)))
        .filter(|(index, _)| chunk.contains(index))
        .collect();

    chunk
        .iter()
        .map(|&index| match by_index.remove(&index) {
            Some(item) => classify_item(index, item),
            None => ItemResult::Failed(BatchFailure {
                index,
                status: 0,
                error: "missing from batch response".to_string(),
            }),
        })
        .collect()
}

fn classify_item(index: usize, item: BatchResponseItem) -> ItemResult {
    if (200..300).contains(&item.status) {
        let body = item.body.unwrap_or_default();
        let Some(id) = body.get("id").and_then(|v| v.as_str()) else {
            return ItemResult::Failed(BatchFailure {
                index,
                status: item.status,
                error: "created event has no id".to_string(),
            });
        };
        return ItemResult::Created(CreatedEvent {
            index,
            id: id.to_string(),
            web_link: body.get("webLink").and_then(|v| v.as_str()).map(str::to_string),
        });
    }

    if item.status == 429 {
        let headers = item
            .headers
            .iter()
            .filter_map(|(name, value)| {
                Some((
                    reqwest::header::HeaderName::from_bytes(name.as_bytes()).ok()?,
                    reqwest::header::HeaderValue::from_str(value).ok()?,
                ))
            })
            .collect();
        return ItemResult::Throttled(index, parse_retry_after(&headers));
    }

    let error = item
        .body
        .as_ref()
        .and_then(|body| body.pointer("/error/message"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .or_else(|| item.body.as_ref().map(|b| b.to_string()))
        .unwrap_or_else(|| format!("HTTP {}", item.status));

    ItemResult::Failed(BatchFailure {
        index,
        status: item.status,
        error,
    })
}
