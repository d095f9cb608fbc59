//! Microsoft Graph resource shapes, limited to the fields calsync reads or writes.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Width used when flattening HTML bodies to text.
const TEXT_WIDTH: usize = 120;

/// A calendar event (`microsoft.graph.event`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<ItemBody>,
    #[serde(default, skip_serializing)]
    pub body_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTimeTimeZone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTimeTimeZone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<Attendee>,
    #[serde(default, skip_serializing)]
    pub organizer: Option<Recipient>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default, skip_serializing)]
    pub is_cancelled: bool,
    #[serde(default, skip_serializing)]
    pub web_link: Option<String>,
}

impl GraphEvent {
    /// Body as plain text. HTML bodies are flattened; falls back to `bodyPreview`.
    pub fn body_text(&self) -> Option<String> {
        let text = match &self.body {
            Some(body) if body.content_type.eq_ignore_ascii_case("html") => {
                html2text::from_read(body.content.as_bytes(), TEXT_WIDTH)
                    .unwrap_or_else(|_| body.content.clone())
            }
            Some(body) => body.content.clone(),
            None => self.body_preview.clone().unwrap_or_default(),
        };

        let text = text.trim();
        if text.is_empty() { None } else { Some(text.to_string()) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBody {
    /// `text` or `html`
    pub content_type: String,
    #[serde(default)]
    pub content: String,
}

impl ItemBody {
    pub fn text(content: impl Into<String>) -> Self {
        ItemBody {
            content_type: "text".to_string(),
            content: content.into(),
        }
    }
}

/// Graph's wall-clock time plus zone name, e.g.
/// `{"dateTime": "2025-03-20T15:00:00.0000000", "timeZone": "UTC"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeTimeZone {
    pub date_time: String,
    #[serde(default = "utc_zone")]
    pub time_zone: String,
}

fn utc_zone() -> String {
    "UTC".to_string()
}

impl DateTimeTimeZone {
    pub fn utc(instant: DateTime<Utc>) -> Self {
        DateTimeTimeZone {
            date_time: instant.format("%Y-%m-%dT%H:%M:%S").to_string(),
            time_zone: utc_zone(),
        }
    }

    /// Resolve to an instant. IANA zone names are honored; anything else
    /// (including Windows zone names) is read as UTC.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(&self.date_time) {
            return Some(with_offset.with_timezone(&Utc));
        }

        let naive = NaiveDateTime::parse_from_str(&self.date_time, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(&self.date_time, "%Y-%m-%dT%H:%M"))
            .ok()?;

        match self.time_zone.parse::<Tz>() {
            Ok(tz) => tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.with_timezone(&Utc)),
            Err(_) => Some(naive.and_utc()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub email_address: EmailAddress,
    /// `required`, `optional` or `resource`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub attendee_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub email_address: EmailAddress,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailAddress {
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A mail message (`microsoft.graph.message`), metadata only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMessage {
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub received_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub body_preview: Option<String>,
    #[serde(default)]
    pub from: Option<Recipient>,
    #[serde(default)]
    pub web_link: Option<String>,
}

/// One page of a Graph collection.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// JSON `$batch` envelope.
#[derive(Debug, Serialize)]
pub struct BatchRequest {
    pub requests: Vec<BatchRequestItem>,
}

#[derive(Debug, Serialize)]
pub struct BatchRequestItem {
    pub id: String,
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub responses: Vec<BatchResponseItem>,
}

#[derive(Debug, Deserialize)]
pub struct BatchResponseItem {
    pub id: String,
    pub status: u16,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}
