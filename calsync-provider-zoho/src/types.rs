//! Zoho CRM v2 record shapes.
//!
//! Field names follow Zoho's API names (`First_Name`, `Deal_Name`, ...).
//! Read-only records serialize back out in snake_case; write shapes keep
//! Zoho's names both ways. Only the fields calsync uses are modelled.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

// =============================================================================
// Envelopes
// =============================================================================

/// `GET /{module}` response. Zoho answers `204 No Content` instead of an empty list.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub info: Option<PageInfo>,
}

impl<T> Default for ListResponse<T> {
    fn default() -> Self {
        ListResponse {
            data: Vec::new(),
            info: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub per_page: u32,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub more_records: bool,
}

/// `{"data": [record]}` body for inserts and updates.
#[derive(Debug, Serialize)]
pub struct WriteRequest<'a, T> {
    pub data: [&'a T; 1],
}

#[derive(Debug, Default, Deserialize)]
pub struct WriteResponse {
    #[serde(default)]
    pub data: Vec<WriteResult>,
}

/// Per-record outcome of an insert or update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteResult {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

// =============================================================================
// Shared field types
// =============================================================================

/// A lookup field (`{"name": "Acme", "id": "4150868000000224005"}`).
/// Writes may reference the target by name alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lookup {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Lookup {
    pub fn id(id: impl Into<String>) -> Self {
        Lookup {
            id: id.into(),
            name: None,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Lookup {
            id: String::new(),
            name: Some(name.into()),
        }
    }
}

// =============================================================================
// Modules
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    #[serde(rename(deserialize = "First_Name"), default)]
    pub first_name: Option<String>,
    #[serde(rename(deserialize = "Last_Name"), default)]
    pub last_name: Option<String>,
    #[serde(rename(deserialize = "Full_Name"), default)]
    pub full_name: Option<String>,
    #[serde(rename(deserialize = "Company"), default)]
    pub company: Option<String>,
    #[serde(rename(deserialize = "Email"), default)]
    pub email: Option<String>,
    #[serde(rename(deserialize = "Phone"), default)]
    pub phone: Option<String>,
    #[serde(rename(deserialize = "Lead_Status"), default)]
    pub lead_status: Option<String>,
    #[serde(rename(deserialize = "Lead_Source"), default)]
    pub lead_source: Option<String>,
    #[serde(rename(deserialize = "Owner"), default)]
    pub owner: Option<Lookup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    #[serde(rename(deserialize = "Campaign_Name"), default)]
    pub campaign_name: Option<String>,
    #[serde(rename(deserialize = "Status"), default)]
    pub status: Option<String>,
    #[serde(rename(deserialize = "Type"), default)]
    pub campaign_type: Option<String>,
    #[serde(rename(deserialize = "Start_Date"), default)]
    pub start_date: Option<NaiveDate>,
    #[serde(rename(deserialize = "End_Date"), default)]
    pub end_date: Option<NaiveDate>,
    #[serde(rename(deserialize = "Expected_Revenue"), default)]
    pub expected_revenue: Option<f64>,
    #[serde(rename(deserialize = "Budgeted_Cost"), default)]
    pub budgeted_cost: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    #[serde(rename(deserialize = "Deal_Name"), default)]
    pub deal_name: Option<String>,
    #[serde(rename(deserialize = "Stage"), default)]
    pub stage: Option<String>,
    #[serde(rename(deserialize = "Amount"), default)]
    pub amount: Option<f64>,
    #[serde(rename(deserialize = "Probability"), default)]
    pub probability: Option<f64>,
    #[serde(rename(deserialize = "Closing_Date"), default)]
    pub closing_date: Option<NaiveDate>,
    #[serde(rename(deserialize = "Account_Name"), default)]
    pub account_name: Option<Lookup>,
    #[serde(rename(deserialize = "Contact_Name"), default)]
    pub contact_name: Option<Lookup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    #[serde(rename(deserialize = "First_Name"), default)]
    pub first_name: Option<String>,
    #[serde(rename(deserialize = "Last_Name"), default)]
    pub last_name: Option<String>,
    #[serde(rename(deserialize = "Full_Name"), default)]
    pub full_name: Option<String>,
    #[serde(rename(deserialize = "Email"), default)]
    pub email: Option<String>,
    #[serde(rename(deserialize = "Phone"), default)]
    pub phone: Option<String>,
    #[serde(rename(deserialize = "Mobile"), default)]
    pub mobile: Option<String>,
    #[serde(rename(deserialize = "Title"), default)]
    pub title: Option<String>,
    #[serde(rename(deserialize = "Account_Name"), default)]
    pub account_name: Option<Lookup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    #[serde(rename(deserialize = "Note_Title"), default)]
    pub note_title: Option<String>,
    #[serde(rename(deserialize = "Note_Content"), default)]
    pub note_content: Option<String>,
    #[serde(rename(deserialize = "Created_Time"), default)]
    pub created_time: Option<DateTime<FixedOffset>>,
}

/// A record of the `Events` module (shown as "Meetings" in the Zoho UI).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "Event_Title", default)]
    pub event_title: String,
    #[serde(rename = "Start_DateTime", default, skip_serializing_if = "Option::is_none")]
    pub start_datetime: Option<DateTime<FixedOffset>>,
    #[serde(rename = "End_DateTime", default, skip_serializing_if = "Option::is_none")]
    pub end_datetime: Option<DateTime<FixedOffset>>,
    #[serde(rename = "Venue", default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "All_day", default)]
    pub all_day: bool,
    #[serde(rename = "Participants", default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<Participant>,
}

/// Meeting participant. `participant` holds an email address for `type: "email"`
/// or a record id for `contact`/`lead`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(rename = "type")]
    pub participant_type: String,
    pub participant: String,
    #[serde(rename = "Email", default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Participant {
    pub fn email(address: impl Into<String>) -> Self {
        Participant {
            participant_type: "email".to_string(),
            participant: address.into(),
            email: None,
            name: None,
        }
    }

    /// Email address for any participant type, when Zoho supplied one.
    pub fn email_address(&self) -> Option<&str> {
        match self.participant_type.as_str() {
            "email" => Some(self.participant.as_str()),
            _ => self.email.as_deref(),
        }
        .filter(|address| address.contains('@'))
    }
}

/// A record of the `Tasks` module.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Task {
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Due_Date", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Priority")]
    pub priority: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Who_Id", skip_serializing_if = "Option::is_none")]
    pub who_id: Option<Lookup>,
    #[serde(rename = "What_Id", skip_serializing_if = "Option::is_none")]
    pub what_id: Option<Lookup>,
    #[serde(rename = "$se_module", skip_serializing_if = "Option::is_none")]
    pub se_module: Option<String>,
}

/// Partial update for a `Contacts` record. Unknown fields pass through as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContactUpdate {
    #[serde(rename = "First_Name", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "Last_Name", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "Email", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "Phone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "Mobile", skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(rename = "Title", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "Account_Name", skip_serializing_if = "Option::is_none")]
    pub account_name: Option<Lookup>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ContactUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.mobile.is_none()
            && self.title.is_none()
            && self.account_name.is_none()
            && self.extra.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meeting_parses_zoho_payload() {
        let json = r#"{
            "id": "4150868000000225001",
            "Event_Title": "Renewal call",
            "Start_DateTime": "2025-03-20T15:00:00+05:30",
            "End_DateTime": "2025-03-20T16:00:00+05:30",
            "Venue": null,
            "All_day": false,
            "Participants": [
                {"type": "email", "participant": "ana@example.com", "status": "not_known"},
                {"type": "contact", "participant": "4150868000000224005",
                 "Email": "bo@example.com", "name": "Bo"},
                {"type": "user", "participant": "4150868000000225013", "name": "Owner"}
            ]
        }"#;

        let meeting: Meeting = serde_json::from_str(json).unwrap();
        assert_eq!(meeting.event_title, "Renewal call");
        assert_eq!(meeting.venue, None);

        let emails: Vec<_> = meeting
            .participants
            .iter()
            .filter_map(Participant::email_address)
            .collect();
        assert_eq!(emails, vec!["ana@example.com", "bo@example.com"]);
    }

    #[test]
    fn task_serializes_lookup_and_module() {
        let task = Task {
            subject: "Follow up".to_string(),
            status: "Not Started".to_string(),
            priority: "High".to_string(),
            what_id: Some(Lookup::id("42")),
            se_module: Some("Deals".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["Subject"], "Follow up");
        assert_eq!(json["What_Id"]["id"], "42");
        assert_eq!(json["$se_module"], "Deals");
        assert!(json.get("Due_Date").is_none());
        assert!(json.get("Who_Id").is_none());
    }

    #[test]
    fn contact_update_flattens_extra_fields() {
        let mut update = ContactUpdate {
            phone: Some("+1 555 0100".to_string()),
            ..Default::default()
        };
        update
            .extra
            .insert("Lead_Source".to_string(), serde_json::json!("Webinar"));

        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"Phone": "+1 555 0100", "Lead_Source": "Webinar"}));
        assert!(!update.is_empty());
        assert!(ContactUpdate::default().is_empty());
    }

    #[test]
    fn deal_reads_lookups_and_dates() {
        let json = r#"{"id":"7","Deal_Name":"Acme renewal","Stage":"Negotiation","Amount":12000.5,
            "Closing_Date":"2025-06-30","Account_Name":{"name":"Acme","id":"9"}}"#;
        let deal: Deal = serde_json::from_str(json).unwrap();

        assert_eq!(deal.closing_date, NaiveDate::from_ymd_opt(2025, 6, 30));
        assert_eq!(deal.account_name.unwrap().name.as_deref(), Some("Acme"));
        assert_eq!(deal.amount, Some(12000.5));
    }

    #[test]
    fn records_serialize_in_snake_case() {
        let contact: Contact = serde_json::from_str(
            r#"{"id":"5","First_Name":"Ana","Account_Name":{"name":"Acme","id":"9"}}"#,
        )
        .unwrap();
        let json = serde_json::to_value(&contact).unwrap();

        assert_eq!(json["first_name"], "Ana");
        assert_eq!(json["account_name"]["name"], "Acme");
        assert!(json.get("First_Name").is_none());
        assert_eq!(
            serde_json::to_value(Lookup::named("Acme")).unwrap(),
            serde_json::json!({"name": "Acme"})
        );
    }
}
