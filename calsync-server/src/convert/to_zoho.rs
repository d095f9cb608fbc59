use calsync_provider_outlook::{Attendee, DateTimeTimeZone, GraphEvent, Recipient};
use calsync_provider_zoho::{ContactUpdate, Lookup, Meeting, Participant, Task};
use chrono::{DateTime, FixedOffset};

use super::{ToZoho, non_blank};
use crate::routes::records::UpdateContactRequest;
use crate::routes::tasks::CreateTaskRequest;

const DEFAULT_TASK_STATUS: &str = "Not Started";
const DEFAULT_TASK_PRIORITY: &str = "Normal";

impl ToZoho<Meeting> for GraphEvent {
    fn to_zoho(&self) -> Meeting {
        let title = non_blank(self.subject.as_deref()).unwrap_or("(No title)");

        Meeting {
            id: None,
            event_title: title.to_string(),
            start_datetime: self.start.as_ref().and_then(to_offset_time),
            end_datetime: self.end.as_ref().and_then(to_offset_time),
            venue: self
                .location
                .as_ref()
                .and_then(|l| non_blank(Some(l.display_name.as_str())))
                .map(str::to_string),
            description: description_with_organizer(self),
            all_day: self.is_all_day,
            participants: self.attendees.iter().filter_map(attendee_to_zoho).collect(),
        }
    }
}

fn to_offset_time(time: &DateTimeTimeZone) -> Option<DateTime<FixedOffset>> {
    time.to_utc().map(|utc| utc.fixed_offset())
}

fn description_with_organizer(event: &GraphEvent) -> Option<String> {
    let body = event.body_text();
    let organizer = event.organizer.as_ref().and_then(organizer_line);

    match (body, organizer) {
        (Some(body), Some(line)) => Some(format!("{body}\n\n{line}")),
        (body, line) => body.or(line),
    }
}

fn organizer_line(organizer: &Recipient) -> Option<String> {
    let address = non_blank(Some(organizer.email_address.address.as_str()))?;

    Some(match non_blank(organizer.email_address.name.as_deref()) {
        Some(name) => format!("Organizer: {name} <{address}>"),
        None => format!("Organizer: {address}"),
    })
}

fn attendee_to_zoho(attendee: &Attendee) -> Option<Participant> {
    non_blank(Some(attendee.email_address.address.as_str())).map(Participant::email)
}

impl ToZoho<Task> for CreateTaskRequest {
    fn to_zoho(&self) -> Task {
        let deal = non_blank(self.deal_id.as_deref());

        Task {
            subject: self.subject.trim().to_string(),
            due_date: self.due_date,
            status: non_blank(self.status.as_deref())
                .unwrap_or(DEFAULT_TASK_STATUS)
                .to_string(),
            priority: non_blank(self.priority.as_deref())
                .unwrap_or(DEFAULT_TASK_PRIORITY)
                .to_string(),
            description: non_blank(self.description.as_deref()).map(str::to_string),
            who_id: non_blank(self.contact_id.as_deref()).map(Lookup::id),
            what_id: deal.map(Lookup::id),
            se_module: deal.map(|_| "Deals".to_string()),
        }
    }
}

impl ToZoho<ContactUpdate> for UpdateContactRequest {
    fn to_zoho(&self) -> ContactUpdate {
        ContactUpdate {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            mobile: self.mobile.clone(),
            title: self.title.clone(),
            account_name: non_blank(self.account_name.as_deref()).map(Lookup::named),
            extra: self.extra.clone(),
        }
    }
}
