use calsync_provider_outlook::{
    Attendee, DateTimeTimeZone, EmailAddress, GraphEvent, ItemBody, Location,
};
use calsync_provider_zoho::{Meeting, Participant};
use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, Utc};

use super::{ToOutlook, non_blank};

impl ToOutlook<GraphEvent> for Meeting {
    fn to_outlook(&self) -> GraphEvent {
        let (start, end) = if self.all_day {
            all_day_bounds(self.start_datetime, self.end_datetime)
        } else {
            (
                self.start_datetime.map(utc_time),
                self.end_datetime.map(utc_time),
            )
        };

        let subject = non_blank(Some(self.event_title.as_str())).unwrap_or("(No title)");

        GraphEvent {
            subject: Some(subject.to_string()),
            body: non_blank(self.description.as_deref()).map(ItemBody::text),
            start,
            end,
            location: non_blank(self.venue.as_deref()).map(|venue| Location {
                display_name: venue.to_string(),
            }),
            attendees: self.participants.iter().filter_map(participant_to_outlook).collect(),
            is_all_day: self.all_day,
            ..Default::default()
        }
    }
}

fn utc_time(instant: DateTime<FixedOffset>) -> DateTimeTimeZone {
    DateTimeTimeZone::utc(instant.with_timezone(&Utc))
}

fn midnight(date: NaiveDate) -> DateTimeTimeZone {
    DateTimeTimeZone::utc(date.and_time(NaiveTime::MIN).and_utc())
}

/// Graph wants all-day events to span whole UTC days, end exclusive.
/// Dates are taken from the meeting's own wall clock.
fn all_day_bounds(
    start: Option<DateTime<FixedOffset>>,
    end: Option<DateTime<FixedOffset>>,
) -> (Option<DateTimeTimeZone>, Option<DateTimeTimeZone>) {
    let Some(start) = start else {
        return (None, end.map(utc_time));
    };

    let first_day = start.date_naive();
    let end_day = end
        .map(|end| {
            let day = end.date_naive();
            if end.time() == NaiveTime::MIN { day } else { day + Days::new(1) }
        })
        .filter(|day| *day > first_day)
        .unwrap_or(first_day + Days::new(1));

    (Some(midnight(first_day)), Some(midnight(end_day)))
}

fn participant_to_outlook(participant: &Participant) -> Option<Attendee> {
    let address = participant.email_address()?;

    Some(Attendee {
        email_address: EmailAddress {
            address: address.to_string(),
            name: participant.name.clone(),
        },
        attendee_type: Some("required".to_string()),
    })
}
