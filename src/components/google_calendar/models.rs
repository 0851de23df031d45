use crate::registration::{EventRequest, EventTime};
use serde::{Deserialize, Serialize};

/// Format Google Calendar expects for a zoned wall-clock `dateTime`
const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Identifier the calendar assigned to a created event
pub type EventId = String;

/// Request body of `events.insert`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EventBody {
    pub summary: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
}

/// Start or end of an event
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: String,
    pub time_zone: String,
}

/// The part of the `events.insert` response we care about
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: Option<String>,
}

impl From<&EventTime> for EventDateTime {
    fn from(time: &EventTime) -> Self {
        Self {
            date_time: time.local.format(DATE_TIME_FORMAT).to_string(),
            time_zone: time.time_zone.name().to_string(),
        }
    }
}

impl From<&EventRequest> for EventBody {
    fn from(event: &EventRequest) -> Self {
        Self {
            summary: event.title.clone(),
            start: EventDateTime::from(&event.start),
            end: EventDateTime::from(&event.end),
        }
    }
}
