use super::extractor::ParsedRegistration;
use chrono::{Duration, NaiveDateTime};
use chrono_tz::Tz;

/// A wall-clock time tagged with the zone it should be read in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTime {
    pub local: NaiveDateTime,
    pub time_zone: Tz,
}

/// Everything needed to create one calendar entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRequest {
    pub title: String,
    pub start: EventTime,
    pub end: EventTime,
    pub calendar_id: String,
}

/// Fixed settings applied to every registration
#[derive(Debug, Clone)]
pub struct EventTemplate {
    pub title_prefix: String,
    pub time_zone: Tz,
    pub calendar_id: String,
    pub duration: Duration,
}

impl Default for EventTemplate {
    fn default() -> Self {
        Self {
            title_prefix: "Gym Class: ".to_string(),
            time_zone: chrono_tz::America::New_York,
            calendar_id: "primary".to_string(),
            duration: Duration::minutes(45),
        }
    }
}

impl EventTemplate {
    /// Build the event request for a parsed registration
    pub fn build(&self, reg: &ParsedRegistration) -> EventRequest {
        let start = reg.start();

        EventRequest {
            title: format!("{}{}", self.title_prefix, reg.class_name),
            start: EventTime {
                local: start,
                time_zone: self.time_zone,
            },
            end: EventTime {
                local: start + self.duration,
                time_zone: self.time_zone,
            },
            calendar_id: self.calendar_id.clone(),
        }
    }
}

/// Build an event request with the default template
pub fn build_event(reg: &ParsedRegistration) -> EventRequest {
    EventTemplate::default().build(reg)
}
