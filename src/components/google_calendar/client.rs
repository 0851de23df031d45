use super::models::{CreatedEvent, EventBody, EventId};
use super::CalendarWriter;
use crate::error::{google_calendar_error, SyncResult};
use crate::registration::EventRequest;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

/// Base URL of the Google Calendar v3 API
pub const GOOGLE_CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3";

/// Calendar writer backed by the Google Calendar REST API
#[derive(Clone)]
pub struct GoogleCalendarClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl GoogleCalendarClient {
    pub fn new(client: Client, access_token: String) -> Self {
        Self::with_base_url(client, GOOGLE_CALENDAR_API, access_token)
    }

    /// Point the client at another API root (used by tests)
    pub fn with_base_url(client: Client, base_url: &str, access_token: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    fn events_url(&self, calendar_id: &str) -> SyncResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| google_calendar_error("Calendar API URL cannot be a base"))?
            .pop_if_empty()
            .extend(["calendars", calendar_id, "events"]);

        Ok(url)
    }
}

#[async_trait]
impl CalendarWriter for GoogleCalendarClient {
    async fn create_event(&self, event: &EventRequest) -> SyncResult<EventId> {
        let url = self.events_url(&event.calendar_id)?;
        let body = EventBody::from(event);
        debug!("Creating event {:?} in calendar {}", body, event.calendar_id);

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to create event: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to create event: HTTP {} - {}",
                status, error_body
            )));
        }

        let created: CreatedEvent = response.json().await.map_err(|e| {
            google_calendar_error(&format!("Failed to parse event response: {}", e))
        })?;

        info!(
            "Created event {} ({})",
            created.id,
            created.html_link.as_deref().unwrap_or("no link")
        );

        Ok(created.id)
    }
}
