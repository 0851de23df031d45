mod client;
pub mod models;

pub use client::{GoogleCalendarClient, GOOGLE_CALENDAR_API};
pub use models::{EventBody, EventId};

use crate::error::SyncResult;
use crate::registration::EventRequest;
use async_trait::async_trait;

/// Destination for created class events
#[async_trait]
pub trait CalendarWriter: Send + Sync {
    /// Persist the event and return the id the calendar assigned to it
    async fn create_event(&self, event: &EventRequest) -> SyncResult<EventId>;
}
