use crate::components::google_calendar::CalendarWriter;
use crate::components::mailbox::{MailFilter, MailMessage, MailboxReader};
use crate::error::{Error, SyncResult};
use crate::registration::{extract, EventTemplate};
use std::fmt;
use tracing::{error, info, warn};

/// What happened to one email
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Event created with the given id
    Created(String),
    /// The body didn't describe a registration
    NoMatch,
    /// The registration sentence had an impossible date or time
    Malformed(String),
    /// The calendar rejected the event
    WriteFailed(String),
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub created: usize,
    pub no_match: usize,
    pub malformed: usize,
    pub failed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Created(_) => self.created += 1,
            Outcome::NoMatch => self.no_match += 1,
            Outcome::Malformed(_) => self.malformed += 1,
            Outcome::WriteFailed(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fetched, {} created, {} without registration, {} malformed, {} failed",
            self.fetched, self.created, self.no_match, self.malformed, self.failed
        )
    }
}

/// Fetch matching unread emails and create one event per registration.
///
/// Only the mailbox fetch can fail the run; every per-email problem is
/// logged, counted and skipped. A message is marked read only once its event
/// exists, so a failed write is retried on the next run.
pub async fn run(
    mailbox: &dyn MailboxReader,
    calendar: &dyn CalendarWriter,
    filter: &MailFilter,
    template: &EventTemplate,
) -> SyncResult<RunSummary> {
    let messages = mailbox.fetch_unread(filter).await?;

    let mut summary = RunSummary {
        fetched: messages.len(),
        ..Default::default()
    };

    for message in &messages {
        let outcome = process_message(message, mailbox, calendar, template).await;
        summary.record(&outcome);
    }

    info!("Run complete: {}", summary);
    Ok(summary)
}

/// Handle a single email
pub async fn process_message(
    message: &MailMessage,
    mailbox: &dyn MailboxReader,
    calendar: &dyn CalendarWriter,
    template: &EventTemplate,
) -> Outcome {
    let registration = match extract(&message.body) {
        Ok(Some(registration)) => registration,
        Ok(None) => {
            info!("No registration found in '{}', skipping", message.subject);
            return Outcome::NoMatch;
        }
        Err(Error::MalformedRegistration { text, reason }) => {
            warn!("Skipping malformed registration '{}': {}", text, reason);
            return Outcome::Malformed(reason);
        }
        Err(e) => {
            warn!("Skipping '{}': {}", message.subject, e);
            return Outcome::Malformed(e.to_string());
        }
    };

    let event = template.build(&registration);
    match calendar.create_event(&event).await {
        Ok(id) => {
            info!("Added {} to the calendar ({})", registration.class_name, id);
            if let Err(e) = mailbox.mark_read(message).await {
                warn!("Could not mark '{}' as read: {}", message.subject, e);
            }
            Outcome::Created(id)
        }
        Err(e) => {
            error!("Failed to add {}: {}", registration.class_name, e);
            Outcome::WriteFailed(e.to_string())
        }
    }
}
