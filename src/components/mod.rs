// Export components
pub mod google_calendar;
pub mod google_oauth;
pub mod mailbox;

// Re-export the collaborator seams
pub use google_calendar::{CalendarWriter, GoogleCalendarClient};
pub use google_oauth::TokenManager;
pub use mailbox::{ImapMailbox, MailboxReader};
