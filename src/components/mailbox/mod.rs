mod imap_mailbox;
pub mod message;

pub use imap_mailbox::{ImapMailbox, ImapSettings};
pub use message::{decode_message, MailMessage};

use crate::error::SyncResult;
use async_trait::async_trait;

/// Which messages count as registration confirmations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailFilter {
    /// Sender address (or part of it) the confirmations come from
    pub sender_contains: String,
    /// Text every confirmation subject contains
    pub subject_contains: String,
}

/// Source of unread registration confirmations
#[async_trait]
pub trait MailboxReader: Send + Sync {
    /// Fetch the decoded unread messages matching the filter
    async fn fetch_unread(&self, filter: &MailFilter) -> SyncResult<Vec<MailMessage>>;

    /// Flag a handled message as read so later runs skip it
    async fn mark_read(&self, message: &MailMessage) -> SyncResult<()>;
}
